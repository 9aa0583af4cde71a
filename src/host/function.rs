//! Host functions

use super::state::Host;
use super::value::HostValue;
use super::HostResult;
use core::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FUNCTION_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity assigned to a function when it is created
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FunctionId(u64);

impl FunctionId {
    fn next() -> Self {
        Self(NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

pub type HostFnProc = dyn Fn(&Host, Vec<HostValue>) -> HostResult<Vec<HostValue>>;

/// Callable host value; clones share the same identity
#[derive(Clone)]
pub struct HostFunction {
    id: FunctionId,
    f: Rc<HostFnProc>,
}

impl HostFunction {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Host, Vec<HostValue>) -> HostResult<Vec<HostValue>> + 'static,
    {
        Self {
            id: FunctionId::next(),
            f: Rc::new(f),
        }
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn call(&self, host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
        (self.f)(host, args)
    }
}

impl PartialEq for HostFunction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HostFunction {}

impl core::hash::Hash for HostFunction {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function: {:#x}", self.id.0)
    }
}
