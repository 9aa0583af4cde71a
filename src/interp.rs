//! Interpreter handle - owns one embedded interpreter
//!
//! The handle holds only a weak reference to the host, so host values that
//! keep the handle alive do not form a reference cycle through it.

use crate::config::BridgeConfig;
use crate::errors::{BridgeError, Result};
use crate::host::{Host, HostFunction};
use crate::interop::{repr, TypeTags};
use crate::logging;
use crate::target::{Engine, Status};
use core::fmt;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub const INTERP_TYPE_NAME: &str = "ltcl.Interp";

/// Host functions reachable from the interpreter, keyed by command name
/// or by derived trace name
#[derive(Default)]
pub struct FunctionTable {
    entries: RefCell<HashMap<String, HostFunction>>,
}

impl FunctionTable {
    pub fn get(&self, name: &str) -> Option<HostFunction> {
        self.entries.borrow().get(name).cloned()
    }

    pub fn insert(&self, name: &str, function: HostFunction) {
        self.entries.borrow_mut().insert(name.to_string(), function);
    }

    pub fn remove(&self, name: &str) -> Option<HostFunction> {
        self.entries.borrow_mut().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

pub struct Interp {
    engine: Rc<Engine>,
    host: Weak<Host>,
    functions: Rc<FunctionTable>,
    config: BridgeConfig,
    destroyed: Cell<bool>,
}

impl Interp {
    pub fn new(host: &Host) -> Result<Self> {
        Self::with_config(host, BridgeConfig::default())
    }

    pub fn with_config(host: &Host, config: BridgeConfig) -> Result<Self> {
        TypeTags::get();

        let engine = Engine::with_max_nesting(config.interp.max_nesting);
        if engine.set_system_encoding(&config.interp.system_encoding) == Status::Error {
            let message = engine.string_result();
            engine.delete();
            return Err(BridgeError::Initialization(message));
        }

        let interp = Self {
            engine,
            host: host.weak(),
            functions: Rc::new(FunctionTable::default()),
            config,
            destroyed: Cell::new(false),
        };
        interp.install_adhoc_command()?;

        if interp.engine.init(interp.config.interp.init_script.as_deref()) == Status::Error {
            return Err(BridgeError::Initialization(interp.engine.string_result()));
        }

        logging::log_interp_create(interp.id());
        Ok(interp)
    }

    /// Stable identity of the underlying interpreter
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.engine) as usize
    }

    pub fn engine(&self) -> &Rc<Engine> {
        &self.engine
    }

    pub fn host(&self) -> Option<Rc<Host>> {
        self.host.upgrade()
    }

    pub(crate) fn host_weak(&self) -> Weak<Host> {
        self.host.clone()
    }

    pub(crate) fn functions(&self) -> &Rc<FunctionTable> {
        &self.functions
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Names with a host function attached, registered commands and
    /// trace callbacks alike
    pub fn function_names(&self) -> Vec<String> {
        self.functions.names()
    }

    /// The interpreter, unless the handle was destroyed
    pub(crate) fn live_engine(&self) -> Result<&Rc<Engine>> {
        if self.destroyed.get() || self.engine.is_deleted() {
            return Err(BridgeError::eval("attempt to use a deleted interpreter"));
        }
        Ok(&self.engine)
    }

    /// Release the interpreter. Teardown is deferred while argument
    /// bundles built from it are alive. Repeated calls do nothing.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        logging::log_interp_destroy(self.id());
        self.engine.delete();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// `ltcl.Interp (0x...)`
    pub fn to_repr(&self) -> Result<String> {
        repr::bounded(format!("{} ({:#x})", INTERP_TYPE_NAME, self.id()))
    }
}

impl Drop for Interp {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Interp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interp")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("functions", &self.functions.len())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}
