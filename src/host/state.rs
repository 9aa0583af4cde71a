//! Host state - the global namespace and function invocation

use super::table::TableRef;
use super::value::HostValue;
use super::{HostError, HostResult};
use std::rc::{Rc, Weak};

pub struct Host {
    globals: TableRef,
    this: Weak<Host>,
}

impl Host {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            globals: TableRef::new(),
            this: this.clone(),
        })
    }

    /// Weak handle for objects that must not keep the host alive
    pub fn weak(&self) -> Weak<Host> {
        self.this.clone()
    }

    pub fn globals(&self) -> &TableRef {
        &self.globals
    }

    pub fn get_global(&self, name: &str) -> HostValue {
        self.globals.get_str(name)
    }

    pub fn set_global(&self, name: &str, value: impl Into<HostValue>) {
        self.globals.set_str(name, value);
    }

    /// Call a function value; anything else is a host error
    pub fn call(&self, f: &HostValue, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
        match f {
            HostValue::Function(func) => func.call(self, args),
            other => Err(HostError::new(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
        }
    }

    pub fn call_global(&self, name: &str, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
        let f = self.get_global(name);
        if f.is_nil() {
            return Err(HostError::new(format!(
                "attempt to call global '{}' (a nil value)",
                name
            )));
        }
        self.call(&f, args)
    }
}
