//! Variable access from the host
//!
//! `LEAVE_ERR_MSG` is always added so failures carry the interpreter's
//! message.

use super::marshal;
use crate::errors::{BridgeError, Result};
use crate::host::HostValue;
use crate::interp::Interp;
use crate::target::{Flags, Status};

impl Interp {
    /// Read a scalar (`element` is `None`) or an array element
    pub fn get_var(&self, name: &str, element: Option<&str>, flags: Flags) -> Result<HostValue> {
        let engine = self.live_engine()?;
        match engine.get_var2(name, element, flags | Flags::LEAVE_ERR_MSG) {
            Some(value) => Ok(marshal::to_host(Some(&value))),
            None => Err(BridgeError::eval(engine.string_result())),
        }
    }

    /// Store `value` and return the variable's new value, which differs
    /// from `value` when appending
    pub fn set_var(&self, name: &str, element: Option<&str>, value: &HostValue, flags: Flags) -> Result<HostValue> {
        let engine = self.live_engine()?;
        let obj = marshal::to_target(value)?;
        match engine.set_var2(name, element, obj, flags | Flags::LEAVE_ERR_MSG) {
            Some(stored) => Ok(marshal::to_host(Some(&stored))),
            None => Err(BridgeError::eval(engine.string_result())),
        }
    }

    pub fn unset_var(&self, name: &str, element: Option<&str>, flags: Flags) -> Result<()> {
        let engine = self.live_engine()?;
        match engine.unset_var2(name, element, flags | Flags::LEAVE_ERR_MSG) {
            Status::Error => Err(BridgeError::eval(engine.string_result())),
            _ => Ok(()),
        }
    }
}
