//! Variable traces backed by host callbacks
//!
//! The trace client name is derived from the callback's identity, so the
//! same callback on the same variable, element and flags is installed once
//! and every trace of one callback shares one function-table slot.

use crate::errors::{BridgeError, Result};
use crate::host::{Host, HostFunction, HostValue};
use crate::interp::{FunctionTable, Interp};
use crate::logging;
use crate::target::{Engine, Flags, Status, VarTraceProc};
use std::rc::{Rc, Weak};

/// Function-table key for traces calling `function`
pub fn trace_name(function: &HostFunction) -> String {
    format!("_tracefunc{:016x}", function.id().as_u64())
}

struct TraceWrapper {
    host: Weak<Host>,
    functions: Rc<FunctionTable>,
    client: String,
    /// Flags the trace was registered with, used again on re-install
    flags: Flags,
}

impl TraceWrapper {
    fn proc_(self: &Rc<Self>) -> Rc<VarTraceProc> {
        let this = Rc::clone(self);
        Rc::new(move |engine: &Engine, name1: &str, name2: Option<&str>, flags: Flags| {
            this.fire(engine, name1, name2, flags)
        })
    }

    fn install(self: &Rc<Self>, engine: &Engine, name1: &str, name2: Option<&str>) -> Status {
        engine.trace_var2(name1, name2, self.flags, &self.client, self.proc_())
    }

    fn fire(self: &Rc<Self>, engine: &Engine, name1: &str, name2: Option<&str>, flags: Flags) -> Option<String> {
        if flags.contains(Flags::INTERP_DESTROYED) {
            return None;
        }
        // the variable went away: keep watching it
        if flags.contains(Flags::TRACE_DESTROYED) {
            return match self.install(engine, name1, name2) {
                Status::Error => Some(engine.string_result()),
                _ => None,
            };
        }

        logging::log_trace_fire(name1, name2, flags.bits());
        let host = self.host.upgrade()?;
        let function: HostValue = self.functions.get(&self.client).into();
        let args = vec![
            HostValue::from(name1),
            name2.map(HostValue::from).unwrap_or_default(),
            HostValue::Integer(i64::from(flags.bits())),
        ];

        let saved = engine.save_result();
        let outcome = host.call(&function, args);
        engine.restore_result(saved);

        match outcome {
            Ok(values) => values
                .into_iter()
                .next()
                .and_then(|value| value.coerce_bytes())
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .filter(|message| !message.is_empty()),
            Err(error) => Some(error.message().to_string()),
        }
    }
}

impl Interp {
    /// Call `function` with `(name, element, flags)` on the accesses named
    /// by `flags`. A non-empty string returned by the callback vetoes the
    /// access with that message.
    pub fn trace_var(&self, name: &str, element: Option<&str>, flags: Flags, function: HostFunction) -> Result<()> {
        let engine = self.live_engine()?;
        let flags = flags | Flags::TRACE_RESULT_DYNAMIC;
        let client = trace_name(&function);

        let already = engine
            .var_trace_info2(name, element)
            .iter()
            .any(|(owner, existing)| *owner == client && *existing == flags);
        if !already {
            let wrapper = Rc::new(TraceWrapper {
                host: self.host_weak(),
                functions: Rc::clone(self.functions()),
                client: client.clone(),
                flags,
            });
            if wrapper.install(engine, name, element) == Status::Error {
                return Err(BridgeError::eval(engine.string_result()));
            }
        }

        self.functions().insert(&client, function);
        Ok(())
    }

    /// Remove the trace `function` installed with `flags`; missing traces
    /// are ignored
    pub fn untrace_var(&self, name: &str, element: Option<&str>, flags: Flags, function: &HostFunction) -> Result<()> {
        let engine = self.live_engine()?;
        let client = trace_name(function);
        engine.untrace_var2(name, element, flags | Flags::TRACE_RESULT_DYNAMIC, &client);
        if engine.trace_client_count(&client) == 0 {
            self.functions().remove(&client);
        }
        Ok(())
    }
}
