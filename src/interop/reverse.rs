//! Reverse calls - the interpreter calling host functions
//!
//! Two paths: one ad-hoc command that looks up a host global by name, and
//! named commands bound to functions stored in the interpreter's function
//! table. A host failure becomes an interpreter error carrying the host
//! message; it never unwinds through the interpreter.

use super::marshal;
use crate::errors::{BridgeError, Result};
use crate::host::{Host, HostFunction, HostResult, HostValue};
use crate::interp::{FunctionTable, Interp};
use crate::logging;
use crate::target::{Engine, Obj, Status};
use std::rc::{Rc, Weak};

const HOST_GONE: &str = "host runtime is no longer available";

fn args_to_host(objv: &[Obj]) -> Vec<HostValue> {
    objv.iter().map(|obj| marshal::to_host(Some(obj))).collect()
}

/// Store the first returned value as the result, or the failure message
fn return_to_target(engine: &Engine, outcome: HostResult<Vec<HostValue>>) -> Status {
    engine.reset_result();
    match outcome {
        Ok(values) => {
            let first = values.into_iter().next().unwrap_or_default();
            match marshal::to_target(&first) {
                Ok(obj) => {
                    engine.set_obj_result(obj);
                    Status::Ok
                }
                Err(error) => engine.error(error.to_string()),
            }
        }
        Err(error) => engine.error(error.message()),
    }
}

/// `<adhoc> name ?arg ...?` calls the host global `name`
fn adhoc_call(host: &Weak<Host>, engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 {
        return Status::Ok;
    }
    let Some(host) = host.upgrade() else {
        return engine.error(HOST_GONE);
    };
    let name = objv[1].as_str();
    logging::log_reverse_call(name, objv.len() - 2);

    let function = host.get_global(name);
    let outcome = host.call(&function, args_to_host(&objv[2..]));
    return_to_target(engine, outcome)
}

/// Command procedure of a registered function
fn registered_call(host: &Weak<Host>, functions: &FunctionTable, key: &str, engine: &Engine, objv: &[Obj]) -> Status {
    let Some(host) = host.upgrade() else {
        return engine.error(HOST_GONE);
    };
    logging::log_reverse_call(key, objv.len().saturating_sub(1));

    let function: HostValue = functions.get(key).into();
    let outcome = host.call(&function, args_to_host(objv.get(1..).unwrap_or_default()));
    return_to_target(engine, outcome)
}

impl Interp {
    pub(crate) fn install_adhoc_command(&self) -> Result<()> {
        let host = self.host_weak();
        let name = &self.config().interp.adhoc_command;
        let installed = self.engine().create_command(
            name,
            move |engine: &Engine, objv: &[Obj]| adhoc_call(&host, engine, objv),
            None,
        );
        if !installed {
            return Err(BridgeError::Initialization(format!("can't create command \"{}\"", name)));
        }
        Ok(())
    }

    /// Make `function` callable from scripts as command `name`. An existing
    /// command of that name is replaced.
    pub fn register_function(&self, name: &str, function: HostFunction) -> Result<()> {
        let engine = self.live_engine()?;
        let host = self.host_weak();
        let functions = Rc::clone(self.functions());
        let on_delete_functions = Rc::clone(self.functions());
        let key = name.to_string();
        let on_delete_key = name.to_string();

        // replacing a command runs its delete procedure right here, so the
        // table entry is written only afterwards
        let installed = engine.create_command(
            name,
            move |engine: &Engine, objv: &[Obj]| registered_call(&host, &functions, &key, engine, objv),
            Some(Box::new(move || {
                on_delete_functions.remove(&on_delete_key);
                logging::log_unregister(&on_delete_key);
            })),
        );
        if !installed {
            return Err(BridgeError::eval(format!("can't create command \"{}\"", name)));
        }

        self.functions().insert(name, function);
        logging::log_register(name);
        Ok(())
    }

    /// Delete command `name`; its delete procedure drops the table entry.
    /// Unknown names are ignored.
    pub fn unregister_function(&self, name: &str) -> Result<()> {
        let engine = self.live_engine()?;
        engine.delete_command(name);
        Ok(())
    }
}
