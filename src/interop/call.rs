//! Call dispatch - scripts and commands invoked from the host
//!
//! Arguments are gathered into a `CallArgs` vector that holds one reference
//! per word for the duration of the call. Argument bundles are spliced in
//! place of a single converted value.

use super::bundle::ArgBundle;
use super::marshal;
use crate::errors::{BridgeError, Result};
use crate::host::{HostValue, TableKey, TableRef};
use crate::interp::Interp;
use crate::logging::{self, perf};
use crate::target::{Engine, Flags, Obj, Status};
use smallvec::SmallVec;

/// Words of one command invocation; most calls fit inline
#[derive(Debug, Default)]
pub struct CallArgs {
    words: SmallVec<[Obj; 8]>,
}

impl CallArgs {
    pub fn new(command: &str) -> Self {
        let mut words = SmallVec::new();
        words.push(Obj::new_string(command));
        Self { words }
    }

    #[inline]
    pub fn push(&mut self, obj: Obj) {
        self.words.push(obj);
    }

    pub fn extend(&mut self, objs: impl IntoIterator<Item = Obj>) {
        self.words.extend(objs);
    }

    /// Convert one host value, splicing it if it is an argument bundle
    pub fn push_value(&mut self, value: &HostValue) -> Result<()> {
        match ArgBundle::from_value(value) {
            Some(bundle) => bundle.splice_into(self).map(|_| ()),
            None => {
                self.push(marshal::to_target(value)?);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn as_slice(&self) -> &[Obj] {
        &self.words
    }

    pub fn spilled(&self) -> bool {
        self.words.spilled()
    }
}

/// Map-region entries of `table` usable as options: numeric keys are
/// skipped, string keys get `prefix`, anything else is rejected
fn option_entries(table: &TableRef, prefix: &str) -> Result<Vec<(HostValue, HostValue)>> {
    let table = table.borrow();
    let mut entries = Vec::new();
    for (key, value) in table.map_entries() {
        if key.is_numeric() {
            continue;
        }
        let TableKey::String(name) = key else {
            return Err(BridgeError::conversion(format!(
                "option name must be a string, got {}",
                key.to_value().type_name()
            )));
        };
        let mut option = prefix.as_bytes().to_vec();
        option.extend_from_slice(name);
        entries.push((HostValue::string(option), value.clone()));
    }
    Ok(entries)
}

/// Flatten `table` into an argument sequence: the array region in order,
/// then each string-keyed entry as a prefixed option name and its value.
/// No interpreter is involved.
pub fn make_arg_list(table: Option<&TableRef>, prefix: &str) -> Result<TableRef> {
    let out = TableRef::new();
    let Some(table) = table else {
        return Ok(out);
    };
    for value in table.array_values() {
        out.push(value);
    }
    for (option, value) in option_entries(table, prefix)? {
        out.push(option);
        out.push(value);
    }
    Ok(out)
}

/// Result of a finished evaluation, or its message as an error
fn finish(engine: &Engine, status: Status) -> Result<HostValue> {
    match status {
        Status::Ok | Status::Return => Ok(marshal::to_host(Some(&engine.obj_result()))),
        Status::Error => {
            let message = engine.string_result();
            logging::log_eval_error(&message);
            Err(BridgeError::eval(message))
        }
    }
}

impl Interp {
    /// Evaluate a script and convert its result
    pub fn eval(&self, script: &str, flags: Flags) -> Result<HostValue> {
        let engine = self.live_engine()?;
        let _perf = perf::track("eval");
        logging::log_eval(script.len());

        engine.reset_result();
        let status = engine.eval(script, flags);
        finish(engine, status)
    }

    /// Invoke `command` with positional arguments
    pub fn call(&self, flags: Flags, command: &str, args: &[HostValue]) -> Result<HostValue> {
        let engine = self.live_engine()?;
        let mut words = CallArgs::new(command);
        for value in args {
            words.push_value(value)?;
        }
        self.dispatch(engine, flags, words)
    }

    /// Invoke `command` with arguments taken from a table, see
    /// [`make_arg_list`] for the order
    pub fn call_table(&self, flags: Flags, command: &str, table: Option<&TableRef>) -> Result<HostValue> {
        let engine = self.live_engine()?;
        let mut words = CallArgs::new(command);
        if let Some(table) = table {
            for value in table.array_values() {
                words.push_value(&value)?;
            }
            for (option, value) in option_entries(table, &self.config().args.option_prefix)? {
                words.push_value(&option)?;
                words.push_value(&value)?;
            }
        }
        self.dispatch(engine, flags, words)
    }

    /// [`make_arg_list`] with this interpreter's option prefix
    pub fn make_arg_list(&self, table: Option<&TableRef>) -> Result<TableRef> {
        make_arg_list(table, &self.config().args.option_prefix)
    }

    fn dispatch(&self, engine: &Engine, flags: Flags, words: CallArgs) -> Result<HostValue> {
        let _perf = perf::track("call");
        let objv = words.as_slice();
        logging::log_call(objv[0].as_str(), objv.len() - 1);

        engine.reset_result();
        let status = engine.eval_objv(objv, flags);
        drop(words);
        finish(engine, status)
    }
}
