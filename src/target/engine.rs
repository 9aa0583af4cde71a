//! Interpreter state - commands, variables, traces, result register
//!
//! All state sits behind `RefCell`s and callbacks (command procedures,
//! trace procedures, delete procedures) are always invoked with no borrow
//! held, so they may re-enter the engine freely.

use super::commands;
use super::encoding::{self, Encoding};
use super::flags::Flags;
use super::obj::Obj;
use super::parse::{self, ScriptParser};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::{debug, trace};

pub const DEFAULT_MAX_NESTING: usize = 1000;

const NO_SUCH_VAR: &str = "no such variable";
const NO_SUCH_ELEMENT: &str = "no such element in array";
const IS_ARRAY: &str = "variable is array";
const NOT_ARRAY: &str = "variable isn't array";

/// Completion code of a script or command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    Return,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
            Status::Return => 2,
        }
    }
}

pub type ObjCmdProc = dyn Fn(&Engine, &[Obj]) -> Status;
pub type CmdDeleteProc = Box<dyn FnOnce()>;

/// Variable trace procedure: `(engine, name1, name2, flags)`; a returned
/// message vetoes the access
pub type VarTraceProc = dyn Fn(&Engine, &str, Option<&str>, Flags) -> Option<String>;

struct Command {
    proc_: Rc<ObjCmdProc>,
    on_delete: Option<CmdDeleteProc>,
}

#[derive(Clone)]
struct TraceRec {
    flags: Flags,
    client: Rc<str>,
    proc_: Rc<VarTraceProc>,
}

#[derive(Default)]
enum VarValue {
    #[default]
    Undefined,
    Scalar(Obj),
    Array,
}

#[derive(Default)]
struct Element {
    value: Option<Obj>,
    traces: Vec<TraceRec>,
}

#[derive(Default)]
struct Var {
    value: VarValue,
    traces: Vec<TraceRec>,
    elements: BTreeMap<String, Element>,
}

impl Var {
    fn is_vacant(&self) -> bool {
        matches!(self.value, VarValue::Undefined) && self.traces.is_empty() && self.elements.is_empty()
    }
}

/// Traces to fire for one variable or element being unset
struct UnsetGroup {
    name2: Option<String>,
    traces: Vec<TraceRec>,
    destroyed: bool,
}

/// Saved result register, see [`Engine::save_result`]
pub struct SavedResult(Obj);

/// The embedded command interpreter
pub struct Engine {
    commands: RefCell<HashMap<String, Command>>,
    vars: RefCell<HashMap<String, Var>>,
    result: RefCell<Obj>,
    active_traces: RefCell<Vec<(String, Option<String>)>>,
    depth: Cell<usize>,
    max_nesting: usize,
    preserve_count: Cell<usize>,
    deleted: Cell<bool>,
    disposed: Cell<bool>,
    system_encoding: RefCell<Encoding>,
}

fn split_name<'a>(name1: &'a str, name2: Option<&'a str>) -> (&'a str, Option<&'a str>) {
    let name1 = name1.strip_prefix("::").unwrap_or(name1);
    if name2.is_some() {
        return (name1, name2);
    }
    if let (Some(open), true) = (name1.find('('), name1.ends_with(')')) {
        return (&name1[..open], Some(&name1[open + 1..name1.len() - 1]));
    }
    (name1, None)
}

fn display_name(name1: &str, name2: Option<&str>) -> String {
    match name2 {
        Some(key) => format!("{}({})", name1, key),
        None => name1.to_string(),
    }
}

fn combine(old: Option<&Obj>, value: Obj, flags: Flags) -> Obj {
    let list = flags.contains(Flags::LIST_ELEMENT);
    let append = flags.contains(Flags::APPEND_VALUE);
    if !list && !append {
        return value;
    }
    let mut text = match (append, old) {
        (true, Some(old)) => old.as_str().to_string(),
        _ => String::new(),
    };
    if list {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&parse::quote_element(value.as_str()));
    } else {
        text.push_str(value.as_str());
    }
    Obj::new_string(text)
}

fn whole_var_groups(var: Var) -> Vec<UnsetGroup> {
    let mut groups: Vec<UnsetGroup> = var
        .elements
        .into_iter()
        .filter(|(_, element)| element.value.is_some() || !element.traces.is_empty())
        .map(|(key, element)| UnsetGroup {
            name2: Some(key),
            traces: element.traces,
            destroyed: true,
        })
        .collect();
    groups.push(UnsetGroup {
        name2: None,
        traces: var.traces,
        destroyed: true,
    });
    groups
}

impl Engine {
    pub fn new() -> Rc<Self> {
        Self::with_max_nesting(DEFAULT_MAX_NESTING)
    }

    pub fn with_max_nesting(max_nesting: usize) -> Rc<Self> {
        let system_encoding = encoding::lookup("utf-8").unwrap_or_else(Encoding::utf8);
        let engine = Rc::new(Self {
            commands: RefCell::new(HashMap::new()),
            vars: RefCell::new(HashMap::new()),
            result: RefCell::new(Obj::empty()),
            active_traces: RefCell::new(Vec::new()),
            depth: Cell::new(0),
            max_nesting: max_nesting.max(1),
            preserve_count: Cell::new(0),
            deleted: Cell::new(false),
            disposed: Cell::new(false),
            system_encoding: RefCell::new(system_encoding),
        });
        commands::register_builtins(&engine);
        engine
    }

    /// Run the optional startup script
    pub fn init(&self, script: Option<&str>) -> Status {
        match script {
            Some(script) => self.eval(script, Flags::EVAL_GLOBAL),
            None => Status::Ok,
        }
    }

    // ---- evaluation ----

    pub fn eval(&self, script: &str, flags: Flags) -> Status {
        if self.deleted.get() {
            return self.error("attempt to call eval in deleted interpreter");
        }
        trace!(len = script.len(), ?flags, "eval script");
        self.preserve();
        let status = ScriptParser::new(script).eval(self, false);
        let status = self.top_level(status);
        self.release();
        status
    }

    pub fn eval_objv(&self, objv: &[Obj], flags: Flags) -> Status {
        if self.deleted.get() {
            return self.error("attempt to call eval in deleted interpreter");
        }
        trace!(words = objv.len(), ?flags, "eval objv");
        self.preserve();
        let status = self.invoke(objv);
        let status = self.top_level(status);
        self.release();
        status
    }

    fn top_level(&self, status: Status) -> Status {
        if status == Status::Return && self.depth.get() == 0 {
            Status::Ok
        } else {
            status
        }
    }

    /// Invoke one command with its substituted words
    pub(crate) fn invoke(&self, objv: &[Obj]) -> Status {
        let Some(first) = objv.first() else {
            return Status::Ok;
        };
        if self.depth.get() >= self.max_nesting {
            return self.error("too many nested evaluations (infinite loop?)");
        }
        let found = self
            .commands
            .borrow()
            .get(first.as_str())
            .map(|command| Rc::clone(&command.proc_));
        let Some(proc_) = found else {
            return self.error(format!("invalid command name \"{}\"", first.as_str()));
        };

        self.reset_result();
        self.depth.set(self.depth.get() + 1);
        let status = proc_(self, objv);
        self.depth.set(self.depth.get() - 1);
        status
    }

    // ---- commands ----

    /// Install `name`, replacing (and tearing down) any existing command of
    /// that name first. Fails only on a deleted interpreter.
    pub fn create_command<F>(&self, name: &str, proc_: F, on_delete: Option<CmdDeleteProc>) -> bool
    where
        F: Fn(&Engine, &[Obj]) -> Status + 'static,
    {
        if self.deleted.get() {
            return false;
        }
        let previous = self.commands.borrow_mut().remove(name);
        if let Some(Command {
            on_delete: Some(old),
            ..
        }) = previous
        {
            debug!(command = name, "replacing command");
            old();
        }
        self.commands.borrow_mut().insert(
            name.to_string(),
            Command {
                proc_: Rc::new(proc_),
                on_delete,
            },
        );
        true
    }

    /// Remove `name`, running its delete procedure; false if it did not exist
    pub fn delete_command(&self, name: &str) -> bool {
        let removed = self.commands.borrow_mut().remove(name);
        match removed {
            Some(command) => {
                if let Some(on_delete) = command.on_delete {
                    on_delete();
                }
                true
            }
            None => false,
        }
    }

    pub fn rename_command(&self, old: &str, new: &str) -> Status {
        if !self.has_command(old) {
            return self.error(format!("can't rename \"{}\": command doesn't exist", old));
        }
        if new.is_empty() {
            self.delete_command(old);
            return Status::Ok;
        }
        if self.has_command(new) {
            return self.error(format!("can't rename to \"{}\": command already exists", new));
        }
        let mut commands = self.commands.borrow_mut();
        if let Some(command) = commands.remove(old) {
            commands.insert(new.to_string(), command);
        }
        Status::Ok
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.borrow().contains_key(name)
    }

    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    // ---- result register ----

    pub fn reset_result(&self) {
        *self.result.borrow_mut() = Obj::empty();
    }

    pub fn set_obj_result(&self, obj: Obj) {
        *self.result.borrow_mut() = obj;
    }

    pub fn set_result(&self, text: impl Into<String>) {
        self.set_obj_result(Obj::new_string(text));
    }

    pub fn obj_result(&self) -> Obj {
        self.result.borrow().clone()
    }

    pub fn string_result(&self) -> String {
        self.result.borrow().as_str().to_string()
    }

    pub fn save_result(&self) -> SavedResult {
        SavedResult(self.result.replace(Obj::empty()))
    }

    pub fn restore_result(&self, saved: SavedResult) {
        *self.result.borrow_mut() = saved.0;
    }

    /// Leave `message` in the result and report an error
    pub fn error(&self, message: impl Into<String>) -> Status {
        self.set_result(message);
        Status::Error
    }

    pub fn wrong_num_args(&self, objv: &[Obj], count: usize, usage: &str) -> Status {
        let mut text = String::from("wrong # args: should be \"");
        for (i, word) in objv.iter().take(count).enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(word.as_str());
        }
        if !usage.is_empty() {
            text.push(' ');
            text.push_str(usage);
        }
        text.push('"');
        self.error(text)
    }

    // ---- variables ----

    fn var_error(&self, flags: Flags, op: &str, name1: &str, name2: Option<&str>, message: &str) {
        if flags.contains(Flags::LEAVE_ERR_MSG) {
            self.set_result(format!(
                "can't {} \"{}\": {}",
                op,
                display_name(name1, name2),
                message
            ));
        }
    }

    fn read_var(&self, name1: &str, name2: Option<&str>) -> Result<Obj, &'static str> {
        let vars = self.vars.borrow();
        let var = vars.get(name1).ok_or(NO_SUCH_VAR)?;
        match (&var.value, name2) {
            (VarValue::Scalar(obj), None) => Ok(obj.clone()),
            (VarValue::Scalar(_), Some(_)) => Err(NOT_ARRAY),
            (VarValue::Array, None) => Err(IS_ARRAY),
            (VarValue::Array, Some(key)) => var
                .elements
                .get(key)
                .and_then(|element| element.value.clone())
                .ok_or(NO_SUCH_ELEMENT),
            (VarValue::Undefined, _) => Err(NO_SUCH_VAR),
        }
    }

    fn store_var(&self, name1: &str, name2: Option<&str>, value: Obj, flags: Flags) -> Result<Obj, &'static str> {
        let mut vars = self.vars.borrow_mut();
        let var = vars.entry(name1.to_string()).or_default();
        match name2 {
            None => {
                let old = match &var.value {
                    VarValue::Scalar(old) => Some(old.clone()),
                    VarValue::Undefined => None,
                    VarValue::Array => return Err(IS_ARRAY),
                };
                let new = combine(old.as_ref(), value, flags);
                var.value = VarValue::Scalar(new.clone());
                Ok(new)
            }
            Some(key) => {
                if matches!(var.value, VarValue::Scalar(_)) {
                    return Err(NOT_ARRAY);
                }
                var.value = VarValue::Array;
                let element = var.elements.entry(key.to_string()).or_default();
                let new = combine(element.value.as_ref(), value, flags);
                element.value = Some(new.clone());
                Ok(new)
            }
        }
    }

    fn trace_active(&self, name1: &str, name2: Option<&str>) -> bool {
        self.active_traces
            .borrow()
            .iter()
            .any(|(n1, n2)| n1 == name1 && n2.as_deref() == name2)
    }

    /// Fire read, write or array traces: array-level first, then element
    fn call_traces(&self, name1: &str, name2: Option<&str>, op: Flags, flags: Flags) -> Result<(), String> {
        if self.trace_active(name1, name2) {
            return Ok(());
        }
        let recs: Vec<TraceRec> = {
            let vars = self.vars.borrow();
            let Some(var) = vars.get(name1) else {
                return Ok(());
            };
            let element = name2.and_then(|key| var.elements.get(key));
            var.traces
                .iter()
                .chain(element.into_iter().flat_map(|e| e.traces.iter()))
                .filter(|rec| rec.flags.intersects(op))
                .cloned()
                .collect()
        };
        if recs.is_empty() {
            return Ok(());
        }

        self.active_traces
            .borrow_mut()
            .push((name1.to_string(), name2.map(str::to_string)));
        let mut outcome = Ok(());
        for rec in &recs {
            if let Some(message) = (rec.proc_)(self, name1, name2, op | flags.scope()) {
                outcome = Err(message);
                break;
            }
        }
        self.active_traces.borrow_mut().pop();
        outcome
    }

    fn fire_unset_traces(&self, name1: &str, groups: Vec<UnsetGroup>, extra: Flags) {
        for group in groups {
            let name2 = group.name2.as_deref();
            if self.trace_active(name1, name2) {
                continue;
            }
            let mut op = Flags::TRACE_UNSETS | extra;
            if group.destroyed {
                op |= Flags::TRACE_DESTROYED;
            }
            self.active_traces
                .borrow_mut()
                .push((name1.to_string(), group.name2.clone()));
            for rec in group.traces.iter().filter(|rec| rec.flags.contains(Flags::TRACE_UNSETS)) {
                // unset traces cannot veto
                let _ = (rec.proc_)(self, name1, name2, op);
            }
            self.active_traces.borrow_mut().pop();
        }
    }

    pub fn get_var2(&self, name1: &str, name2: Option<&str>, flags: Flags) -> Option<Obj> {
        let (name1, name2) = split_name(name1, name2);
        if let Err(message) = self.call_traces(name1, name2, Flags::TRACE_READS, flags) {
            self.var_error(flags, "read", name1, name2, &message);
            return None;
        }
        match self.read_var(name1, name2) {
            Ok(value) => Some(value),
            Err(message) => {
                self.var_error(flags, "read", name1, name2, message);
                None
            }
        }
    }

    /// Store `value` (or append it, per `flags`) and return the new value
    pub fn set_var2(&self, name1: &str, name2: Option<&str>, value: Obj, flags: Flags) -> Option<Obj> {
        let (name1, name2) = split_name(name1, name2);
        if flags.contains(Flags::APPEND_VALUE) {
            if let Err(message) = self.call_traces(name1, name2, Flags::TRACE_READS, flags) {
                self.var_error(flags, "read", name1, name2, &message);
                return None;
            }
        }
        let stored = match self.store_var(name1, name2, value, flags) {
            Ok(stored) => stored,
            Err(message) => {
                self.var_error(flags, "set", name1, name2, message);
                return None;
            }
        };
        if let Err(message) = self.call_traces(name1, name2, Flags::TRACE_WRITES, flags) {
            self.var_error(flags, "set", name1, name2, &message);
            return None;
        }
        Some(self.read_var(name1, name2).unwrap_or(stored))
    }

    pub fn unset_var2(&self, name1: &str, name2: Option<&str>, flags: Flags) -> Status {
        let (name1, name2) = split_name(name1, name2);
        match self.detach_var(name1, name2) {
            Ok(groups) => {
                self.fire_unset_traces(name1, groups, flags.scope());
                Status::Ok
            }
            Err(message) => {
                self.var_error(flags, "unset", name1, name2, message);
                Status::Error
            }
        }
    }

    fn detach_var(&self, name1: &str, name2: Option<&str>) -> Result<Vec<UnsetGroup>, &'static str> {
        let mut vars = self.vars.borrow_mut();
        let Some(var) = vars.get_mut(name1) else {
            return Err(NO_SUCH_VAR);
        };
        if matches!(var.value, VarValue::Undefined) {
            return Err(NO_SUCH_VAR);
        }
        match name2 {
            Some(key) => {
                if !matches!(var.value, VarValue::Array) {
                    return Err(NOT_ARRAY);
                }
                match var.elements.remove(key) {
                    Some(Element {
                        value: Some(_),
                        traces,
                    }) => Ok(vec![
                        UnsetGroup {
                            name2: Some(key.to_string()),
                            traces: var.traces.clone(),
                            destroyed: false,
                        },
                        UnsetGroup {
                            name2: Some(key.to_string()),
                            traces,
                            destroyed: true,
                        },
                    ]),
                    Some(element) => {
                        var.elements.insert(key.to_string(), element);
                        Err(NO_SUCH_ELEMENT)
                    }
                    None => Err(NO_SUCH_ELEMENT),
                }
            }
            None => {
                let var = vars.remove(name1).unwrap_or_default();
                Ok(whole_var_groups(var))
            }
        }
    }

    /// Attach a trace procedure owned by `client`
    pub fn trace_var2(
        &self,
        name1: &str,
        name2: Option<&str>,
        flags: Flags,
        client: &str,
        proc_: Rc<VarTraceProc>,
    ) -> Status {
        let (name1, name2) = split_name(name1, name2);
        let rec = TraceRec {
            flags,
            client: Rc::from(client),
            proc_,
        };
        let mut vars = self.vars.borrow_mut();
        let var = vars.entry(name1.to_string()).or_default();
        match name2 {
            None => var.traces.insert(0, rec),
            Some(key) => {
                if matches!(var.value, VarValue::Scalar(_)) {
                    drop(vars);
                    self.var_error(Flags::LEAVE_ERR_MSG, "trace", name1, name2, NOT_ARRAY);
                    return Status::Error;
                }
                var.value = VarValue::Array;
                var.elements.entry(key.to_string()).or_default().traces.insert(0, rec);
            }
        }
        Status::Ok
    }

    /// Remove the first trace of `client` registered with the same
    /// operation flags; true if one was removed
    pub fn untrace_var2(&self, name1: &str, name2: Option<&str>, flags: Flags, client: &str) -> bool {
        const MASK: Flags = Flags::TRACE_OPS.union(Flags::TRACE_RESULT_DYNAMIC);
        let (name1, name2) = split_name(name1, name2);
        let matches = |rec: &TraceRec| &*rec.client == client && (rec.flags & MASK) == (flags & MASK);

        let mut vars = self.vars.borrow_mut();
        let Some(var) = vars.get_mut(name1) else {
            return false;
        };
        let removed = match name2 {
            None => match var.traces.iter().position(matches) {
                Some(i) => {
                    var.traces.remove(i);
                    true
                }
                None => false,
            },
            Some(key) => {
                let Some(element) = var.elements.get_mut(key) else {
                    return false;
                };
                match element.traces.iter().position(matches) {
                    Some(i) => {
                        element.traces.remove(i);
                        if element.value.is_none() && element.traces.is_empty() {
                            var.elements.remove(key);
                        }
                        true
                    }
                    None => false,
                }
            }
        };
        if var.is_vacant() {
            vars.remove(name1);
        }
        removed
    }

    /// `(client, flags)` of each trace on a variable or element, newest first
    pub fn var_trace_info2(&self, name1: &str, name2: Option<&str>) -> Vec<(String, Flags)> {
        let (name1, name2) = split_name(name1, name2);
        let vars = self.vars.borrow();
        let Some(var) = vars.get(name1) else {
            return Vec::new();
        };
        let traces = match name2 {
            None => Some(&var.traces),
            Some(key) => var.elements.get(key).map(|e| &e.traces),
        };
        traces
            .into_iter()
            .flatten()
            .map(|rec| (rec.client.to_string(), rec.flags))
            .collect()
    }

    /// Number of traces anywhere in the interpreter owned by `client`
    pub fn trace_client_count(&self, client: &str) -> usize {
        let vars = self.vars.borrow();
        vars.values()
            .map(|var| {
                var.traces.iter().filter(|r| &*r.client == client).count()
                    + var
                        .elements
                        .values()
                        .flat_map(|e| e.traces.iter())
                        .filter(|r| &*r.client == client)
                        .count()
            })
            .sum()
    }

    /// True when the variable or element holds a value; fires no traces
    pub fn var_exists(&self, name1: &str, name2: Option<&str>) -> bool {
        let (name1, name2) = split_name(name1, name2);
        self.read_var(name1, name2).is_ok()
    }

    pub(crate) fn array_exists(&self, name: &str) -> bool {
        let (name, _) = split_name(name, None);
        matches!(
            self.vars.borrow().get(name).map(|v| &v.value),
            Some(VarValue::Array)
        )
    }

    /// Names of the defined elements of an array, sorted
    pub(crate) fn array_names(&self, name: &str) -> Vec<String> {
        let (name, _) = split_name(name, None);
        self.vars
            .borrow()
            .get(name)
            .map(|var| {
                var.elements
                    .iter()
                    .filter(|(_, e)| e.value.is_some())
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fire array traces before an `array` operation
    pub(crate) fn array_traces(&self, name: &str) -> Status {
        let (name, _) = split_name(name, None);
        match self.call_traces(name, None, Flags::TRACE_ARRAY, Flags::NONE) {
            Ok(()) => Status::Ok,
            Err(message) => self.error(format!("can't trace \"{}\": {}", name, message)),
        }
    }

    // ---- lifetime ----

    /// Defer disposal while the caller is using the interpreter
    pub fn preserve(&self) {
        self.preserve_count.set(self.preserve_count.get() + 1);
    }

    pub fn release(&self) {
        let count = self.preserve_count.get().saturating_sub(1);
        self.preserve_count.set(count);
        if count == 0 && self.deleted.get() {
            self.dispose();
        }
    }

    pub fn preserve_count(&self) -> usize {
        self.preserve_count.get()
    }

    /// Mark the interpreter deleted; state is torn down once no preserve
    /// is outstanding
    pub fn delete(&self) {
        if self.deleted.replace(true) {
            return;
        }
        debug!(preserved = self.preserve_count.get(), "interpreter deleted");
        if self.preserve_count.get() == 0 {
            self.dispose();
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        debug!("disposing interpreter state");

        let commands: Vec<Command> = self.commands.borrow_mut().drain().map(|(_, c)| c).collect();
        for command in commands {
            if let Some(on_delete) = command.on_delete {
                on_delete();
            }
        }

        let vars: Vec<(String, Var)> = self.vars.borrow_mut().drain().collect();
        for (name, var) in vars {
            let groups = whole_var_groups(var);
            self.fire_unset_traces(&name, groups, Flags::INTERP_DESTROYED | Flags::GLOBAL_ONLY);
        }
        // the result register is left alone: a command that deleted its own
        // interpreter still reports its value to the caller
        self.vars.borrow_mut().clear();
    }

    // ---- encodings ----

    /// Resolve an encoding name (`None` for the system encoding); on
    /// failure the result holds `unknown encoding "name"`
    pub fn get_encoding(&self, name: Option<&str>) -> Option<Encoding> {
        match name {
            None => Some(self.system_encoding.borrow().clone()),
            Some(name) => {
                let found = encoding::lookup(name);
                if found.is_none() {
                    self.set_result(format!("unknown encoding \"{}\"", name));
                }
                found
            }
        }
    }

    pub fn system_encoding(&self) -> Encoding {
        self.system_encoding.borrow().clone()
    }

    pub fn set_system_encoding(&self, name: &str) -> Status {
        match self.get_encoding(Some(name)) {
            Some(found) => {
                *self.system_encoding.borrow_mut() = found;
                Status::Ok
            }
            None => Status::Error,
        }
    }

    /// Convert UTF-8 text to `encoding`, returning the bytes written to `dst`
    pub fn utf_to_external(&self, encoding: Option<&Encoding>, src: &[u8], dst: &mut [u8]) -> usize {
        match encoding {
            Some(encoding) => encoding.from_utf(src, dst),
            None => self.system_encoding().from_utf(src, dst),
        }
    }

    pub fn external_to_utf(&self, encoding: Option<&Encoding>, src: &[u8], dst: &mut [u8]) -> usize {
        match encoding {
            Some(encoding) => encoding.to_utf(src, dst),
            None => self.system_encoding().to_utf(src, dst),
        }
    }

    /// Leave the list of known encoding names in the result
    pub fn get_encoding_names(&self) {
        let names = encoding::names().into_iter().map(Obj::new_string).collect();
        self.set_obj_result(Obj::new_list(names));
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.deleted.set(true);
        self.dispose();
    }
}
