//! Host-facing function library
//!
//! `open` returns the table a host script sees as the `ltcl` module. Every
//! function checks its arguments before touching an interpreter; bad
//! arguments raise `bad argument #N to 'name' (...)`.

use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::host::{Host, HostError, HostFunction, HostResult, HostValue, TableRef, UserData};
use crate::interop::ArgBundle;
use crate::interp::{Interp, INTERP_TYPE_NAME};
use crate::target::Flags;

pub const VERSION: f64 = 0.9;
pub const REVISION: i64 = 1;

/// Positional view of a host call's arguments; positions are 1-based
struct Args<'a> {
    function: &'static str,
    values: &'a [HostValue],
}

impl<'a> Args<'a> {
    fn new(function: &'static str, values: &'a [HostValue]) -> Self {
        Self { function, values }
    }

    fn error(&self, position: usize, message: impl Into<String>) -> HostError {
        BridgeError::argument(self.function, position, message).into()
    }

    fn expected(&self, position: usize, what: &str) -> HostError {
        let got = match self.values.get(position - 1) {
            Some(value) => value.type_name(),
            None => "no value",
        };
        self.error(position, format!("{} expected, got {}", what, got))
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn get(&self, position: usize) -> &'a HostValue {
        const NIL: &HostValue = &HostValue::Nil;
        self.values.get(position - 1).unwrap_or(NIL)
    }

    fn is_number(&self, position: usize) -> bool {
        self.get(position).is_number()
    }

    fn interp(&self, position: usize) -> HostResult<&'a Interp> {
        self.get(position)
            .as_userdata()
            .filter(|u| u.type_name() == INTERP_TYPE_NAME)
            .and_then(|u| u.downcast_ref::<Interp>())
            .ok_or_else(|| self.expected(position, INTERP_TYPE_NAME))
    }

    fn bytes(&self, position: usize) -> HostResult<Vec<u8>> {
        self.get(position)
            .coerce_bytes()
            .ok_or_else(|| self.expected(position, "string"))
    }

    fn string(&self, position: usize) -> HostResult<String> {
        self.bytes(position)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn opt_string(&self, position: usize) -> HostResult<Option<String>> {
        if self.get(position).is_nil() {
            return Ok(None);
        }
        self.string(position).map(Some)
    }

    fn flags(&self, position: usize) -> HostResult<Flags> {
        match self.get(position).as_number() {
            Some(n) => Ok(Flags::from_bits(n as i32)),
            None => Err(self.expected(position, "number")),
        }
    }

    fn opt_flags(&self, position: usize) -> HostResult<Flags> {
        if self.get(position).is_nil() {
            return Ok(Flags::NONE);
        }
        self.flags(position)
    }

    fn opt_table(&self, position: usize) -> HostResult<Option<&'a TableRef>> {
        match self.get(position) {
            HostValue::Nil => Ok(None),
            HostValue::Table(table) => Ok(Some(table)),
            _ => Err(self.expected(position, "table")),
        }
    }

    fn function(&self, position: usize) -> HostResult<HostFunction> {
        self.get(position)
            .as_function()
            .cloned()
            .ok_or_else(|| self.expected(position, "function"))
    }

    /// Flags in the slot after the interpreter, when a number is there;
    /// returns the flags and the next position
    fn leading_flags(&self) -> HostResult<(Flags, usize)> {
        if self.is_number(2) {
            Ok((self.flags(2)?, 3))
        } else {
            Ok((Flags::NONE, 2))
        }
    }
}

fn one(value: impl Into<HostValue>) -> HostResult<Vec<HostValue>> {
    Ok(vec![value.into()])
}

fn none() -> HostResult<Vec<HostValue>> {
    Ok(Vec::new())
}

fn new(host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("new", &args);
    let config = match a.opt_string(1)? {
        Some(text) => BridgeConfig::parse(&text).map_err(|e| a.error(1, e))?,
        None => BridgeConfig::default(),
    };
    let interp = Interp::with_config(host, config)?;
    one(UserData::new(INTERP_TYPE_NAME, interp))
}

fn eval(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("eval", &args);
    let interp = a.interp(1)?;
    let (flags, base) = a.leading_flags()?;
    let script = a.string(base)?;
    one(interp.eval(&script, flags)?)
}

fn call(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("call", &args);
    let interp = a.interp(1)?;
    let (flags, base) = a.leading_flags()?;
    let command = a.string(base)?;
    let rest = args.get(base..).unwrap_or_default();
    one(interp.call(flags, &command, rest)?)
}

fn callt(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("callt", &args);
    let interp = a.interp(1)?;
    let (flags, base) = a.leading_flags()?;
    let command = a.string(base)?;
    let table = a.opt_table(base + 1)?;
    one(interp.call_table(flags, &command, table)?)
}

fn makearglist(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("makearglist", &args);
    let interp = a.interp(1)?;
    let table = a.opt_table(2)?;
    one(interp.make_arg_list(table)?)
}

fn getvar(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("getvar", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let flags = a.opt_flags(3)?;
    one(interp.get_var(&name, None, flags)?)
}

fn getarray(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("getarray", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let element = a.opt_string(3)?;
    let flags = a.opt_flags(4)?;
    one(interp.get_var(&name, element.as_deref(), flags)?)
}

fn setvar(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("setvar", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let flags = a.opt_flags(4)?;
    one(interp.set_var(&name, None, a.get(3), flags)?)
}

fn setarray(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("setarray", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let element = a.opt_string(3)?;
    let flags = a.opt_flags(5)?;
    one(interp.set_var(&name, element.as_deref(), a.get(4), flags)?)
}

fn unsetvar(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("unsetvar", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let flags = a.opt_flags(3)?;
    interp.unset_var(&name, None, flags)?;
    none()
}

fn unsetarray(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("unsetarray", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let element = a.opt_string(3)?;
    let flags = a.opt_flags(4)?;
    interp.unset_var(&name, element.as_deref(), flags)?;
    none()
}

fn tracevar(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("tracevar", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let element = a.opt_string(3)?;
    let flags = a.flags(4)?;
    let function = a.function(5)?;
    interp.trace_var(&name, element.as_deref(), flags, function)?;
    none()
}

fn untracevar(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("untracevar", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let element = a.opt_string(3)?;
    let flags = a.flags(4)?;
    let function = a.function(5)?;
    interp.untrace_var(&name, element.as_deref(), flags, &function)?;
    none()
}

fn register(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("register", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    let function = a.function(3)?;
    interp.register_function(&name, function)?;
    none()
}

fn unregister(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("unregister", &args);
    let interp = a.interp(1)?;
    let name = a.string(2)?;
    interp.unregister_function(&name)?;
    none()
}

fn fromutf8(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("fromutf8", &args);
    let interp = a.interp(1)?;
    let text = a.bytes(2)?;
    let encoding = a.opt_string(3)?;
    one(HostValue::string(interp.to_external(&text, encoding.as_deref())?))
}

fn toutf8(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("toutf8", &args);
    let interp = a.interp(1)?;
    let bytes = a.bytes(2)?;
    let encoding = a.opt_string(3)?;
    one(HostValue::string(interp.to_host_encoding(&bytes, encoding.as_deref())?))
}

fn getencs(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("getencs", &args);
    let interp = a.interp(1)?;
    one(interp.list_encodings()?)
}

fn vals(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("vals", &args);
    if a.len() <= 1 {
        return Err(BridgeError::argument("vals", 2, "not enough arguments").into());
    }
    let interp = a.interp(1)?;
    let bundle = ArgBundle::build(interp.live_engine()?, &args[1..])?;
    one(bundle.into_userdata())
}

fn checkflags(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("checkflags", &args);
    a.interp(1)?;
    let flags = a.flags(2)?;
    (3..=a.len())
        .map(|position| {
            let candidate = a.flags(position)?;
            Ok(if flags.contains(candidate) {
                HostValue::Integer(i64::from(candidate.bits()))
            } else {
                HostValue::Nil
            })
        })
        .collect()
}

fn tostring(_host: &Host, args: Vec<HostValue>) -> HostResult<Vec<HostValue>> {
    let a = Args::new("tostring", &args);
    if let Some(bundle) = ArgBundle::from_value(a.get(1)) {
        return one(bundle.to_repr()?);
    }
    let interp = a.interp(1)?;
    one(interp.to_repr()?)
}

const FUNCTIONS: &[(&str, fn(&Host, Vec<HostValue>) -> HostResult<Vec<HostValue>>)] = &[
    ("new", new),
    ("eval", eval),
    ("call", call),
    ("callt", callt),
    ("makearglist", makearglist),
    ("getvar", getvar),
    ("getarray", getarray),
    ("setvar", setvar),
    ("setarray", setarray),
    ("unsetvar", unsetvar),
    ("unsetarray", unsetarray),
    ("tracevar", tracevar),
    ("untracevar", untracevar),
    ("register", register),
    ("unregister", unregister),
    ("fromutf8", fromutf8),
    ("toutf8", toutf8),
    ("getencs", getencs),
    ("vals", vals),
    ("checkflags", checkflags),
    ("tostring", tostring),
];

const CONSTANTS: &[(&str, Flags)] = &[
    ("EVAL_GLOBAL", Flags::EVAL_GLOBAL),
    ("EVAL_DIRECT", Flags::EVAL_DIRECT),
    ("GLOBAL_ONLY", Flags::GLOBAL_ONLY),
    ("NAMESPACE_ONLY", Flags::NAMESPACE_ONLY),
    ("APPEND_VALUE", Flags::APPEND_VALUE),
    ("LIST_ELEMENT", Flags::LIST_ELEMENT),
    ("TRACE_READS", Flags::TRACE_READS),
    ("TRACE_WRITES", Flags::TRACE_WRITES),
    ("TRACE_UNSETS", Flags::TRACE_UNSETS),
    ("TRACE_ARRAY", Flags::TRACE_ARRAY),
];

/// Build the module table and publish it as the global `ltcl`
pub fn open(host: &Host) -> TableRef {
    let module = TableRef::new();
    for &(name, f) in FUNCTIONS {
        module.set_str(name, HostFunction::new(f));
    }
    for &(name, flag) in CONSTANTS {
        module.set_str(name, HostValue::Integer(i64::from(flag.bits())));
    }
    module.set_str("_VERSION", VERSION);
    module.set_str("_REVISION", REVISION);

    host.set_global("ltcl", module.clone());
    module
}
