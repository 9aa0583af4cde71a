//! Tests of the host-facing function library

use ltcl::host::{Host, HostError, HostFunction, HostResult, HostValue, TableRef};
use ltcl::module::{REVISION, VERSION};
use std::cell::RefCell;
use std::rc::Rc;

struct Fixture {
    host: Rc<Host>,
    module: TableRef,
    interp: HostValue,
}

impl Fixture {
    fn new() -> Self {
        let host = Host::new();
        let module = ltcl::open(&host);
        let interp = host
            .call(&module.get_str("new"), Vec::new())
            .expect("new")
            .remove(0);
        Self { host, module, interp }
    }

    fn call(&self, name: &str, args: Vec<HostValue>) -> HostResult<HostValue> {
        let results = self.host.call(&self.module.get_str(name), args)?;
        Ok(results.into_iter().next().unwrap_or_default())
    }

    /// Call `name` with the interpreter as first argument
    fn on(&self, name: &str, mut args: Vec<HostValue>) -> HostResult<HostValue> {
        args.insert(0, self.interp.clone());
        self.call(name, args)
    }

    fn constant(&self, name: &str) -> HostValue {
        self.module.get_str(name)
    }
}

fn message(result: HostResult<HostValue>) -> String {
    result.expect_err("call should fail").message().to_string()
}

fn strings(value: &HostValue) -> Vec<String> {
    value
        .as_table()
        .expect("table")
        .array_values()
        .iter()
        .map(|v| v.to_string())
        .collect()
}

mod module_table {
    use super::*;

    #[test]
    fn test_open_publishes_global() {
        let fx = Fixture::new();
        assert_eq!(fx.host.get_global("ltcl"), HostValue::Table(fx.module.clone()));
        assert_eq!(fx.constant("_VERSION"), HostValue::Number(VERSION));
        assert_eq!(fx.constant("_REVISION"), HostValue::Integer(REVISION));
    }

    #[test]
    fn test_constants() {
        let fx = Fixture::new();
        assert_eq!(fx.constant("GLOBAL_ONLY"), HostValue::Integer(1));
        assert_eq!(fx.constant("NAMESPACE_ONLY"), HostValue::Integer(2));
        assert_eq!(fx.constant("APPEND_VALUE"), HostValue::Integer(4));
        assert_eq!(fx.constant("LIST_ELEMENT"), HostValue::Integer(8));
        assert_eq!(fx.constant("TRACE_READS"), HostValue::Integer(0x10));
        assert_eq!(fx.constant("TRACE_WRITES"), HostValue::Integer(0x20));
        assert_eq!(fx.constant("TRACE_UNSETS"), HostValue::Integer(0x40));
        assert_eq!(fx.constant("TRACE_ARRAY"), HostValue::Integer(0x800));
        assert_eq!(fx.constant("EVAL_GLOBAL"), HostValue::Integer(0x20000));
    }

    #[test]
    fn test_every_function_is_callable() {
        let fx = Fixture::new();
        for name in [
            "new", "eval", "call", "callt", "makearglist", "getvar", "getarray", "setvar", "setarray",
            "unsetvar", "unsetarray", "tracevar", "untracevar", "register", "unregister", "fromutf8",
            "toutf8", "getencs", "vals", "checkflags", "tostring",
        ] {
            assert!(fx.module.get_str(name).as_function().is_some(), "missing {}", name);
        }
    }
}

mod arguments {
    use super::*;

    #[test]
    fn test_interpreter_argument_is_checked() {
        let fx = Fixture::new();
        assert_eq!(
            message(fx.call("eval", vec!["not an interp".into(), "set x 1".into()])),
            "bad argument #1 to 'eval' (ltcl.Interp expected, got string)"
        );
        assert_eq!(
            message(fx.call("getvar", Vec::new())),
            "bad argument #1 to 'getvar' (ltcl.Interp expected, got no value)"
        );
    }

    #[test]
    fn test_positions_shift_after_flags() {
        let fx = Fixture::new();
        assert_eq!(
            message(fx.on("eval", Vec::new())),
            "bad argument #2 to 'eval' (string expected, got no value)"
        );
        assert_eq!(
            message(fx.on("eval", vec![fx.constant("EVAL_GLOBAL")])),
            "bad argument #3 to 'eval' (string expected, got no value)"
        );
    }

    #[test]
    fn test_tracevar_requires_function() {
        let fx = Fixture::new();
        let err = message(fx.on(
            "tracevar",
            vec!["x".into(), HostValue::Nil, fx.constant("TRACE_WRITES"), "nope".into()],
        ));
        assert_eq!(err, "bad argument #5 to 'tracevar' (function expected, got string)");

        let err = message(fx.on("tracevar", vec!["x".into(), HostValue::Nil, "flags".into()]));
        assert_eq!(err, "bad argument #4 to 'tracevar' (number expected, got string)");
    }

    #[test]
    fn test_callt_requires_table() {
        let fx = Fixture::new();
        let err = message(fx.on("callt", vec!["list".into(), "oops".into()]));
        assert_eq!(err, "bad argument #3 to 'callt' (table expected, got string)");
    }

    #[test]
    fn test_new_with_config() {
        let fx = Fixture::new();
        let interp = fx
            .call("new", vec!["[interp]\nadhoc_command = \"host\"\n".into()])
            .unwrap();
        fx.host.set_global("seven", HostFunction::new(|_, _| Ok(vec![7.into()])));
        let result = fx.call("eval", vec![interp, "host seven".into()]).unwrap();
        assert_eq!(result, HostValue::Integer(7));

        let err = message(fx.call("new", vec!["[interp\n".into()]));
        assert!(err.starts_with("bad argument #1 to 'new' (Failed to parse config"), "{}", err);
    }
}

mod operations {
    use super::*;

    #[test]
    fn test_eval_and_call() {
        let fx = Fixture::new();
        // script literals are untyped, so they come back as strings
        assert_eq!(fx.on("eval", vec!["set x 5".into()]).unwrap(), HostValue::from("5"));
        assert_eq!(
            fx.on("eval", vec![fx.constant("EVAL_GLOBAL"), "incr x".into()]).unwrap(),
            HostValue::Integer(6)
        );
        assert_eq!(
            fx.on("call", vec!["set".into(), "y".into(), 2.5.into()]).unwrap(),
            HostValue::Number(2.5)
        );
        assert_eq!(message(fx.on("eval", vec!["error boom".into()])), "boom");
    }

    #[test]
    fn test_callt_and_makearglist() {
        let fx = Fixture::new();
        let table = TableRef::from_values(vec!["a".into(), "b".into()]);
        table.set("k", "v").unwrap();

        let list = fx.on("callt", vec!["list".into(), table.clone().into()]).unwrap();
        assert_eq!(strings(&list), vec!["a", "b", "-k", "v"]);

        let args = fx.on("makearglist", vec![table.into()]).unwrap();
        assert_eq!(strings(&args), vec!["a", "b", "-k", "v"]);

        let empty = fx.on("callt", vec!["list".into()]).unwrap();
        assert!(empty.as_table().expect("empty list").is_empty());
    }

    #[test]
    fn test_variable_functions() {
        let fx = Fixture::new();
        fx.on("setvar", vec!["s".into(), "x".into()]).unwrap();
        let appended = fx
            .on("setvar", vec!["s".into(), "y".into(), fx.constant("APPEND_VALUE")])
            .unwrap();
        assert_eq!(appended, HostValue::from("xy"));
        assert_eq!(fx.on("getvar", vec!["s".into()]).unwrap(), HostValue::from("xy"));

        fx.on("setarray", vec!["a".into(), "k".into(), 1.into()]).unwrap();
        assert_eq!(fx.on("getarray", vec!["a".into(), "k".into()]).unwrap(), HostValue::Integer(1));
        fx.on("unsetarray", vec!["a".into(), "k".into()]).unwrap();
        assert!(fx.on("getarray", vec!["a".into(), "k".into()]).is_err());

        fx.on("unsetvar", vec!["s".into()]).unwrap();
        assert_eq!(
            message(fx.on("getvar", vec!["s".into()])),
            "can't read \"s\": no such variable"
        );
    }

    #[test]
    fn test_trace_functions() {
        let fx = Fixture::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let callback = HostFunction::new(move |_, args: Vec<HostValue>| {
            sink.borrow_mut().push(args[0].to_string());
            Ok(Vec::new())
        });
        let args = |f: &HostFunction| {
            vec!["t".into(), HostValue::Nil, fx.constant("TRACE_WRITES"), f.clone().into()]
        };

        fx.on("tracevar", args(&callback)).unwrap();
        fx.on("eval", vec!["set t 1".into()]).unwrap();
        fx.on("untracevar", args(&callback)).unwrap();
        fx.on("eval", vec!["set t 2".into()]).unwrap();
        assert_eq!(*seen.borrow(), vec!["t"]);
    }

    #[test]
    fn test_register_functions() {
        let fx = Fixture::new();
        let double = HostFunction::new(|_, args: Vec<HostValue>| {
            let n: i64 = args
                .first()
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| HostError::new("expected a number"))?;
            Ok(vec![(n * 2).into()])
        });
        fx.on("register", vec!["double".into(), double.into()]).unwrap();
        assert_eq!(fx.on("eval", vec!["double 21".into()]).unwrap(), HostValue::Integer(42));
        assert_eq!(message(fx.on("eval", vec!["double x".into()])), "expected a number");

        fx.on("unregister", vec!["double".into()]).unwrap();
        assert!(fx.on("eval", vec!["double 1".into()]).is_err());
    }

    #[test]
    fn test_adhoc_through_globals() {
        let fx = Fixture::new();
        fx.host.set_global(
            "upper",
            HostFunction::new(|_, args: Vec<HostValue>| {
                Ok(vec![args[0].to_string().to_uppercase().into()])
            }),
        );
        assert_eq!(fx.on("eval", vec!["lua upper abc".into()]).unwrap(), HostValue::from("ABC"));
    }

    #[test]
    fn test_encoding_functions() {
        let fx = Fixture::new();
        let latin = fx.on("fromutf8", vec!["é".into(), "iso8859-1".into()]).unwrap();
        assert_eq!(latin, HostValue::string([0xE9]));
        let utf = fx.on("toutf8", vec![latin, "iso8859-1".into()]).unwrap();
        assert_eq!(utf, HostValue::from("é"));

        assert_eq!(
            message(fx.on("toutf8", vec!["x".into(), "bogus".into()])),
            "unknown encoding \"bogus\""
        );
        let names = strings(&fx.on("getencs", Vec::new()).unwrap());
        assert!(names.iter().any(|n| n == "utf-8"));
    }

    #[test]
    fn test_vals() {
        let fx = Fixture::new();
        assert_eq!(
            message(fx.on("vals", Vec::new())),
            "bad argument #2 to 'vals' (not enough arguments)"
        );

        let bundle = fx.on("vals", vec![1.into(), "two".into()]).unwrap();
        let repr = fx.call("tostring", vec![bundle.clone()]).unwrap();
        assert!(repr.to_string().starts_with("ltcl.Vals: 0x"));

        let list = fx.on("call", vec!["list".into(), bundle.clone(), "three".into()]).unwrap();
        assert_eq!(strings(&list), vec!["1", "two", "three"]);
        let again = fx.on("call", vec!["list".into(), bundle]).unwrap();
        assert_eq!(strings(&again), vec!["1", "two"]);
    }

    #[test]
    fn test_checkflags() {
        let fx = Fixture::new();
        let reads = fx.constant("TRACE_READS");
        let writes = fx.constant("TRACE_WRITES");
        let unsets = fx.constant("TRACE_UNSETS");
        let both = HostValue::Integer(0x30);

        let results = fx
            .host
            .call(
                &fx.module.get_str("checkflags"),
                vec![fx.interp.clone(), both, reads.clone(), unsets, writes.clone()],
            )
            .unwrap();
        assert_eq!(results, vec![reads, HostValue::Nil, writes]);
    }

    #[test]
    fn test_tostring_interp() {
        let fx = Fixture::new();
        let text = fx.call("tostring", vec![fx.interp.clone()]).unwrap().to_string();
        assert!(text.starts_with("ltcl.Interp (0x"), "{}", text);
        assert!(fx.call("tostring", vec![1.into()]).is_err());
    }
}
