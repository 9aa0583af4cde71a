//! End-to-end tests of the bridge through the `Interp` API

use ltcl::errors::ErrorKind;
use ltcl::host::{Host, HostError, HostFunction, HostValue, TableRef};
use ltcl::interop::ArgBundle;
use ltcl::target::{Flags, Obj, Status};
use ltcl::{BridgeConfig, BridgeError, Interp};
use std::cell::RefCell;
use std::rc::Rc;

fn setup() -> (Rc<Host>, Interp) {
    let host = Host::new();
    let interp = Interp::new(&host).expect("interpreter");
    (host, interp)
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

/// Host function that records its arguments and returns nothing
fn recorder() -> (HostFunction, Rc<RefCell<Vec<Vec<HostValue>>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let f = HostFunction::new(move |_, args| {
        sink.borrow_mut().push(args);
        Ok(Vec::new())
    });
    (f, calls)
}

mod dispatch {
    use super::*;

    #[test]
    fn test_call_set_then_get() {
        let (_host, interp) = setup();
        let result = interp.call(Flags::NONE, "set", &["x".into(), 5.into()]).unwrap();
        assert_eq!(result, HostValue::Integer(5));
        assert_eq!(interp.get_var("x", None, Flags::NONE).unwrap(), HostValue::Integer(5));
    }

    #[test]
    fn test_call_table_argument_vector() {
        let (_host, interp) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        interp.engine().create_command(
            "configure",
            move |_: &ltcl::Engine, objv: &[Obj]| {
                *sink.borrow_mut() = objv.iter().map(|o| o.as_str().to_string()).collect();
                Status::Ok
            },
            None,
        );

        let table = TableRef::from_values(vec![1.into()]);
        table.set("a", "b").unwrap();
        interp.call_table(Flags::NONE, "configure", Some(&table)).unwrap();
        assert_eq!(*seen.borrow(), vec!["configure", "1", "-a", "b"]);
    }

    #[test]
    fn test_eval_error_is_verbatim() {
        let (_host, interp) = setup();
        let err = interp.eval("error foo", Flags::NONE).unwrap_err();
        assert_eq!(err, BridgeError::Eval("foo".to_string()));
        assert_eq!(err.to_string(), "foo");

        let err = interp.call(Flags::NONE, "nosuch", &[]).unwrap_err();
        assert_eq!(err.to_string(), "invalid command name \"nosuch\"");
    }

    #[test]
    fn test_eval_returns_converted_result() {
        let (_host, interp) = setup();
        assert_eq!(interp.eval("incr n 3", Flags::NONE).unwrap(), HostValue::Integer(3));
        let list = interp.eval("list a {b c} [list d]", Flags::NONE).unwrap();
        let table = list.as_table().unwrap();
        assert_eq!(table.get(1), HostValue::from("a"));
        assert_eq!(table.get(2), HostValue::from("b c"));
        assert_eq!(strings(&table.get(3)), vec!["d"]);
        assert!(interp.eval("", Flags::NONE).unwrap() == HostValue::from(""));
    }

    #[test]
    fn test_nested_table_argument_becomes_list() {
        let (_host, interp) = setup();
        let inner = TableRef::from_values(vec!["b".into(), "c d".into()]);
        let outer = HostValue::Table(TableRef::from_values(vec!["a".into(), HostValue::Table(inner)]));
        interp.call(Flags::NONE, "set", &["l".into(), outer]).unwrap();
        assert_eq!(interp.eval("llength $l", Flags::NONE).unwrap(), HostValue::Integer(2));
        assert_eq!(interp.eval("lindex $l 1", Flags::NONE).unwrap().as_table().unwrap().len(), 2);
    }

    #[test]
    fn test_conversion_failure_touches_nothing() {
        let (_host, interp) = setup();
        let f = HostFunction::new(|_, _| Ok(Vec::new()));
        let err = interp.call(Flags::NONE, "set", &["x".into(), f.into()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(!interp.engine().var_exists("x", None));

        let cyclic = TableRef::new();
        cyclic.push(HostValue::Table(cyclic.clone()));
        let err = interp.set_var("y", None, &HostValue::Table(cyclic), Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "can not convert recursive table to target value");
        assert!(!interp.engine().var_exists("y", None));
    }

    #[test]
    fn test_make_arg_list_uses_configured_prefix() {
        let host = Host::new();
        let mut config = BridgeConfig::default();
        config.args.option_prefix = "--".to_string();
        let interp = Interp::with_config(&host, config).unwrap();

        let table = TableRef::from_values(vec!["pos".into()]);
        table.set("opt", 1).unwrap();
        let list = interp.make_arg_list(Some(&table)).unwrap();
        assert_eq!(strings(&HostValue::Table(list)), vec!["pos", "--opt", "1"]);
    }
}

mod variables {
    use super::*;

    #[test]
    fn test_scalar_and_array_access() {
        let (_host, interp) = setup();
        interp.set_var("arr", Some("k"), &"v".into(), Flags::NONE).unwrap();
        assert_eq!(interp.get_var("arr", Some("k"), Flags::NONE).unwrap(), HostValue::from("v"));

        let err = interp.get_var("arr", None, Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "can't read \"arr\": variable is array");

        interp.unset_var("arr", Some("k"), Flags::NONE).unwrap();
        let err = interp.get_var("arr", Some("k"), Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "can't read \"arr(k)\": no such element in array");

        let err = interp.unset_var("missing", None, Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "can't unset \"missing\": no such variable");
    }

    #[test]
    fn test_append_and_list_element() {
        let (_host, interp) = setup();
        interp.set_var("s", None, &"a".into(), Flags::NONE).unwrap();
        let value = interp.set_var("s", None, &"b".into(), Flags::APPEND_VALUE).unwrap();
        assert_eq!(value, HostValue::from("ab"));

        interp
            .set_var("l", None, &"x y".into(), Flags::APPEND_VALUE | Flags::LIST_ELEMENT)
            .unwrap();
        let value = interp
            .set_var("l", None, &"z".into(), Flags::APPEND_VALUE | Flags::LIST_ELEMENT)
            .unwrap();
        assert_eq!(value, HostValue::from("{x y} z"));
    }

    #[test]
    fn test_nil_sets_empty_value() {
        let (_host, interp) = setup();
        interp.set_var("e", None, &HostValue::Nil, Flags::NONE).unwrap();
        assert_eq!(interp.get_var("e", None, Flags::NONE).unwrap(), HostValue::from(""));
    }
}

mod reverse_calls {
    use super::*;

    #[test]
    fn test_adhoc_call_by_global_name() {
        let (host, interp) = setup();
        host.set_global(
            "add",
            HostFunction::new(|_, args| {
                let sum: i64 = args
                    .iter()
                    .filter_map(|v| v.as_str().and_then(|s| s.parse::<i64>().ok()))
                    .sum();
                Ok(vec![HostValue::Integer(sum)])
            }),
        );
        assert_eq!(interp.eval("lua add 2 3", Flags::NONE).unwrap(), HostValue::Integer(5));
        assert_eq!(interp.eval("lua", Flags::NONE).unwrap(), HostValue::from(""));

        let err = interp.eval("lua nothing", Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "attempt to call a nil value");
    }

    #[test]
    fn test_adhoc_receives_converted_values() {
        let (host, interp) = setup();
        let (f, calls) = recorder();
        host.set_global("probe", f);
        interp.eval("lua probe [list a b c] word", Flags::NONE).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(strings(&calls[0][0]), vec!["a", "b", "c"]);
        assert_eq!(calls[0][1], HostValue::from("word"));
    }

    #[test]
    fn test_register_and_unregister() {
        let (_host, interp) = setup();
        let greet = HostFunction::new(|_, args| {
            let who = args.first().map(|v| v.to_string()).unwrap_or_default();
            Ok(vec![format!("hello {}", who).into()])
        });
        interp.register_function("greet", greet).unwrap();
        assert_eq!(interp.eval("greet world", Flags::NONE).unwrap(), HostValue::from("hello world"));
        assert_eq!(interp.function_names(), vec!["greet"]);

        interp.unregister_function("greet").unwrap();
        assert!(interp.function_names().is_empty());
        let err = interp.eval("greet again", Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "invalid command name \"greet\"");

        interp.unregister_function("greet").unwrap();
        interp.unregister_function("never-registered").unwrap();
    }

    #[test]
    fn test_reregister_replaces_function() {
        let (_host, interp) = setup();
        interp
            .register_function("f", HostFunction::new(|_, _| Ok(vec!["first".into()])))
            .unwrap();
        interp
            .register_function("f", HostFunction::new(|_, _| Ok(vec!["second".into()])))
            .unwrap();
        assert_eq!(interp.eval("f", Flags::NONE).unwrap(), HostValue::from("second"));
        assert_eq!(interp.function_names(), vec!["f"]);
    }

    #[test]
    fn test_host_failure_becomes_interpreter_error() {
        let (_host, interp) = setup();
        interp
            .register_function("fail", HostFunction::new(|_, _| Err(HostError::new("it broke"))))
            .unwrap();
        let err = interp.eval("fail", Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "it broke");
        assert_eq!(interp.eval("catch fail msg; set msg", Flags::NONE).unwrap(), HostValue::from("it broke"));

        interp
            .register_function("bad", HostFunction::new(|_, _| Ok(vec![HostFunction::new(|_, _| Ok(vec![])).into()])))
            .unwrap();
        let err = interp.eval("bad", Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "can not convert host value of type 'function' to target value");
    }

    #[test]
    fn test_reentrant_call_keeps_outer_result() {
        let host = Host::new();
        let interp = Rc::new(Interp::new(&host).unwrap());
        let weak = Rc::downgrade(&interp);
        interp
            .register_function(
                "inner",
                HostFunction::new(move |_, _| {
                    let interp = weak.upgrade().ok_or_else(|| HostError::new("gone"))?;
                    interp.eval("set y 99", Flags::NONE)?;
                    Ok(vec!["ok".into()])
                }),
            )
            .unwrap();

        let result = interp.eval("set r [inner]; list $r $y", Flags::NONE).unwrap();
        assert_eq!(strings(&result), vec!["ok", "99"]);
    }

    #[test]
    fn test_custom_adhoc_command_name() {
        let host = Host::new();
        let mut config = BridgeConfig::default();
        config.interp.adhoc_command = "host".to_string();
        let interp = Interp::with_config(&host, config).unwrap();
        host.set_global("one", HostFunction::new(|_, _| Ok(vec![1.into()])));

        assert_eq!(interp.eval("host one", Flags::NONE).unwrap(), HostValue::Integer(1));
        assert!(interp.eval("lua one", Flags::NONE).is_err());
    }
}

mod traces {
    use super::*;

    #[test]
    fn test_write_trace_receives_arguments() {
        let (_host, interp) = setup();
        let (f, calls) = recorder();
        interp.trace_var("x", None, Flags::TRACE_WRITES, f).unwrap();
        interp.call(Flags::NONE, "set", &["x".into(), 1.into()]).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], HostValue::from("x"));
        assert!(calls[0][1].is_nil());
        let flags = calls[0][2].as_integer().unwrap() as i32;
        assert!(Flags::from_bits(flags).contains(Flags::TRACE_WRITES));
    }

    #[test]
    fn test_same_callback_registers_once() {
        let (_host, interp) = setup();
        let (f, calls) = recorder();
        interp.trace_var("x", None, Flags::TRACE_WRITES, f.clone()).unwrap();
        interp.trace_var("x", None, Flags::TRACE_WRITES, f.clone()).unwrap();
        assert_eq!(interp.engine().var_trace_info2("x", None).len(), 1);

        let (g, other_calls) = recorder();
        interp.trace_var("x", None, Flags::TRACE_WRITES, g).unwrap();
        assert_eq!(interp.engine().var_trace_info2("x", None).len(), 2);

        interp.set_var("x", None, &1.into(), Flags::NONE).unwrap();
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(other_calls.borrow().len(), 1);
        assert_eq!(interp.function_names().len(), 2);
    }

    #[test]
    fn test_trace_veto() {
        let (_host, interp) = setup();
        interp.set_var("secret", None, &"42".into(), Flags::NONE).unwrap();
        let deny = HostFunction::new(|_, _| Ok(vec!["denied".into()]));
        interp.trace_var("secret", None, Flags::TRACE_READS, deny).unwrap();

        let err = interp.get_var("secret", None, Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "can't read \"secret\": denied");

        let failing = HostFunction::new(|_, _| Err(HostError::new("callback failed")));
        interp.trace_var("w", None, Flags::TRACE_WRITES, failing).unwrap();
        let err = interp.set_var("w", None, &1.into(), Flags::NONE).unwrap_err();
        assert_eq!(err.to_string(), "can't set \"w\": callback failed");
    }

    #[test]
    fn test_empty_return_allows_access() {
        let (_host, interp) = setup();
        let quiet = HostFunction::new(|_, _| Ok(vec!["".into()]));
        interp.trace_var("q", None, Flags::TRACE_WRITES, quiet).unwrap();
        assert_eq!(interp.set_var("q", None, &3.into(), Flags::NONE).unwrap(), HostValue::Integer(3));
    }

    #[test]
    fn test_trace_survives_unset() {
        let (_host, interp) = setup();
        let (f, calls) = recorder();
        interp
            .trace_var("a", Some("1"), Flags::TRACE_WRITES | Flags::TRACE_UNSETS, f)
            .unwrap();

        interp.set_var("a", Some("1"), &"one".into(), Flags::NONE).unwrap();
        interp.unset_var("a", Some("1"), Flags::NONE).unwrap();
        assert_eq!(interp.engine().var_trace_info2("a", Some("1")).len(), 1);

        interp.set_var("a", Some("1"), &"again".into(), Flags::NONE).unwrap();
        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1][1], HostValue::from("1"));
    }

    #[test]
    fn test_trace_without_unsets_ends_with_variable() {
        let (_host, interp) = setup();
        let (f, calls) = recorder();
        interp.trace_var("a", Some("1"), Flags::TRACE_WRITES, f.clone()).unwrap();
        interp.set_var("a", Some("1"), &"x".into(), Flags::NONE).unwrap();
        interp.unset_var("a", None, Flags::NONE).unwrap();
        interp.set_var("a", Some("1"), &"y".into(), Flags::NONE).unwrap();
        assert_eq!(calls.borrow().len(), 1);
        assert!(interp.engine().var_trace_info2("a", Some("1")).is_empty());

        interp.trace_var("s", None, Flags::TRACE_WRITES, f).unwrap();
        interp.set_var("s", None, &1.into(), Flags::NONE).unwrap();
        interp.unset_var("s", None, Flags::NONE).unwrap();
        interp.set_var("s", None, &2.into(), Flags::NONE).unwrap();
        assert_eq!(calls.borrow().len(), 2);
        assert!(interp.engine().var_trace_info2("s", None).is_empty());
    }

    #[test]
    fn test_untrace_removes_trace_and_slot() {
        let (_host, interp) = setup();
        let (f, calls) = recorder();
        interp.trace_var("x", None, Flags::TRACE_WRITES, f.clone()).unwrap();
        interp.untrace_var("x", None, Flags::TRACE_WRITES, &f).unwrap();
        assert!(interp.function_names().is_empty());

        interp.set_var("x", None, &1.into(), Flags::NONE).unwrap();
        assert!(calls.borrow().is_empty());

        interp.untrace_var("x", None, Flags::TRACE_WRITES, &f).unwrap();
    }

    #[test]
    fn test_traces_are_quiet_during_teardown() {
        let (_host, interp) = setup();
        let (f, calls) = recorder();
        interp.set_var("v", None, &1.into(), Flags::NONE).unwrap();
        interp.trace_var("v", None, Flags::TRACE_UNSETS, f).unwrap();
        interp.destroy();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_callback_cannot_clobber_result() {
        let host = Host::new();
        let interp = Rc::new(Interp::new(&host).unwrap());
        let weak = Rc::downgrade(&interp);
        let noisy = HostFunction::new(move |_, _| {
            if let Some(interp) = weak.upgrade() {
                let _ = interp.eval("set other noise", Flags::NONE);
            }
            Ok(Vec::new())
        });
        interp.trace_var("t", None, Flags::TRACE_WRITES, noisy).unwrap();
        assert_eq!(interp.eval("set t value", Flags::NONE).unwrap(), HostValue::from("value"));
    }
}

mod lifetime {
    use super::*;

    #[test]
    fn test_command_destroying_its_interpreter_keeps_result() {
        let host = Host::new();
        let interp = Rc::new(Interp::new(&host).unwrap());
        let weak = Rc::downgrade(&interp);
        interp
            .register_function(
                "kill",
                HostFunction::new(move |_, _| {
                    if let Some(interp) = weak.upgrade() {
                        interp.destroy();
                    }
                    Ok(vec!["bye".into()])
                }),
            )
            .unwrap();

        assert_eq!(interp.eval("kill", Flags::NONE).unwrap(), HostValue::from("bye"));
        assert!(interp.is_destroyed());
        assert!(interp.engine().is_disposed());
        assert!(interp.function_names().is_empty());
    }

    #[test]
    fn test_bundle_spliced_twice() {
        let (_host, interp) = setup();
        let bundle = ArgBundle::build(interp.engine(), &["a".into(), 2.into()]).unwrap();
        let bundle = HostValue::UserData(bundle.into_userdata());

        let first = interp.call(Flags::NONE, "list", &[bundle.clone(), "z".into()]).unwrap();
        let second = interp.call(Flags::NONE, "list", &["y".into(), bundle.clone()]).unwrap();
        assert_eq!(strings(&first), vec!["a", "2", "z"]);
        assert_eq!(strings(&second), vec!["y", "a", "2"]);

        let table = TableRef::from_values(vec![bundle.clone()]);
        let third = interp.call_table(Flags::NONE, "list", Some(&table)).unwrap();
        assert_eq!(strings(&third), vec!["a", "2"]);
        drop(table);

        assert_eq!(interp.engine().preserve_count(), 1);
        drop(bundle);
        assert_eq!(interp.engine().preserve_count(), 0);
    }

    #[test]
    fn test_bundle_defers_teardown() {
        let (_host, interp) = setup();
        let bundle = ArgBundle::build(interp.engine(), &[1.into()]).unwrap();
        let engine = Rc::clone(interp.engine());

        drop(interp);
        assert!(engine.is_deleted());
        assert!(!engine.is_disposed());

        bundle.teardown();
        assert!(engine.is_disposed());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (_host, interp) = setup();
        interp.destroy();
        interp.destroy();
        assert!(interp.is_destroyed());
        let err = interp.eval("set x 1", Flags::NONE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Eval);
    }

    #[test]
    fn test_registered_functions_released_on_destroy() {
        let (_host, interp) = setup();
        interp
            .register_function("f", HostFunction::new(|_, _| Ok(Vec::new())))
            .unwrap();
        interp.destroy();
        assert!(interp.function_names().is_empty());
    }

    #[test]
    fn test_init_script() {
        let host = Host::new();
        let mut config = BridgeConfig::default();
        config.interp.init_script = Some("set ready yes".to_string());
        let interp = Interp::with_config(&host, config).unwrap();
        assert_eq!(interp.get_var("ready", None, Flags::NONE).unwrap(), HostValue::from("yes"));

        let mut config = BridgeConfig::default();
        config.interp.init_script = Some("error {no tk}".to_string());
        let err = Interp::with_config(&host, config).unwrap_err();
        assert_eq!(err, BridgeError::Initialization("no tk".to_string()));
        assert_eq!(err.to_string(), "interpreter initialization failed: no tk");
    }

    #[test]
    fn test_repr() {
        let (_host, interp) = setup();
        let text = interp.to_repr().unwrap();
        assert!(text.starts_with("ltcl.Interp (0x"));
        assert!(text.ends_with(')'));
    }
}

mod encodings {
    use super::*;

    #[test]
    fn test_round_trip_through_latin1() {
        let (_host, interp) = setup();
        let external = interp.to_external("café".as_bytes(), Some("iso8859-1")).unwrap();
        assert_eq!(external, vec![b'c', b'a', b'f', 0xE9]);
        let back = interp.to_host_encoding(&external, Some("iso8859-1")).unwrap();
        assert_eq!(back, "café".as_bytes());
    }

    #[test]
    fn test_system_encoding_default() {
        let (_host, interp) = setup();
        assert_eq!(interp.to_external(b"plain", None).unwrap(), b"plain");
    }

    #[test]
    fn test_unknown_encoding() {
        let (_host, interp) = setup();
        let err = interp.to_external(b"x", Some("klingon")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.to_string(), "unknown encoding \"klingon\"");
    }

    #[test]
    fn test_list_encodings() {
        let (_host, interp) = setup();
        let names = strings(&interp.list_encodings().unwrap());
        assert!(names.contains(&"utf-8".to_string()));
        assert!(names.contains(&"iso8859-1".to_string()));
    }

    #[test]
    fn test_bad_system_encoding_fails_creation() {
        let host = Host::new();
        let mut config = BridgeConfig::default();
        config.interp.system_encoding = "nope".to_string();
        let err = Interp::with_config(&host, config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
    }
}
