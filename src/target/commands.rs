//! Built-in commands

use super::engine::{Engine, Status};
use super::flags::Flags;
use super::obj::Obj;
use std::io::Write;

type Builtin = fn(&Engine, &[Obj]) -> Status;

const BUILTINS: &[(&str, Builtin)] = &[
    ("append", cmd_append),
    ("array", cmd_array),
    ("catch", cmd_catch),
    ("concat", cmd_concat),
    ("encoding", cmd_encoding),
    ("error", cmd_error),
    ("eval", cmd_eval),
    ("incr", cmd_incr),
    ("info", cmd_info),
    ("join", cmd_join),
    ("lappend", cmd_lappend),
    ("lindex", cmd_lindex),
    ("list", cmd_list),
    ("llength", cmd_llength),
    ("puts", cmd_puts),
    ("rename", cmd_rename),
    ("return", cmd_return),
    ("set", cmd_set),
    ("string", cmd_string),
    ("unset", cmd_unset),
];

pub(crate) fn register_builtins(engine: &Engine) {
    for &(name, proc_) in BUILTINS {
        engine.create_command(name, proc_, None);
    }
}

/// Glob match supporting `*` and `?`
pub(crate) fn string_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

fn int_arg(engine: &Engine, obj: &Obj) -> Result<i64, Status> {
    obj.get_int().map_err(|message| engine.error(message))
}

fn list_arg(engine: &Engine, obj: &Obj) -> Result<Vec<Obj>, Status> {
    obj.get_list().map_err(|message| engine.error(message))
}

fn set_result_var(engine: &Engine, value: Option<Obj>) -> Status {
    match value {
        Some(value) => {
            engine.set_obj_result(value);
            Status::Ok
        }
        None => Status::Error,
    }
}

fn cmd_set(engine: &Engine, objv: &[Obj]) -> Status {
    match objv.len() {
        2 => set_result_var(engine, engine.get_var2(objv[1].as_str(), None, Flags::LEAVE_ERR_MSG)),
        3 => set_result_var(
            engine,
            engine.set_var2(objv[1].as_str(), None, objv[2].clone(), Flags::LEAVE_ERR_MSG),
        ),
        _ => engine.wrong_num_args(objv, 1, "varName ?newValue?"),
    }
}

fn cmd_unset(engine: &Engine, objv: &[Obj]) -> Status {
    let mut names = &objv[1..];
    let mut complain = true;
    while let Some(first) = names.first() {
        match first.as_str() {
            "-nocomplain" => complain = false,
            "--" => {
                names = &names[1..];
                break;
            }
            _ => break,
        }
        names = &names[1..];
    }
    for name in names {
        let flags = if complain { Flags::LEAVE_ERR_MSG } else { Flags::NONE };
        if engine.unset_var2(name.as_str(), None, flags) != Status::Ok && complain {
            return Status::Error;
        }
    }
    engine.reset_result();
    Status::Ok
}

fn cmd_incr(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() != 2 && objv.len() != 3 {
        return engine.wrong_num_args(objv, 1, "varName ?increment?");
    }
    let step = match objv.get(2) {
        Some(obj) => match int_arg(engine, obj) {
            Ok(step) => step,
            Err(status) => return status,
        },
        None => 1,
    };
    let name = objv[1].as_str();
    let current = if engine.var_exists(name, None) {
        match engine.get_var2(name, None, Flags::LEAVE_ERR_MSG) {
            Some(value) => match int_arg(engine, &value) {
                Ok(current) => current,
                Err(status) => return status,
            },
            None => return Status::Error,
        }
    } else {
        0
    };
    let next = Obj::new_int(current.wrapping_add(step));
    set_result_var(engine, engine.set_var2(name, None, next, Flags::LEAVE_ERR_MSG))
}

fn cmd_append(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 {
        return engine.wrong_num_args(objv, 1, "varName ?value ...?");
    }
    let name = objv[1].as_str();
    if objv.len() == 2 {
        return set_result_var(engine, engine.get_var2(name, None, Flags::LEAVE_ERR_MSG));
    }
    let mut last = None;
    for value in &objv[2..] {
        last = engine.set_var2(name, None, value.clone(), Flags::APPEND_VALUE | Flags::LEAVE_ERR_MSG);
        if last.is_none() {
            return Status::Error;
        }
    }
    set_result_var(engine, last)
}

fn cmd_lappend(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 {
        return engine.wrong_num_args(objv, 1, "varName ?value ...?");
    }
    let name = objv[1].as_str();
    if objv.len() == 2 {
        if !engine.var_exists(name, None) {
            return set_result_var(engine, engine.set_var2(name, None, Obj::empty(), Flags::LEAVE_ERR_MSG));
        }
        return set_result_var(engine, engine.get_var2(name, None, Flags::LEAVE_ERR_MSG));
    }
    let flags = Flags::APPEND_VALUE | Flags::LIST_ELEMENT | Flags::LEAVE_ERR_MSG;
    let mut last = None;
    for value in &objv[2..] {
        last = engine.set_var2(name, None, value.clone(), flags);
        if last.is_none() {
            return Status::Error;
        }
    }
    set_result_var(engine, last)
}

fn cmd_list(engine: &Engine, objv: &[Obj]) -> Status {
    engine.set_obj_result(Obj::new_list(objv[1..].to_vec()));
    Status::Ok
}

fn cmd_llength(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() != 2 {
        return engine.wrong_num_args(objv, 1, "list");
    }
    match list_arg(engine, &objv[1]) {
        Ok(elements) => {
            engine.set_obj_result(Obj::new_int(elements.len() as i64));
            Status::Ok
        }
        Err(status) => status,
    }
}

/// `N`, `end` or `end-N` against a list of `len` elements
fn resolve_index(engine: &Engine, index: &Obj, len: usize) -> Result<Option<usize>, Status> {
    let text = index.as_str().trim();
    let position = if let Some(rest) = text.strip_prefix("end") {
        let back = match rest.strip_prefix('-') {
            Some(n) => n.parse::<i64>().map_err(|_| bad_index(engine, text))?,
            None if rest.is_empty() => 0,
            None => return Err(bad_index(engine, text)),
        };
        len as i64 - 1 - back
    } else {
        index.get_int().map_err(|_| bad_index(engine, text))?
    };
    Ok(usize::try_from(position).ok().filter(|&p| p < len))
}

fn bad_index(engine: &Engine, text: &str) -> Status {
    engine.error(format!(
        "bad index \"{}\": must be integer?[+-]integer? or end?[+-]integer?",
        text
    ))
}

fn cmd_lindex(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 {
        return engine.wrong_num_args(objv, 1, "list ?index ...?");
    }
    let mut current = objv[1].clone();
    for index in &objv[2..] {
        let elements = match list_arg(engine, &current) {
            Ok(elements) => elements,
            Err(status) => return status,
        };
        match resolve_index(engine, index, elements.len()) {
            Ok(Some(i)) => current = elements[i].clone(),
            Ok(None) => {
                current = Obj::empty();
                break;
            }
            Err(status) => return status,
        }
    }
    engine.set_obj_result(current);
    Status::Ok
}

fn concat_words(objv: &[Obj]) -> String {
    objv.iter()
        .map(|o| o.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn cmd_concat(engine: &Engine, objv: &[Obj]) -> Status {
    engine.set_result(concat_words(&objv[1..]));
    Status::Ok
}

fn cmd_join(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() != 2 && objv.len() != 3 {
        return engine.wrong_num_args(objv, 1, "list ?joinString?");
    }
    let separator = objv.get(2).map_or(" ", |o| o.as_str());
    match list_arg(engine, &objv[1]) {
        Ok(elements) => {
            let parts: Vec<&str> = elements.iter().map(|e| e.as_str()).collect();
            engine.set_result(parts.join(separator));
            Status::Ok
        }
        Err(status) => status,
    }
}

fn cmd_error(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 || objv.len() > 4 {
        return engine.wrong_num_args(objv, 1, "message ?errorInfo? ?errorCode?");
    }
    if let Some(info) = objv.get(2) {
        engine.set_var2("errorInfo", None, info.clone(), Flags::GLOBAL_ONLY);
    }
    if let Some(code) = objv.get(3) {
        engine.set_var2("errorCode", None, code.clone(), Flags::GLOBAL_ONLY);
    }
    engine.set_obj_result(objv[1].clone());
    Status::Error
}

fn cmd_return(engine: &Engine, objv: &[Obj]) -> Status {
    let mut args = &objv[1..];
    let mut status = Status::Return;
    while args.len() >= 2 && args[0].as_str() == "-code" {
        status = match args[1].as_str() {
            "ok" | "0" => Status::Ok,
            "error" | "1" => Status::Error,
            "return" | "2" => Status::Return,
            other => {
                return engine.error(format!(
                    "bad completion code \"{}\": must be ok, error, or return",
                    other
                ))
            }
        };
        args = &args[2..];
    }
    match args {
        [] => engine.reset_result(),
        [value] => engine.set_obj_result(value.clone()),
        _ => return engine.wrong_num_args(objv, 1, "?-code code? ?result?"),
    }
    status
}

fn cmd_catch(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() != 2 && objv.len() != 3 {
        return engine.wrong_num_args(objv, 1, "script ?resultVarName?");
    }
    let status = engine.eval(objv[1].as_str(), Flags::NONE);
    if let Some(var) = objv.get(2) {
        let value = engine.obj_result();
        if engine
            .set_var2(var.as_str(), None, value, Flags::LEAVE_ERR_MSG)
            .is_none()
        {
            return engine.error("couldn't save command result in variable");
        }
    }
    engine.set_obj_result(Obj::new_int(status.code() as i64));
    Status::Ok
}

fn cmd_eval(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 {
        return engine.wrong_num_args(objv, 1, "arg ?arg ...?");
    }
    let script = if objv.len() == 2 {
        objv[1].as_str().to_string()
    } else {
        concat_words(&objv[1..])
    };
    engine.eval(&script, Flags::NONE)
}

fn cmd_rename(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() != 3 {
        return engine.wrong_num_args(objv, 1, "oldName newName");
    }
    engine.rename_command(objv[1].as_str(), objv[2].as_str())
}

fn cmd_info(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 {
        return engine.wrong_num_args(objv, 1, "subcommand ?arg ...?");
    }
    match (objv[1].as_str(), objv.len()) {
        ("exists", 3) => {
            let exists = engine.var_exists(objv[2].as_str(), None) || engine.array_exists(objv[2].as_str());
            engine.set_obj_result(Obj::new_boolean(exists));
            Status::Ok
        }
        ("commands", 2) | ("commands", 3) => {
            let pattern = objv.get(2).map_or("*", |o| o.as_str());
            let names = engine
                .command_names()
                .into_iter()
                .filter(|name| string_match(pattern, name))
                .map(Obj::new_string)
                .collect();
            engine.set_obj_result(Obj::new_list(names));
            Status::Ok
        }
        ("exists", _) => engine.wrong_num_args(objv, 2, "varName"),
        (other, _) => engine.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be commands, or exists",
            other
        )),
    }
}

fn cmd_array(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 3 {
        return engine.wrong_num_args(objv, 1, "option arrayName ?arg ...?");
    }
    let name = objv[2].as_str();
    if engine.array_traces(name) != Status::Ok {
        return Status::Error;
    }
    let exists = engine.array_exists(name);

    match (objv[1].as_str(), objv.len()) {
        ("exists", 3) => engine.set_obj_result(Obj::new_boolean(exists)),
        ("size", 3) => engine.set_obj_result(Obj::new_int(engine.array_names(name).len() as i64)),
        ("names", 3) | ("names", 4) => {
            let pattern = objv.get(3).map_or("*", |o| o.as_str());
            let names = engine
                .array_names(name)
                .into_iter()
                .filter(|key| string_match(pattern, key))
                .map(Obj::new_string)
                .collect();
            engine.set_obj_result(Obj::new_list(names));
        }
        ("get", 3) => {
            let mut pairs = Vec::new();
            for key in engine.array_names(name) {
                if let Some(value) = engine.get_var2(name, Some(&key), Flags::NONE) {
                    pairs.push(Obj::new_string(key));
                    pairs.push(value);
                }
            }
            engine.set_obj_result(Obj::new_list(pairs));
        }
        ("set", 4) => {
            let pairs = match list_arg(engine, &objv[3]) {
                Ok(pairs) => pairs,
                Err(status) => return status,
            };
            if pairs.len() % 2 != 0 {
                return engine.error("list must have an even number of elements");
            }
            for pair in pairs.chunks(2) {
                let stored = engine.set_var2(name, Some(pair[0].as_str()), pair[1].clone(), Flags::LEAVE_ERR_MSG);
                if stored.is_none() {
                    return Status::Error;
                }
            }
            engine.reset_result();
        }
        ("unset", 3) => {
            if exists {
                engine.unset_var2(name, None, Flags::NONE);
            }
            engine.reset_result();
        }
        (option @ ("exists" | "size" | "names" | "get" | "set" | "unset"), _) => {
            return engine.error(format!("wrong # args: should be \"array {} arrayName\"", option));
        }
        (other, _) => {
            return engine.error(format!(
                "bad option \"{}\": must be exists, get, names, set, size, or unset",
                other
            ))
        }
    }
    Status::Ok
}

fn cmd_string(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 3 {
        return engine.wrong_num_args(objv, 1, "option arg ?arg ...?");
    }
    let arg = objv[2].as_str();
    let result = match (objv[1].as_str(), objv.len()) {
        ("length", 3) => Obj::new_int(arg.chars().count() as i64),
        ("bytelength", 3) => Obj::new_int(arg.len() as i64),
        ("toupper", 3) => Obj::new_string(arg.to_uppercase()),
        ("tolower", 3) => Obj::new_string(arg.to_lowercase()),
        ("trim", 3) => Obj::new_string(arg.trim()),
        ("equal", 4) => Obj::new_boolean(arg == objv[3].as_str()),
        ("match", 4) => Obj::new_boolean(string_match(arg, objv[3].as_str())),
        (other, _) => {
            return engine.error(format!(
                "bad option \"{}\": must be bytelength, equal, length, match, tolower, toupper, or trim",
                other
            ))
        }
    };
    engine.set_obj_result(result);
    Status::Ok
}

fn cmd_puts(engine: &Engine, objv: &[Obj]) -> Status {
    let mut args = &objv[1..];
    let mut newline = true;
    if args.first().map(|o| o.as_str()) == Some("-nonewline") {
        newline = false;
        args = &args[1..];
    }
    let (channel, text) = match args {
        [text] => ("stdout", text.as_str()),
        [channel, text] => (channel.as_str(), text.as_str()),
        _ => return engine.wrong_num_args(objv, 1, "?-nonewline? ?channelId? string"),
    };
    let outcome = match channel {
        "stdout" => write_line(&mut std::io::stdout().lock(), text, newline),
        "stderr" => write_line(&mut std::io::stderr().lock(), text, newline),
        other => return engine.error(format!("can not find channel named \"{}\"", other)),
    };
    match outcome {
        Ok(()) => Status::Ok,
        Err(e) => engine.error(format!("error writing \"{}\": {}", channel, e)),
    }
}

fn write_line(out: &mut dyn Write, text: &str, newline: bool) -> std::io::Result<()> {
    out.write_all(text.as_bytes())?;
    if newline {
        out.write_all(b"\n")?;
    }
    out.flush()
}

fn encoding_args(args: &[Obj]) -> Option<(Option<&str>, &Obj)> {
    match args {
        [data] => Some((None, data)),
        [name, data] => Some((Some(name.as_str()), data)),
        _ => None,
    }
}

fn cmd_encoding(engine: &Engine, objv: &[Obj]) -> Status {
    if objv.len() < 2 {
        return engine.wrong_num_args(objv, 1, "option ?arg ...?");
    }
    let args = &objv[2..];
    match objv[1].as_str() {
        "names" if args.is_empty() => {
            engine.get_encoding_names();
            Status::Ok
        }
        "system" => match args {
            [] => {
                engine.set_result(engine.system_encoding().name());
                Status::Ok
            }
            [name] => engine.set_system_encoding(name.as_str()),
            _ => engine.wrong_num_args(objv, 2, "?encoding?"),
        },
        option @ ("convertto" | "convertfrom") => {
            let Some((name, data)) = encoding_args(args) else {
                return engine.wrong_num_args(objv, 2, "?encoding? data");
            };
            let Some(found) = engine.get_encoding(name) else {
                return Status::Error;
            };
            if option == "convertto" {
                let src = data.as_str().as_bytes();
                let mut dst = vec![0u8; src.len() * 4 + 4];
                let n = found.from_utf(src, &mut dst);
                dst.truncate(n);
                engine.set_obj_result(Obj::new_byte_array(dst));
            } else {
                let src = data.get_byte_array();
                let mut dst = vec![0u8; src.len() * 4 + 4];
                let n = found.to_utf(&src, &mut dst);
                dst.truncate(n);
                engine.set_result(String::from_utf8_lossy(&dst).into_owned());
            }
            Status::Ok
        }
        "names" => engine.wrong_num_args(objv, 2, ""),
        other => engine.error(format!(
            "bad option \"{}\": must be convertfrom, convertto, names, or system",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_match() {
        assert!(string_match("*", ""));
        assert!(string_match("a*c", "abbc"));
        assert!(string_match("a?c", "abc"));
        assert!(!string_match("a?c", "ac"));
        assert!(string_match("*b*", "abc"));
        assert!(!string_match("x*", "abc"));
    }
}
