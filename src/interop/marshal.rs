//! Value marshaling - interpreter values ↔ host values
//!
//! Design: dispatch on a closed `ValueKind` going to the host, on the host
//! value's tag going to the interpreter. Tables become lists through their
//! array region only, with a visited set threaded through the descent.

use super::types::{TypeTags, ValueKind};
use super::visited::VisitedSet;
use crate::errors::{BridgeError, Result};
use crate::host::{HostValue, TableRef};
use crate::logging;
use crate::target::Obj;

const RECURSIVE_TABLE: &str = "can not convert recursive table to target value";

/// Check whether `seq` is made only of well-formed UTF-8 code-unit
/// patterns (1 to 6 byte forms). A zero byte always fails, the
/// interpreter does not accept it inside strings.
pub fn probably_utf8(seq: &[u8]) -> bool {
    let mut pos = 0;
    while pos < seq.len() {
        let lead = seq[pos];
        pos += 1;
        let trailing = match lead {
            0 => return false,
            b if b & 0x80 == 0 => 0,
            b if b & 0xE0 == 0xC0 => 1,
            b if b & 0xF0 == 0xE0 => 2,
            b if b & 0xF8 == 0xF0 => 3,
            b if b & 0xFC == 0xF8 => 4,
            b if b & 0xFE == 0xFC => 5,
            _ => return false,
        };
        if pos + trailing > seq.len() {
            return false;
        }
        if !seq[pos..pos + trailing].iter().all(|&b| b & 0xC0 == 0x80) {
            return false;
        }
        pos += trailing;
    }
    true
}

/// Convert an interpreter value for the host. Never fails; no value at
/// all becomes nil.
pub fn to_host(obj: Option<&Obj>) -> HostValue {
    match obj {
        Some(obj) => obj_to_host(obj, TypeTags::get()),
        None => HostValue::Nil,
    }
}

fn obj_to_host(obj: &Obj, tags: &TypeTags) -> HostValue {
    match ValueKind::classify(obj, tags) {
        ValueKind::Int(i) | ValueKind::Boolean(i) => HostValue::Integer(i),
        ValueKind::Double(d) => HostValue::Number(d),
        ValueKind::ByteArray(bytes) => HostValue::string(bytes),
        ValueKind::List(elements) => {
            HostValue::Table(TableRef::from_values(elements.iter().map(|e| obj_to_host(e, tags))))
        }
        ValueKind::Text(text) => HostValue::string(text),
    }
}

/// Convert a host value for the interpreter
pub fn to_target(value: &HostValue) -> Result<Obj> {
    let mut visited = VisitedSet::new();
    value_to_target(value, &mut visited).map_err(|error| {
        logging::log_conversion_error(&error.to_string());
        error
    })
}

fn value_to_target(value: &HostValue, visited: &mut VisitedSet) -> Result<Obj> {
    match value {
        HostValue::Nil => Ok(Obj::empty()),
        HostValue::Boolean(b) => Ok(Obj::new_boolean(*b)),
        HostValue::Integer(i) => Ok(Obj::new_int(*i)),
        HostValue::Number(n) => Ok(number_to_target(*n)),
        HostValue::String(bytes) => Ok(bytes_to_target(bytes)),
        HostValue::Table(table) => table_to_target(table, visited),
        other => Err(BridgeError::conversion(format!(
            "can not convert host value of type '{}' to target value",
            other.type_name()
        ))),
    }
}

/// Integer when the number survives a round trip through `i64` unchanged
fn number_to_target(n: f64) -> Obj {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    if (-LIMIT..LIMIT).contains(&n) {
        let i = n as i64;
        if (i as f64).to_bits() == n.to_bits() {
            return Obj::new_int(i);
        }
    }
    Obj::new_double(n)
}

fn bytes_to_target(bytes: &[u8]) -> Obj {
    if probably_utf8(bytes) {
        // the heuristic admits 5 and 6 byte forms that are not strings here
        if let Ok(text) = std::str::from_utf8(bytes) {
            return Obj::new_string(text);
        }
    }
    Obj::new_byte_array(bytes)
}

fn table_to_target(table: &TableRef, visited: &mut VisitedSet) -> Result<Obj> {
    let id = table.id();
    if !visited.enter(id) {
        return Err(BridgeError::conversion(RECURSIVE_TABLE));
    }

    let values = table.array_values();
    let mut elements = Vec::with_capacity(values.len());
    for value in &values {
        match value_to_target(value, visited) {
            Ok(obj) => elements.push(obj),
            Err(error) => {
                visited.leave(id);
                return Err(error);
            }
        }
    }

    visited.leave(id);
    Ok(Obj::new_list(elements))
}
