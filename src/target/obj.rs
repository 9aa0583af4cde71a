//! Interpreter values - immutable, reference counted, dual-ported
//!
//! Design: every value has a string representation (computed lazily and
//! cached) and, optionally, a typed internal representation tagged with a
//! registered `ObjType`. Cloning an `Obj` takes a reference; dropping it
//! releases one.

use super::parse;
use core::fmt;
use once_cell::unsync::OnceCell;
use std::borrow::Cow;
use std::rc::Rc;

/// Registered internal-representation tag
#[derive(Debug, PartialEq, Eq)]
pub struct ObjType {
    pub name: &'static str,
}

pub static BOOLEAN_TYPE: ObjType = ObjType { name: "boolean" };
pub static BYTE_ARRAY_TYPE: ObjType = ObjType { name: "bytearray" };
pub static DOUBLE_TYPE: ObjType = ObjType { name: "double" };
pub static INT_TYPE: ObjType = ObjType { name: "int" };
pub static LIST_TYPE: ObjType = ObjType { name: "list" };
pub static STRING_TYPE: ObjType = ObjType { name: "string" };

static REGISTERED_TYPES: [&ObjType; 6] = [
    &BOOLEAN_TYPE,
    &BYTE_ARRAY_TYPE,
    &DOUBLE_TYPE,
    &INT_TYPE,
    &LIST_TYPE,
    &STRING_TYPE,
];

/// Look up a built-in type tag by name
pub fn get_obj_type(name: &str) -> Option<&'static ObjType> {
    REGISTERED_TYPES.iter().copied().find(|t| t.name == name)
}

enum Rep {
    Empty,
    Int(i64),
    Double(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Text,
    List(Vec<Obj>),
    Opaque(&'static ObjType),
}

struct ObjInner {
    rep: Rep,
    string: OnceCell<String>,
}

/// Reference-counted interpreter value
#[derive(Clone)]
pub struct Obj(Rc<ObjInner>);

impl Obj {
    fn from_rep(rep: Rep) -> Self {
        Self(Rc::new(ObjInner {
            rep,
            string: OnceCell::new(),
        }))
    }

    fn with_string(rep: Rep, text: String) -> Self {
        let string = OnceCell::new();
        let _ = string.set(text);
        Self(Rc::new(ObjInner { rep, string }))
    }

    /// Value with no internal representation and an empty string
    pub fn empty() -> Self {
        Self::from_rep(Rep::Empty)
    }

    pub fn new_int(value: i64) -> Self {
        Self::from_rep(Rep::Int(value))
    }

    pub fn new_double(value: f64) -> Self {
        Self::from_rep(Rep::Double(value))
    }

    pub fn new_boolean(value: bool) -> Self {
        Self::from_rep(Rep::Boolean(value))
    }

    pub fn new_byte_array(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_rep(Rep::Bytes(bytes.into()))
    }

    /// Pure string value (no internal representation)
    pub fn new_string(text: impl Into<String>) -> Self {
        Self::with_string(Rep::Text, text.into())
    }

    pub fn new_list(elements: Vec<Obj>) -> Self {
        Self::from_rep(Rep::List(elements))
    }

    /// Value of an extension type only known by its textual form
    pub fn new_opaque(obj_type: &'static ObjType, text: impl Into<String>) -> Self {
        Self::with_string(Rep::Opaque(obj_type), text.into())
    }

    /// Internal representation tag, `None` for pure strings
    pub fn type_ptr(&self) -> Option<&'static ObjType> {
        match self.0.rep {
            Rep::Empty | Rep::Text => None,
            Rep::Int(_) => Some(&INT_TYPE),
            Rep::Double(_) => Some(&DOUBLE_TYPE),
            Rep::Boolean(_) => Some(&BOOLEAN_TYPE),
            Rep::Bytes(_) => Some(&BYTE_ARRAY_TYPE),
            Rep::List(_) => Some(&LIST_TYPE),
            Rep::Opaque(t) => Some(t),
        }
    }

    /// Integer held by an int or boolean representation
    pub fn int_rep(&self) -> Option<i64> {
        match self.0.rep {
            Rep::Int(i) => Some(i),
            Rep::Boolean(b) => Some(b as i64),
            _ => None,
        }
    }

    pub fn double_rep(&self) -> Option<f64> {
        match self.0.rep {
            Rep::Double(d) => Some(d),
            _ => None,
        }
    }

    pub fn byte_array_rep(&self) -> Option<&[u8]> {
        match &self.0.rep {
            Rep::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn list_rep(&self) -> Option<&[Obj]> {
        match &self.0.rep {
            Rep::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// String representation, generated on first use
    pub fn as_str(&self) -> &str {
        self.0.string.get_or_init(|| self.update_string())
    }

    fn update_string(&self) -> String {
        match &self.0.rep {
            Rep::Empty | Rep::Text | Rep::Opaque(_) => String::new(),
            Rep::Int(i) => i.to_string(),
            Rep::Double(d) => format_double(*d),
            Rep::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            Rep::Bytes(bytes) => bytes.iter().map(|&b| char::from(b)).collect(),
            Rep::List(elements) => {
                let mut out = String::new();
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    out.push_str(&parse::quote_element(element.as_str()));
                }
                out
            }
        }
    }

    /// Bytes of a byte-array value, or the string truncated to one byte per char
    pub fn get_byte_array(&self) -> Cow<'_, [u8]> {
        match &self.0.rep {
            Rep::Bytes(b) => Cow::Borrowed(b),
            _ => Cow::Owned(self.as_str().chars().map(|c| c as u32 as u8).collect()),
        }
    }

    pub fn get_int(&self) -> Result<i64, String> {
        if let Some(i) = self.int_rep() {
            return Ok(i);
        }
        parse_int(self.as_str().trim())
            .ok_or_else(|| format!("expected integer but got \"{}\"", self.as_str()))
    }

    pub fn get_double(&self) -> Result<f64, String> {
        match self.0.rep {
            Rep::Double(d) => return Ok(d),
            Rep::Int(i) => return Ok(i as f64),
            Rep::Boolean(b) => return Ok(b as i64 as f64),
            _ => {}
        }
        let text = self.as_str().trim();
        parse_int(text)
            .map(|i| i as f64)
            .or_else(|| text.parse::<f64>().ok())
            .ok_or_else(|| format!("expected floating-point number but got \"{}\"", self.as_str()))
    }

    /// Elements of this value interpreted as a list
    pub fn get_list(&self) -> Result<Vec<Obj>, String> {
        match &self.0.rep {
            Rep::List(elements) => Ok(elements.clone()),
            Rep::Empty => Ok(Vec::new()),
            _ => Ok(parse::split_list(self.as_str())?
                .into_iter()
                .map(Obj::new_string)
                .collect()),
        }
    }

    /// Number of live references to this value
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn is_shared(&self) -> bool {
        self.ref_count() > 1
    }

    pub fn ptr_eq(&self, other: &Obj) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Obj {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.type_ptr().map(|t| t.name).unwrap_or("pure");
        write!(f, "Obj({}: {:?})", ty, self.as_str())
    }
}

impl From<&str> for Obj {
    fn from(text: &str) -> Self {
        Obj::new_string(text)
    }
}

impl From<i64> for Obj {
    fn from(value: i64) -> Self {
        Obj::new_int(value)
    }
}

/// Decimal or `0x` hexadecimal integer, optional sign
fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Shortest round-trip form, always recognisable as a double
pub(crate) fn format_double(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    let text = format!("{}", d);
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        text + ".0"
    }
}
