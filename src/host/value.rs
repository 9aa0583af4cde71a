//! Host values

use super::function::HostFunction;
use super::table::TableRef;
use core::fmt;
use std::any::Any;
use std::rc::Rc;

/// Opaque host object wrapping any `'static` value
#[derive(Clone)]
pub struct UserData {
    type_name: &'static str,
    data: Rc<dyn Any>,
}

impl UserData {
    pub fn new<T: Any>(type_name: &'static str, value: T) -> Self {
        Self {
            type_name,
            data: Rc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Shared handle to the wrapped value
    pub fn downcast_rc<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.data).downcast::<T>().ok()
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.data) as *const () as usize
    }
}

impl PartialEq for UserData {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for UserData {}

impl std::hash::Hash for UserData {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#x}", self.type_name, self.id())
    }
}

/// A value of the host runtime
#[derive(Clone, Default)]
pub enum HostValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Rc<[u8]>),
    Table(TableRef),
    Function(HostFunction),
    UserData(UserData),
}

impl HostValue {
    /// Byte string value
    pub fn string(bytes: impl AsRef<[u8]>) -> Self {
        HostValue::String(Rc::from(bytes.as_ref()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Boolean(_) => "boolean",
            HostValue::Integer(_) | HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Table(_) => "table",
            HostValue::Function(_) => "function",
            HostValue::UserData(_) => "userdata",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, HostValue::Nil)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, HostValue::Integer(_) | HostValue::Number(_))
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HostValue::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// String contents when they are valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Integer value, accepting floats with an exact integer value
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            HostValue::Integer(i) => Some(i),
            HostValue::Number(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 => {
                Some(n as i64)
            }
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match *self {
            HostValue::Integer(i) => Some(i as f64),
            HostValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            HostValue::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&HostFunction> {
        match self {
            HostValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_userdata(&self) -> Option<&UserData> {
        match self {
            HostValue::UserData(u) => Some(u),
            _ => None,
        }
    }

    /// Strings and numbers as bytes, the way host string coercion does
    pub fn coerce_bytes(&self) -> Option<Vec<u8>> {
        match self {
            HostValue::String(bytes) => Some(bytes.to_vec()),
            HostValue::Integer(_) | HostValue::Number(_) => Some(self.to_string().into_bytes()),
            _ => None,
        }
    }

    /// Truthiness: everything except nil and false
    pub fn truthy(&self) -> bool {
        !matches!(self, HostValue::Nil | HostValue::Boolean(false))
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = format!("{}", n);
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        text + ".0"
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Nil => f.write_str("nil"),
            HostValue::Boolean(b) => write!(f, "{}", b),
            HostValue::Integer(i) => write!(f, "{}", i),
            HostValue::Number(n) => f.write_str(&format_number(*n)),
            HostValue::String(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            HostValue::Table(t) => write!(f, "table: {:#x}", t.id()),
            HostValue::Function(func) => write!(f, "function: {:#x}", func.id().as_u64()),
            HostValue::UserData(u) => write!(f, "{:?}", u),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::String(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            HostValue::Integer(i) => write!(f, "Integer({})", i),
            HostValue::Number(n) => write!(f, "Number({})", n),
            other => write!(f, "{}", other),
        }
    }
}

/// Raw equality: numbers by value, strings by content, the rest by identity
impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        use HostValue::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Number(a), Number(b)) => a == b,
            (Integer(a), Number(b)) | (Number(b), Integer(a)) => *a as f64 == *b,
            (String(a), String(b)) => a == b,
            (Table(a), Table(b)) => a == b,
            (Function(a), Function(b)) => a.id() == b.id(),
            (UserData(a), UserData(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Integer(i)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Integer(i as i64)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::string(s)
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::string(s)
    }
}

impl From<&[u8]> for HostValue {
    fn from(bytes: &[u8]) -> Self {
        HostValue::string(bytes)
    }
}

impl From<TableRef> for HostValue {
    fn from(t: TableRef) -> Self {
        HostValue::Table(t)
    }
}

impl From<HostFunction> for HostValue {
    fn from(f: HostFunction) -> Self {
        HostValue::Function(f)
    }
}

impl From<UserData> for HostValue {
    fn from(u: UserData) -> Self {
        HostValue::UserData(u)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Nil, Into::into)
    }
}
