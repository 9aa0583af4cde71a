//! Type tags and value kinds for conversion dispatch
//!
//! The interpreter's built-in type tags are looked up once per process and
//! shared by every interpreter handle.

use crate::target::{get_obj_type, Obj, ObjType};
use once_cell::sync::OnceCell;

static TYPE_TAGS: OnceCell<TypeTags> = OnceCell::new();

/// Built-in type tags of the interpreter; a tag the interpreter does not
/// register stays `None` and never matches
#[derive(Debug, Clone, Copy)]
pub struct TypeTags {
    pub boolean: Option<&'static ObjType>,
    pub byte_array: Option<&'static ObjType>,
    pub double: Option<&'static ObjType>,
    pub int: Option<&'static ObjType>,
    pub list: Option<&'static ObjType>,
    pub string: Option<&'static ObjType>,
}

impl TypeTags {
    fn lookup() -> Self {
        Self {
            boolean: get_obj_type("boolean"),
            byte_array: get_obj_type("bytearray"),
            double: get_obj_type("double"),
            int: get_obj_type("int"),
            list: get_obj_type("list"),
            string: get_obj_type("string"),
        }
    }

    /// Process-wide tags, computed on first use
    pub fn get() -> &'static TypeTags {
        TYPE_TAGS.get_or_init(Self::lookup)
    }

    pub fn is_initialized() -> bool {
        TYPE_TAGS.get().is_some()
    }
}

#[inline]
fn same_tag(tag: Option<&'static ObjType>, actual: &'static ObjType) -> bool {
    tag.map_or(false, |tag| core::ptr::eq(tag, actual))
}

/// Closed set of value shapes the converter distinguishes
#[derive(Debug, Clone, Copy)]
pub enum ValueKind<'a> {
    Int(i64),
    Double(f64),
    /// Carried to the host as the integer 0 or 1
    Boolean(i64),
    ByteArray(&'a [u8]),
    List(&'a [Obj]),
    /// Native strings and every other tag go through the string form
    Text(&'a str),
}

impl<'a> ValueKind<'a> {
    pub fn classify(obj: &'a Obj, tags: &TypeTags) -> Self {
        let Some(actual) = obj.type_ptr() else {
            return Self::Text(obj.as_str());
        };

        if same_tag(tags.int, actual) {
            if let Some(i) = obj.int_rep() {
                return Self::Int(i);
            }
        } else if same_tag(tags.double, actual) {
            if let Some(d) = obj.double_rep() {
                return Self::Double(d);
            }
        } else if same_tag(tags.boolean, actual) {
            if let Some(b) = obj.int_rep() {
                return Self::Boolean(b);
            }
        } else if same_tag(tags.byte_array, actual) {
            if let Some(bytes) = obj.byte_array_rep() {
                return Self::ByteArray(bytes);
            }
        } else if same_tag(tags.list, actual) {
            if let Some(elements) = obj.list_rep() {
                return Self::List(elements);
            }
        }

        Self::Text(obj.as_str())
    }
}
