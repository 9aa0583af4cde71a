//! Interoperability - the bridge between host and interpreter
//!
//! Design: conversion is a pure function pair; every operation that
//! touches the interpreter is a method on [`Interp`](crate::interp::Interp)
//! defined next to the machinery it needs.
//!
//! Architecture:
//! - `types.rs` - Cached type tags and value-kind classification
//! - `visited.rs` - Cycle detection for compound conversion
//! - `marshal.rs` - Interpreter ↔ host value conversions
//! - `bundle.rs` - Pre-converted, pinned argument bundles
//! - `call.rs` - Script evaluation and command dispatch
//! - `vars.rs` - Variable access
//! - `reverse.rs` - Interpreter-to-host function calls
//! - `trace.rs` - Variable traces with host callbacks
//! - `encoding.rs` - Encoding conversions
//! - `repr.rs` - Handle debug strings

mod bundle;
mod call;
mod encoding;
mod marshal;
pub(crate) mod repr;
mod reverse;
mod trace;
mod types;
mod vars;
mod visited;

pub use bundle::{ArgBundle, BUNDLE_TYPE_NAME};
pub use call::{make_arg_list, CallArgs};
pub use marshal::{probably_utf8, to_host, to_target};
pub use repr::TOSTRING_BUFSIZ;
pub use trace::trace_name;
pub use types::{TypeTags, ValueKind};
pub use visited::VisitedSet;
