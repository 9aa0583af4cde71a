//! ltcl - bridge between a host scripting runtime and an embedded command
//! interpreter
//!
//! Host code drives the interpreter (scripts, commands, variables) with
//! automatic value conversion; the interpreter calls back into host
//! functions and variable-trace callbacks.

// Core modules
pub mod config;
pub mod errors;
pub mod host;
pub mod interop;
pub mod interp;
pub mod logging;
pub mod module;
pub mod target;

// Re-export commonly used items
pub use config::BridgeConfig;
pub use errors::{BridgeError, ErrorKind, Result};
pub use host::{Host, HostError, HostFunction, HostValue, TableRef, UserData};
pub use interop::{make_arg_list, probably_utf8, to_host, to_target, ArgBundle};
pub use interp::Interp;
pub use module::open;
pub use target::{Engine, Flags, Obj};
