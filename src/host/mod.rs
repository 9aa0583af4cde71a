//! Host runtime model - values, tables, functions and the global namespace
//!
//! Architecture:
//! - `value.rs` - Tagged host values and userdata
//! - `table.rs` - Tables with array and map regions
//! - `function.rs` - Callable values with stable identities
//! - `state.rs` - Global namespace and calls

mod function;
mod state;
mod table;
mod value;

pub use function::{FunctionId, HostFnProc, HostFunction};
pub use state::Host;
pub use table::{Table, TableKey, TableRef};
pub use value::{HostValue, UserData};

use core::fmt;

/// Error raised on the host side; carries the message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HostError {}

pub type HostResult<T> = Result<T, HostError>;
