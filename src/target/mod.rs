//! Embedded command interpreter - the target side of the bridge
//!
//! Design: string-based command language with dual-ported values. The
//! bridge only uses the accessor API exported here.
//!
//! Architecture:
//! - `obj.rs` - Reference-counted values and their type tags
//! - `flags.rs` - Evaluation, variable and trace flag bits
//! - `parse.rs` - Script evaluation and list syntax
//! - `engine.rs` - Commands, variables, traces, result register, lifetime
//! - `commands.rs` - Built-in commands
//! - `encoding.rs` - Encoding registry and conversions
//! - `preserve.rs` - RAII preserve/release guard

mod commands;
mod encoding;
mod engine;
mod flags;
mod obj;
mod parse;
mod preserve;

pub use encoding::{lookup as lookup_encoding, names as encoding_names, register_encoding, Codec, Encoding};
pub use engine::{CmdDeleteProc, Engine, ObjCmdProc, SavedResult, Status, VarTraceProc, DEFAULT_MAX_NESTING};
pub use flags::Flags;
pub use obj::{get_obj_type, Obj, ObjType};
pub use preserve::PreserveGuard;
