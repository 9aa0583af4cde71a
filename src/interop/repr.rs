//! Debug strings for handles exposed to the host

use crate::errors::{BridgeError, Result};

/// Size limit for handle representations
pub const TOSTRING_BUFSIZ: usize = 64;

/// Accept `text` if it fits the representation buffer
pub fn bounded(text: String) -> Result<String> {
    if text.len() >= TOSTRING_BUFSIZ {
        return Err(BridgeError::Internal(format!(
            "string representation of {} bytes exceeds {} byte buffer",
            text.len(),
            TOSTRING_BUFSIZ
        )));
    }
    Ok(text)
}
