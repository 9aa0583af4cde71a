//! Encoding conversions through the interpreter's codec registry

use super::marshal;
use crate::errors::{BridgeError, Result};
use crate::host::HostValue;
use crate::interp::Interp;
use crate::target::{Encoding, Engine};

/// Scratch space per input byte, enough for every registered codec
const SCRATCH_FACTOR: usize = 4;

fn resolve(engine: &Engine, name: Option<&str>) -> Result<Encoding> {
    engine
        .get_encoding(name)
        .ok_or_else(|| BridgeError::Encoding(engine.string_result()))
}

fn convert(src: &[u8], f: impl FnOnce(&[u8], &mut [u8]) -> usize) -> Vec<u8> {
    let mut dst = vec![0u8; src.len() * SCRATCH_FACTOR + 1];
    let written = f(src, &mut dst);
    dst.truncate(written);
    dst
}

impl Interp {
    /// Convert UTF-8 `text` to `encoding` (the system encoding when `None`)
    pub fn to_external(&self, text: &[u8], encoding: Option<&str>) -> Result<Vec<u8>> {
        let engine = self.live_engine()?;
        let encoding = resolve(engine, encoding)?;
        Ok(convert(text, |src, dst| engine.utf_to_external(Some(&encoding), src, dst)))
    }

    /// Convert `bytes` from `encoding` (the system encoding when `None`) to UTF-8
    pub fn to_host_encoding(&self, bytes: &[u8], encoding: Option<&str>) -> Result<Vec<u8>> {
        let engine = self.live_engine()?;
        let encoding = resolve(engine, encoding)?;
        Ok(convert(bytes, |src, dst| engine.external_to_utf(Some(&encoding), src, dst)))
    }

    /// Names of the available encodings as a host sequence
    pub fn list_encodings(&self) -> Result<HostValue> {
        let engine = self.live_engine()?;
        engine.get_encoding_names();
        Ok(marshal::to_host(Some(&engine.obj_result())))
    }
}
