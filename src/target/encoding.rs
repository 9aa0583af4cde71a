//! Character encodings known to the interpreter
//!
//! The registry is process wide. Conversions write into a caller-supplied
//! buffer and stop at the last character that fits completely.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Conversion routine behind an encoding name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    Utf8,
    Iso8859_1,
    Ascii,
    Identity,
    Unicode,
}

/// Handle to a registered encoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoding {
    name: String,
    codec: Codec,
}

static REGISTRY: Lazy<RwLock<BTreeMap<String, Codec>>> = Lazy::new(|| {
    let mut table = BTreeMap::new();
    table.insert("utf-8".to_string(), Codec::Utf8);
    table.insert("iso8859-1".to_string(), Codec::Iso8859_1);
    table.insert("ascii".to_string(), Codec::Ascii);
    table.insert("identity".to_string(), Codec::Identity);
    table.insert("unicode".to_string(), Codec::Unicode);
    RwLock::new(table)
});

/// Make `name` available as an alias for `codec`
pub fn register_encoding(name: &str, codec: Codec) {
    REGISTRY.write().insert(name.to_string(), codec);
}

pub fn lookup(name: &str) -> Option<Encoding> {
    REGISTRY.read().get(name).map(|&codec| Encoding {
        name: name.to_string(),
        codec,
    })
}

/// Registered encoding names, sorted
pub fn names() -> Vec<String> {
    REGISTRY.read().keys().cloned().collect()
}

/// Decode possibly malformed UTF-8; invalid bytes map to the code point of
/// the same value
fn decode_lenient(src: &[u8], mut each: impl FnMut(char) -> bool) {
    let mut rest = src;
    while !rest.is_empty() {
        let (valid, skip) = match std::str::from_utf8(rest) {
            Ok(text) => (text, 0),
            Err(e) => {
                let (head, _) = rest.split_at(e.valid_up_to());
                // valid_up_to guarantees the prefix is well formed
                (std::str::from_utf8(head).unwrap_or_default(), 1)
            }
        };
        for c in valid.chars() {
            if !each(c) {
                return;
            }
        }
        let consumed = valid.len();
        if skip == 1 && !each(char::from(rest[consumed])) {
            return;
        }
        rest = &rest[consumed + skip..];
    }
}

/// Appends encoded bytes while they fit
struct Sink<'a> {
    dst: &'a mut [u8],
    len: usize,
}

impl Sink<'_> {
    fn put(&mut self, bytes: &[u8]) -> bool {
        if self.len + bytes.len() > self.dst.len() {
            return false;
        }
        self.dst[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        true
    }

    fn put_char(&mut self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.put(c.encode_utf8(&mut buf).as_bytes())
    }
}

impl Encoding {
    pub(crate) fn utf8() -> Self {
        Self {
            name: "utf-8".to_string(),
            codec: Codec::Utf8,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Convert interpreter text (UTF-8) into this encoding
    pub fn from_utf(&self, src: &[u8], dst: &mut [u8]) -> usize {
        let mut sink = Sink { dst, len: 0 };
        match self.codec {
            Codec::Identity => {
                let n = src.len().min(sink.dst.len());
                sink.put(&src[..n]);
            }
            Codec::Utf8 => decode_lenient(src, |c| sink.put_char(c)),
            Codec::Iso8859_1 => decode_lenient(src, |c| {
                let b = u8::try_from(u32::from(c)).unwrap_or(b'?');
                sink.put(&[b])
            }),
            Codec::Ascii => decode_lenient(src, |c| {
                let b = if c.is_ascii() { c as u8 } else { b'?' };
                sink.put(&[b])
            }),
            Codec::Unicode => decode_lenient(src, |c| {
                let mut units = [0u16; 2];
                c.encode_utf16(&mut units)
                    .iter()
                    .all(|unit| sink.put(&unit.to_ne_bytes()))
            }),
        }
        sink.len
    }

    /// Convert bytes in this encoding into interpreter text (UTF-8)
    pub fn to_utf(&self, src: &[u8], dst: &mut [u8]) -> usize {
        let mut sink = Sink { dst, len: 0 };
        match self.codec {
            Codec::Identity => {
                let n = src.len().min(sink.dst.len());
                sink.put(&src[..n]);
            }
            Codec::Utf8 => decode_lenient(src, |c| sink.put_char(c)),
            Codec::Iso8859_1 => {
                for &b in src {
                    if !sink.put_char(char::from(b)) {
                        break;
                    }
                }
            }
            Codec::Ascii => {
                for &b in src {
                    let c = if b.is_ascii() { char::from(b) } else { '?' };
                    if !sink.put_char(c) {
                        break;
                    }
                }
            }
            Codec::Unicode => {
                let units = src
                    .chunks_exact(2)
                    .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]));
                for c in char::decode_utf16(units) {
                    if !sink.put_char(c.unwrap_or('\u{fffd}')) {
                        break;
                    }
                }
            }
        }
        sink.len
    }
}
