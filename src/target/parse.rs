//! Script and list syntax
//!
//! Scripts are evaluated directly from source: each command's words are
//! substituted left to right and the command is invoked before the next one
//! is parsed. A word made of a single substitution keeps the substituted
//! value itself instead of a string copy.

use super::engine::{Engine, Status};
use super::flags::Flags;
use super::obj::Obj;
use std::borrow::Cow;

#[inline]
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

#[inline]
fn char_at(src: &str, pos: usize) -> char {
    src[pos..].chars().next().unwrap_or_default()
}

fn hex_value(digits: &str, max: usize) -> (u32, usize) {
    let count = digits
        .bytes()
        .take(max)
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if count == 0 {
        return (0, 0);
    }
    (u32::from_str_radix(&digits[..count], 16).unwrap_or(0), count)
}

/// Decode the backslash sequence at `src[pos]`, returning the character and
/// the number of bytes consumed
pub(crate) fn backslash(src: &str, pos: usize) -> (char, usize) {
    let rest = &src[pos + 1..];
    let Some(c) = rest.chars().next() else {
        return ('\\', 1);
    };
    match c {
        'a' => ('\u{7}', 2),
        'b' => ('\u{8}', 2),
        'f' => ('\u{c}', 2),
        'n' => ('\n', 2),
        'r' => ('\r', 2),
        't' => ('\t', 2),
        'v' => ('\u{b}', 2),
        '\n' => {
            let blanks = rest[1..]
                .bytes()
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            (' ', 2 + blanks)
        }
        'x' | 'u' => {
            let max = if c == 'x' { 2 } else { 4 };
            match hex_value(&rest[1..], max) {
                (_, 0) => (c, 2),
                (value, count) => (char::from_u32(value).unwrap_or('\u{fffd}'), 2 + count),
            }
        }
        '0'..='7' => {
            let count = rest.bytes().take(3).take_while(|b| (b'0'..=b'7').contains(b)).count();
            let value = u32::from_str_radix(&rest[..count], 8).unwrap_or(0) & 0xff;
            (char::from_u32(value).unwrap_or_default(), 1 + count)
        }
        other => (other, 1 + other.len_utf8()),
    }
}

/// Index of the brace closing the one at `bytes[open]`
pub(crate) fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn braces_balanced(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
        i += 1;
    }
    depth == 0
}

/// Quote `text` so that it parses back as exactly one list element
pub(crate) fn quote_element(text: &str) -> Cow<'_, str> {
    if text.is_empty() {
        return Cow::Borrowed("{}");
    }
    let special = text.starts_with('#')
        || text.bytes().any(|b| {
            is_space(b) || matches!(b, b'{' | b'}' | b'[' | b']' | b'$' | b'"' | b'\\' | b';')
        });
    if !special {
        return Cow::Borrowed(text);
    }
    if braces_balanced(text) && !text.ends_with('\\') {
        return Cow::Owned(format!("{{{}}}", text));
    }

    let mut out = String::with_capacity(text.len() * 2);
    if text.starts_with('#') {
        out.push('\\');
    }
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            ' ' | '{' | '}' | '[' | ']' | '$' | '"' | '\\' | ';' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn word_after(src: &str, pos: usize) -> &str {
    let end = src[pos..]
        .bytes()
        .position(is_space)
        .map_or(src.len(), |n| pos + n);
    &src[pos..end]
}

/// Split a string into its list elements
pub(crate) fn split_list(src: &str) -> Result<Vec<String>, String> {
    let bytes = src.as_bytes();
    let mut elements = Vec::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && is_space(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Ok(elements);
        }

        match bytes[pos] {
            b'{' => {
                let close = matching_brace(bytes, pos)
                    .ok_or_else(|| "unmatched open brace in list".to_string())?;
                elements.push(src[pos + 1..close].to_string());
                pos = close + 1;
                if pos < bytes.len() && !is_space(bytes[pos]) {
                    return Err(format!(
                        "list element in braces followed by \"{}\" instead of space",
                        word_after(src, pos)
                    ));
                }
            }
            b'"' => {
                let mut text = String::new();
                pos += 1;
                loop {
                    if pos >= bytes.len() {
                        return Err("unmatched open quote in list".to_string());
                    }
                    match bytes[pos] {
                        b'"' => {
                            pos += 1;
                            break;
                        }
                        b'\\' => {
                            let (c, used) = backslash(src, pos);
                            text.push(c);
                            pos += used;
                        }
                        _ => {
                            let c = char_at(src, pos);
                            text.push(c);
                            pos += c.len_utf8();
                        }
                    }
                }
                if pos < bytes.len() && !is_space(bytes[pos]) {
                    return Err(format!(
                        "list element in quotes followed by \"{}\" instead of space",
                        word_after(src, pos)
                    ));
                }
                elements.push(text);
            }
            _ => {
                let mut text = String::new();
                while pos < bytes.len() && !is_space(bytes[pos]) {
                    if bytes[pos] == b'\\' {
                        let (c, used) = backslash(src, pos);
                        text.push(c);
                        pos += used;
                    } else {
                        let c = char_at(src, pos);
                        text.push(c);
                        pos += c.len_utf8();
                    }
                }
                elements.push(text);
            }
        }
    }
}

/// Accumulates the pieces of one word
#[derive(Default)]
struct WordBuilder {
    pieces: usize,
    single: Option<Obj>,
    text: String,
}

impl WordBuilder {
    fn push_obj(&mut self, obj: Obj) {
        self.pieces += 1;
        self.text.push_str(obj.as_str());
        if self.pieces == 1 {
            self.single = Some(obj);
        }
    }

    fn push_char(&mut self, c: char) {
        self.pieces += 1;
        self.text.push(c);
    }

    fn finish(self) -> Obj {
        match (self.pieces, self.single) {
            (1, Some(obj)) => obj,
            _ => Obj::new_string(self.text),
        }
    }
}

/// Evaluator over one script source
pub(crate) struct ScriptParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ScriptParser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Run commands until the end of input, or through the closing `]` of a
    /// command substitution when `nested`
    pub(crate) fn eval(&mut self, engine: &Engine, nested: bool) -> Status {
        engine.reset_result();
        loop {
            self.skip_separators();
            let Some(b) = self.peek() else {
                if nested {
                    return engine.error("missing close-bracket");
                }
                return Status::Ok;
            };
            if nested && b == b']' {
                self.pos += 1;
                return Status::Ok;
            }
            if b == b'#' {
                self.skip_comment();
                continue;
            }

            let words = match self.parse_command(engine, nested) {
                Ok(words) => words,
                Err(status) => return status,
            };
            if words.is_empty() {
                continue;
            }
            let status = engine.invoke(&words);
            if status != Status::Ok {
                return status;
            }
        }
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if is_space(b) || b == b';' {
                self.pos += 1;
            } else if b == b'\\' && self.bytes.get(self.pos + 1) == Some(&b'\n') {
                self.pos += 2;
            } else {
                break;
            }
        }
    }

    fn skip_blanks(&mut self) {
        while let Some(b) = self.peek() {
            if b != b'\n' && is_space(b) {
                self.pos += 1;
            } else if b == b'\\' && self.bytes.get(self.pos + 1) == Some(&b'\n') {
                self.pos += 2;
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'\n' => break,
                _ => {}
            }
        }
    }

    fn parse_command(&mut self, engine: &Engine, nested: bool) -> Result<Vec<Obj>, Status> {
        let mut words = Vec::new();
        loop {
            self.skip_blanks();
            match self.peek() {
                None => break,
                Some(b'\n') | Some(b';') => {
                    self.pos += 1;
                    break;
                }
                Some(b']') if nested => break,
                Some(_) => words.push(self.parse_word(engine, nested)?),
            }
        }
        Ok(words)
    }

    fn check_word_end(&self, engine: &Engine, nested: bool, message: &str) -> Result<(), Status> {
        match self.peek() {
            None => Ok(()),
            Some(b) if is_space(b) || b == b';' || (nested && b == b']') => Ok(()),
            Some(_) => Err(engine.error(message)),
        }
    }

    fn parse_word(&mut self, engine: &Engine, nested: bool) -> Result<Obj, Status> {
        match self.peek() {
            Some(b'{') => {
                let close = matching_brace(self.bytes, self.pos)
                    .ok_or_else(|| engine.error("missing close-brace"))?;
                let text = &self.src[self.pos + 1..close];
                self.pos = close + 1;
                self.check_word_end(engine, nested, "extra characters after close-brace")?;
                Ok(Obj::new_string(text))
            }
            Some(b'"') => {
                self.pos += 1;
                let mut word = WordBuilder::default();
                loop {
                    match self.peek() {
                        None => return Err(engine.error("missing \"")),
                        Some(b'"') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => self.parse_piece(engine, &mut word)?,
                    }
                }
                self.check_word_end(engine, nested, "extra characters after close-quote")?;
                Ok(word.finish())
            }
            _ => {
                let mut word = WordBuilder::default();
                while let Some(b) = self.peek() {
                    if is_space(b) || b == b';' || (nested && b == b']') {
                        break;
                    }
                    if b == b'\\' && self.bytes.get(self.pos + 1) == Some(&b'\n') {
                        break;
                    }
                    self.parse_piece(engine, &mut word)?;
                }
                Ok(word.finish())
            }
        }
    }

    fn parse_piece(&mut self, engine: &Engine, word: &mut WordBuilder) -> Result<(), Status> {
        match self.peek() {
            Some(b'$') => match self.parse_variable(engine)? {
                Some(value) => word.push_obj(value),
                None => word.push_char('$'),
            },
            Some(b'[') => {
                self.pos += 1;
                let status = self.eval(engine, true);
                if status != Status::Ok {
                    return Err(status);
                }
                word.push_obj(engine.obj_result());
            }
            Some(b'\\') => {
                let (c, used) = backslash(self.src, self.pos);
                word.push_char(c);
                self.pos += used;
            }
            Some(_) => {
                let c = char_at(self.src, self.pos);
                word.push_char(c);
                self.pos += c.len_utf8();
            }
            None => {}
        }
        Ok(())
    }

    /// `$name`, `$name(index)` or `${name}`; `None` for a lone `$`
    fn parse_variable(&mut self, engine: &Engine) -> Result<Option<Obj>, Status> {
        let src = self.src;
        self.pos += 1;

        if self.peek() == Some(b'{') {
            let close = src[self.pos..]
                .find('}')
                .ok_or_else(|| engine.error("missing close-brace for variable name"))?;
            let name = &src[self.pos + 1..self.pos + close];
            self.pos += close + 1;
            return engine
                .get_var2(name, None, Flags::LEAVE_ERR_MSG)
                .map(Some)
                .ok_or(Status::Error);
        }

        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else if b == b':' && self.bytes.get(self.pos + 1) == Some(&b':') {
                self.pos += 2;
            } else {
                break;
            }
        }
        let name = &src[start..self.pos];

        if self.peek() == Some(b'(') {
            self.pos += 1;
            let mut index = WordBuilder::default();
            loop {
                match self.peek() {
                    None => return Err(engine.error("missing )")),
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => self.parse_piece(engine, &mut index)?,
                }
            }
            let key = index.finish();
            return engine
                .get_var2(name, Some(key.as_str()), Flags::LEAVE_ERR_MSG)
                .map(Some)
                .ok_or(Status::Error);
        }

        if name.is_empty() {
            return Ok(None);
        }
        engine
            .get_var2(name, None, Flags::LEAVE_ERR_MSG)
            .map(Some)
            .ok_or(Status::Error)
    }
}
