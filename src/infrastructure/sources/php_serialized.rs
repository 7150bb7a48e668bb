//! Minimal reader for PHP `serialize()` output.
//!
//! WordPress plugins keep structured settings in this format. Only the value
//! kinds those payloads use are supported: null, booleans, integers, floats,
//! strings and arrays. Objects and references are rejected.

#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered key/value pairs.
    Array(Vec<(PhpValue, PhpValue)>),
}

impl PhpValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[(PhpValue, PhpValue)]> {
        match self {
            Self::Array(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a string key in an array value.
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        self.as_array()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Renders scalars as text; arrays and null yield `None`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Null | Self::Array(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhpParseError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),

    #[error("unexpected '{found}' at byte {at}")]
    Unexpected { found: char, at: usize },

    #[error("invalid number at byte {0}")]
    InvalidNumber(usize),

    #[error("unsupported value type '{0}'")]
    Unsupported(char),

    #[error("trailing data at byte {0}")]
    TrailingData(usize),

    #[error("arrays nested too deeply")]
    TooDeep,
}

/// Deepest array nesting accepted.
const MAX_DEPTH: usize = 64;

/// Parses a complete serialized value.
pub fn parse(input: &str) -> Result<PhpValue, PhpParseError> {
    let mut parser = Parser {
        bytes: input.trim().as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    if parser.pos != parser.bytes.len() {
        return Err(PhpParseError::TrailingData(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn value(&mut self) -> Result<PhpValue, PhpParseError> {
        let kind = self.next()?;
        match kind {
            b'N' => {
                self.expect(b';')?;
                Ok(PhpValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                let v = self.number_until(b';')?;
                Ok(PhpValue::Bool(v != 0))
            }
            b'i' => {
                self.expect(b':')?;
                Ok(PhpValue::Int(self.number_until(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                let start = self.pos;
                let raw = self.take_until(b';')?;
                raw.parse::<f64>()
                    .map(PhpValue::Float)
                    .map_err(|_| PhpParseError::InvalidNumber(start))
            }
            b's' => {
                self.expect(b':')?;
                let len = self.length_until(b':')?;
                self.expect(b'"')?;
                let end = self
                    .pos
                    .checked_add(len)
                    .ok_or(PhpParseError::UnexpectedEnd(self.bytes.len()))?;
                let slice = self
                    .bytes
                    .get(self.pos..end)
                    .ok_or(PhpParseError::UnexpectedEnd(self.bytes.len()))?;
                let text = String::from_utf8_lossy(slice).into_owned();
                self.pos = end;
                self.expect(b'"')?;
                self.expect(b';')?;
                Ok(PhpValue::Str(text))
            }
            b'a' => {
                self.expect(b':')?;
                let count = self.length_until(b':')?;
                self.expect(b'{')?;
                if self.depth >= MAX_DEPTH {
                    return Err(PhpParseError::TooDeep);
                }
                self.depth += 1;
                let mut entries = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let key = self.value()?;
                    let value = self.value()?;
                    entries.push((key, value));
                }
                self.depth -= 1;
                self.expect(b'}')?;
                Ok(PhpValue::Array(entries))
            }
            other => Err(PhpParseError::Unsupported(char::from(other))),
        }
    }

    fn next(&mut self) -> Result<u8, PhpParseError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(PhpParseError::UnexpectedEnd(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, wanted: u8) -> Result<(), PhpParseError> {
        let at = self.pos;
        let found = self.next()?;
        if found != wanted {
            return Err(PhpParseError::Unexpected {
                found: char::from(found),
                at,
            });
        }
        Ok(())
    }

    fn take_until(&mut self, terminator: u8) -> Result<&str, PhpParseError> {
        let start = self.pos;
        let offset = self.bytes[start..]
            .iter()
            .position(|b| *b == terminator)
            .ok_or(PhpParseError::UnexpectedEnd(self.bytes.len()))?;
        self.pos = start + offset + 1;
        std::str::from_utf8(&self.bytes[start..start + offset])
            .map_err(|_| PhpParseError::InvalidNumber(start))
    }

    fn number_until(&mut self, terminator: u8) -> Result<i64, PhpParseError> {
        let start = self.pos;
        self.take_until(terminator)?
            .parse()
            .map_err(|_| PhpParseError::InvalidNumber(start))
    }

    fn length_until(&mut self, terminator: u8) -> Result<usize, PhpParseError> {
        let start = self.pos;
        self.take_until(terminator)?
            .parse()
            .map_err(|_| PhpParseError::InvalidNumber(start))
    }
}
