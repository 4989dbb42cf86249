//! RESP (Redis Serialization Protocol) codec.
//!
//! Requests arrive as arrays of bulk strings and are decoded into a [`Command`].
//! Replies are built as [`RespValue`]s and encoded back to bytes. Decoding is
//! incremental: [`CommandDecoder`] takes complete elements off the read buffer
//! and returns `Ok(None)` until the whole request is in, so the caller can
//! append more bytes and call it again.

use std::mem;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Largest bulk string accepted from a client (same limit as Redis).
pub const MAX_BULK_LENGTH: usize = 512 * 1024 * 1024;
/// Largest number of elements accepted in a request array.
pub const MAX_ARRAY_LENGTH: usize = 1024 * 1024;
/// Digits allowed in a length header; `u64::MAX` has 20.
const MAX_LENGTH_DIGITS: usize = 20;
/// Upper bound on the argument vector reserved from an array header, before
/// any element has arrived.
const PREALLOCATED_ELEMENTS: usize = 1024;

/// Fatal decoding errors. Any of these means the byte stream can no longer be
/// trusted and the connection has to be closed.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("expected '{expected}', got '{found}'")]
    UnexpectedByte { expected: char, found: char },
    #[error("invalid length prefix")]
    InvalidLength,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("bulk string length {0} exceeds limit")]
    BulkTooLong(usize),
    #[error("array length {0} exceeds limit")]
    ArrayTooLong(usize),
    #[error("empty command")]
    EmptyCommand,
    #[error("missing CRLF terminator")]
    MissingTerminator,
    #[error("invalid UTF-8 in simple string")]
    InvalidUtf8,
}

impl RespError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

/// A request decoded from the wire: the command name followed by its arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct Command {
    pub name: Bytes,
    pub args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: impl Into<Bytes>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Builds the request frame a client would send for this command.
    pub fn to_resp(&self) -> RespValue {
        let mut elements = Vec::with_capacity(self.args.len() + 1);
        elements.push(RespValue::BulkString(self.name.clone()));
        elements.extend(self.args.iter().cloned().map(RespValue::BulkString));

        RespValue::Array(elements)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn encode_array_from_bytes<I>(items: I) -> RespValue
    where
        I: IntoIterator<Item = Bytes>,
    {
        RespValue::Array(items.into_iter().map(RespValue::BulkString).collect())
    }

    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(64);
        self.encode_to(&mut buffer);
        buffer.freeze()
    }

    pub fn encode_to(&self, buffer: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buffer.put_u8(b'+');
                buffer.put_slice(s.as_bytes());
                buffer.put_slice(b"\r\n");
            }
            RespValue::Error(e) => {
                buffer.put_u8(b'-');
                buffer.put_slice(e.as_bytes());
                buffer.put_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buffer.put_u8(b':');
                buffer.put_slice(n.to_string().as_bytes());
                buffer.put_slice(b"\r\n");
            }
            RespValue::BulkString(data) => {
                buffer.put_u8(b'$');
                buffer.put_slice(data.len().to_string().as_bytes());
                buffer.put_slice(b"\r\n");
                buffer.put_slice(data);
                buffer.put_slice(b"\r\n");
            }
            RespValue::Null => buffer.put_slice(b"$-1\r\n"),
            RespValue::Array(elements) => {
                buffer.put_u8(b'*');
                buffer.put_slice(elements.len().to_string().as_bytes());
                buffer.put_slice(b"\r\n");

                for element in elements {
                    element.encode_to(buffer);
                }
            }
        }
    }

    /// Decodes a single reply frame of any kind. Used on the client side of the
    /// protocol; the server only ever decodes requests with [`CommandDecoder`].
    pub fn decode(buffer: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
        let mut parser = Parser::new(&buffer[..]);

        match parser.parse_value()? {
            Some(value) => Ok(Some((value, parser.position))),
            None => Ok(None),
        }
    }
}

/// Decodes requests out of a connection's read buffer.
///
/// Bulk strings are split off the buffer as soon as they are complete, so a
/// request arriving over many reads is parsed once rather than from its first
/// byte on every attempt. The decoder remembers how far into the current
/// request it got; feed it the same buffer after every read.
#[derive(Debug, Default)]
pub struct CommandDecoder {
    /// Element count announced by the array header of the request in progress
    expected: Option<usize>,
    elements: Vec<Bytes>,
    /// Payload bytes held in `elements`
    held: usize,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload bytes taken off the buffer for a request that is not complete yet.
    pub fn held_len(&self) -> usize {
        self.held
    }

    /// Consumes as much of `buffer` as it can. Returns the next command once
    /// all of its elements have arrived, `Ok(None)` while more bytes are
    /// needed.
    pub fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<Command>, RespError> {
        let expected = match self.expected {
            Some(expected) => expected,
            None => {
                let mut parser = Parser::new(&buffer[..]);

                let Some(length) = parser.read_length(b'*', MAX_ARRAY_LENGTH)? else {
                    return Ok(None);
                };

                if length == 0 {
                    return Err(RespError::EmptyCommand);
                }

                let header = parser.position;
                buffer.advance(header);

                self.expected = Some(length);
                self.elements = Vec::with_capacity(length.min(PREALLOCATED_ELEMENTS));
                length
            }
        };

        while self.elements.len() < expected {
            let mut parser = Parser::new(&buffer[..]);

            let Some(length) = parser.read_length(b'$', MAX_BULK_LENGTH)? else {
                return Ok(None);
            };

            let header = parser.position;
            if buffer.len() < header + length + 2 {
                return Ok(None);
            }

            if &buffer[header + length..header + length + 2] != b"\r\n" {
                return Err(RespError::MissingTerminator);
            }

            buffer.advance(header);
            self.elements.push(buffer.split_to(length).freeze());
            buffer.advance(2);
            self.held += length;
        }

        self.expected = None;
        self.held = 0;
        let mut elements = mem::take(&mut self.elements);
        let name = elements.remove(0);

        Ok(Some(Command {
            name,
            args: elements,
        }))
    }
}

struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn read_line(&mut self) -> Option<&'a [u8]> {
        let remaining = &self.data[self.position..];
        let end = remaining.windows(2).position(|window| window == b"\r\n")?;
        self.position += end + 2;

        Some(&remaining[..end])
    }

    fn expect_prefix(&mut self, expected: u8) -> Result<Option<()>, RespError> {
        let Some(&found) = self.data.get(self.position) else {
            return Ok(None);
        };

        if found != expected {
            return Err(RespError::UnexpectedByte {
                expected: expected as char,
                found: found as char,
            });
        }

        self.position += 1;
        Ok(Some(()))
    }

    /// Reads a `<prefix><digits>\r\n` header. Bytes are checked as they
    /// arrive, so a malformed header fails before its CRLF shows up.
    fn read_length(&mut self, prefix: u8, limit: usize) -> Result<Option<usize>, RespError> {
        if self.expect_prefix(prefix)?.is_none() {
            return Ok(None);
        }

        let mut length = 0usize;
        let mut digits = 0;

        loop {
            let Some(&byte) = self.data.get(self.position) else {
                return Ok(None);
            };

            match byte {
                b'0'..=b'9' if digits < MAX_LENGTH_DIGITS => {
                    length = length
                        .checked_mul(10)
                        .and_then(|length| length.checked_add((byte - b'0') as usize))
                        .ok_or(RespError::InvalidLength)?;
                    digits += 1;
                    self.position += 1;
                }
                b'\r' if digits > 0 => match self.data.get(self.position + 1) {
                    None => return Ok(None),
                    Some(b'\n') => {
                        self.position += 2;
                        break;
                    }
                    Some(_) => return Err(RespError::InvalidLength),
                },
                _ => return Err(RespError::InvalidLength),
            }
        }

        if length > limit {
            return Err(match prefix {
                b'*' => RespError::ArrayTooLong(length),
                _ => RespError::BulkTooLong(length),
            });
        }

        Ok(Some(length))
    }

    fn read_bulk(&mut self) -> Result<Option<Bytes>, RespError> {
        let Some(length) = self.read_length(b'$', MAX_BULK_LENGTH)? else {
            return Ok(None);
        };

        if self.data.len() < self.position + length + 2 {
            return Ok(None);
        }

        let payload = &self.data[self.position..self.position + length];
        self.position += length;

        if &self.data[self.position..self.position + 2] != b"\r\n" {
            return Err(RespError::MissingTerminator);
        }
        self.position += 2;

        Ok(Some(Bytes::copy_from_slice(payload)))
    }

    fn parse_value(&mut self) -> Result<Option<RespValue>, RespError> {
        let Some(&prefix) = self.data.get(self.position) else {
            return Ok(None);
        };

        match prefix {
            b'+' | b'-' => {
                self.position += 1;
                let Some(line) = self.read_line() else {
                    return Ok(None);
                };
                let text = std::str::from_utf8(line)
                    .map_err(|_| RespError::InvalidUtf8)?
                    .to_string();

                if prefix == b'+' {
                    Ok(Some(RespValue::SimpleString(text)))
                } else {
                    Ok(Some(RespValue::Error(text)))
                }
            }
            b':' => {
                self.position += 1;
                let Some(line) = self.read_line() else {
                    return Ok(None);
                };
                let value = std::str::from_utf8(line)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or(RespError::InvalidInteger)?;

                Ok(Some(RespValue::Integer(value)))
            }
            b'$' => {
                let rest = &self.data[self.position..];
                if rest.starts_with(b"$-1\r\n") {
                    self.position += 5;
                    return Ok(Some(RespValue::Null));
                }
                if b"$-1\r\n".starts_with(rest) {
                    return Ok(None);
                }

                Ok(self.read_bulk()?.map(RespValue::BulkString))
            }
            b'*' => {
                let Some(length) = self.read_length(b'*', MAX_ARRAY_LENGTH)? else {
                    return Ok(None);
                };

                let mut elements = Vec::with_capacity(length.min(PREALLOCATED_ELEMENTS));
                for _ in 0..length {
                    let Some(element) = self.parse_value()? else {
                        return Ok(None);
                    };
                    elements.push(element);
                }

                Ok(Some(RespValue::Array(elements)))
            }
            other => Err(RespError::UnexpectedByte {
                expected: '*',
                found: other as char,
            }),
        }
    }
}
