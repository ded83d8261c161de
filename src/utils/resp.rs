//! RESP (Redis Serialization Protocol) encoder and decoder
//!
//! Requests are always encoded as arrays of bulk strings. Replies are decoded
//! one value at a time from any buffered byte stream, so the codec can be
//! driven by a socket or by a canned `Cursor` in tests.

use std::io::{BufRead, Read};

use super::error::{ProtocolError, Result};

/// RESP value types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple string (+OK\r\n)
    SimpleString(String),
    /// Error (-ERR message\r\n)
    Error(String),
    /// Integer (:1000\r\n)
    Integer(i64),
    /// Bulk string ($6\r\nfoobar\r\n)
    BulkString(Vec<u8>),
    /// Null bulk string ($-1\r\n)
    Null,
    /// Array (*2\r\n...)
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Check for the literal `+OK` status
    pub fn is_ok(&self) -> bool {
        matches!(self, RespValue::SimpleString(s) if s == "OK")
    }

    /// Turn an error reply into `ProtocolError::ServerError`, including one
    /// nested at any depth inside an array
    pub fn into_result(self) -> Result<RespValue> {
        match self.first_error() {
            Some(e) => Err(ProtocolError::ServerError(e.to_string()).into()),
            None => Ok(self),
        }
    }

    fn first_error(&self) -> Option<&str> {
        match self {
            RespValue::Error(e) => Some(e),
            RespValue::Array(elements) => elements.iter().find_map(RespValue::first_error),
            _ => None,
        }
    }

    /// Render a scalar reply as text. Integers are formatted in decimal.
    pub fn to_text(&self) -> Option<String> {
        match self {
            RespValue::SimpleString(s) => Some(s.clone()),
            RespValue::BulkString(b) => Some(String::from_utf8_lossy(b).into_owned()),
            RespValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

/// RESP encoder with pre-allocated buffer
pub struct RespEncoder {
    buf: Vec<u8>,
}

impl RespEncoder {
    /// Create new encoder with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Clear buffer for reuse
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Get encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Encode a command as RESP array
    /// Each argument is encoded as a bulk string
    pub fn encode_command(&mut self, args: &[&[u8]]) {
        // Array header: *<count>\r\n
        self.buf.push(b'*');
        self.write_int(args.len() as i64);
        self.buf.extend_from_slice(b"\r\n");

        // Each argument as bulk string: $<len>\r\n<data>\r\n
        for arg in args {
            self.buf.push(b'$');
            self.write_int(arg.len() as i64);
            self.buf.extend_from_slice(b"\r\n");
            self.buf.extend_from_slice(arg);
            self.buf.extend_from_slice(b"\r\n");
        }
    }

    /// Encode a command from string slices.
    /// Lengths are byte lengths of the UTF-8 form.
    pub fn encode_command_str(&mut self, args: &[&str]) {
        let byte_args: Vec<&[u8]> = args.iter().map(|s| s.as_bytes()).collect();
        self.encode_command(&byte_args);
    }

    #[inline]
    fn write_int(&mut self, value: i64) {
        let mut buffer = itoa::Buffer::new();
        let s = buffer.format(value);
        self.buf.extend_from_slice(s.as_bytes());
    }
}

/// Cap on pre-allocation for arrays so a bogus count cannot exhaust memory
const MAX_PREALLOC_ELEMENTS: usize = 1024;

/// Largest bulk payload accepted, matching the server's `proto-max-bulk-len` default
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Cap on pre-allocation for bulk payloads; larger ones grow as bytes arrive
const MAX_PREALLOC_BULK: usize = 64 * 1024;

/// RESP decoder for streaming reads
pub struct RespDecoder<R> {
    reader: R,
    line_buf: Vec<u8>,
}

impl<R: BufRead> RespDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: Vec::with_capacity(256),
        }
    }

    /// Decode next RESP value from stream
    pub fn decode(&mut self) -> Result<RespValue> {
        self.read_line()?;

        let Some((&type_byte, content)) = self.line_buf.split_first() else {
            return Err(ProtocolError::Parse("Empty reply line".to_string()).into());
        };

        match type_byte {
            b'+' => Ok(RespValue::SimpleString(
                String::from_utf8_lossy(content).into_owned(),
            )),
            b'-' => Ok(RespValue::Error(String::from_utf8_lossy(content).into_owned())),
            b':' => Ok(RespValue::Integer(parse_int(content, "integer")?)),
            b'$' => {
                let len = parse_int(content, "bulk string length")?;
                if len == -1 {
                    return Ok(RespValue::Null);
                }
                if !(0..=MAX_BULK_LEN).contains(&len) {
                    return Err(ProtocolError::InvalidLength(len).into());
                }

                // The declared length is authoritative; the payload may contain CRLF
                let len = len as usize;
                let mut data = Vec::with_capacity(len.min(MAX_PREALLOC_BULK));
                let read = (&mut self.reader).take(len as u64).read_to_end(&mut data)?;
                if read < len {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "Bulk payload truncated",
                    )
                    .into());
                }

                let mut crlf = [0u8; 2];
                self.reader.read_exact(&mut crlf)?;
                if &crlf != b"\r\n" {
                    return Err(ProtocolError::MissingTerminator.into());
                }

                Ok(RespValue::BulkString(data))
            }
            b'*' => {
                let count = parse_int(content, "array length")?;
                if count == -1 {
                    return Ok(RespValue::Array(Vec::new()));
                }
                if count < 0 {
                    return Err(ProtocolError::InvalidLength(count).into());
                }

                let count = count as usize;
                let mut elements = Vec::with_capacity(count.min(MAX_PREALLOC_ELEMENTS));
                for _ in 0..count {
                    elements.push(self.decode()?);
                }

                Ok(RespValue::Array(elements))
            }
            other => Err(ProtocolError::InvalidType(other as char).into()),
        }
    }

    /// Read one CRLF-terminated line into `line_buf`, terminator stripped
    fn read_line(&mut self) -> Result<()> {
        self.line_buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.line_buf)?;

        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Connection closed",
            )
            .into());
        }

        if !self.line_buf.ends_with(b"\r\n") {
            return Err(ProtocolError::MissingTerminator.into());
        }
        self.line_buf.truncate(self.line_buf.len() - 2);
        Ok(())
    }
}

fn parse_int(content: &[u8], what: &str) -> Result<i64> {
    std::str::from_utf8(content)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            ProtocolError::Parse(format!(
                "Invalid {}: {:?}",
                what,
                String::from_utf8_lossy(content)
            ))
            .into()
        })
}
