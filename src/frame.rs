// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

/// Longest accepted inline request line, in bytes.
pub const MAX_INLINE: usize = 4096;
/// Longest accepted bulk-string payload, in bytes.
pub const MAX_BULK: usize = 4096;

#[derive(Debug, ThisError, PartialEq)]
pub enum FrameError {
    /// A request line or bulk payload exceeded the protocol limit. The
    /// connection is closed.
    #[error("protocol error; command length out of limit")]
    OutOfLimit,
    /// A `$` or CRLF marker was missing at the expected offset. The
    /// connection is closed.
    #[error("protocol error; wrong command format")]
    WrongFormat,
}

/// A single RESP reply value.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(b'+');
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(b'-');
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let repr = i.to_string();
                let mut bytes = Vec::with_capacity(1 + repr.len() + CRLF.len());
                bytes.push(b':');
                bytes.extend_from_slice(repr.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(data) => {
                let len = data.len().to_string();
                let mut bytes = Vec::with_capacity(1 + len.len() + CRLF.len() * 2 + data.len());
                bytes.push(b'$');
                bytes.extend_from_slice(len.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(CRLF);
                bytes
            }
            // RESP2 null bulk.
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::Array(items) => {
                let len = items.len().to_string();
                let mut bytes = Vec::with_capacity(1 + len.len() + CRLF.len());
                bytes.push(b'*');
                bytes.extend_from_slice(len.as_bytes());
                bytes.extend_from_slice(CRLF);
                for item in items {
                    bytes.extend(item.serialize());
                }
                bytes
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(items) => {
                write!(f, "*{}", items.len())?;
                for item in items {
                    write!(f, " {}", item)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum CommandKind {
    /// First byte of the next request not yet seen.
    #[default]
    Unknown,
    Inline,
    Bulk,
}

/// Incremental parser for client requests.
///
/// Two framings are accepted: a single space-separated line (inline) and an
/// array of bulk strings (`*<argc>` followed by `$<len>` payloads). The
/// parser keeps partial-frame state across reads, so it can be fed a byte
/// stream in arbitrary chunks; a complete frame yields the argument vector
/// and resets the state for the next request.
#[derive(Debug, Default)]
pub struct RequestParser {
    kind: CommandKind,
    /// Bulk payloads still expected for the current frame.
    remaining: usize,
    /// Length of the bulk payload whose header has been consumed.
    bulk_len: Option<usize>,
    args: Vec<Bytes>,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume at most one complete request from `buf`.
    ///
    /// Returns `Ok(Some(argv))` when a full frame was consumed (the argv may
    /// be empty for a blank inline line or `*0`), `Ok(None)` when more bytes
    /// are needed. Residual bytes stay in `buf` for the next call.
    pub fn parse(&mut self, buf: &mut BytesMut) -> Result<Option<Vec<Bytes>>, FrameError> {
        if buf.is_empty() {
            return Ok(None);
        }
        if self.kind == CommandKind::Unknown {
            self.kind = if buf[0] == b'*' {
                CommandKind::Bulk
            } else {
                CommandKind::Inline
            };
        }
        match self.kind {
            CommandKind::Inline => self.parse_inline(buf),
            CommandKind::Bulk => self.parse_bulk(buf),
            CommandKind::Unknown => unreachable!(),
        }
    }

    fn parse_inline(&mut self, buf: &mut BytesMut) -> Result<Option<Vec<Bytes>>, FrameError> {
        let Some(line_end) = find_crlf(buf) else {
            if buf.len() > MAX_INLINE {
                return Err(FrameError::OutOfLimit);
            }
            return Ok(None);
        };
        if line_end > MAX_INLINE {
            return Err(FrameError::OutOfLimit);
        }
        let args = buf[..line_end]
            .split(|b| b.is_ascii_whitespace())
            .filter(|part| !part.is_empty())
            .map(Bytes::copy_from_slice)
            .collect();
        buf.advance(line_end + 2);
        self.reset();
        Ok(Some(args))
    }

    fn parse_bulk(&mut self, buf: &mut BytesMut) -> Result<Option<Vec<Bytes>>, FrameError> {
        if self.remaining == 0 && self.args.is_empty() {
            let Some(line_end) = find_crlf(buf) else {
                if buf.len() > MAX_INLINE {
                    return Err(FrameError::OutOfLimit);
                }
                return Ok(None);
            };
            let argc = parse_number(&buf[1..line_end])?;
            buf.advance(line_end + 2);
            if argc == 0 {
                self.reset();
                return Ok(Some(Vec::new()));
            }
            self.remaining = argc;
            self.args = Vec::with_capacity(argc);
        }

        while self.remaining > 0 {
            let len = match self.bulk_len {
                Some(len) => len,
                None => {
                    let Some(line_end) = find_crlf(buf) else {
                        if buf.len() > MAX_INLINE {
                            return Err(FrameError::OutOfLimit);
                        }
                        return Ok(None);
                    };
                    if buf[0] != b'$' {
                        return Err(FrameError::WrongFormat);
                    }
                    let len = parse_number(&buf[1..line_end])?;
                    if len > MAX_BULK {
                        return Err(FrameError::OutOfLimit);
                    }
                    buf.advance(line_end + 2);
                    self.bulk_len = Some(len);
                    len
                }
            };
            if buf.len() < len + 2 {
                return Ok(None);
            }
            if &buf[len..len + 2] != CRLF {
                return Err(FrameError::WrongFormat);
            }
            self.args.push(Bytes::copy_from_slice(&buf[..len]));
            buf.advance(len + 2);
            self.bulk_len = None;
            self.remaining -= 1;
        }

        let args = std::mem::take(&mut self.args);
        self.reset();
        Ok(Some(args))
    }

    fn reset(&mut self) {
        self.kind = CommandKind::Unknown;
        self.remaining = 0;
        self.bulk_len = None;
        self.args.clear();
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|window| window == CRLF)
}

fn parse_number(digits: &[u8]) -> Result<usize, FrameError> {
    let text = std::str::from_utf8(digits).map_err(|_| FrameError::WrongFormat)?;
    text.parse::<usize>().map_err(|_| FrameError::WrongFormat)
}

/// Encode an argument vector in the bulk framing, the same bytes a client
/// would send. Used by the AOF writer.
pub fn encode_argv(args: &[Bytes]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg);
        out.extend_from_slice(CRLF);
    }
    out
}
