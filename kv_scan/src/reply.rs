//! Reader for the store's reply framing.
//!
//! Only the subset a scan reply can contain is understood: arrays (and the
//! RESP3 set/push headers), bulk and simple strings, integers, the null
//! marker and error lines. Every element is one header line:
//!
//! ```text
//! [prefix: 1B][payload][\r\n]             simple / integer / error / null
//! [$][len][\r\n][bytes: len][\r\n]        bulk string
//! [*][count][\r\n][element]...[element]   array
//! ```
//!
//! `$-1`, `*-1` and `_` are the null marker and surface as [`ScanError::Nil`].

use crate::config::ScanConfig;
use crate::{ScanError, ScanResult};
use bytes::{Buf, Bytes};

const ARRAY: u8 = b'*';
const SET: u8 = b'~';
const PUSH: u8 = b'>';
const BULK: u8 = b'$';
const SIMPLE: u8 = b'+';
const ERROR: u8 = b'-';
const INTEGER: u8 = b':';
const NULL: u8 = b'_';

const CRLF: &[u8] = b"\r\n";

/// Sequential reader over one buffered reply.
#[derive(Debug, Clone)]
pub struct ReplyReader {
    buf: Bytes,
    max_array_len: usize,
    max_bulk_len: usize,
}

impl ReplyReader {
    /// Create a reader with default limits.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self::with_config(buf, &ScanConfig::default())
    }

    /// Create a reader that enforces the limits of `config`.
    pub fn with_config(buf: impl Into<Bytes>, config: &ScanConfig) -> Self {
        Self {
            buf: buf.into(),
            max_array_len: config.max_array_len,
            max_bulk_len: config.max_bulk_len,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    /// Read an aggregate header and return its element count.
    pub fn read_array_len(&mut self) -> ScanResult<usize> {
        let (prefix, payload) = self.read_header()?;
        match prefix {
            ARRAY | SET | PUSH => {
                let n = parse_int(&payload)?;
                if n < 0 {
                    return Err(ScanError::Nil);
                }
                let n = n as usize;
                if n > self.max_array_len {
                    return Err(ScanError::Decode(format!(
                        "array length {} exceeds limit {}",
                        n, self.max_array_len
                    )));
                }
                Ok(n)
            }
            NULL => Err(ScanError::Nil),
            ERROR => Err(ScanError::Server(lossy(&payload))),
            other => Err(ScanError::Protocol(format!(
                "can't parse array reply: {:?}",
                other as char
            ))),
        }
    }

    /// Read a bulk string, simple string or integer as text.
    pub fn read_string(&mut self) -> ScanResult<String> {
        let (prefix, payload) = self.read_header()?;
        match prefix {
            BULK => {
                let n = parse_int(&payload)?;
                if n < 0 {
                    return Err(ScanError::Nil);
                }
                let data = self.read_bulk_body(n as usize)?;
                utf8(data)
            }
            SIMPLE => utf8(payload),
            INTEGER => {
                parse_int(&payload)?;
                utf8(payload)
            }
            NULL => Err(ScanError::Nil),
            ERROR => Err(ScanError::Server(lossy(&payload))),
            other => Err(ScanError::Protocol(format!(
                "can't parse string reply: {:?}",
                other as char
            ))),
        }
    }

    fn read_bulk_body(&mut self, len: usize) -> ScanResult<Bytes> {
        if len > self.max_bulk_len {
            return Err(ScanError::Decode(format!(
                "bulk length {} exceeds limit {}",
                len, self.max_bulk_len
            )));
        }
        if self.buf.remaining() < len + CRLF.len() {
            return Err(ScanError::Decode(format!(
                "bulk string truncated: need {} bytes, have {}",
                len + CRLF.len(),
                self.buf.remaining()
            )));
        }
        let data = self.buf.split_to(len);
        if &self.buf[..CRLF.len()] != CRLF {
            return Err(ScanError::Decode("bulk string not terminated by CRLF".into()));
        }
        self.buf.advance(CRLF.len());
        Ok(data)
    }

    /// Split off one header line, returning its prefix byte and payload.
    fn read_header(&mut self) -> ScanResult<(u8, Bytes)> {
        let end = self
            .buf
            .windows(CRLF.len())
            .position(|w| w == CRLF)
            .ok_or_else(|| ScanError::Decode("reply line truncated".into()))?;
        if end == 0 {
            return Err(ScanError::Decode("empty reply line".into()));
        }
        let mut line = self.buf.split_to(end);
        self.buf.advance(CRLF.len());
        let prefix = line.get_u8();
        Ok((prefix, line))
    }
}

fn parse_int(payload: &[u8]) -> ScanResult<i64> {
    std::str::from_utf8(payload)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ScanError::Decode(format!("invalid integer: {:?}", lossy(payload))))
}

fn utf8(data: Bytes) -> ScanResult<String> {
    String::from_utf8(data.to_vec()).map_err(|e| ScanError::Decode(e.to_string()))
}

fn lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}
