//! State of one logical scan: arguments, last page, last cursor, first error.

use crate::config::ScanConfig;
use crate::decoder::read_scan_reply;
use crate::executor::ScanExecutor;
use crate::iterator::ScanIterator;
use crate::reply::ReplyReader;
use crate::variant::ScanVariant;
use crate::{KeyValue, ScanError, ScanResult, TERMINAL_CURSOR};
use bytes::Bytes;
use std::fmt;

/// A scan command and the result of its most recent execution.
///
/// The command exclusively owns its argument vector. The cursor slot is
/// rewritten before every re-fetch, so one command must only ever be driven
/// by one iterator; [`ScanCommand::iterator`] consumes it to enforce that.
#[derive(Debug, Clone)]
pub struct ScanCommand {
    variant: ScanVariant,
    args: Vec<String>,
    page: Vec<String>,
    cursor: String,
    /// Set once a page has been received; until then the cursor is the
    /// caller's starting value and can't be terminal.
    fetched: bool,
    err: Option<ScanError>,
    config: ScanConfig,
}

impl ScanCommand {
    /// Create a command from its full argument vector, name included.
    ///
    /// The starting cursor is whatever sits in the variant's cursor slot.
    pub fn new(variant: ScanVariant, args: Vec<String>) -> ScanResult<Self> {
        let offset = variant.cursor_offset();
        let cursor = match args.get(offset) {
            Some(c) => c.clone(),
            None => {
                return Err(ScanError::MissingCursorSlot {
                    variant,
                    offset,
                    len: args.len(),
                })
            }
        };

        Ok(Self {
            variant,
            args,
            page: Vec::new(),
            cursor,
            fetched: false,
            err: None,
            config: ScanConfig::default(),
        })
    }

    /// Builder-style: set decode limits and hints.
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn variant(&self) -> ScanVariant {
        self.variant
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Arguments to send on the next round trip.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Replace the current page and cursor.
    pub fn set_result(&mut self, page: Vec<String>, cursor: String) {
        self.page = page;
        self.cursor = cursor;
        self.fetched = true;
    }

    pub fn page(&self) -> &[String] {
        &self.page
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Page, cursor and the stored error in one call.
    pub fn result(&self) -> ScanResult<(&[String], &str)> {
        match &self.err {
            Some(e) => Err(e.clone()),
            None => Ok((self.page.as_slice(), self.cursor.as_str())),
        }
    }

    /// Interpret the page as alternating keys and values.
    ///
    /// Values are borrowed from the page, not copied.
    pub fn paired_view(&self) -> ScanResult<Vec<KeyValue<'_>>> {
        if self.page.len() % 2 != 0 {
            return Err(ScanError::Pairing {
                len: self.page.len(),
            });
        }
        Ok(self
            .page
            .chunks_exact(2)
            .map(|kv| KeyValue::new(&kv[0], kv[1].as_bytes()))
            .collect())
    }

    pub fn err(&self) -> Option<&ScanError> {
        self.err.as_ref()
    }

    /// Record a terminal error. The first one recorded is kept.
    pub fn set_err(&mut self, err: ScanError) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Whether the server has reported the end of the enumeration.
    pub fn is_complete(&self) -> bool {
        self.fetched && self.cursor == TERMINAL_CURSOR
    }

    /// A reader over `buf` using this command's decode limits.
    pub fn reply_reader(&self, buf: impl Into<Bytes>) -> ReplyReader {
        ReplyReader::with_config(buf, &self.config)
    }

    /// Decode a scan reply into this command. A decode failure is also
    /// recorded as the command's error.
    pub fn read_reply(&mut self, rd: &mut ReplyReader) -> ScanResult<()> {
        match read_scan_reply(rd) {
            Ok((page, cursor)) => {
                self.set_result(page, cursor);
                Ok(())
            }
            Err(e) => {
                self.set_err(e.clone());
                Err(e)
            }
        }
    }

    /// Build the page iterator. The command moves into it.
    pub fn iterator<E: ScanExecutor>(self, executor: E) -> ScanIterator<E> {
        ScanIterator::new(self, executor)
    }

    /// Write the latest cursor into the variant's cursor slot.
    pub(crate) fn patch_cursor(&mut self) {
        let offset = self.variant.cursor_offset();
        self.args[offset].clone_from(&self.cursor);
    }

    pub(crate) fn mark_fetched(&mut self) {
        self.fetched = true;
    }
}

impl fmt::Display for ScanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.args.join(" "), self.page.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_reads_starting_cursor() {
        let cmd = ScanCommand::new(ScanVariant::Keys, args(&["scan", "0", "MATCH", "a*"])).unwrap();
        assert_eq!(cmd.cursor(), "0");
        assert!(cmd.page().is_empty());
        assert!(cmd.err().is_none());
        assert!(!cmd.is_complete());

        let cmd = ScanCommand::new(ScanVariant::Qualified, args(&["hscan", "myhash", "42"])).unwrap();
        assert_eq!(cmd.cursor(), "42");
    }

    #[test]
    fn test_new_missing_cursor_slot() {
        let err = ScanCommand::new(ScanVariant::Values, args(&["vscan", "bucket"])).unwrap_err();
        match err {
            ScanError::MissingCursorSlot { variant, offset, len } => {
                assert_eq!(variant, ScanVariant::Values);
                assert_eq!(offset, 2);
                assert_eq!(len, 2);
            }
            other => panic!("Expected MissingCursorSlot, got {:?}", other),
        }
    }

    #[test]
    fn test_set_result_overwrites() {
        let mut cmd = ScanCommand::new(ScanVariant::Keys, args(&["scan", "0"])).unwrap();
        cmd.set_result(args(&["a", "b"]), "7".into());
        cmd.set_result(args(&["c"]), "0".into());
        assert_eq!(cmd.page(), &["c".to_string()]);
        assert_eq!(cmd.cursor(), "0");
        assert!(cmd.is_complete());
    }

    #[test]
    fn test_paired_view() {
        let mut cmd = ScanCommand::new(ScanVariant::Values, args(&["vscan", "b", "0"])).unwrap();
        cmd.set_result(args(&["k0", "v0", "k1", "v1"]), "0".into());

        let pairs = cmd.paired_view().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], KeyValue::new("k0", b"v0"));
        assert_eq!(pairs[1], KeyValue::new("k1", b"v1"));
        // Borrowed from the page, not copied.
        assert_eq!(pairs[1].value.as_ptr(), cmd.page()[3].as_ptr());
    }

    #[test]
    fn test_paired_view_odd_length() {
        let mut cmd = ScanCommand::new(ScanVariant::Values, args(&["vscan", "b", "0"])).unwrap();
        cmd.set_result(args(&["k0", "v0", "k1"]), "0".into());
        assert!(matches!(cmd.paired_view(), Err(ScanError::Pairing { len: 3 })));
    }

    #[test]
    fn test_paired_view_empty() {
        let cmd = ScanCommand::new(ScanVariant::Values, args(&["vscan", "b", "0"])).unwrap();
        assert!(cmd.paired_view().unwrap().is_empty());
    }

    #[test]
    fn test_first_error_wins() {
        let mut cmd = ScanCommand::new(ScanVariant::Keys, args(&["scan", "0"])).unwrap();
        cmd.set_err(ScanError::Server("ERR first".into()));
        cmd.set_err(ScanError::Cancelled);
        assert!(matches!(cmd.err(), Some(ScanError::Server(m)) if m == "ERR first"));
        assert!(cmd.result().is_err());
    }

    #[test]
    fn test_patch_cursor_per_variant() {
        let mut cmd = ScanCommand::new(ScanVariant::Keys, args(&["scan", "0", "COUNT", "10"])).unwrap();
        cmd.set_result(vec![], "91".into());
        cmd.patch_cursor();
        assert_eq!(cmd.args(), &args(&["scan", "91", "COUNT", "10"])[..]);

        let mut cmd = ScanCommand::new(ScanVariant::Qualified, args(&["sscan", "set", "0"])).unwrap();
        cmd.set_result(vec![], "12".into());
        cmd.patch_cursor();
        assert_eq!(cmd.args(), &args(&["sscan", "set", "12"])[..]);
    }

    #[test]
    fn test_read_reply() {
        let mut cmd = ScanCommand::new(ScanVariant::Keys, args(&["scan", "0"])).unwrap();
        let mut rd = cmd.reply_reader(Bytes::from_static(b"*2\r\n$1\r\n4\r\n*1\r\n$3\r\nfoo\r\n"));
        cmd.read_reply(&mut rd).unwrap();
        assert_eq!(cmd.cursor(), "4");
        assert_eq!(cmd.page(), &["foo".to_string()]);
        let (page, cursor) = cmd.result().unwrap();
        assert_eq!((page.len(), cursor), (1, "4"));
    }

    #[test]
    fn test_read_reply_records_error() {
        let mut cmd = ScanCommand::new(ScanVariant::Keys, args(&["scan", "0"])).unwrap();
        let mut rd = cmd.reply_reader(Bytes::from_static(b"*1\r\n$1\r\n0\r\n"));
        assert!(cmd.read_reply(&mut rd).is_err());
        assert!(matches!(cmd.err(), Some(ScanError::Protocol(_))));
    }

    #[test]
    fn test_display() {
        let mut cmd = ScanCommand::new(ScanVariant::Keys, args(&["scan", "0"])).unwrap();
        cmd.set_result(args(&["a", "b"]), "3".into());
        assert_eq!(cmd.to_string(), "scan 0: [a b]");
    }
}
