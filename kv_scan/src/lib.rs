//! kv_scan: cursor-paginated SCAN support for key-value store clients.
//!
//! The SCAN family of commands answers with bounded pages plus an opaque
//! continuation cursor. This crate decodes those replies, keeps the state of
//! one logical scan in a [`ScanCommand`], and walks every page through a
//! [`ScanIterator`] that re-issues the command until the server hands back
//! the terminal cursor `"0"`.
//!
//! # Architecture
//!
//! ```text
//! raw reply → ReplyReader → read_scan_reply → ScanCommand ← ScanIterator
//!                                                  ↑             │
//!                                                  └─ ScanExecutor (I/O)
//! ```
//!
//! Connections, request encoding and retries belong to the surrounding
//! client; the iterator only talks to it through [`ScanExecutor`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use kv_scan::{ScanCommand, ScanExecutor, ScanResult, ScanVariant};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example<E: ScanExecutor>(executor: E) -> ScanResult<()> {
//! let cmd = ScanCommand::new(ScanVariant::Keys, vec!["scan".into(), "0".into()])?;
//! let iter = cmd.iterator(executor);
//! let cancel = CancellationToken::new();
//!
//! while iter.advance(&cancel).await {
//!     println!("{}", iter.value().await);
//! }
//! if let Some(err) = iter.err().await {
//!     return Err(err);
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod decoder;
pub mod executor;
pub mod iterator;
pub mod reply;
pub mod variant;

pub use command::ScanCommand;
pub use config::ScanConfig;
pub use decoder::read_scan_reply;
pub use executor::{ReplyExecutor, ScanExecutor};
pub use iterator::{IterState, ScanIterator};
pub use reply::ReplyReader;
pub use variant::ScanVariant;

use std::sync::Arc;
use thiserror::Error;

/// Cursor value the server sends once enumeration is complete.
pub const TERMINAL_CURSOR: &str = "0";

/// Errors that can occur while decoding or driving a scan.
#[derive(Error, Debug, Clone)]
pub enum ScanError {
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// The store's null marker. Tolerated inside a page, fatal elsewhere.
    #[error("nil reply")]
    Nil,

    #[error("server error: {0}")]
    Server(String),

    #[error("got {len} elements in paired page, expected an even count")]
    Pairing { len: usize },

    #[error("executor error: {0}")]
    Executor(Arc<dyn std::error::Error + Send + Sync>),

    #[error("scan cancelled")]
    Cancelled,

    #[error("{variant} needs a cursor argument at index {offset}, got {len} arguments")]
    MissingCursorSlot {
        variant: ScanVariant,
        offset: usize,
        len: usize,
    },
}

impl ScanError {
    /// Wrap an arbitrary transport failure.
    pub fn executor<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ScanError::Executor(Arc::new(err))
    }

    /// Whether this is the tolerated null marker.
    pub fn is_nil(&self) -> bool {
        matches!(self, ScanError::Nil)
    }
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// One entry of a paired page, borrowed straight from the page buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValue<'a> {
    pub key: &'a str,
    pub value: &'a [u8],
}

impl<'a> KeyValue<'a> {
    pub fn new(key: &'a str, value: &'a [u8]) -> Self {
        Self { key, value }
    }
}
