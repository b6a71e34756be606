//! Page-by-page iteration over a scan.
//!
//! The iterator walks the current page and, once it runs out, re-issues the
//! command with the latest cursor. Three server behaviors shape the loop:
//!
//! * completion is signalled by the cursor `"0"`, never by page length;
//! * a page may be empty while more data remains;
//! * the cursor goes back in a variant-specific argument slot.
//!
//! ```text
//! NeedsFetch ──fetch, non-empty──► HasCurrent ──page consumed──► fetch
//!     │  ▲                                                         │
//!     │  └──────────────── empty page, cursor != "0" ◄─────────────┤
//!     ├── cursor "0" ──► Exhausted                                  │
//!     └── executor error ──► Errored ◄──────────────────────────────┘
//! ```
//!
//! All public operations take the same lock, so an iterator can be shared
//! between tasks. Interleaved `advance` calls from several tasks are safe but
//! which task sees which element is up to the scheduler.

use crate::command::ScanCommand;
use crate::executor::ScanExecutor;
use crate::{ScanError, ScanResult};
use bytes::Bytes;
use futures::Stream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Where the iterator stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    /// No element is current; the next `advance` may fetch.
    NeedsFetch,
    /// An element of the current page is current.
    HasCurrent,
    /// The server returned the terminal cursor and the last page is consumed.
    Exhausted,
    /// A fetch failed. No further I/O happens.
    Errored,
}

struct Inner {
    cmd: ScanCommand,
    /// One past the current element; 0 means nothing is current.
    pos: usize,
    state: IterState,
}

impl Inner {
    fn current(&self) -> Option<&str> {
        if self.cmd.err().is_some() || self.pos == 0 {
            return None;
        }
        self.cmd.page().get(self.pos - 1).map(String::as_str)
    }

    /// Take the current element as a key and the next one as its value.
    /// A missing trailing value reads as empty.
    fn take_pair(&mut self) -> Option<(String, String)> {
        let key = self.current()?.to_owned();
        let len = self.cmd.page().len();
        let value = self.cmd.page().get(self.pos).cloned().unwrap_or_default();
        self.pos = (self.pos + 1).min(len);
        Some((key, value))
    }
}

/// Iterator over every element of a scan, fetching pages on demand.
pub struct ScanIterator<E> {
    executor: E,
    inner: Mutex<Inner>,
}

impl<E: ScanExecutor> ScanIterator<E> {
    pub(crate) fn new(cmd: ScanCommand, executor: E) -> Self {
        let state = if cmd.err().is_some() {
            IterState::Errored
        } else {
            IterState::NeedsFetch
        };
        Self {
            executor,
            inner: Mutex::new(Inner { cmd, pos: 0, state }),
        }
    }

    /// Move to the next element, fetching pages as needed.
    ///
    /// Returns false when the scan is over. Check [`ScanIterator::err`] to
    /// tell clean exhaustion from failure. After a failure this returns false
    /// without touching the executor again.
    pub async fn advance(&self, cancel: &CancellationToken) -> bool {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        if inner.cmd.err().is_some() {
            inner.state = IterState::Errored;
            return false;
        }

        if inner.pos < inner.cmd.page().len() {
            inner.pos += 1;
            inner.state = IterState::HasCurrent;
            return true;
        }

        loop {
            if inner.cmd.is_complete() {
                inner.state = IterState::Exhausted;
                return false;
            }

            inner.state = IterState::NeedsFetch;
            inner.pos = 0;
            inner.cmd.patch_cursor();
            tracing::debug!(
                "Fetching {} scan page with cursor {}",
                inner.cmd.variant(),
                inner.cmd.cursor()
            );

            if let Err(e) = self.executor.execute(cancel, &mut inner.cmd).await {
                tracing::warn!("Scan fetch failed, stopping iteration: {}", e);
                inner.cmd.set_err(e);
                inner.state = IterState::Errored;
                return false;
            }
            inner.cmd.mark_fetched();

            if inner.cmd.err().is_some() {
                inner.state = IterState::Errored;
                return false;
            }

            let len = inner.cmd.page().len();
            tracing::debug!("Received scan page: {} elements, cursor {}", len, inner.cmd.cursor());

            if len > 0 {
                inner.pos = 1;
                inner.state = IterState::HasCurrent;
                return true;
            }

            tracing::debug!("Empty scan page with cursor {}", inner.cmd.cursor());
        }
    }

    /// The current element, or empty if nothing is current or the scan failed.
    pub async fn value(&self) -> String {
        let inner = self.inner.lock().await;
        inner.current().map(str::to_owned).unwrap_or_default()
    }

    /// Read the current element as a key and the following one as its value,
    /// moving past both. For value-returning scans.
    pub async fn key_value(&self) -> (String, String) {
        let mut inner = self.inner.lock().await;
        inner.take_pair().unwrap_or_default()
    }

    /// [`ScanIterator::key_value`] with the value as raw bytes.
    pub async fn key_value_bytes(&self) -> (String, Bytes) {
        let mut inner = self.inner.lock().await;
        match inner.take_pair() {
            Some((key, value)) => (key, Bytes::from(value.into_bytes())),
            None => (String::new(), Bytes::new()),
        }
    }

    pub async fn err(&self) -> Option<ScanError> {
        self.inner.lock().await.cmd.err().cloned()
    }

    pub async fn state(&self) -> IterState {
        self.inner.lock().await.state
    }

    /// Read position within the current page.
    pub async fn position(&self) -> usize {
        self.inner.lock().await.pos
    }

    /// Give back the command, with its last page, cursor and error.
    pub fn into_command(self) -> ScanCommand {
        self.inner.into_inner().cmd
    }

    /// Turn the iterator into a stream of elements. A failed scan ends the
    /// stream with its error.
    pub fn into_stream(self, cancel: CancellationToken) -> impl Stream<Item = ScanResult<String>> {
        futures::stream::unfold(Some((self, cancel)), |state| async move {
            let (iter, cancel) = state?;
            if iter.advance(&cancel).await {
                let value = iter.value().await;
                return Some((Ok(value), Some((iter, cancel))));
            }
            iter.err().await.map(|e| (Err(e), None))
        })
    }
}
