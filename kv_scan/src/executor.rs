//! The I/O seam: how a scan command reaches the server.

use crate::command::ScanCommand;
use crate::{ScanError, ScanResult};
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Performs one request/response round trip for a scan command.
///
/// An implementation sends `cmd.args()`, then stores the decoded page and
/// cursor on `cmd` (usually through [`ScanCommand::read_reply`]) before
/// returning. It owns every transport policy: timeouts, retries and honoring
/// `cancel`. A returned error ends the scan that issued it.
pub trait ScanExecutor: Send + Sync {
    fn execute(
        &self,
        cancel: &CancellationToken,
        cmd: &mut ScanCommand,
    ) -> impl Future<Output = ScanResult<()>> + Send;
}

impl<E: ScanExecutor> ScanExecutor for &E {
    fn execute(
        &self,
        cancel: &CancellationToken,
        cmd: &mut ScanCommand,
    ) -> impl Future<Output = ScanResult<()>> + Send {
        (**self).execute(cancel, cmd)
    }
}

impl<E: ScanExecutor> ScanExecutor for Arc<E> {
    fn execute(
        &self,
        cancel: &CancellationToken,
        cmd: &mut ScanCommand,
    ) -> impl Future<Output = ScanResult<()>> + Send {
        (**self).execute(cancel, cmd)
    }
}

/// Executor built from a transport that turns an argument vector into the
/// raw reply bytes. Decoding happens here, with the command's limits.
pub struct ReplyExecutor<F> {
    transport: F,
}

impl<F> ReplyExecutor<F> {
    pub fn new(transport: F) -> Self {
        Self { transport }
    }
}

impl<F, Fut> ScanExecutor for ReplyExecutor<F>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = ScanResult<Bytes>> + Send,
{
    async fn execute(&self, cancel: &CancellationToken, cmd: &mut ScanCommand) -> ScanResult<()> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let request = cmd.args().to_vec();
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScanError::Cancelled),
            reply = (self.transport)(request) => reply?,
        };

        let mut rd = cmd.reply_reader(reply);
        cmd.read_reply(&mut rd)
    }
}
