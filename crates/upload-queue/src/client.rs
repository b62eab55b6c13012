//! Transfer Client boundary.
//!
//! `TransferClient` is implemented by the client app to bridge the
//! queue to the actual network uploader. Using a trait keeps queue
//! logic decoupled from transport and testable with mocks.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use prephub_protocol::UploadDestination;

use crate::queue::TransferEvents;

/// Everything a Transfer Client needs to move one file, for one attempt.
#[derive(Debug, Clone)]
pub struct TransferJob {
    /// Queue task this attempt belongs to.
    pub task_id: String,
    /// Attempt number; echoed back on every event so the queue can
    /// discard reports from superseded attempts.
    pub attempt: u64,
    /// Caller-owned source file, borrowed for the task lifetime.
    pub source_path: PathBuf,
    pub display_name: String,
    /// Declared size in bytes (0 = unknown).
    pub declared_size: i64,
    pub destination: UploadDestination,
}

/// Performs the network transfer for admitted tasks.
///
/// `start` must return without blocking: implementations spawn the
/// actual transfer and report through `events`, tagging every event
/// with `job.task_id` and `job.attempt`. Exactly one of
/// [`TransferEvents::succeeded`]/[`TransferEvents::failed`] fires per
/// attempt, and nothing fires after an acknowledged abort of `cancel`.
pub trait TransferClient: Send + Sync {
    fn start(&self, job: TransferJob, events: TransferEvents, cancel: CancellationToken);
}

/// Live handle to a running transfer attempt.
#[derive(Debug, Clone)]
pub struct TransferHandle {
    cancel: CancellationToken,
}

impl TransferHandle {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Requests the transfer be aborted. Idempotent.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once an abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_is_idempotent() {
        let handle = TransferHandle::new(CancellationToken::new());
        assert!(!handle.is_aborted());
        handle.abort();
        handle.abort();
        assert!(handle.is_aborted());
    }
}
