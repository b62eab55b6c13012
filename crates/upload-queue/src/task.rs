//! Task model: one file's upload job and its mutable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use prephub_protocol::{ErrorClass, TaskSnapshot, TaskState, UploadDestination};

use crate::client::{TransferHandle, TransferJob};
use crate::error::TransferError;

/// One file selected for upload, as handed to [`UploadQueue::submit`].
///
/// [`UploadQueue::submit`]: crate::queue::UploadQueue::submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Caller-owned file handle; the Transfer Client reads it for the
    /// task lifetime.
    pub source_path: PathBuf,
    pub display_name: String,
    /// Declared size in bytes (0 = unknown).
    #[serde(default)]
    pub declared_size: i64,
    pub destination: UploadDestination,
}

/// The mutable record behind a [`TaskSnapshot`].
///
/// State transitions are restricted to: `Waiting→Active` (admission),
/// `Active→Succeeded`, `Active→Failed`, `Failed→Waiting` (retry),
/// `Active→Waiting` (pause), plus removal from `Waiting`/`Active`
/// (cancel). All mutation happens under the queue lock.
pub(crate) struct UploadTask {
    id: String,
    request: UploadRequest,
    state: TaskState,
    progress_percent: u8,
    throughput_estimate: f64,
    retry_count: u32,
    max_retries: u32,
    retryable: bool,
    result_location: String,
    last_error: String,
    error_class: Option<ErrorClass>,
    submitted_at: DateTime<Utc>,
    /// Admission generation. Events carrying an older attempt are stale.
    attempt: u64,
    /// Present exactly while `Active`.
    handle: Option<TransferHandle>,
}

impl UploadTask {
    pub(crate) fn new(request: UploadRequest, max_retries: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request,
            state: TaskState::Waiting,
            progress_percent: 0,
            throughput_estimate: 0.0,
            retry_count: 0,
            max_retries,
            retryable: false,
            result_location: String::new(),
            last_error: String::new(),
            error_class: None,
            submitted_at: Utc::now(),
            attempt: 0,
            handle: None,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn state(&self) -> TaskState {
        self.state
    }

    pub(crate) fn attempt(&self) -> u64 {
        self.attempt
    }

    pub(crate) fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub(crate) fn handle(&self) -> Option<&TransferHandle> {
        self.handle.as_ref()
    }

    pub(crate) fn display_name(&self) -> &str {
        &self.request.display_name
    }

    /// Admits the task: `Waiting → Active`, new attempt, fresh progress.
    /// Returns the job to hand to the Transfer Client.
    pub(crate) fn begin_attempt(&mut self, cancel: CancellationToken) -> TransferJob {
        debug_assert_eq!(self.state, TaskState::Waiting);
        self.attempt += 1;
        self.state = TaskState::Active;
        self.progress_percent = 0;
        self.throughput_estimate = 0.0;
        self.last_error.clear();
        self.error_class = None;
        self.retryable = false;
        self.handle = Some(TransferHandle::new(cancel));

        TransferJob {
            task_id: self.id.clone(),
            attempt: self.attempt,
            source_path: self.request.source_path.clone(),
            display_name: self.request.display_name.clone(),
            declared_size: self.request.declared_size,
            destination: self.request.destination.clone(),
        }
    }

    /// Records a progress report. Percent is clamped to 100 and never
    /// decreases within an attempt.
    pub(crate) fn record_progress(&mut self, percent: u8, throughput: f64) {
        self.progress_percent = percent.min(100).max(self.progress_percent);
        self.throughput_estimate = throughput;
    }

    /// `Active → Succeeded`.
    pub(crate) fn complete(&mut self, location: String) {
        self.state = TaskState::Succeeded;
        self.progress_percent = 100;
        self.throughput_estimate = 0.0;
        self.result_location = location;
        self.handle = None;
    }

    /// `Active → Failed`, with classification. A task that has used up
    /// its retry budget is permanently failed regardless of class.
    pub(crate) fn fail(&mut self, error: &TransferError) {
        let class = error.class();
        self.state = TaskState::Failed;
        self.throughput_estimate = 0.0;
        self.last_error = error.to_string();
        self.error_class = Some(class);
        self.retryable = class == ErrorClass::Transient && self.retry_count < self.max_retries;
        self.handle = None;
    }

    /// Returns `true` if `retry` may requeue this task.
    pub(crate) fn can_retry(&self) -> bool {
        self.state == TaskState::Failed && self.retryable && self.retry_count < self.max_retries
    }

    /// `Failed → Waiting`: resets progress, consumes one retry.
    pub(crate) fn reset_for_retry(&mut self) {
        debug_assert!(self.can_retry());
        self.state = TaskState::Waiting;
        self.progress_percent = 0;
        self.throughput_estimate = 0.0;
        self.retry_count += 1;
        self.retryable = false;
        self.last_error.clear();
        self.error_class = None;
    }

    /// `Active → Waiting` without touching the retry budget: aborts the
    /// running transfer and requeues the task (pause).
    pub(crate) fn suspend(&mut self) {
        debug_assert_eq!(self.state, TaskState::Active);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.state = TaskState::Waiting;
        self.progress_percent = 0;
        self.throughput_estimate = 0.0;
    }

    /// Immutable view for the UI bridge.
    pub(crate) fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            display_name: self.request.display_name.clone(),
            declared_size: self.request.declared_size,
            state: self.state,
            progress_percent: self.progress_percent,
            throughput_estimate: self.throughput_estimate,
            retry_count: self.retry_count,
            max_retries: self.max_retries,
            retryable: self.retryable,
            result_location: self.result_location.clone(),
            last_error: self.last_error.clone(),
            error_class: self.error_class,
            submitted_at: self.submitted_at,
        }
    }
}
