//! Upload queue: bounded active set, FIFO admission, command surface.
//!
//! One queue per upload session, owned by the calling controller and
//! passed by reference wherever it is needed — there is no ambient
//! singleton and no durable state. A single lock guards the task list;
//! commands and transfer events both acquire it before mutating, and
//! admission runs under the same lock, so no two admission passes can
//! observe the same task.

use std::sync::{Arc, Mutex, Weak};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use prephub_protocol::constants::{DEFAULT_ACTIVE_LIMIT, DEFAULT_MAX_RETRIES};
use prephub_protocol::{QueueSnapshot, TaskState};

use crate::aggregate::aggregate;
use crate::client::{TransferClient, TransferJob};
use crate::error::TransferError;
use crate::task::{UploadRequest, UploadTask};

/// Callback invoked with the aggregate snapshot after every mutation.
pub type SnapshotCallback = Box<dyn Fn(QueueSnapshot) + Send + Sync>;

/// Tunables for one queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Maximum number of concurrent transfers.
    pub active_limit: usize,
    /// Retry budget per task.
    pub max_retries: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            active_limit: DEFAULT_ACTIVE_LIMIT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// The upload queue for one session.
///
/// All commands are synchronous and non-blocking: they mutate, start
/// any newly admitted transfers, emit a snapshot, and return. The
/// transfers themselves run inside the Transfer Client and report back
/// through [`TransferEvents`].
#[derive(Clone)]
pub struct UploadQueue {
    core: Arc<QueueCore>,
}

pub(crate) struct QueueCore {
    tasks: Mutex<Vec<UploadTask>>,
    callbacks: Mutex<Vec<Arc<SnapshotCallback>>>,
    client: Arc<dyn TransferClient>,
    config: QueueConfig,
}

impl UploadQueue {
    /// Creates an empty queue backed by `client`.
    pub fn new(client: Arc<dyn TransferClient>, config: QueueConfig) -> Self {
        Self {
            core: Arc::new(QueueCore {
                tasks: Mutex::new(Vec::new()),
                callbacks: Mutex::new(Vec::new()),
                client,
                config,
            }),
        }
    }

    /// Registers a snapshot callback. Callbacks run synchronously after
    /// every mutation, outside the queue locks, so they may issue
    /// commands.
    pub fn on_snapshot(&self, callback: SnapshotCallback) {
        self.core.callbacks.lock().unwrap().push(Arc::new(callback));
    }

    /// Returns the current aggregate snapshot on demand.
    pub fn snapshot(&self) -> QueueSnapshot {
        let tasks = self.core.tasks.lock().unwrap();
        QueueCore::snapshot_locked(&tasks)
    }

    /// Appends a `Waiting` task and triggers scheduling. Non-blocking;
    /// the returned id is the handle for `cancel`/`retry`.
    pub fn submit(&self, request: UploadRequest) -> String {
        let (id, snapshot, starts) = {
            let mut tasks = self.core.tasks.lock().unwrap();
            let task = UploadTask::new(request, self.core.config.max_retries);
            let id = task.id().to_string();
            debug!(task = %id, name = %task.display_name(), "task submitted");
            tasks.push(task);
            let starts = self.core.admit(&mut tasks);
            (id, QueueCore::snapshot_locked(&tasks), starts)
        };
        self.core.start_transfers(starts);
        self.core.emit(snapshot);
        id
    }

    /// Removes a task. `Active` tasks have their transfer aborted
    /// first; terminal and unknown ids are ignored (command/state races
    /// are expected, not exceptional).
    pub fn cancel(&self, id: &str) {
        let (snapshot, starts) = {
            let mut tasks = self.core.tasks.lock().unwrap();
            let Some(index) = tasks.iter().position(|t| t.id() == id) else {
                return;
            };
            match tasks[index].state() {
                TaskState::Waiting => {
                    tasks.remove(index);
                }
                TaskState::Active => {
                    let task = tasks.remove(index);
                    if let Some(handle) = task.handle() {
                        handle.abort();
                    }
                }
                TaskState::Succeeded | TaskState::Failed => return,
            }
            info!(task = %id, "task cancelled");
            let starts = self.core.admit(&mut tasks);
            (QueueCore::snapshot_locked(&tasks), starts)
        };
        self.core.start_transfers(starts);
        self.core.emit(snapshot);
    }

    /// Requeues a failed, retryable task and triggers scheduling.
    /// Ignored for anything else.
    pub fn retry(&self, id: &str) {
        let (snapshot, starts) = {
            let mut tasks = self.core.tasks.lock().unwrap();
            let Some(task) = tasks.iter_mut().find(|t| t.id() == id) else {
                return;
            };
            if !task.can_retry() {
                debug!(task = %id, "retry ignored for ineligible task");
                return;
            }
            task.reset_for_retry();
            info!(task = %id, retry = task.retry_count(), "task requeued for retry");
            let starts = self.core.admit(&mut tasks);
            (QueueCore::snapshot_locked(&tasks), starts)
        };
        self.core.start_transfers(starts);
        self.core.emit(snapshot);
    }

    /// Applies [`retry`](Self::retry) to every eligible failed task.
    pub fn retry_all(&self) {
        let (snapshot, starts, requeued) = {
            let mut tasks = self.core.tasks.lock().unwrap();
            let mut requeued = 0usize;
            for task in tasks.iter_mut() {
                if task.can_retry() {
                    task.reset_for_retry();
                    requeued += 1;
                }
            }
            let starts = self.core.admit(&mut tasks);
            (QueueCore::snapshot_locked(&tasks), starts, requeued)
        };
        if requeued > 0 {
            info!(count = requeued, "failed tasks requeued");
        }
        self.core.start_transfers(starts);
        self.core.emit(snapshot);
    }

    /// Removes all `Succeeded` tasks.
    pub fn clear_completed(&self) {
        let snapshot = {
            let mut tasks = self.core.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| t.state() != TaskState::Succeeded);
            let removed = before - tasks.len();
            if removed > 0 {
                debug!(count = removed, "completed tasks cleared");
            }
            QueueCore::snapshot_locked(&tasks)
        };
        self.core.emit(snapshot);
    }

    /// Aborts every `Active` transfer and requeues it as `Waiting`
    /// without consuming retry budget. Unlike cancel/completion this
    /// does not trigger scheduling: paused tasks stay queued until the
    /// next submission or capacity change.
    pub fn pause_all(&self) {
        let snapshot = {
            let mut tasks = self.core.tasks.lock().unwrap();
            let mut paused = 0usize;
            for task in tasks.iter_mut() {
                if task.state() == TaskState::Active {
                    task.suspend();
                    paused += 1;
                }
            }
            if paused > 0 {
                info!(count = paused, "active uploads paused");
            }
            QueueCore::snapshot_locked(&tasks)
        };
        self.core.emit(snapshot);
    }
}

impl QueueCore {
    /// Admission pass: moves the earliest-submitted `Waiting` tasks to
    /// `Active` while capacity remains. Runs under the task lock; the
    /// collected transfers are started by the caller after the lock is
    /// released, so a Transfer Client may report synchronously without
    /// deadlocking.
    fn admit(&self, tasks: &mut Vec<UploadTask>) -> Vec<(TransferJob, CancellationToken)> {
        let mut active = tasks
            .iter()
            .filter(|t| t.state() == TaskState::Active)
            .count();
        let mut starts = Vec::new();
        for task in tasks.iter_mut() {
            if active >= self.config.active_limit {
                break;
            }
            if task.state() != TaskState::Waiting {
                continue;
            }
            let cancel = CancellationToken::new();
            let job = task.begin_attempt(cancel.clone());
            debug!(task = %task.id(), attempt = job.attempt, "task admitted");
            starts.push((job, cancel));
            active += 1;
        }
        starts
    }

    fn start_transfers(self: &Arc<Self>, starts: Vec<(TransferJob, CancellationToken)>) {
        for (job, cancel) in starts {
            let events = TransferEvents {
                core: Arc::downgrade(self),
            };
            self.client.start(job, events, cancel);
        }
    }

    fn snapshot_locked(tasks: &[UploadTask]) -> QueueSnapshot {
        aggregate(tasks.iter().map(UploadTask::snapshot).collect())
    }

    // Callbacks are cloned out before invocation: a callback that
    // issues a command re-enters emit, which must not find the
    // callback list locked.
    fn emit(&self, snapshot: QueueSnapshot) {
        let callbacks: Vec<Arc<SnapshotCallback>> =
            self.callbacks.lock().unwrap().iter().cloned().collect();
        for callback in callbacks {
            callback(snapshot.clone());
        }
    }

    fn apply_progress(&self, task_id: &str, attempt: u64, percent: u8, throughput: f64) {
        let snapshot = {
            let mut tasks = self.tasks.lock().unwrap();
            let Some(task) = tasks.iter_mut().find(|t| t.id() == task_id) else {
                debug!(task = %task_id, "progress for unknown task dropped");
                return;
            };
            if task.attempt() != attempt || task.state() != TaskState::Active {
                debug!(task = %task_id, attempt, "stale progress report dropped");
                return;
            }
            task.record_progress(percent, throughput);
            Self::snapshot_locked(&tasks)
        };
        self.emit(snapshot);
    }

    fn apply_succeeded(
        self: &Arc<Self>,
        task_id: &str,
        attempt: u64,
        location: String,
        elapsed_ms: u64,
    ) {
        let (snapshot, starts) = {
            let mut tasks = self.tasks.lock().unwrap();
            let Some(task) = tasks.iter_mut().find(|t| t.id() == task_id) else {
                debug!(task = %task_id, "success for unknown task dropped");
                return;
            };
            if task.attempt() != attempt || task.state() != TaskState::Active {
                debug!(task = %task_id, attempt, "stale success report dropped");
                return;
            }
            task.complete(location);
            info!(task = %task_id, elapsed_ms, "upload succeeded");
            let starts = self.admit(&mut tasks);
            (Self::snapshot_locked(&tasks), starts)
        };
        self.start_transfers(starts);
        self.emit(snapshot);
    }

    fn apply_failed(self: &Arc<Self>, task_id: &str, attempt: u64, error: TransferError) {
        let (snapshot, starts) = {
            let mut tasks = self.tasks.lock().unwrap();
            let Some(task) = tasks.iter_mut().find(|t| t.id() == task_id) else {
                debug!(task = %task_id, "failure for unknown task dropped");
                return;
            };
            if task.attempt() != attempt || task.state() != TaskState::Active {
                debug!(task = %task_id, attempt, "stale failure report dropped");
                return;
            }
            warn!(task = %task_id, error = %error, class = ?error.class(), "upload failed");
            task.fail(&error);
            let starts = self.admit(&mut tasks);
            (Self::snapshot_locked(&tasks), starts)
        };
        self.start_transfers(starts);
        self.emit(snapshot);
    }
}

/// Completion surface handed to Transfer Clients.
///
/// Every progress/success/failure report for every attempt funnels
/// through this one handle. Each call re-acquires the queue lock before
/// touching task state, so event application is serialized with the
/// command surface; reports for a superseded attempt or a removed task
/// are dropped. Holds only a weak reference — events outliving the
/// queue are ignored.
#[derive(Clone)]
pub struct TransferEvents {
    core: Weak<QueueCore>,
}

impl TransferEvents {
    /// Progress report for one attempt. `percent` is 0–100;
    /// `throughput` is the client's current estimate in bytes/second.
    pub fn progress(&self, task_id: &str, attempt: u64, percent: u8, throughput: f64) {
        if let Some(core) = self.core.upgrade() {
            core.apply_progress(task_id, attempt, percent, throughput);
        }
    }

    /// Terminal success for one attempt. Fires at most once per attempt.
    pub fn succeeded(&self, task_id: &str, attempt: u64, location: String, elapsed_ms: u64) {
        if let Some(core) = self.core.upgrade() {
            core.apply_succeeded(task_id, attempt, location, elapsed_ms);
        }
    }

    /// Terminal failure for one attempt. Fires at most once per attempt.
    pub fn failed(&self, task_id: &str, attempt: u64, error: TransferError) {
        if let Some(core) = self.core.upgrade() {
            core.apply_failed(task_id, attempt, error);
        }
    }
}
