use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an upload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

impl TaskState {
    /// Returns `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Classification of a transfer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Environmental failure (network, timeout, transport abort) — worth
    /// retrying.
    #[serde(rename = "transient")]
    Transient,
    /// Validation, authorization or size-limit failure — retrying cannot
    /// change the outcome.
    #[serde(rename = "permanent")]
    Permanent,
}

/// Broad file category, derived from the file extension at submission
/// time. Drives both the remote storage layout and the UI icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileCategory {
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "file")]
    Other,
}

/// Where an upload lands in remote storage.
///
/// The Transfer Client maps this to the remote object path
/// `task_{assignment}/student_{student}/{timestamp}/{filename}`; the
/// queue treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDestination {
    pub assignment_id: i64,
    pub student_id: i64,
    pub category: FileCategory,
}

impl UploadDestination {
    /// Remote object prefix, without the per-submission timestamp folder.
    pub fn object_prefix(&self) -> String {
        format!("task_{}/student_{}", self.assignment_id, self.student_id)
    }
}

/// Snapshot of one task, emitted to the UI after every queue mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub id: String,
    pub display_name: String,
    /// Declared size in bytes (0 = unknown).
    pub declared_size: i64,
    pub state: TaskState,
    /// 0–100. Meaningful only while `Active`; non-decreasing within one
    /// attempt and reset to 0 on each new attempt.
    pub progress_percent: u8,
    /// Estimated throughput in bytes/second (0 when not transferring).
    pub throughput_estimate: f64,
    pub retry_count: u32,
    pub max_retries: u32,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result_location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    pub submitted_at: DateTime<Utc>,
}

/// Per-state task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounts {
    pub waiting: usize,
    pub active: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

/// Aggregate view of the whole queue at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub tasks: Vec<TaskSnapshot>,
    /// Rounded mean contribution over all tasks, 0–100. Reaches 100 only
    /// when every task has succeeded.
    pub overall_progress: u8,
    /// Mean throughput over active tasks in bytes/second (0 if none).
    pub average_throughput: f64,
    /// Estimated seconds until the queue drains (0 when throughput is
    /// unknown).
    pub estimated_remaining_secs: f64,
    pub counts: QueueCounts,
}

impl QueueSnapshot {
    /// Returns `true` when every submitted task has failed — the one
    /// situation the UI escalates to a blocking indicator.
    pub fn all_failed(&self) -> bool {
        self.counts.total > 0 && self.counts.failed == self.counts.total
    }
}
