//! Limits and defaults shared across the upload pipeline.
//!
//! The storage limits must match the rules the remote storage service
//! enforces; a mismatch surfaces as `SizeLimit` rejections mid-transfer.

/// Maximum accepted upload size: 10 MiB.
pub const MAX_UPLOAD_SIZE: i64 = 10 * 1024 * 1024;

/// Maximum length of a sanitized file name, in characters.
pub const MAX_FILE_NAME_LEN: usize = 100;

/// Default number of concurrent transfers per queue.
pub const DEFAULT_ACTIVE_LIMIT: usize = 3;

/// Default retry budget per task.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Size assumed for ETA purposes when a waiting task's size is unknown.
pub const DEFAULT_WAITING_SIZE: i64 = 512 * 1024;
