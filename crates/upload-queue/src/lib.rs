//! Bounded-concurrency upload pipeline for the PrepHub client.
//!
//! This crate implements the **business logic** for moving user-selected
//! files to remote storage: a per-session task queue with a bounded
//! active set, FIFO admission, aggregate progress, and command-driven
//! retry. It is a library crate with no UI or transport dependencies —
//! the client app provides a [`TransferClient`] implementation that
//! bridges to the actual HTTP uploader, and registers a snapshot
//! callback to drive rendering.
//!
//! # Flow
//!
//! 1. **Submit** — each selected file becomes a `Waiting` task
//! 2. **Admit** — the scheduler starts up to `active_limit` transfers
//! 3. **Report** — transfer events drive progress and terminal states
//! 4. **Aggregate** — every mutation re-emits a queue snapshot
//! 5. **Retry** — failures are classified; retry is command-driven

pub mod aggregate;
pub mod client;
pub mod error;
pub mod queue;
pub mod retry;
pub mod validation;

mod task;

// Re-export primary types for convenience.
pub use client::{TransferClient, TransferHandle, TransferJob};
pub use error::TransferError;
pub use queue::{QueueConfig, SnapshotCallback, TransferEvents, UploadQueue};
pub use retry::RetryBackoff;
pub use task::UploadRequest;
