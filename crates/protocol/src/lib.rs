//! Shared types for the PrepHub upload pipeline.
//!
//! Everything here crosses the JSON bridge between the upload queue and
//! the UI layer, so all types are serde-serializable with camelCase
//! field names and string-renamed enums.

pub mod constants;
pub mod types;

pub use types::{
    ErrorClass, FileCategory, QueueCounts, QueueSnapshot, TaskSnapshot, TaskState,
    UploadDestination,
};
