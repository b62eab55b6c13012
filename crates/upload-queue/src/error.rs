//! Transfer error taxonomy and classification.

use prephub_protocol::ErrorClass;

/// Failure reported by a Transfer Client for one attempt.
///
/// The variants are the wire-level taxonomy, not internal plumbing:
/// implementations map their transport errors onto these before
/// reporting. I/O problems while reading the source file are reported
/// as `Network` or `Validation` depending on whether they can recur.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransferError {
    #[error("network error: {0}")]
    Network(String),

    #[error("network timeout")]
    Timeout,

    #[error("transport aborted: {0}")]
    TransportAborted(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("authorization error: {0}")]
    Authorization(String),

    #[error("file size {size} exceeds limit of {limit} bytes")]
    SizeLimit { size: i64, limit: i64 },
}

impl TransferError {
    /// Classifies the failure. Pure function of the error value.
    pub fn class(&self) -> ErrorClass {
        match self {
            TransferError::Network(_)
            | TransferError::Timeout
            | TransferError::TransportAborted(_) => ErrorClass::Transient,
            TransferError::Validation(_)
            | TransferError::Authorization(_)
            | TransferError::SizeLimit { .. } => ErrorClass::Permanent,
        }
    }
}
