//! Error types for store operations.

use thiserror::Error;

/// Errors surfaced by an [`crate::EventStore`] implementation.
///
/// The taxonomy separates failures where a retry could reasonably succeed
/// (`Transient`, `Timeout`) from failures that will not go away on their own
/// (`Rejected`, `InvalidResponse`). The writer does not retry either class;
/// callers that want retries can branch on [`StoreError::is_transient`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network failure, throttling, or a 5xx from the store.
    #[error("transient store failure: {0}")]
    Transient(String),

    /// The store rejected the request (bad payload, unknown session, 4xx).
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The store answered but the response body could not be decoded.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    /// A per-call deadline expired before the store answered.
    #[error("store call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

impl StoreError {
    /// Whether a retry of the same call could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_) | StoreError::Timeout { .. })
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
