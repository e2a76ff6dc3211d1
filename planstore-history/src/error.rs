//! Error types for persisted history.

use planstore_codec::CodecError;
use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history stream could not be read.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Persisted records are not in strictly increasing sequence order.
    #[error("history sequence went from {previous} to {found}")]
    SequenceRegression { previous: u64, found: u64 },
}
