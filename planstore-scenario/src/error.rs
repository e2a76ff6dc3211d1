//! Error types for scenarios.

use planstore_codec::CodecError;
use planstore_history::HistoryError;
use planstore_model::{ModelError, RestoreError};
use planstore_types::EntityId;
use std::time::Duration;
use thiserror::Error;

/// Result type for scenario operations.
pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A manager rejected the operation (missing entity, duplicate key).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A scenario stream could not be read.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("restore error: {0}")]
    Restore(#[from] RestoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The scenario lock could not be acquired in time.
    #[error("scenario lock not acquired within {0:?}")]
    LockTimeout(Duration),

    /// A transmission's sequence number is not after the last applied one.
    #[error("transmission {received} is out of order (last applied {last})")]
    OutOfOrder { last: u64, received: u64 },

    /// Cancelled through a cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A transmission addressed a different scenario.
    #[error("transmission for scenario {found} sent to scenario {expected}")]
    WrongScenario { expected: EntityId, found: EntityId },

    /// A transmission is well-formed but cannot be applied.
    #[error("invalid transmission: {0}")]
    InvalidTransmission(String),
}
