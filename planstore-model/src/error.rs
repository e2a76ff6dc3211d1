//! Error types for the model layer.

use planstore_codec::CodecError;
use planstore_types::EntityId;
use thiserror::Error;

use crate::RestorePhase;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by entity managers.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required entity is absent.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: EntityId },

    /// An external key is already taken while the external index is enabled.
    #[error("duplicate external id '{key}' for {kind}")]
    DuplicateKey { kind: &'static str, key: String },

    /// Decoding a manager failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Errors raised by the reference restorer.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// A pass was requested out of order (pass 2 before pass 1, or a pass
    /// run twice on the same restorer).
    #[error("restoration pass {requested} requested in phase {phase:?}")]
    PassOutOfOrder { requested: u8, phase: RestorePhase },
}
