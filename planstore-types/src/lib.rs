//! Core type definitions for planstore.
//!
//! This crate defines the identity substrate every other crate builds on:
//! - Entity identifiers (`EntityId`) and their per-family generators
//! - Instigator and transmission identifiers (UUID v7)
//! - Millisecond timestamps used for history and transmission records
//! - Added/updated/deleted change sets reported back to transmission callers
//! - Cooperative cancellation tokens for long-running work
//!
//! Domain entities (plants, jobs, resources...) live in `planstore-scenario`,
//! not here.

mod cancel;
mod changes;
mod ids;
mod timestamp;

pub use cancel::{CancellationScopes, CancellationToken};
pub use changes::{ChangeSet, ScenarioDataChanges};
pub use ids::{EntityId, IdGenerator, InstigatorId, TransmissionId};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
