//! Change tracking for planstore scenarios.
//!
//! Three layers, fed in this order while a transmission is applied under the
//! scenario write lock:
//!
//! - [`AuditLog`]: the raw per-transmission list of what changed, with the
//!   encoded state of each entity before it changed
//! - [`HistoryManager`]: bounded, user-facing history; one record per audit
//!   entry, announced to listeners as one batch per transmission
//! - [`TransmissionLog`]: the transmissions themselves, each wrapped in a
//!   [`TransmissionRecord`] so the log can be persisted and replayed

mod audit;
mod error;
mod history;
mod recorder;

pub use audit::{AuditEntry, AuditLog, ChangeKind};
pub use error::{HistoryError, HistoryResult};
pub use history::{
    DEFAULT_MAX_HISTORY, HistoryListener, HistoryManager, HistoryRecord, HistoryType,
};
pub use recorder::{TransmissionLog, TransmissionRecord};
