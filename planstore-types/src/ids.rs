//! Identifier types used throughout planstore.
//!
//! Persisted entities are keyed by a numeric [`EntityId`] handed out by an
//! [`IdGenerator`] that is shared by every manager of one entity family.
//! Identities that cross process boundaries (who sent a transmission, which
//! transmission it was) use UUID v7 so they sort by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::Error;

/// Identifier of a persisted entity.
///
/// Totally ordered and compared by value. [`EntityId::NULL`] denotes
/// "no reference"; a generator never hands it out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// The "no reference" sentinel.
    pub const NULL: EntityId = EntityId(0);

    /// Creates an entity ID from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Returns true for the null sentinel.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Parses an entity ID from its decimal form.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::InvalidEntityId(s.to_string()))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Monotonic identifier source for one entity family.
///
/// Cloning yields another handle onto the same counter, which is how several
/// managers of the same kind share a family. `next_id` is a single atomic
/// increment and never blocks.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    family: &'static str,
    next: Arc<AtomicU64>,
}

impl IdGenerator {
    /// Creates a generator whose first id is 1.
    #[must_use]
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Name of the family this generator numbers.
    #[must_use]
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Allocates the next identifier.
    pub fn next_id(&self) -> EntityId {
        EntityId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the id the next call to [`next_id`](Self::next_id) would yield.
    #[must_use]
    pub fn peek(&self) -> EntityId {
        EntityId(self.next.load(Ordering::Relaxed))
    }

    /// Records that `id` is live in this family so it is never handed out.
    pub fn observe(&self, id: EntityId) {
        if !id.is_null() {
            self.next.fetch_max(id.0.saturating_add(1), Ordering::Relaxed);
        }
    }

    /// Restarts numbering at 1.
    ///
    /// Only safe while every entity of the family is about to be renumbered,
    /// i.e. at the start of restoration pass 1.
    pub fn reset(&self) {
        self.next.store(1, Ordering::Relaxed);
    }

    /// Returns true if both handles share one counter.
    #[must_use]
    pub fn same_family(&self, other: &IdGenerator) -> bool {
        Arc::ptr_eq(&self.next, &other.next)
    }
}

/// Identity of whoever instigated a transmission (a user or a service).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstigatorId(Uuid);

impl InstigatorId {
    /// Creates a new instigator ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The instigator used for work the system does on its own behalf.
    #[must_use]
    pub const fn system() -> Self {
        Self(Uuid::nil())
    }

    /// Creates an instigator ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an instigator ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for InstigatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstigatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstigatorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransmissionId(Uuid);

impl TransmissionId {
    /// Creates a new transmission ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransmissionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
