use planstore_codec::{Encode, Writer};
use planstore_types::{EntityId, ScenarioDataChanges};

/// What happened to the subject of an [`AuditEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Deleted,
}

/// One entity-level change made by a transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub subject: EntityId,
    pub kind: &'static str,
    pub change: ChangeKind,
    /// Headerless encoding of the entity before the change. `None` for
    /// additions.
    pub before: Option<Vec<u8>>,
}

impl AuditEntry {
    #[must_use]
    pub fn added(kind: &'static str, subject: EntityId) -> Self {
        Self {
            subject,
            kind,
            change: ChangeKind::Added,
            before: None,
        }
    }

    #[must_use]
    pub fn changed<T: Encode>(kind: &'static str, subject: EntityId, before: &T) -> Self {
        Self {
            subject,
            kind,
            change: ChangeKind::Changed,
            before: Some(snapshot(before)),
        }
    }

    #[must_use]
    pub fn deleted<T: Encode>(kind: &'static str, subject: EntityId, before: &T) -> Self {
        Self {
            subject,
            kind,
            change: ChangeKind::Deleted,
            before: Some(snapshot(before)),
        }
    }
}

fn snapshot<T: Encode>(value: &T) -> Vec<u8> {
    let mut writer = Writer::headerless();
    value.encode(&mut writer);
    writer.into_bytes()
}

/// Buffer of audit entries for a single transmission.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the log, yielding entries in the order they were recorded.
    pub fn drain(&mut self) -> std::vec::Drain<'_, AuditEntry> {
        self.entries.drain(..)
    }

    /// Folds the recorded entries into per-kind change sets.
    #[must_use]
    pub fn changes(&self) -> ScenarioDataChanges {
        let mut changes = ScenarioDataChanges::new();
        for entry in &self.entries {
            match entry.change {
                ChangeKind::Added => changes.added(entry.kind, entry.subject),
                ChangeKind::Changed => changes.updated(entry.kind, entry.subject),
                ChangeKind::Deleted => changes.deleted(entry.kind, entry.subject),
            }
        }
        changes
    }
}
