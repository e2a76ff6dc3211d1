//! Bounded history with batched notification.

use planstore_codec::{CodecError, CodecResult, Encode, Layout, Reader, VersionTable, Writer};
use planstore_types::{EntityId, InstigatorId, Timestamp};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::{ChangeKind, HistoryError, HistoryResult};

/// History kept per scenario unless configured otherwise.
pub const DEFAULT_MAX_HISTORY: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryType {
    #[default]
    General,
    Added,
    Changed,
    Deleted,
}

impl HistoryType {
    fn code(self) -> i32 {
        match self {
            Self::General => 0,
            Self::Added => 1,
            Self::Changed => 2,
            Self::Deleted => 3,
        }
    }

    fn from_code(code: i32) -> CodecResult<Self> {
        match code {
            0 => Ok(Self::General),
            1 => Ok(Self::Added),
            2 => Ok(Self::Changed),
            3 => Ok(Self::Deleted),
            other => Err(CodecError::InvalidValue {
                what: "history type",
                value: i64::from(other),
            }),
        }
    }
}

impl From<ChangeKind> for HistoryType {
    fn from(change: ChangeKind) -> Self {
        match change {
            ChangeKind::Added => Self::Added,
            ChangeKind::Changed => Self::Changed,
            ChangeKind::Deleted => Self::Deleted,
        }
    }
}

impl fmt::Display for HistoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::General => "general",
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        };
        f.write_str(label)
    }
}

/// One user-facing history line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub sequence: u64,
    pub subject_keys: Vec<EntityId>,
    pub description: String,
    pub history_type: HistoryType,
    pub timestamp: Timestamp,
    pub instigator: InstigatorId,
}

impl Default for HistoryRecord {
    fn default() -> Self {
        Self {
            sequence: 0,
            subject_keys: Vec::new(),
            description: String::new(),
            history_type: HistoryType::General,
            timestamp: Timestamp::EPOCH,
            instigator: InstigatorId::system(),
        }
    }
}

impl Encode for HistoryRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.write_u64(self.sequence);
        writer.write_str(&self.description);
        writer.write_timestamp(self.timestamp);
        writer.write_seq(&self.subject_keys, |w, id| w.write_entity_id(*id));
        writer.write_i32(self.history_type.code());
        writer.write_uuid(self.instigator.as_uuid());
    }
}

// v1 stored the sequence as i64 and nothing beyond the text and time.
fn read_v1(reader: &mut Reader<'_>) -> CodecResult<HistoryRecord> {
    let sequence = reader.read_i64()?;
    Ok(HistoryRecord {
        sequence: u64::try_from(sequence).map_err(|_| CodecError::InvalidValue {
            what: "history sequence",
            value: sequence,
        })?,
        description: reader.read_string()?,
        timestamp: reader.read_timestamp()?,
        ..HistoryRecord::default()
    })
}

fn read_v5(reader: &mut Reader<'_>) -> CodecResult<HistoryRecord> {
    Ok(HistoryRecord {
        sequence: reader.read_u64()?,
        description: reader.read_string()?,
        timestamp: reader.read_timestamp()?,
        subject_keys: reader.read_seq(Reader::read_entity_id)?,
        history_type: HistoryType::from_code(reader.read_i32()?)?,
        ..HistoryRecord::default()
    })
}

fn read_v9(reader: &mut Reader<'_>) -> CodecResult<HistoryRecord> {
    Ok(HistoryRecord {
        sequence: reader.read_u64()?,
        description: reader.read_string()?,
        timestamp: reader.read_timestamp()?,
        subject_keys: reader.read_seq(Reader::read_entity_id)?,
        history_type: HistoryType::from_code(reader.read_i32()?)?,
        instigator: InstigatorId::from_uuid(reader.read_uuid()?),
    })
}

pub(crate) static HISTORY_RECORD: VersionTable<HistoryRecord> = VersionTable::new(
    "history record",
    &[
        Layout::reads(9, read_v9),
        Layout::reads(5, read_v5),
        Layout::reads(1, read_v1),
    ],
);

/// Receives history batches.
pub trait HistoryListener: Send + Sync {
    /// Called once per applied transmission with every record it produced.
    fn on_history(&self, batch: &[HistoryRecord]);
}

/// Bounded, ordered history of one scenario.
///
/// Records are appended by [`record_history`](Self::record_history) and
/// announced together by [`fire_history_event`](Self::fire_history_event);
/// listeners never see a partial batch.
pub struct HistoryManager {
    records: VecDeque<HistoryRecord>,
    pending: Vec<HistoryRecord>,
    listeners: Vec<Arc<dyn HistoryListener>>,
    max_count: usize,
    next_sequence: u64,
}

impl HistoryManager {
    #[must_use]
    pub fn new(max_count: usize) -> Self {
        Self {
            records: VecDeque::new(),
            pending: Vec::new(),
            listeners: Vec::new(),
            max_count,
            next_sequence: 1,
        }
    }

    /// Appends a record and queues it for the next batch. Returns its
    /// sequence number.
    pub fn record_history(
        &mut self,
        subject_keys: Vec<EntityId>,
        description: impl Into<String>,
        history_type: HistoryType,
        timestamp: Timestamp,
        instigator: InstigatorId,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let record = HistoryRecord {
            sequence,
            subject_keys,
            description: description.into(),
            history_type,
            timestamp,
            instigator,
        };
        self.pending.push(record.clone());
        self.records.push_back(record);
        self.evict();
        sequence
    }

    /// Notifies every listener of the pending batch, then clears it.
    /// Returns the batch size; an empty batch notifies nobody.
    pub fn fire_history_event(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let batch = std::mem::take(&mut self.pending);
        for listener in &self.listeners {
            listener.on_history(&batch);
        }
        debug!(
            "history batch of {} fired to {} listeners",
            batch.len(),
            self.listeners.len()
        );
        batch.len()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn HistoryListener>) {
        self.listeners.push(listener);
    }

    /// Oldest first.
    pub fn records(&self) -> impl ExactSizeIterator<Item = &HistoryRecord> + '_ {
        self.records.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&HistoryRecord> {
        self.records.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Changes the bound, evicting right away when it shrinks.
    pub fn set_max_count(&mut self, max_count: usize) {
        self.max_count = max_count;
        self.evict();
    }

    fn evict(&mut self) {
        let excess = self.records.len().saturating_sub(self.max_count);
        if excess > 0 {
            self.records.drain(..excess);
        }
    }

    /// Decodes persisted records into a manager bounded by `max_count`.
    /// Listeners are not persisted.
    pub fn decode_with(reader: &mut Reader<'_>, max_count: usize) -> HistoryResult<Self> {
        let records = reader.read_seq(|r| HISTORY_RECORD.read(r))?;
        let mut manager = Self::new(max_count);
        for record in records {
            if let Some(last) = manager.records.back() {
                if record.sequence <= last.sequence {
                    return Err(HistoryError::SequenceRegression {
                        previous: last.sequence,
                        found: record.sequence,
                    });
                }
            }
            manager.next_sequence = record.sequence.checked_add(1).ok_or_else(|| {
                CodecError::InvalidValue {
                    what: "history sequence",
                    value: record.sequence as i64,
                }
            })?;
            manager.records.push_back(record);
        }
        manager.evict();
        Ok(manager)
    }
}

impl Encode for HistoryManager {
    fn encode(&self, writer: &mut Writer) {
        writer.write_seq(&self.records, |w, record| record.encode(w));
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("len", &self.records.len())
            .field("pending", &self.pending.len())
            .field("listeners", &self.listeners.len())
            .field("max_count", &self.max_count)
            .finish()
    }
}
