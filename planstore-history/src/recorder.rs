//! Recording of applied transmissions for persistence and replay.

use planstore_codec::{ClassFactory, CodecResult, Polymorphic, Reader, Writer};
use planstore_types::Timestamp;
use std::fmt;

/// Streams older than this did not store when a transmission was recorded.
const RECORDED_AT_SINCE: i32 = 3;

/// A transmission together with the time it was recorded.
pub struct TransmissionRecord<P: ?Sized> {
    recorded_at: Timestamp,
    payload: Box<P>,
}

impl<P: ?Sized + Polymorphic> TransmissionRecord<P> {
    /// Wraps `payload`, stamped with the current time.
    #[must_use]
    pub fn new(payload: Box<P>) -> Self {
        Self::with_time(Timestamp::now(), payload)
    }

    #[must_use]
    pub fn with_time(recorded_at: Timestamp, payload: Box<P>) -> Self {
        Self {
            recorded_at,
            payload,
        }
    }

    #[must_use]
    pub fn recorded_at(&self) -> Timestamp {
        self.recorded_at
    }

    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Box<P> {
        self.payload
    }

    /// Writes the recording time, then the payload's tag and body.
    pub fn serialize(&self, writer: &mut Writer, factory: &ClassFactory<P>) {
        writer.write_timestamp(self.recorded_at);
        factory.serialize(writer, &self.payload);
    }

    pub fn deserialize(reader: &mut Reader<'_>, factory: &ClassFactory<P>) -> CodecResult<Self> {
        let recorded_at = if reader.at_least(RECORDED_AT_SINCE) {
            reader.read_timestamp()?
        } else {
            Timestamp::EPOCH
        };
        let payload = factory.deserialize(reader)?;
        Ok(Self {
            recorded_at,
            payload,
        })
    }
}

impl<P: ?Sized> fmt::Debug for TransmissionRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransmissionRecord")
            .field("recorded_at", &self.recorded_at)
            .finish_non_exhaustive()
    }
}

/// Ordered log of recorded transmissions.
///
/// Unlike history the log is not bounded: it keeps every transmission since
/// the scenario was created, because replay needs the complete sequence.
/// It is rewritten in full on every save. Owners that want to cap it drain
/// it with [`take`](Self::take), which also ends its replayability from an
/// empty scenario.
pub struct TransmissionLog<P: ?Sized> {
    records: Vec<TransmissionRecord<P>>,
}

impl<P: ?Sized + Polymorphic> TransmissionLog<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, record: TransmissionRecord<P>) {
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TransmissionRecord<P>> + '_ {
        self.records.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&TransmissionRecord<P>> {
        self.records.last()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Removes every record, oldest first.
    pub fn take(&mut self) -> Vec<TransmissionRecord<P>> {
        std::mem::take(&mut self.records)
    }

    pub fn serialize(&self, writer: &mut Writer, factory: &ClassFactory<P>) {
        writer.write_seq(&self.records, |w, record| record.serialize(w, factory));
    }

    pub fn deserialize(reader: &mut Reader<'_>, factory: &ClassFactory<P>) -> CodecResult<Self> {
        let records = reader.read_seq(|r| TransmissionRecord::deserialize(r, factory))?;
        Ok(Self { records })
    }
}

impl<P: ?Sized + Polymorphic> Default for TransmissionLog<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized + Polymorphic> FromIterator<TransmissionRecord<P>> for TransmissionLog<P> {
    fn from_iter<I: IntoIterator<Item = TransmissionRecord<P>>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<P: ?Sized> fmt::Debug for TransmissionLog<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransmissionLog")
            .field("len", &self.records.len())
            .finish()
    }
}
