use byteorder::{ByteOrder, LittleEndian};
use planstore_types::{EntityId, Timestamp};
#[cfg(debug_assertions)]
use std::collections::HashSet;
use uuid::Uuid;

use crate::CURRENT_FORMAT_VERSION;

/// Append-only stream writer.
///
/// Always writes the current format version. In debug builds it also tracks
/// which live instances were passed to [`mark_written`](Self::mark_written)
/// during this pass.
pub struct Writer {
    buffer: Vec<u8>,
    #[cfg(debug_assertions)]
    written: HashSet<(usize, &'static str)>,
}

impl Writer {
    /// Creates a writer and emits the current version header.
    #[must_use]
    pub fn new() -> Self {
        let mut writer = Self::headerless();
        writer.write_i32(CURRENT_FORMAT_VERSION.as_i32());
        writer
    }

    /// Creates a writer for a nested payload that carries no header of its
    /// own (snapshots, payloads embedded in another stream).
    #[must_use]
    pub fn headerless() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
            #[cfg(debug_assertions)]
            written: HashSet::new(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Registers `instance` as serialized in this pass.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the same live instance was already marked:
    /// writing one object twice means the reference graph has an ownership
    /// bug, and the resulting stream would rehydrate two distinct copies.
    pub fn mark_written<T: ?Sized>(&mut self, instance: &T) {
        #[cfg(debug_assertions)]
        {
            let address = (instance as *const T).cast::<()>() as usize;
            let type_name = std::any::type_name::<T>();
            if !self.written.insert((address, type_name)) {
                panic!(
                    "duplicate serialization: {type_name} at {address:#x} written twice in one pass"
                );
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = instance;
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn write_i64(&mut self, value: i64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_i64(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    /// Writes a collection length as int32.
    ///
    /// # Panics
    ///
    /// Panics if `len` does not fit an int32; no persisted collection may
    /// grow that large.
    pub fn write_len(&mut self, len: usize) {
        let len = i32::try_from(len).expect("collection too large for stream length prefix");
        self.write_i32(len);
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_len(value.len());
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Writes an optional string; `None` is a length of -1.
    pub fn write_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => self.write_str(s),
            None => self.write_i32(-1),
        }
    }

    /// Writes a length-prefixed byte blob.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_len(value.len());
        self.buffer.extend_from_slice(value);
    }

    pub fn write_entity_id(&mut self, id: EntityId) {
        self.write_u64(id.raw());
    }

    pub fn write_uuid(&mut self, id: Uuid) {
        self.buffer.extend_from_slice(id.as_bytes());
    }

    pub fn write_timestamp(&mut self, ts: Timestamp) {
        self.write_i64(ts.as_millis());
    }

    /// Writes a length-prefixed sequence, one item at a time.
    pub fn write_seq<'a, T: 'a, I, F>(&mut self, items: I, mut write_item: F)
    where
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut Self, &'a T),
    {
        let items = items.into_iter();
        self.write_len(items.len());
        for item in items {
            write_item(self, item);
        }
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
