use byteorder::{LittleEndian, ReadBytesExt};
use planstore_types::{EntityId, Timestamp};
use std::io::{Cursor, Read};
use uuid::Uuid;

use crate::{CodecError, CodecResult, FormatVersion};

/// Stream reader bound to the format version declared by the stream.
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    version: FormatVersion,
}

impl<'a> Reader<'a> {
    /// Reads the version header and checks that this build supports it.
    pub fn new(bytes: &'a [u8]) -> CodecResult<Self> {
        let mut cursor = Cursor::new(bytes);
        let version = FormatVersion::new(cursor.read_i32::<LittleEndian>()?);
        if !version.is_supported() {
            return Err(CodecError::UnsupportedVersion {
                what: "stream header",
                version,
            });
        }
        Ok(Self { cursor, version })
    }

    /// Reads a headerless payload written under `version`.
    #[must_use]
    pub fn with_version(bytes: &'a [u8], version: FormatVersion) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            version,
        }
    }

    /// The format version every decoder on this stream gates on.
    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Returns true if the stream was written at or after `version`.
    #[must_use]
    pub fn at_least(&self, version: i32) -> bool {
        self.version.as_i32() >= version
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails if any bytes remain.
    pub fn expect_end(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidValue {
                what: "bool",
                value: i64::from(other),
            }),
        }
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(self.cursor.read_i64::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> CodecResult<u64> {
        Ok(self.cursor.read_u64::<LittleEndian>()?)
    }

    pub fn read_f64(&mut self) -> CodecResult<f64> {
        Ok(self.cursor.read_f64::<LittleEndian>()?)
    }

    /// Reads an int32 length and checks it against the remaining input,
    /// assuming each element takes at least `min_element_size` bytes.
    pub fn read_len(&mut self, min_element_size: usize) -> CodecResult<usize> {
        let length = self.read_i32()?;
        let remaining = self.remaining();
        let invalid = || CodecError::InvalidLength {
            length: i64::from(length),
            remaining,
        };
        let length = usize::try_from(length).map_err(|_| invalid())?;
        if length.saturating_mul(min_element_size) > remaining {
            return Err(invalid());
        }
        Ok(length)
    }

    pub fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_len(1)?;
        let bytes = self.read_exact(len)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Reads a string written by `write_opt_str`.
    pub fn read_opt_string(&mut self) -> CodecResult<Option<String>> {
        let start = self.position();
        if self.read_i32()? == -1 {
            return Ok(None);
        }
        self.cursor.set_position(start as u64);
        self.read_string().map(Some)
    }

    pub fn read_bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.read_len(1)?;
        self.read_exact(len)
    }

    pub fn read_entity_id(&mut self) -> CodecResult<EntityId> {
        Ok(EntityId::from_raw(self.read_u64()?))
    }

    pub fn read_uuid(&mut self) -> CodecResult<Uuid> {
        let mut bytes = [0u8; 16];
        self.cursor.read_exact(&mut bytes)?;
        Ok(Uuid::from_bytes(bytes))
    }

    pub fn read_timestamp(&mut self) -> CodecResult<Timestamp> {
        Ok(Timestamp::from_millis(self.read_i64()?))
    }

    /// Reads a sequence written by `Writer::write_seq`.
    pub fn read_seq<T, F>(&mut self, mut read_item: F) -> CodecResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> CodecResult<T>,
    {
        let len = self.read_len(1)?;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(read_item(self)?);
        }
        Ok(items)
    }

    fn read_exact(&mut self, len: usize) -> CodecResult<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        self.cursor.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}
