//! Versioned binary codec for planstore.
//!
//! Every persisted stream starts with an int32 format-version header followed
//! by nested `{int32 type tag, payload}` records. Writers always emit the
//! current version's full field set; readers accept every supported
//! historical version and pick the matching layout from a [`VersionTable`].
//!
//! - [`Writer`] / [`Reader`]: little-endian primitives, strings, ids
//! - [`Encode`] / [`Decode`]: per-type serialization contract
//! - [`VersionTable`]: one isolated layout per historical version range
//! - [`ClassFactory`]: type tag → constructor for polymorphic payloads

mod error;
mod factory;
mod reader;
mod version;
mod writer;

pub use error::{CodecError, CodecResult};
pub use factory::{ClassFactory, Constructor, Polymorphic, TypeTag};
pub use reader::Reader;
pub use version::{
    CURRENT_FORMAT_VERSION, FormatVersion, Layout, LayoutReader, MIN_FORMAT_VERSION, VersionTable,
};
pub use writer::Writer;

/// A value that can be written to a stream.
///
/// There is deliberately no version parameter: the current layout is the
/// only one ever written.
pub trait Encode {
    fn encode(&self, writer: &mut Writer);
}

/// A value that can be rebuilt from a stream of any supported version.
pub trait Decode: Sized {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self>;
}

/// Encodes a value into a fresh stream with the current version header.
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut writer = Writer::new();
    value.encode(&mut writer);
    writer.into_bytes()
}

/// Decodes a value from a stream that starts with a version header.
///
/// Trailing bytes after the value are an error.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> CodecResult<T> {
    let mut reader = Reader::new(bytes)?;
    let value = T::decode(&mut reader)?;
    reader.expect_end()?;
    Ok(value)
}
