//! Error types for the codec.

use thiserror::Error;

use crate::{FormatVersion, TypeTag};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while reading a stream.
///
/// All of them are fatal for the stream being read: once a read goes wrong
/// the position of the following bytes is unknown.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying read failed (most commonly a truncated stream).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream declares a version this build cannot read, or a type has
    /// no layout for it.
    #[error("unsupported format version {version} for {what}")]
    UnsupportedVersion {
        what: &'static str,
        version: FormatVersion,
    },

    /// No constructor is registered for a type tag.
    #[error("unknown type tag {tag} in {factory}")]
    UnknownTypeTag { factory: &'static str, tag: TypeTag },

    /// A constructor was registered twice for the same tag.
    #[error("type tag {tag} registered twice in {factory}")]
    DuplicateTypeTag { factory: &'static str, tag: TypeTag },

    /// A length prefix is negative or larger than the remaining input.
    #[error("invalid length {length} ({remaining} bytes remaining)")]
    InvalidLength { length: i64, remaining: usize },

    /// A string payload is not UTF-8.
    #[error("invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A value is out of range for its type.
    #[error("invalid value for {what}: {value}")]
    InvalidValue { what: &'static str, value: i64 },

    /// Bytes remain after the top-level value.
    #[error("{0} trailing bytes after end of stream")]
    TrailingBytes(usize),
}
