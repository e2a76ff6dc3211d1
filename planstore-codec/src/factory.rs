//! Polymorphic construction by type tag.

use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::{CodecError, CodecResult, Reader, Writer};

/// Small integer written ahead of a polymorphic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(pub i32);

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value whose concrete type is only known from its tag on the wire.
pub trait Polymorphic {
    fn type_tag(&self) -> TypeTag;

    /// Writes everything after the tag.
    fn encode_body(&self, writer: &mut Writer);
}

/// Rebuilds one concrete type from the bytes following its tag.
pub type Constructor<P> = fn(&mut Reader<'_>) -> CodecResult<Box<P>>;

/// Maps type tags to constructors for one family of polymorphic values.
pub struct ClassFactory<P: ?Sized> {
    name: &'static str,
    constructors: HashMap<TypeTag, (&'static str, Constructor<P>)>,
}

impl<P: ?Sized + Polymorphic> ClassFactory<P> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            constructors: HashMap::new(),
        }
    }

    /// Registers the constructor for `tag`.
    pub fn register(
        &mut self,
        tag: TypeTag,
        type_name: &'static str,
        constructor: Constructor<P>,
    ) -> CodecResult<()> {
        if self.constructors.contains_key(&tag) {
            return Err(CodecError::DuplicateTypeTag {
                factory: self.name,
                tag,
            });
        }
        debug!("{}: registered {} as {}", self.name, type_name, tag);
        self.constructors.insert(tag, (type_name, constructor));
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, tag: TypeTag) -> bool {
        self.constructors.contains_key(&tag)
    }

    /// Name of the type registered under `tag`.
    #[must_use]
    pub fn type_name(&self, tag: TypeTag) -> Option<&'static str> {
        self.constructors.get(&tag).map(|(name, _)| *name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Writes the value's tag followed by its body.
    pub fn serialize(&self, writer: &mut Writer, value: &P) {
        let tag = value.type_tag();
        debug_assert!(
            self.is_registered(tag),
            "{}: serializing unregistered tag {}",
            self.name,
            tag
        );
        writer.write_i32(tag.0);
        value.encode_body(writer);
    }

    /// Reads a tag and invokes the matching constructor.
    pub fn deserialize(&self, reader: &mut Reader<'_>) -> CodecResult<Box<P>> {
        let tag = TypeTag(reader.read_i32()?);
        let (_, constructor) = self
            .constructors
            .get(&tag)
            .ok_or(CodecError::UnknownTypeTag {
                factory: self.name,
                tag,
            })?;
        constructor(reader)
    }
}
