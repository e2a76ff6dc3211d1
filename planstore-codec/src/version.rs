//! Format versions and historical layout tables.
//!
//! Instead of one ever-growing `if version >= N` chain per type, each type
//! declares a static [`VersionTable`]: one [`Layout`] per supported version
//! range, each reading exactly the fields a writer of that range emitted.
//! The newest layout whose `since` is not above the stream version wins.

use std::fmt;

use crate::{CodecError, CodecResult, Reader};

/// Format version number carried in every stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion(i32);

impl FormatVersion {
    #[must_use]
    pub const fn new(version: i32) -> Self {
        Self(version)
    }

    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns true if this build can read streams of this version.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.0 >= MIN_FORMAT_VERSION.0 && self.0 <= CURRENT_FORMAT_VERSION.0
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Oldest stream version this build still reads.
pub const MIN_FORMAT_VERSION: FormatVersion = FormatVersion(1);

/// Version written by this build.
pub const CURRENT_FORMAT_VERSION: FormatVersion = FormatVersion(12);

/// Reads one historical field layout.
pub type LayoutReader<T> = fn(&mut Reader<'_>) -> CodecResult<T>;

/// The field layout of a type for streams at or above `since`, up to the next
/// layout in the same table.
pub struct Layout<T> {
    since: FormatVersion,
    read: Option<LayoutReader<T>>,
}

impl<T> Layout<T> {
    /// A range whose writers emitted the fields read by `read`.
    pub const fn reads(since: i32, read: LayoutReader<T>) -> Self {
        Self {
            since: FormatVersion(since),
            read: Some(read),
        }
    }

    /// A range whose writers emitted nothing for this type. Reading it
    /// consumes no bytes and yields `T::default()`.
    pub const fn empty(since: i32) -> Self {
        Self {
            since: FormatVersion(since),
            read: None,
        }
    }

    #[must_use]
    pub const fn since(&self) -> FormatVersion {
        self.since
    }

    /// True for a range declared with [`Layout::empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.read.is_none()
    }
}

/// All historical layouts of one type.
pub struct VersionTable<T: 'static> {
    name: &'static str,
    layouts: &'static [Layout<T>],
}

impl<T: 'static> VersionTable<T> {
    pub const fn new(name: &'static str, layouts: &'static [Layout<T>]) -> Self {
        Self { name, layouts }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The layout that applies to streams of `version`.
    #[must_use]
    pub fn layout_for(&self, version: FormatVersion) -> Option<&Layout<T>> {
        self.layouts
            .iter()
            .filter(|layout| layout.since <= version)
            .max_by_key(|layout| layout.since)
    }

    /// First version of every declared range, oldest first.
    #[must_use]
    pub fn versions(&self) -> Vec<FormatVersion> {
        let mut versions: Vec<_> = self.layouts.iter().map(|l| l.since).collect();
        versions.sort();
        versions
    }
}

impl<T: Default + 'static> VersionTable<T> {
    /// Reads the fields of `T` using the layout matching the reader's version.
    pub fn read(&self, reader: &mut Reader<'_>) -> CodecResult<T> {
        let version = reader.version();
        let layout = self
            .layout_for(version)
            .ok_or(CodecError::UnsupportedVersion {
                what: self.name,
                version,
            })?;
        match layout.read {
            Some(read) => read(reader),
            None => Ok(T::default()),
        }
    }
}
