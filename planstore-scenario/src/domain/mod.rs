//! Sample planning domain.
//!
//! Just enough structure to exercise ownership, nesting and cross-manager
//! weak references: plants own nothing, resources point at a plant, jobs
//! own their operations, and operations point at a resource.

mod job;
mod operation;
mod plant;
mod resource;

pub use job::Job;
pub use operation::Operation;
pub use plant::Plant;
pub use resource::Resource;

use planstore_codec::{CodecError, CodecResult};
use planstore_model::Entity;
use std::fmt;

/// Entity kinds a transmission can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Plant,
    Resource,
    Job,
    Operation,
}

impl EntityKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Plant => Plant::KIND,
            Self::Resource => Resource::KIND,
            Self::Job => Job::KIND,
            Self::Operation => Operation::KIND,
        }
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            Self::Plant => 1,
            Self::Resource => 2,
            Self::Job => 3,
            Self::Operation => 4,
        }
    }

    pub(crate) fn from_code(code: i32) -> CodecResult<Self> {
        match code {
            1 => Ok(Self::Plant),
            2 => Ok(Self::Resource),
            3 => Ok(Self::Job),
            4 => Ok(Self::Operation),
            other => Err(CodecError::InvalidValue {
                what: "entity kind",
                value: i64::from(other),
            }),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
