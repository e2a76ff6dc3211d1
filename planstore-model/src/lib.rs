//! Identity and ownership substrate for planstore.
//!
//! Defines the pieces every domain manager is built from:
//! - [`Entity`]: a persisted object with a stable [`EntityId`](planstore_types::EntityId)
//! - [`EntityManager`]: exclusive, id-ordered owner of one kind of entity
//! - [`ExternalIndex`]: reference-counted hash index by external key
//! - [`WeakRef`]: id-only reference to an entity owned elsewhere
//! - [`ReferenceRestorer`]: the two-pass renumber/reconnect protocol run
//!   after a whole graph has been deserialized
//!
//! Managers never hold pointers into one another. Cross references are ids,
//! so reconnecting after a load is a map lookup and cycles need no special
//! casing.

mod entity;
mod error;
mod external_index;
mod manager;
mod naming;
mod restore;
mod weak_ref;

pub use entity::Entity;
pub use error::{ModelError, ModelResult, RestoreError};
pub use external_index::ExternalIndex;
pub use manager::EntityManager;
pub use restore::{
    ChildNode, DanglingReferenceFault, ReferenceRestorer, RestoreChild, RestoreContext, RestoreKey,
    RestorePhase, RestoreReport, Restorable, Role, SharedRestorable,
};
pub use weak_ref::WeakRef;
