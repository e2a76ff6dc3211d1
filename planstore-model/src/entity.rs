use planstore_types::EntityId;

use crate::{RestoreChild, RestoreContext};

/// A persisted object owned by exactly one [`EntityManager`](crate::EntityManager).
///
/// The id is read first when an entity is rehydrated, before any
/// subtype fields. Managers rewrite it on insert (null ids), on copy, and
/// during restoration pass 1; nothing else should.
pub trait Entity: Send + Sync + 'static {
    /// Entity kind, also the name of its id family.
    const KIND: &'static str;

    fn id(&self) -> EntityId;

    fn set_id(&mut self, id: EntityId);

    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    /// Key assigned by an external system (ERP number, import key...).
    fn external_id(&self) -> Option<&str> {
        None
    }

    fn set_external_id(&mut self, external_id: Option<String>) {
        let _ = external_id;
    }

    /// Re-resolves this entity's weak references after every owner has
    /// been renumbered (restoration pass 2).
    fn reconnect(&mut self, ctx: &mut RestoreContext) {
        let _ = ctx;
    }

    /// Nested restorable members this entity owns or refers to.
    fn restorable_children(&mut self) -> Vec<RestoreChild<'_>> {
        Vec::new()
    }
}
