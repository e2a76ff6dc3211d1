use planstore_codec::{CodecResult, Decode, Encode, Reader, Writer};
use planstore_types::EntityId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::{Entity, EntityManager, RestoreContext};

/// Id-only reference to an entity owned by some other manager.
///
/// Holds no borrow and no pointer; resolving is a lookup in the owning
/// manager. After a load the id is stale until
/// [`reconnect`](Self::reconnect) runs in restoration pass 2.
pub struct WeakRef<T> {
    id: EntityId,
    kind: PhantomData<fn() -> T>,
}

impl<T: Entity> WeakRef<T> {
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            kind: PhantomData,
        }
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::new(EntityId::NULL)
    }

    #[must_use]
    pub fn to(entity: &T) -> Self {
        Self::new(entity.id())
    }

    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.id.is_null()
    }

    pub fn set(&mut self, id: EntityId) {
        self.id = id;
    }

    pub fn clear(&mut self) {
        self.id = EntityId::NULL;
    }

    #[must_use]
    pub fn resolve<'m>(&self, manager: &'m EntityManager<T>) -> Option<&'m T> {
        if self.is_null() {
            return None;
        }
        manager.get_by_id(self.id)
    }

    /// Rewrites the id through the restoration remap table.
    pub fn reconnect(&mut self, ctx: &mut RestoreContext) {
        self.id = ctx.resolve(T::KIND, self.id);
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WeakRef<T> {}

impl<T> PartialEq for WeakRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for WeakRef<T> {}

impl<T> Hash for WeakRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Default for WeakRef<T> {
    fn default() -> Self {
        Self {
            id: EntityId::NULL,
            kind: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakRef<{}>({})", T::KIND, self.id)
    }
}

impl<T> Encode for WeakRef<T> {
    fn encode(&self, writer: &mut Writer) {
        writer.write_entity_id(self.id);
    }
}

impl<T> Decode for WeakRef<T> {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            id: reader.read_entity_id()?,
            kind: PhantomData,
        })
    }
}
