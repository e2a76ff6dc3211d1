//! Id-ordered ownership of one entity kind.

use planstore_codec::{CodecResult, Decode, Encode, Reader, Writer};
use planstore_types::{EntityId, IdGenerator};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::naming::AutoNamer;
use crate::{
    Entity, ExternalIndex, ModelError, ModelResult, Restorable, RestoreChild, RestoreContext,
};

/// Exclusive owner of a collection of entities of one kind.
///
/// Entities are kept in a `BTreeMap` so enumeration is always in ascending
/// id order and lookups are `O(log n)`. Every structural change also updates
/// the external index (when enabled) and the default-name counter, within
/// the same call.
///
/// Managers of the same kind living in different parents (one operation
/// manager per job, say) must share one [`IdGenerator`] so ids stay unique
/// across the family; see [`with_generator`](Self::with_generator).
#[derive(Debug)]
pub struct EntityManager<T: Entity> {
    entities: BTreeMap<EntityId, T>,
    generator: IdGenerator,
    namer: AutoNamer,
    index: ExternalIndex,
}

impl<T: Entity> EntityManager<T> {
    /// Creates an empty manager with its own generator.
    #[must_use]
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self::with_generator(IdGenerator::new(T::KIND), name_prefix)
    }

    /// Creates an empty manager numbering from a shared family generator.
    #[must_use]
    pub fn with_generator(generator: IdGenerator, name_prefix: impl Into<String>) -> Self {
        Self {
            entities: BTreeMap::new(),
            generator,
            namer: AutoNamer::new(name_prefix),
            index: ExternalIndex::new(),
        }
    }

    /// Switches to `generator`, advancing it past every id held here.
    pub fn adopt_generator(&mut self, generator: IdGenerator) {
        for id in self.entities.keys() {
            generator.observe(*id);
        }
        self.generator = generator;
    }

    #[must_use]
    pub fn generator(&self) -> &IdGenerator {
        &self.generator
    }

    #[must_use]
    pub fn name_prefix(&self) -> &str {
        self.namer.prefix()
    }

    /// Changes the prefix of synthesized names. The number cache is dropped.
    pub fn set_name_prefix(&mut self, name_prefix: impl Into<String>) {
        self.namer = AutoNamer::new(name_prefix);
    }

    /// Allocates an id from this manager's family.
    pub fn next_id(&self) -> EntityId {
        self.generator.next_id()
    }

    // ── Mutation ──────────────────────────────────────────────────

    /// Inserts `entity`, or returns the entity already stored under its id.
    ///
    /// A null id is replaced with a fresh one and an empty name with
    /// `<prefix> <n>`. With the external index enabled, an external id
    /// already held by another entity is rejected and nothing is inserted.
    pub fn add(&mut self, mut entity: T) -> ModelResult<&T> {
        if entity.id().is_null() {
            entity.set_id(self.generator.next_id());
        }
        let id = entity.id();
        if self.entities.contains_key(&id) {
            debug!("{} {id} already present, add ignored", T::KIND);
            return Ok(&self.entities[&id]);
        }
        if let Some(key) = entity.external_id() {
            self.index.check_available(T::KIND, key, id)?;
        }

        if entity.name().is_empty() {
            let name = self.namer.issue(self.entities.values().map(Entity::name), id);
            entity.set_name(name);
        } else {
            self.namer.observe_name(entity.name());
        }
        self.generator.observe(id);
        if let Some(key) = entity.external_id() {
            self.index.insert(key, id);
        }
        Ok(self.entities.entry(id).or_insert(entity))
    }

    /// Adds `clone` under `new_id`, or under a fresh id when `new_id` is
    /// null or equal to the original's id.
    pub fn add_copy(&mut self, original: &T, mut clone: T, new_id: EntityId) -> ModelResult<&T> {
        let id = if new_id.is_null() || new_id == original.id() {
            self.generator.next_id()
        } else {
            new_id
        };
        clone.set_id(id);
        self.add(clone)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let entity = self.entities.remove(&id)?;
        if let Some(key) = entity.external_id() {
            self.index.remove(key, id);
        }
        self.namer.on_removed(id);
        Some(entity)
    }

    /// Removes the entity at position `index` in id order.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let id = *self.entities.keys().nth(index)?;
        self.remove(id)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.index.clear_keys();
        self.namer.reset();
    }

    pub fn rename(&mut self, id: EntityId, name: impl Into<String>) -> ModelResult<()> {
        let name = name.into();
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(ModelError::NotFound { kind: T::KIND, id })?;
        self.namer.observe_name(&name);
        entity.set_name(name);
        Ok(())
    }

    /// Sets or clears an entity's external id, keeping the index in step.
    pub fn set_external_id(&mut self, id: EntityId, external_id: Option<String>) -> ModelResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(ModelError::NotFound { kind: T::KIND, id })?;
        if let Some(key) = external_id.as_deref() {
            self.index.check_available(T::KIND, key, id)?;
        }
        if let Some(old) = entity.external_id() {
            self.index.remove(old, id);
        }
        if let Some(key) = external_id.as_deref() {
            self.index.insert(key, id);
        }
        entity.set_external_id(external_id);
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────

    #[must_use]
    pub fn get_by_id(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    /// Mutable access for fields the manager does not track.
    ///
    /// Ids, names and external ids must be changed through the manager
    /// ([`rename`](Self::rename), [`set_external_id`](Self::set_external_id)).
    pub fn get_by_id_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id)
    }

    /// Entity at position `index` in id order.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&T> {
        self.entities.values().nth(index)
    }

    /// Like [`get_by_id`](Self::get_by_id) but absence is an error.
    pub fn validate_existence(&self, id: EntityId) -> ModelResult<&T> {
        self.entities
            .get(&id)
            .ok_or(ModelError::NotFound { kind: T::KIND, id })
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in ascending id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = &mut T> + '_ {
        self.entities.values_mut()
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    // ── External index ────────────────────────────────────────────

    pub fn enable_external_index(&self) -> ModelResult<()> {
        self.index.enable(T::KIND, self.keyed_entries())
    }

    /// Bounded-wait variant for latency-sensitive callers.
    /// `Ok(false)` means the index lock could not be acquired in time.
    pub fn try_enable_external_index(&self, timeout: Duration) -> ModelResult<bool> {
        self.index.try_enable(T::KIND, self.keyed_entries(), timeout)
    }

    /// Returns true if this call tore the index down.
    pub fn disable_external_index(&self) -> bool {
        self.index.disable()
    }

    #[must_use]
    pub fn is_external_index_enabled(&self) -> bool {
        self.index.is_enabled()
    }

    #[must_use]
    pub fn external_index(&self) -> &ExternalIndex {
        &self.index
    }

    #[must_use]
    pub fn contains_external_id(&self, key: &str) -> bool {
        self.get_by_external_id(key).is_some()
    }

    /// Looks up by external id through the index, or by scanning while the
    /// index is disabled.
    #[must_use]
    pub fn get_by_external_id(&self, key: &str) -> Option<&T> {
        match self.index.lookup(key) {
            Some(hit) => hit.and_then(|id| self.entities.get(&id)),
            None => self
                .entities
                .values()
                .find(|entity| entity.external_id() == Some(key)),
        }
    }

    fn keyed_entries(&self) -> impl Iterator<Item = (&str, EntityId)> + '_ {
        self.entities
            .values()
            .filter_map(|entity| entity.external_id().map(|key| (key, entity.id())))
    }

    fn rebuild_index(&mut self) {
        let Self {
            entities, index, ..
        } = self;
        index.rebuild(
            entities
                .values()
                .filter_map(|entity| entity.external_id().map(|key| (key, entity.id()))),
        );
    }

    // ── Codec ─────────────────────────────────────────────────────

    /// Decodes a manager written by [`Encode`], numbering in `generator`'s
    /// family.
    ///
    /// Ids are taken as written; restoration renumbers them afterwards.
    /// Names are not synthesized here.
    pub fn decode_with(
        reader: &mut Reader<'_>,
        generator: IdGenerator,
        name_prefix: impl Into<String>,
    ) -> CodecResult<Self>
    where
        T: Decode,
    {
        let mut manager = Self::with_generator(generator, name_prefix);
        for entity in reader.read_seq(T::decode)? {
            manager.insert_decoded(entity);
        }
        Ok(manager)
    }

    fn insert_decoded(&mut self, mut entity: T) {
        if entity.id().is_null() {
            entity.set_id(self.generator.next_id());
        }
        let id = entity.id();
        if self.entities.contains_key(&id) {
            warn!("{} {id} appears twice in stream, keeping the first", T::KIND);
            return;
        }
        self.generator.observe(id);
        self.entities.insert(id, entity);
    }
}

impl<T: Entity + Encode> Encode for EntityManager<T> {
    fn encode(&self, writer: &mut Writer) {
        writer.write_seq(self.entities.values(), |w, entity| {
            w.mark_written(entity);
            entity.encode(w);
        });
    }
}

impl<T: Entity> Restorable for EntityManager<T> {
    fn renumber(&mut self, ctx: &mut RestoreContext) {
        if ctx.begin_family(T::KIND) {
            self.generator.reset();
        }
        let previous = std::mem::take(&mut self.entities);
        for (old, mut entity) in previous {
            let new = self.generator.next_id();
            ctx.record_renumber(T::KIND, old, new);
            entity.set_id(new);
            self.entities.insert(new, entity);
        }
        self.namer.reset();
        self.rebuild_index();
    }

    fn reconnect(&mut self, ctx: &mut RestoreContext) {
        for entity in self.entities.values_mut() {
            entity.reconnect(ctx);
        }
    }

    fn restorable_children(&mut self) -> Vec<RestoreChild<'_>> {
        self.entities
            .values_mut()
            .flat_map(Entity::restorable_children)
            .collect()
    }
}
