//! Change sets reported to transmission callers.
//!
//! Every applied transmission answers with a [`ScenarioDataChanges`]: for
//! each entity kind it touched, the ids that were added, updated or deleted.
//! Collaborators use it to refresh views without diffing the whole scenario.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Added/updated/deleted ids for one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: BTreeSet<EntityId>,
    pub updated: BTreeSet<EntityId>,
    pub deleted: BTreeSet<EntityId>,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Total number of ids across the three sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.deleted.len()
    }

    fn merge(&mut self, other: &ChangeSet) {
        for id in &other.added {
            self.record_added(*id);
        }
        for id in &other.updated {
            self.record_updated(*id);
        }
        for id in &other.deleted {
            self.record_deleted(*id);
        }
    }

    fn record_added(&mut self, id: EntityId) {
        self.deleted.remove(&id);
        self.added.insert(id);
    }

    fn record_updated(&mut self, id: EntityId) {
        // An entity added in the same batch is reported once, as added.
        if !self.added.contains(&id) {
            self.updated.insert(id);
        }
    }

    fn record_deleted(&mut self, id: EntityId) {
        let was_added = self.added.remove(&id);
        self.updated.remove(&id);
        if !was_added {
            self.deleted.insert(id);
        }
    }
}

/// Per-kind change sets produced by one or more transmissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDataChanges {
    kinds: BTreeMap<String, ChangeSet>,
}

impl ScenarioDataChanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&mut self, kind: &str, id: EntityId) {
        self.entry(kind).record_added(id);
    }

    pub fn updated(&mut self, kind: &str, id: EntityId) {
        self.entry(kind).record_updated(id);
    }

    pub fn deleted(&mut self, kind: &str, id: EntityId) {
        self.entry(kind).record_deleted(id);
    }

    /// Returns the change set for a kind, if anything changed for it.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&ChangeSet> {
        self.kinds.get(kind).filter(|c| !c.is_empty())
    }

    /// Iterates over kinds with at least one change, in kind order.
    pub fn kinds(&self) -> impl Iterator<Item = (&str, &ChangeSet)> {
        self.kinds
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(k, c)| (k.as_str(), c))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(ChangeSet::is_empty)
    }

    /// Folds `other` into `self` as if its changes happened afterwards.
    pub fn merge(&mut self, other: &ScenarioDataChanges) {
        for (kind, set) in &other.kinds {
            self.entry(kind).merge(set);
        }
    }

    fn entry(&mut self, kind: &str) -> &mut ChangeSet {
        self.kinds.entry(kind.to_string()).or_default()
    }
}
