//! Optional hash index from external key to entity id.
//!
//! Enabling is reference counted: several callers may ask for the fast path
//! at once, and the map is only dropped when the last of them lets go. The
//! count and the map sit behind one mutex; structural updates arrive through
//! `&mut self` from the owning manager and need no locking at all.

use parking_lot::Mutex;
use planstore_types::EntityId;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{ModelError, ModelResult};

#[derive(Debug, Default)]
struct IndexState {
    refs: usize,
    keys: Option<HashMap<String, EntityId>>,
}

#[derive(Debug, Default)]
pub struct ExternalIndex {
    state: Mutex<IndexState>,
}

impl ExternalIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a reference on the index, building it on the first one.
    ///
    /// Fails with `DuplicateKey` (and stays disabled) if two entries share a
    /// key.
    pub fn enable<'a, I>(&self, kind: &'static str, entries: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (&'a str, EntityId)>,
    {
        let mut state = self.state.lock();
        Self::enable_locked(&mut state, kind, entries)
    }

    /// Like [`enable`](Self::enable) but gives up after `timeout`.
    /// Returns `Ok(false)` when the lock could not be acquired.
    pub fn try_enable<'a, I>(
        &self,
        kind: &'static str,
        entries: I,
        timeout: Duration,
    ) -> ModelResult<bool>
    where
        I: IntoIterator<Item = (&'a str, EntityId)>,
    {
        let Some(mut state) = self.state.try_lock_for(timeout) else {
            debug!("{kind}: external index busy, skipping fast path");
            return Ok(false);
        };
        Self::enable_locked(&mut state, kind, entries)?;
        Ok(true)
    }

    /// Drops a reference. Returns true if this tore the index down.
    pub fn disable(&self) -> bool {
        let mut state = self.state.lock();
        Self::disable_locked(&mut state)
    }

    /// Like [`disable`](Self::disable) but gives up after `timeout`.
    pub fn try_disable(&self, timeout: Duration) -> Option<bool> {
        let mut state = self.state.try_lock_for(timeout)?;
        Some(Self::disable_locked(&mut state))
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.lock().keys.is_some()
    }

    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.state.lock().refs
    }

    /// `None` while disabled, otherwise the hit (or miss) from the index.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Option<EntityId>> {
        let state = self.state.lock();
        state.keys.as_ref().map(|keys| keys.get(key).copied())
    }

    /// Fails if `key` already belongs to an entity other than `id`.
    pub(crate) fn check_available(
        &mut self,
        kind: &'static str,
        key: &str,
        id: EntityId,
    ) -> ModelResult<()> {
        match self.keys_mut().and_then(|keys| keys.get(key)) {
            Some(existing) if *existing != id => Err(ModelError::DuplicateKey {
                kind,
                key: key.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn insert(&mut self, key: &str, id: EntityId) {
        if let Some(keys) = self.keys_mut() {
            keys.insert(key.to_string(), id);
        }
    }

    /// Removes `key` if it still maps to `id`.
    pub(crate) fn remove(&mut self, key: &str, id: EntityId) {
        if let Some(keys) = self.keys_mut() {
            if keys.get(key) == Some(&id) {
                keys.remove(key);
            }
        }
    }

    /// Replaces the contents of an enabled index.
    pub(crate) fn rebuild<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a str, EntityId)>,
    {
        if let Some(keys) = self.keys_mut() {
            keys.clear();
            keys.extend(entries.into_iter().map(|(k, id)| (k.to_string(), id)));
        }
    }

    pub(crate) fn clear_keys(&mut self) {
        if let Some(keys) = self.keys_mut() {
            keys.clear();
        }
    }

    fn keys_mut(&mut self) -> Option<&mut HashMap<String, EntityId>> {
        self.state.get_mut().keys.as_mut()
    }

    fn enable_locked<'a, I>(state: &mut IndexState, kind: &'static str, entries: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (&'a str, EntityId)>,
    {
        if state.refs == 0 {
            let mut keys = HashMap::new();
            for (key, id) in entries {
                if keys.insert(key.to_string(), id).is_some() {
                    return Err(ModelError::DuplicateKey {
                        kind,
                        key: key.to_string(),
                    });
                }
            }
            debug!("{kind}: external index built with {} keys", keys.len());
            state.keys = Some(keys);
        }
        state.refs += 1;
        Ok(())
    }

    fn disable_locked(state: &mut IndexState) -> bool {
        if state.refs == 0 {
            warn!("external index disabled more often than enabled");
            return false;
        }
        state.refs -= 1;
        if state.refs == 0 {
            state.keys = None;
            true
        } else {
            false
        }
    }
}
