//! A lock-guarded scenario.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use planstore_history::TransmissionRecord;
use planstore_types::{CancellationToken, EntityId, ScenarioDataChanges};
use std::time::Duration;
use tracing::{info, warn};

use crate::transmission::Transmission;
use crate::{ScenarioConfig, ScenarioData, ScenarioError, ScenarioResult};

/// One scenario shared between threads.
///
/// Readers run concurrently; transmissions are applied one at a time under
/// the write lock. Callers that must not block use the `try_*` variants,
/// which give up after a bounded wait.
pub struct Scenario {
    data: RwLock<ScenarioData>,
    config: ScenarioConfig,
}

impl Scenario {
    #[must_use]
    pub fn new(scenario_id: EntityId, name: impl Into<String>, config: ScenarioConfig) -> Self {
        let data = ScenarioData::new(scenario_id, name, &config);
        Self::from_data(data, config)
    }

    /// Wraps already built data, typically a loaded scenario.
    #[must_use]
    pub fn from_data(data: ScenarioData, config: ScenarioConfig) -> Self {
        Self {
            data: RwLock::new(data),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    // ── Locking ───────────────────────────────────────────────────

    /// Blocks until read access is available.
    pub fn read(&self) -> RwLockReadGuard<'_, ScenarioData> {
        self.data.read()
    }

    /// Blocks until write access is available.
    pub fn write(&self) -> RwLockWriteGuard<'_, ScenarioData> {
        self.data.write()
    }

    pub fn try_read_for(&self, timeout: Duration) -> ScenarioResult<RwLockReadGuard<'_, ScenarioData>> {
        self.data
            .try_read_for(timeout)
            .ok_or(ScenarioError::LockTimeout(timeout))
    }

    pub fn try_write_for(
        &self,
        timeout: Duration,
    ) -> ScenarioResult<RwLockWriteGuard<'_, ScenarioData>> {
        self.data
            .try_write_for(timeout)
            .ok_or(ScenarioError::LockTimeout(timeout))
    }

    /// Read access within the configured read timeout.
    pub fn try_read(&self) -> ScenarioResult<RwLockReadGuard<'_, ScenarioData>> {
        self.try_read_for(self.config.read_timeout())
    }

    /// Write access within the configured write timeout.
    pub fn try_write(&self) -> ScenarioResult<RwLockWriteGuard<'_, ScenarioData>> {
        self.try_write_for(self.config.write_timeout())
    }

    // ── Transmissions ─────────────────────────────────────────────

    /// Applies one transmission under the write lock.
    pub fn receive(
        &self,
        transmission: Box<dyn Transmission>,
    ) -> ScenarioResult<ScenarioDataChanges> {
        self.write().receive(transmission)
    }

    /// Re-applies recorded transmissions in order.
    ///
    /// The token is checked before each transmission; the write lock is
    /// released between transmissions so readers are not starved. Returns
    /// the changes of every transmission applied.
    pub fn replay<I>(&self, records: I, cancel: &CancellationToken) -> ScenarioResult<ScenarioDataChanges>
    where
        I: IntoIterator<Item = TransmissionRecord<dyn Transmission>>,
    {
        let mut changes = ScenarioDataChanges::new();
        let mut applied = 0usize;
        for record in records {
            if cancel.is_cancelled() {
                warn!("replay cancelled after {applied} transmissions");
                return Err(ScenarioError::Cancelled);
            }
            let applied_changes = self.write().receive_record(record)?;
            changes.merge(&applied_changes);
            applied += 1;
        }
        info!("replayed {applied} transmissions");
        Ok(changes)
    }

    #[must_use]
    pub fn into_data(self) -> ScenarioData {
        self.data.into_inner()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.data.try_read() {
            Some(data) => f.debug_struct("Scenario").field("data", &*data).finish(),
            None => f.debug_struct("Scenario").finish_non_exhaustive(),
        }
    }
}
