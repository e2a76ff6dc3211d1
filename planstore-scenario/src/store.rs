//! Scenario persistence.
//!
//! A scenario file is one codec stream: the version header, then the root
//! (id, name, last applied sequence, plants, resources, jobs, history,
//! transmission log). Loading decodes the whole graph and then runs both
//! restoration passes before anything else sees it. When that moves any
//! id of a scenario with a non-empty log, a
//! [`RestorePointT`](crate::transmission::RestorePointT) is appended to the
//! log so the log stays replayable.

use planstore_codec::{ClassFactory, FormatVersion, Reader, Writer};
use planstore_model::{ReferenceRestorer, RestoreReport};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::transmission::{Transmission, transmission_factory};
use crate::{Scenario, ScenarioConfig, ScenarioData, ScenarioResult};

/// A decoded and restored scenario.
#[derive(Debug)]
pub struct LoadedScenario {
    pub data: ScenarioData,
    pub report: RestoreReport,
    /// Format version the stream was written with.
    pub version: FormatVersion,
}

/// Reads and writes scenario streams.
pub struct ScenarioStore {
    factory: ClassFactory<dyn Transmission>,
    config: ScenarioConfig,
}

impl ScenarioStore {
    pub fn new(config: ScenarioConfig) -> ScenarioResult<Self> {
        Ok(Self {
            factory: transmission_factory()?,
            config,
        })
    }

    #[must_use]
    pub fn factory(&self) -> &ClassFactory<dyn Transmission> {
        &self.factory
    }

    #[must_use]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Encodes `data` at the current format version.
    #[must_use]
    pub fn encode(&self, data: &ScenarioData) -> Vec<u8> {
        let mut writer = Writer::new();
        data.encode(&mut writer, &self.factory);
        writer.into_bytes()
    }

    /// Decodes a stream of any supported version and restores references.
    pub fn decode(&self, bytes: &[u8]) -> ScenarioResult<LoadedScenario> {
        let mut reader = Reader::new(bytes)?;
        let version = reader.version();
        let mut data = ScenarioData::decode(&mut reader, &self.factory, &self.config)?;
        reader.expect_end()?;

        let report = ReferenceRestorer::run(&mut data)?;
        if report.moved > 0 && !data.transmissions().is_empty() {
            data.mark_restore_point(report.moved);
        }
        if self.config.index_external_ids {
            data.enable_external_indexes();
        }
        if !report.is_clean() {
            warn!(
                "scenario {} restored with {} dangling references",
                data.scenario_id(),
                report.faults.len()
            );
        }
        debug!(
            "decoded scenario {} (v{version}): {}",
            data.scenario_id(),
            data.entity_counts()
        );
        Ok(LoadedScenario {
            data,
            report,
            version,
        })
    }

    /// Deep copy by round-tripping through the codec. The copy is fully
    /// restored; history listeners are not carried over.
    pub fn copy(&self, data: &ScenarioData) -> ScenarioResult<ScenarioData> {
        Ok(self.decode(&self.encode(data))?.data)
    }

    /// Writes the scenario to `path`, replacing any previous file.
    ///
    /// The scenario is encoded under a bounded read lock, which is released
    /// before any I/O. The file is written beside `path` and renamed into
    /// place.
    pub async fn save(&self, scenario: &Scenario, path: impl AsRef<Path>) -> ScenarioResult<()> {
        let bytes = {
            let data = scenario.try_read()?;
            self.encode(&data)
        };
        let path = path.as_ref();
        let staging = staging_path(path);
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, path).await?;
        info!("saved scenario to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub async fn load(&self, path: impl AsRef<Path>) -> ScenarioResult<LoadedScenario> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let loaded = self.decode(&bytes)?;
        info!(
            "loaded scenario {} from {} (format v{})",
            loaded.data.scenario_id(),
            path.display(),
            loaded.version
        );
        Ok(loaded)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(OsString::from(".tmp"));
    PathBuf::from(name)
}
