//! Commands behind the `planstore` binary.

use anyhow::{Context, Result};
use planstore_scenario::{LoadedScenario, Scenario, ScenarioConfig, ScenarioData, ScenarioStore};
use planstore_types::{CancellationToken, ScenarioDataChanges};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Summary of a scenario file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Inspection {
    pub format_version: i32,
    pub scenario_id: String,
    pub name: String,
    pub plants: usize,
    pub resources: usize,
    pub jobs: usize,
    pub operations: usize,
    pub history_records: usize,
    pub transmissions: usize,
    pub last_sequence: u64,
    pub dangling_references: usize,
}

impl Inspection {
    #[must_use]
    pub fn of(loaded: &LoadedScenario) -> Self {
        let data = &loaded.data;
        let counts = data.entity_counts();
        Self {
            format_version: loaded.version.as_i32(),
            scenario_id: data.scenario_id().to_string(),
            name: data.name().to_string(),
            plants: counts.plants,
            resources: counts.resources,
            jobs: counts.jobs,
            operations: counts.operations,
            history_records: data.history().len(),
            transmissions: data.transmissions().len(),
            last_sequence: data.last_sequence(),
            dangling_references: loaded.report.faults.len(),
        }
    }
}

/// Outcome of replaying a scenario's transmission log.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub last_sequence: u64,
    pub changes: ScenarioDataChanges,
}

pub async fn inspect(store: &ScenarioStore, path: &Path) -> Result<Inspection> {
    let loaded = store
        .load(path)
        .await
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    Ok(Inspection::of(&loaded))
}

/// Reads a scenario of any supported version and writes it at the current
/// one. Returns the summary of what was read.
pub async fn upgrade(store: &ScenarioStore, input: &Path, output: &Path) -> Result<Inspection> {
    let loaded = store
        .load(input)
        .await
        .with_context(|| format!("Failed to load scenario {}", input.display()))?;
    let inspection = Inspection::of(&loaded);
    let scenario = Scenario::from_data(loaded.data, store.config().clone());
    store
        .save(&scenario, output)
        .await
        .with_context(|| format!("Failed to write scenario {}", output.display()))?;
    info!(
        "upgraded {} from v{} to {}",
        input.display(),
        inspection.format_version,
        output.display()
    );
    Ok(inspection)
}

/// Re-applies the transmission log of `data` into an empty scenario with
/// the same id and name.
pub fn replay_data(
    mut data: ScenarioData,
    config: &ScenarioConfig,
    cancel: &CancellationToken,
) -> Result<(Scenario, ReplaySummary)> {
    let records = data.take_transmissions();
    let applied = records.len();
    let target = Scenario::new(data.scenario_id(), data.name(), config.clone());
    let changes = target
        .replay(records, cancel)
        .context("Replay did not complete")?;
    let last_sequence = target.read().last_sequence();
    Ok((
        target,
        ReplaySummary {
            applied,
            last_sequence,
            changes,
        },
    ))
}

pub async fn replay(
    store: &ScenarioStore,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<ReplaySummary> {
    let loaded = store
        .load(path)
        .await
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    let (_, summary) = replay_data(loaded.data, store.config(), cancel)?;
    Ok(summary)
}
