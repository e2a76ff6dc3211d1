//! Scenario configuration.

use planstore_history::DEFAULT_MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::ScenarioResult;

/// Prefixes used for synthesized entity names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamePrefixes {
    pub plant: String,
    pub resource: String,
    pub job: String,
    pub operation: String,
}

impl Default for NamePrefixes {
    fn default() -> Self {
        Self {
            plant: "Plant".to_string(),
            resource: "Resource".to_string(),
            job: "Job".to_string(),
            operation: "Operation".to_string(),
        }
    }
}

/// Tunables for a scenario. Every field has a default, so a config file
/// only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Maximum history records kept.
    pub max_history: usize,
    /// Bounded wait for read access (ms).
    pub read_timeout_ms: u64,
    /// Bounded wait for write access (ms).
    pub write_timeout_ms: u64,
    /// Keep external-id indexes enabled on the top-level managers.
    pub index_external_ids: bool,
    pub name_prefixes: NamePrefixes,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            read_timeout_ms: 250,
            write_timeout_ms: 2_000,
            index_external_ids: true,
            name_prefixes: NamePrefixes::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> ScenarioResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON config file.
    pub async fn load(path: impl AsRef<Path>) -> ScenarioResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}
