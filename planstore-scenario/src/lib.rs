//! Scenarios for planstore.
//!
//! A scenario is one complete object graph: managers of plants, resources
//! and jobs (each job owning its operations), plus the history and the log
//! of transmissions that built it.
//!
//! - [`ScenarioData`]: the graph itself; the restoration root
//! - [`Scenario`]: the graph behind a reader/writer lock
//! - [`transmission`]: the change requests a scenario accepts
//! - [`ScenarioStore`]: versioned save/load with reference restoration
//! - [`ScenarioConfig`]: tunables, loadable from JSON
//!
//! # Example
//!
//! ```no_run
//! use planstore_scenario::transmission::{AddPlantT, TransmissionHeader};
//! use planstore_scenario::{Scenario, ScenarioConfig};
//! use planstore_types::{EntityId, InstigatorId};
//!
//! let scenario = Scenario::new(EntityId::from_raw(1), "Main", ScenarioConfig::default());
//! let header = TransmissionHeader::new(EntityId::from_raw(1), InstigatorId::new(), 1);
//! let changes = scenario.receive(Box::new(AddPlantT::new(header, "Berlin")))?;
//! assert!(!changes.is_empty());
//! # Ok::<(), planstore_scenario::ScenarioError>(())
//! ```

mod config;
mod data;
pub mod domain;
mod error;
mod scenario;
mod store;
pub mod transmission;

pub use config::{NamePrefixes, ScenarioConfig};
pub use data::{EntityCounts, ScenarioData};
pub use error::{ScenarioError, ScenarioResult};
pub use scenario::Scenario;
pub use store::{LoadedScenario, ScenarioStore};
