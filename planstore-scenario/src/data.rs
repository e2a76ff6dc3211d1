//! The root object graph of one scenario.

use planstore_codec::{ClassFactory, CodecResult, Decode, Encode, Reader, Writer};
use planstore_history::{AuditLog, HistoryManager, HistoryType, TransmissionLog, TransmissionRecord};
use planstore_model::{Entity, EntityManager, Restorable, RestoreChild};
use planstore_types::{EntityId, IdGenerator, InstigatorId, ScenarioDataChanges, Timestamp};
use std::fmt;
use tracing::{debug, warn};

use crate::config::{NamePrefixes, ScenarioConfig};
use crate::domain::{Job, Operation, Plant, Resource};
use crate::transmission::{RestorePointT, Transmission, TransmissionHeader};
use crate::{ScenarioError, ScenarioResult};

/// Stream version that added the last applied sequence and the
/// transmission log to the root.
const TRANSMISSION_LOG_SINCE: i32 = 11;
/// Stream version that started persisting history.
const HISTORY_SINCE: i32 = 2;

/// Entity totals, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub plants: usize,
    pub resources: usize,
    pub jobs: usize,
    pub operations: usize,
}

impl fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} plants, {} resources, {} jobs, {} operations",
            self.plants, self.resources, self.jobs, self.operations
        )
    }
}

/// Everything a scenario owns.
///
/// Not synchronized on its own; [`Scenario`](crate::Scenario) wraps it in a
/// lock. Changes go through [`receive`](Self::receive).
pub struct ScenarioData {
    scenario_id: EntityId,
    name: String,
    prefixes: NamePrefixes,
    plants: EntityManager<Plant>,
    resources: EntityManager<Resource>,
    jobs: EntityManager<Job>,
    /// Shared by the operation managers of every job.
    operation_ids: IdGenerator,
    history: HistoryManager,
    transmissions: TransmissionLog<dyn Transmission>,
    last_sequence: u64,
    clock: Timestamp,
}

impl ScenarioData {
    #[must_use]
    pub fn new(scenario_id: EntityId, name: impl Into<String>, config: &ScenarioConfig) -> Self {
        let prefixes = config.name_prefixes.clone();
        let data = Self {
            scenario_id,
            name: name.into(),
            plants: EntityManager::new(prefixes.plant.as_str()),
            resources: EntityManager::new(prefixes.resource.as_str()),
            jobs: EntityManager::new(prefixes.job.as_str()),
            operation_ids: IdGenerator::new(Operation::KIND),
            history: HistoryManager::new(config.max_history),
            transmissions: TransmissionLog::new(),
            last_sequence: 0,
            clock: Timestamp::EPOCH,
            prefixes,
        };
        if config.index_external_ids {
            data.enable_external_indexes();
        }
        data
    }

    // ── Accessors ─────────────────────────────────────────────────

    #[must_use]
    pub fn scenario_id(&self) -> EntityId {
        self.scenario_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn plants(&self) -> &EntityManager<Plant> {
        &self.plants
    }

    pub fn plants_mut(&mut self) -> &mut EntityManager<Plant> {
        &mut self.plants
    }

    #[must_use]
    pub fn resources(&self) -> &EntityManager<Resource> {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut EntityManager<Resource> {
        &mut self.resources
    }

    #[must_use]
    pub fn jobs(&self) -> &EntityManager<Job> {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut EntityManager<Job> {
        &mut self.jobs
    }

    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Mutable history access, for registering listeners.
    pub fn history_mut(&mut self) -> &mut HistoryManager {
        &mut self.history
    }

    #[must_use]
    pub fn transmissions(&self) -> &TransmissionLog<dyn Transmission> {
        &self.transmissions
    }

    /// Empties the transmission log, oldest first, for replay elsewhere.
    pub fn take_transmissions(&mut self) -> Vec<TransmissionRecord<dyn Transmission>> {
        self.transmissions.take()
    }

    /// Sequence number of the last applied transmission, 0 if none.
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Creates an empty job numbering its operations in this scenario's
    /// operation family.
    #[must_use]
    pub fn new_job(&self, name: impl Into<String>) -> Job {
        Job::new(name, self.operation_ids.clone(), &self.prefixes.operation)
    }

    /// Finds an operation in any job. Returns the owning job's id with it.
    #[must_use]
    pub fn find_operation(&self, id: EntityId) -> Option<(EntityId, &Operation)> {
        self.jobs
            .iter()
            .find_map(|job| job.operations().get_by_id(id).map(|op| (job.id(), op)))
    }

    #[must_use]
    pub fn entity_counts(&self) -> EntityCounts {
        EntityCounts {
            plants: self.plants.count(),
            resources: self.resources.count(),
            jobs: self.jobs.count(),
            operations: self.jobs.iter().map(|job| job.operations().count()).sum(),
        }
    }

    // ── Transmissions ─────────────────────────────────────────────

    /// Applies one transmission.
    ///
    /// On success one history record is written per audit entry, listeners
    /// get them as a single batch, and the transmission is appended to the
    /// log. On failure nothing changes.
    pub fn receive(
        &mut self,
        transmission: Box<dyn Transmission>,
    ) -> ScenarioResult<ScenarioDataChanges> {
        self.receive_record(TransmissionRecord::new(transmission))
    }

    /// Like [`receive`](Self::receive) for an already recorded transmission;
    /// the original recording time is kept.
    pub fn receive_record(
        &mut self,
        record: TransmissionRecord<dyn Transmission>,
    ) -> ScenarioResult<ScenarioDataChanges> {
        let transmission = record.payload();
        let header = *transmission.header();
        if header.scenario != self.scenario_id {
            return Err(ScenarioError::WrongScenario {
                expected: self.scenario_id,
                found: header.scenario,
            });
        }
        let restore_point = transmission.is_restore_point();
        let in_order = if restore_point {
            header.sequence == self.last_sequence
        } else {
            header.sequence > self.last_sequence
        };
        if !in_order {
            return Err(ScenarioError::OutOfOrder {
                last: self.last_sequence,
                received: header.sequence,
            });
        }

        let mut audit = AuditLog::new();
        let changes = transmission.apply(self, &mut audit)?;
        if restore_point {
            self.log_restore_point(record);
            return Ok(changes);
        }

        let description = transmission.description();
        for entry in audit.drain() {
            self.clock = self.clock.tick();
            let history_type = HistoryType::from(entry.change);
            self.history.record_history(
                vec![entry.subject],
                format!("{description}: {} {} {history_type}", entry.kind, entry.subject),
                history_type,
                self.clock,
                header.instigator,
            );
        }
        let fired = self.history.fire_history_event();
        debug!(
            "scenario {}: applied transmission {} ({fired} history records)",
            self.scenario_id, header.sequence
        );

        self.last_sequence = header.sequence;
        self.transmissions.record(record);
        Ok(changes)
    }

    /// Appends a restore point after a load renumbered `moved` entities.
    /// The entities themselves were already renumbered by the loader.
    pub(crate) fn mark_restore_point(&mut self, moved: usize) {
        let header = TransmissionHeader::new(
            self.scenario_id,
            InstigatorId::system(),
            self.last_sequence,
        );
        let point: Box<dyn Transmission> = Box::new(RestorePointT::new(header, moved as u64));
        self.log_restore_point(TransmissionRecord::new(point));
    }

    fn log_restore_point(&mut self, record: TransmissionRecord<dyn Transmission>) {
        let payload = record.payload();
        self.clock = self.clock.tick();
        self.history.record_history(
            Vec::new(),
            payload.description(),
            HistoryType::General,
            self.clock,
            payload.header().instigator,
        );
        self.history.fire_history_event();
        debug!(
            "scenario {}: restore point at sequence {}",
            self.scenario_id,
            payload.header().sequence
        );
        self.transmissions.record(record);
    }

    // ── Persistence ───────────────────────────────────────────────

    /// Turns the external-id indexes on. A failure (duplicate keys in a
    /// loaded scenario) leaves that manager unindexed; lookups still work
    /// by scanning.
    pub(crate) fn enable_external_indexes(&self) {
        if let Err(e) = self.plants.enable_external_index() {
            warn!("plant index left disabled: {e}");
        }
        if let Err(e) = self.resources.enable_external_index() {
            warn!("resource index left disabled: {e}");
        }
        if let Err(e) = self.jobs.enable_external_index() {
            warn!("job index left disabled: {e}");
        }
    }

    pub(crate) fn encode(&self, writer: &mut Writer, factory: &ClassFactory<dyn Transmission>) {
        writer.write_entity_id(self.scenario_id);
        writer.write_str(&self.name);
        writer.write_u64(self.last_sequence);
        self.plants.encode(writer);
        self.resources.encode(writer);
        self.jobs.encode(writer);
        self.history.encode(writer);
        self.transmissions.serialize(writer, factory);
    }

    /// Decodes the root. Ids are as written; restoration must run before
    /// the data is used.
    pub(crate) fn decode(
        reader: &mut Reader<'_>,
        factory: &ClassFactory<dyn Transmission>,
        config: &ScenarioConfig,
    ) -> ScenarioResult<Self> {
        let prefixes = config.name_prefixes.clone();
        let scenario_id = reader.read_entity_id()?;
        let name = reader.read_string()?;
        let last_sequence = if reader.at_least(TRANSMISSION_LOG_SINCE) {
            reader.read_u64()?
        } else {
            0
        };

        let plants = decode_manager(reader, prefixes.plant.as_str())?;
        let resources = decode_manager(reader, prefixes.resource.as_str())?;
        let mut jobs: EntityManager<Job> = decode_manager(reader, prefixes.job.as_str())?;

        let operation_ids = IdGenerator::new(Operation::KIND);
        for job in jobs.iter_mut() {
            job.attach(&operation_ids, &prefixes);
        }

        let history = if reader.at_least(HISTORY_SINCE) {
            HistoryManager::decode_with(reader, config.max_history)?
        } else {
            HistoryManager::new(config.max_history)
        };
        let transmissions = if reader.at_least(TRANSMISSION_LOG_SINCE) {
            TransmissionLog::deserialize(reader, factory)?
        } else {
            TransmissionLog::new()
        };
        let clock = history
            .last()
            .map_or(Timestamp::EPOCH, |record| record.timestamp);

        Ok(Self {
            scenario_id,
            name,
            prefixes,
            plants,
            resources,
            jobs,
            operation_ids,
            history,
            transmissions,
            last_sequence,
            clock,
        })
    }
}

fn decode_manager<T>(reader: &mut Reader<'_>, prefix: &str) -> CodecResult<EntityManager<T>>
where
    T: Entity + Decode,
{
    EntityManager::decode_with(reader, IdGenerator::new(T::KIND), prefix)
}

impl Restorable for ScenarioData {
    fn restorable_children(&mut self) -> Vec<RestoreChild<'_>> {
        vec![
            RestoreChild::master(&mut self.plants),
            RestoreChild::master(&mut self.resources),
            RestoreChild::master(&mut self.jobs),
        ]
    }

    fn restore_kind(&self) -> &'static str {
        "ScenarioData"
    }
}

impl fmt::Debug for ScenarioData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioData")
            .field("scenario_id", &self.scenario_id)
            .field("name", &self.name)
            .field("counts", &self.entity_counts())
            .field("history", &self.history.len())
            .field("transmissions", &self.transmissions.len())
            .field("last_sequence", &self.last_sequence)
            .finish_non_exhaustive()
    }
}
