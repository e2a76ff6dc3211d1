use planstore_codec::{CodecResult, Decode, Encode, Layout, Reader, VersionTable, Writer};
use planstore_model::{Entity, EntityManager, RestoreChild};
use planstore_types::{EntityId, IdGenerator};

use crate::config::NamePrefixes;
use crate::domain::Operation;

/// A unit of work made of operations.
///
/// Each job owns its operations outright. All operation managers in a
/// scenario share one id family, so operation ids are unique scenario-wide.
#[derive(Debug)]
pub struct Job {
    id: EntityId,
    name: String,
    external_id: Option<String>,
    pub priority: i32,
    operations: EntityManager<Operation>,
}

impl Job {
    /// Creates a job whose operations number in `operation_ids`.
    #[must_use]
    pub fn new(name: impl Into<String>, operation_ids: IdGenerator, operation_prefix: &str) -> Self {
        Self {
            id: EntityId::NULL,
            name: name.into(),
            external_id: None,
            priority: 0,
            operations: EntityManager::with_generator(operation_ids, operation_prefix),
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    #[must_use]
    pub fn operations(&self) -> &EntityManager<Operation> {
        &self.operations
    }

    pub fn operations_mut(&mut self) -> &mut EntityManager<Operation> {
        &mut self.operations
    }

    /// Total planned minutes over all operations.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        self.operations.iter().map(|op| op.duration_minutes).sum()
    }

    /// Rewires a decoded job into the scenario's operation family.
    pub(crate) fn attach(&mut self, operation_ids: &IdGenerator, prefixes: &NamePrefixes) {
        self.operations.adopt_generator(operation_ids.clone());
        self.operations.set_name_prefix(prefixes.operation.as_str());
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new(
            String::new(),
            IdGenerator::new(Operation::KIND),
            &NamePrefixes::default().operation,
        )
    }
}

impl Entity for Job {
    const KIND: &'static str = "Job";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    fn set_external_id(&mut self, external_id: Option<String>) {
        self.external_id = external_id;
    }

    fn restorable_children(&mut self) -> Vec<RestoreChild<'_>> {
        vec![RestoreChild::master(&mut self.operations)]
    }
}

impl Encode for Job {
    fn encode(&self, writer: &mut Writer) {
        writer.write_entity_id(self.id);
        writer.write_str(&self.name);
        writer.write_opt_str(self.external_id.as_deref());
        writer.write_i32(self.priority);
        self.operations.encode(writer);
    }
}

fn read_operations(reader: &mut Reader<'_>) -> CodecResult<EntityManager<Operation>> {
    EntityManager::decode_with(
        reader,
        IdGenerator::new(Operation::KIND),
        NamePrefixes::default().operation,
    )
}

fn read_v1(reader: &mut Reader<'_>) -> CodecResult<Job> {
    Ok(Job {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        operations: read_operations(reader)?,
        ..Job::default()
    })
}

fn read_v3(reader: &mut Reader<'_>) -> CodecResult<Job> {
    Ok(Job {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        external_id: reader.read_opt_string()?,
        operations: read_operations(reader)?,
        ..Job::default()
    })
}

fn read_v10(reader: &mut Reader<'_>) -> CodecResult<Job> {
    Ok(Job {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        external_id: reader.read_opt_string()?,
        priority: reader.read_i32()?,
        operations: read_operations(reader)?,
    })
}

pub(crate) static LAYOUTS: VersionTable<Job> = VersionTable::new(
    "job",
    &[
        Layout::reads(10, read_v10),
        Layout::reads(3, read_v3),
        Layout::reads(1, read_v1),
    ],
);

impl Decode for Job {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        LAYOUTS.read(reader)
    }
}
