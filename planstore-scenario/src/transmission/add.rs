use planstore_codec::{CodecResult, Polymorphic, Reader, TypeTag, Writer};
use planstore_history::{AuditEntry, AuditLog};
use planstore_model::{Entity, ModelError, WeakRef};
use planstore_types::{EntityId, ScenarioDataChanges};

use crate::domain::{Job, Operation, Plant, Resource};
use crate::transmission::{Transmission, TransmissionHeader};
use crate::{ScenarioData, ScenarioError, ScenarioResult};

// ── AddPlantT ────────────────────────────────────────────────────

/// Adds a plant. An empty name gets a default one.
#[derive(Debug, Clone, PartialEq)]
pub struct AddPlantT {
    pub header: TransmissionHeader,
    pub name: String,
    pub external_id: Option<String>,
    pub description: String,
    pub capacity: f64,
}

impl AddPlantT {
    pub const TAG: TypeTag = TypeTag(1);

    #[must_use]
    pub fn new(header: TransmissionHeader, name: impl Into<String>) -> Self {
        Self {
            header,
            name: name.into(),
            external_id: None,
            description: String::new(),
            capacity: 0.0,
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Box<dyn Transmission>> {
        Ok(Box::new(Self {
            header: TransmissionHeader::decode(reader)?,
            name: reader.read_string()?,
            external_id: reader.read_opt_string()?,
            description: reader.read_string()?,
            capacity: reader.read_f64()?,
        }))
    }
}

impl Polymorphic for AddPlantT {
    fn type_tag(&self) -> TypeTag {
        Self::TAG
    }

    fn encode_body(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_str(&self.name);
        writer.write_opt_str(self.external_id.as_deref());
        writer.write_str(&self.description);
        writer.write_f64(self.capacity);
    }
}

impl Transmission for AddPlantT {
    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn description(&self) -> String {
        format!("add plant '{}'", self.name)
    }

    fn apply(
        &self,
        data: &mut ScenarioData,
        audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges> {
        let mut plant = Plant::new(self.name.as_str());
        plant.description.clone_from(&self.description);
        plant.capacity = self.capacity;
        plant.set_external_id(self.external_id.clone());

        let id = data.plants_mut().add(plant)?.id();
        audit.record(AuditEntry::added(Plant::KIND, id));
        Ok(audit.changes())
    }
}

// ── AddResourceT ─────────────────────────────────────────────────

/// Adds a resource located at an existing plant.
#[derive(Debug, Clone, PartialEq)]
pub struct AddResourceT {
    pub header: TransmissionHeader,
    pub plant: EntityId,
    pub name: String,
    pub external_id: Option<String>,
    pub capacity: f64,
}

impl AddResourceT {
    pub const TAG: TypeTag = TypeTag(2);

    #[must_use]
    pub fn new(header: TransmissionHeader, plant: EntityId, name: impl Into<String>) -> Self {
        Self {
            header,
            plant,
            name: name.into(),
            external_id: None,
            capacity: 1.0,
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Box<dyn Transmission>> {
        Ok(Box::new(Self {
            header: TransmissionHeader::decode(reader)?,
            plant: reader.read_entity_id()?,
            name: reader.read_string()?,
            external_id: reader.read_opt_string()?,
            capacity: reader.read_f64()?,
        }))
    }
}

impl Polymorphic for AddResourceT {
    fn type_tag(&self) -> TypeTag {
        Self::TAG
    }

    fn encode_body(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_entity_id(self.plant);
        writer.write_str(&self.name);
        writer.write_opt_str(self.external_id.as_deref());
        writer.write_f64(self.capacity);
    }
}

impl Transmission for AddResourceT {
    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn description(&self) -> String {
        format!("add resource '{}' to plant {}", self.name, self.plant)
    }

    fn apply(
        &self,
        data: &mut ScenarioData,
        audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges> {
        let plant = data.plants().validate_existence(self.plant)?;
        let mut resource = Resource::new(self.name.as_str(), WeakRef::to(plant));
        resource.capacity = self.capacity;
        resource.set_external_id(self.external_id.clone());

        let id = data.resources_mut().add(resource)?.id();
        audit.record(AuditEntry::added(Resource::KIND, id));
        Ok(audit.changes())
    }
}

// ── AddJobT ──────────────────────────────────────────────────────

/// Adds an empty job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddJobT {
    pub header: TransmissionHeader,
    pub name: String,
    pub external_id: Option<String>,
    pub priority: i32,
}

impl AddJobT {
    pub const TAG: TypeTag = TypeTag(3);

    #[must_use]
    pub fn new(header: TransmissionHeader, name: impl Into<String>) -> Self {
        Self {
            header,
            name: name.into(),
            external_id: None,
            priority: 0,
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Box<dyn Transmission>> {
        Ok(Box::new(Self {
            header: TransmissionHeader::decode(reader)?,
            name: reader.read_string()?,
            external_id: reader.read_opt_string()?,
            priority: reader.read_i32()?,
        }))
    }
}

impl Polymorphic for AddJobT {
    fn type_tag(&self) -> TypeTag {
        Self::TAG
    }

    fn encode_body(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_str(&self.name);
        writer.write_opt_str(self.external_id.as_deref());
        writer.write_i32(self.priority);
    }
}

impl Transmission for AddJobT {
    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn description(&self) -> String {
        format!("add job '{}'", self.name)
    }

    fn apply(
        &self,
        data: &mut ScenarioData,
        audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges> {
        let mut job = data.new_job(self.name.as_str());
        job.priority = self.priority;
        job.set_external_id(self.external_id.clone());

        let id = data.jobs_mut().add(job)?.id();
        audit.record(AuditEntry::added(Job::KIND, id));
        Ok(audit.changes())
    }
}

// ── AddOperationT ────────────────────────────────────────────────

/// Appends an operation to a job, optionally bound to a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOperationT {
    pub header: TransmissionHeader,
    pub job: EntityId,
    /// `EntityId::NULL` leaves the operation unassigned.
    pub resource: EntityId,
    pub name: String,
    pub duration_minutes: i64,
}

impl AddOperationT {
    pub const TAG: TypeTag = TypeTag(4);

    #[must_use]
    pub fn new(
        header: TransmissionHeader,
        job: EntityId,
        resource: EntityId,
        name: impl Into<String>,
        duration_minutes: i64,
    ) -> Self {
        Self {
            header,
            job,
            resource,
            name: name.into(),
            duration_minutes,
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Box<dyn Transmission>> {
        Ok(Box::new(Self {
            header: TransmissionHeader::decode(reader)?,
            job: reader.read_entity_id()?,
            resource: reader.read_entity_id()?,
            name: reader.read_string()?,
            duration_minutes: reader.read_i64()?,
        }))
    }
}

impl Polymorphic for AddOperationT {
    fn type_tag(&self) -> TypeTag {
        Self::TAG
    }

    fn encode_body(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_entity_id(self.job);
        writer.write_entity_id(self.resource);
        writer.write_str(&self.name);
        writer.write_i64(self.duration_minutes);
    }
}

impl Transmission for AddOperationT {
    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn description(&self) -> String {
        format!("add operation '{}' to job {}", self.name, self.job)
    }

    fn apply(
        &self,
        data: &mut ScenarioData,
        audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges> {
        if self.duration_minutes < 0 {
            return Err(ScenarioError::InvalidTransmission(format!(
                "negative duration {} for operation '{}'",
                self.duration_minutes, self.name
            )));
        }
        data.jobs().validate_existence(self.job)?;
        if !self.resource.is_null() {
            data.resources().validate_existence(self.resource)?;
        }

        let operation = Operation::new(
            self.name.as_str(),
            WeakRef::new(self.resource),
            self.duration_minutes,
        );
        let job = data
            .jobs_mut()
            .get_by_id_mut(self.job)
            .ok_or(ModelError::NotFound {
                kind: Job::KIND,
                id: self.job,
            })?;
        let id = job.operations_mut().add(operation)?.id();
        audit.record(AuditEntry::added(Operation::KIND, id));
        Ok(audit.changes())
    }
}
