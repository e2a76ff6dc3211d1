use planstore_codec::{CodecResult, Encode, Polymorphic, Reader, TypeTag, Writer};
use planstore_history::{AuditEntry, AuditLog};
use planstore_model::{Entity, EntityManager, ModelError};
use planstore_types::{EntityId, ScenarioDataChanges};
use tracing::debug;

use crate::domain::{EntityKind, Job, Operation, Plant, Resource};
use crate::transmission::{Transmission, TransmissionHeader};
use crate::{ScenarioData, ScenarioError, ScenarioResult};

// ── SetExternalIdT ───────────────────────────────────────────────

/// Sets or clears the external id of a plant, resource or job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetExternalIdT {
    pub header: TransmissionHeader,
    pub kind: EntityKind,
    pub target: EntityId,
    pub external_id: Option<String>,
}

impl SetExternalIdT {
    pub const TAG: TypeTag = TypeTag(5);

    #[must_use]
    pub fn new(
        header: TransmissionHeader,
        kind: EntityKind,
        target: EntityId,
        external_id: Option<String>,
    ) -> Self {
        Self {
            header,
            kind,
            target,
            external_id,
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Box<dyn Transmission>> {
        Ok(Box::new(Self {
            header: TransmissionHeader::decode(reader)?,
            kind: EntityKind::from_code(reader.read_i32()?)?,
            target: reader.read_entity_id()?,
            external_id: reader.read_opt_string()?,
        }))
    }
}

impl Polymorphic for SetExternalIdT {
    fn type_tag(&self) -> TypeTag {
        Self::TAG
    }

    fn encode_body(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_i32(self.kind.code());
        writer.write_entity_id(self.target);
        writer.write_opt_str(self.external_id.as_deref());
    }
}

fn set_external_id<T: Entity + Encode>(
    manager: &mut EntityManager<T>,
    target: EntityId,
    external_id: Option<String>,
    audit: &mut AuditLog,
) -> ScenarioResult<()> {
    let entry = AuditEntry::changed(T::KIND, target, manager.validate_existence(target)?);
    manager.set_external_id(target, external_id)?;
    audit.record(entry);
    Ok(())
}

impl Transmission for SetExternalIdT {
    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn description(&self) -> String {
        match &self.external_id {
            Some(key) => format!("set external id of {} {} to '{key}'", self.kind, self.target),
            None => format!("clear external id of {} {}", self.kind, self.target),
        }
    }

    fn apply(
        &self,
        data: &mut ScenarioData,
        audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges> {
        let external_id = self.external_id.clone();
        match self.kind {
            EntityKind::Plant => set_external_id(data.plants_mut(), self.target, external_id, audit)?,
            EntityKind::Resource => {
                set_external_id(data.resources_mut(), self.target, external_id, audit)?;
            }
            EntityKind::Job => set_external_id(data.jobs_mut(), self.target, external_id, audit)?,
            EntityKind::Operation => {
                return Err(ScenarioError::InvalidTransmission(
                    "operations carry no external id".to_string(),
                ));
            }
        }
        Ok(audit.changes())
    }
}

// ── DeleteEntityT ────────────────────────────────────────────────

/// Deletes one entity.
///
/// A plant still used by a resource cannot be deleted. Deleting a resource
/// unassigns the operations that ran on it; deleting a job deletes its
/// operations. Operations are addressed through their owning job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntityT {
    pub header: TransmissionHeader,
    pub kind: EntityKind,
    pub target: EntityId,
    /// Owning job when `kind` is [`EntityKind::Operation`], otherwise null.
    pub owner: EntityId,
}

impl DeleteEntityT {
    pub const TAG: TypeTag = TypeTag(6);

    #[must_use]
    pub fn new(header: TransmissionHeader, kind: EntityKind, target: EntityId) -> Self {
        Self {
            header,
            kind,
            target,
            owner: EntityId::NULL,
        }
    }

    #[must_use]
    pub fn operation(header: TransmissionHeader, job: EntityId, operation: EntityId) -> Self {
        Self {
            header,
            kind: EntityKind::Operation,
            target: operation,
            owner: job,
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Box<dyn Transmission>> {
        Ok(Box::new(Self {
            header: TransmissionHeader::decode(reader)?,
            kind: EntityKind::from_code(reader.read_i32()?)?,
            target: reader.read_entity_id()?,
            owner: reader.read_entity_id()?,
        }))
    }

    fn delete_plant(&self, data: &mut ScenarioData, audit: &mut AuditLog) -> ScenarioResult<()> {
        data.plants().validate_existence(self.target)?;
        if let Some(user) = data.resources().iter().find(|r| r.plant.id() == self.target) {
            return Err(ScenarioError::InvalidTransmission(format!(
                "plant {} is still used by resource {}",
                self.target,
                user.id()
            )));
        }
        if let Some(plant) = data.plants_mut().remove(self.target) {
            audit.record(AuditEntry::deleted(Plant::KIND, self.target, &plant));
        }
        Ok(())
    }

    fn delete_resource(&self, data: &mut ScenarioData, audit: &mut AuditLog) -> ScenarioResult<()> {
        data.resources().validate_existence(self.target)?;
        for job in data.jobs_mut().iter_mut() {
            for operation in job.operations_mut().iter_mut() {
                if operation.resource.id() == self.target {
                    audit.record(AuditEntry::changed(
                        Operation::KIND,
                        operation.id(),
                        &*operation,
                    ));
                    operation.resource.clear();
                }
            }
        }
        if let Some(resource) = data.resources_mut().remove(self.target) {
            audit.record(AuditEntry::deleted(Resource::KIND, self.target, &resource));
        }
        Ok(())
    }

    fn delete_job(&self, data: &mut ScenarioData, audit: &mut AuditLog) -> ScenarioResult<()> {
        let job = data
            .jobs_mut()
            .remove(self.target)
            .ok_or(ModelError::NotFound {
                kind: Job::KIND,
                id: self.target,
            })?;
        for operation in job.operations().iter() {
            audit.record(AuditEntry::deleted(Operation::KIND, operation.id(), operation));
        }
        debug!(
            "job {} deleted with {} operations",
            self.target,
            job.operations().count()
        );
        audit.record(AuditEntry::deleted(Job::KIND, self.target, &job));
        Ok(())
    }

    fn delete_operation(&self, data: &mut ScenarioData, audit: &mut AuditLog) -> ScenarioResult<()> {
        if self.owner.is_null() {
            return Err(ScenarioError::InvalidTransmission(format!(
                "operation {} deleted without its job",
                self.target
            )));
        }
        let job = data
            .jobs_mut()
            .get_by_id_mut(self.owner)
            .ok_or(ModelError::NotFound {
                kind: Job::KIND,
                id: self.owner,
            })?;
        let operation = job
            .operations_mut()
            .remove(self.target)
            .ok_or(ModelError::NotFound {
                kind: Operation::KIND,
                id: self.target,
            })?;
        audit.record(AuditEntry::deleted(Operation::KIND, self.target, &operation));
        Ok(())
    }
}

impl Polymorphic for DeleteEntityT {
    fn type_tag(&self) -> TypeTag {
        Self::TAG
    }

    fn encode_body(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_i32(self.kind.code());
        writer.write_entity_id(self.target);
        writer.write_entity_id(self.owner);
    }
}

impl Transmission for DeleteEntityT {
    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn description(&self) -> String {
        format!("delete {} {}", self.kind, self.target)
    }

    fn apply(
        &self,
        data: &mut ScenarioData,
        audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges> {
        match self.kind {
            EntityKind::Plant => self.delete_plant(data, audit)?,
            EntityKind::Resource => self.delete_resource(data, audit)?,
            EntityKind::Job => self.delete_job(data, audit)?,
            EntityKind::Operation => self.delete_operation(data, audit)?,
        }
        Ok(audit.changes())
    }
}
