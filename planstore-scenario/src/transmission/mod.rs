//! Transmissions: the only way scenario data changes.
//!
//! A transmission is a polymorphic, serializable request. It is decoded
//! through [`transmission_factory`], applied under the scenario write lock,
//! and then kept in the scenario's transmission log for replay.
//!
//! Every `apply` validates first and mutates second, so a rejected
//! transmission leaves the scenario untouched.

mod add;
mod edit;
mod restore_point;

pub use add::{AddJobT, AddOperationT, AddPlantT, AddResourceT};
pub use edit::{DeleteEntityT, SetExternalIdT};
pub use restore_point::RestorePointT;

use planstore_codec::{ClassFactory, CodecResult, Polymorphic, Reader, Writer};
use planstore_history::AuditLog;
use planstore_types::{EntityId, InstigatorId, ScenarioDataChanges, TransmissionId};
use std::fmt;

use crate::{ScenarioData, ScenarioResult};

/// Routing and ordering data carried by every transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionHeader {
    pub id: TransmissionId,
    /// Scenario the transmission is addressed to.
    pub scenario: EntityId,
    pub instigator: InstigatorId,
    /// Must be greater than the last sequence the scenario applied.
    pub sequence: u64,
}

impl TransmissionHeader {
    #[must_use]
    pub fn new(scenario: EntityId, instigator: InstigatorId, sequence: u64) -> Self {
        Self {
            id: TransmissionId::new(),
            scenario,
            instigator,
            sequence,
        }
    }

    pub(crate) fn encode(&self, writer: &mut Writer) {
        writer.write_uuid(self.id.as_uuid());
        writer.write_entity_id(self.scenario);
        writer.write_uuid(self.instigator.as_uuid());
        writer.write_u64(self.sequence);
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            id: TransmissionId::from_uuid(reader.read_uuid()?),
            scenario: reader.read_entity_id()?,
            instigator: InstigatorId::from_uuid(reader.read_uuid()?),
            sequence: reader.read_u64()?,
        })
    }
}

/// A change request against one scenario.
pub trait Transmission: Polymorphic + Send + Sync + fmt::Debug {
    fn header(&self) -> &TransmissionHeader;

    /// Short human-readable summary used in history records.
    fn description(&self) -> String;

    /// True for [`RestorePointT`], which reuses the last applied sequence
    /// number instead of advancing it.
    fn is_restore_point(&self) -> bool {
        false
    }

    /// Validates and applies the change, recording one audit entry per
    /// entity touched.
    fn apply(
        &self,
        data: &mut ScenarioData,
        audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges>;
}

/// Builds the factory that knows every transmission type.
pub fn transmission_factory() -> CodecResult<ClassFactory<dyn Transmission>> {
    let mut factory = ClassFactory::new("transmissions");
    factory.register(AddPlantT::TAG, "AddPlantT", AddPlantT::decode)?;
    factory.register(AddResourceT::TAG, "AddResourceT", AddResourceT::decode)?;
    factory.register(AddJobT::TAG, "AddJobT", AddJobT::decode)?;
    factory.register(AddOperationT::TAG, "AddOperationT", AddOperationT::decode)?;
    factory.register(SetExternalIdT::TAG, "SetExternalIdT", SetExternalIdT::decode)?;
    factory.register(DeleteEntityT::TAG, "DeleteEntityT", DeleteEntityT::decode)?;
    factory.register(RestorePointT::TAG, "RestorePointT", RestorePointT::decode)?;
    Ok(factory)
}
