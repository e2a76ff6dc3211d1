use planstore_codec::{CodecResult, Polymorphic, Reader, TypeTag, Writer};
use planstore_history::AuditLog;
use planstore_model::ReferenceRestorer;
use planstore_types::ScenarioDataChanges;
use tracing::{debug, warn};

use crate::transmission::{Transmission, TransmissionHeader};
use crate::{ScenarioData, ScenarioResult};

/// Marks the place in a transmission log where a load renumbered the
/// scenario's entities.
///
/// Transmissions logged after the marker use the new ids. Replaying the
/// marker renumbers the replay target the same way, so the rest of the log
/// applies to the entities it was written against. Its sequence number is
/// the last one applied before the load, and it is accepted only at exactly
/// that sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePointT {
    pub header: TransmissionHeader,
    /// Entities whose id changed at the load.
    pub moved: u64,
}

impl RestorePointT {
    pub const TAG: TypeTag = TypeTag(7);

    #[must_use]
    pub fn new(header: TransmissionHeader, moved: u64) -> Self {
        Self { header, moved }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> CodecResult<Box<dyn Transmission>> {
        Ok(Box::new(Self {
            header: TransmissionHeader::decode(reader)?,
            moved: reader.read_u64()?,
        }))
    }
}

impl Polymorphic for RestorePointT {
    fn type_tag(&self) -> TypeTag {
        Self::TAG
    }

    fn encode_body(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_u64(self.moved);
    }
}

impl Transmission for RestorePointT {
    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn description(&self) -> String {
        format!("restore point: {} ids renumbered", self.moved)
    }

    fn is_restore_point(&self) -> bool {
        true
    }

    fn apply(
        &self,
        data: &mut ScenarioData,
        _audit: &mut AuditLog,
    ) -> ScenarioResult<ScenarioDataChanges> {
        let report = ReferenceRestorer::run(data)?;
        if report.moved as u64 != self.moved {
            warn!(
                "restore point at {} moved {} ids, {} when recorded",
                self.header.sequence, report.moved, self.moved
            );
        }
        debug!(
            "scenario {}: renumbered at restore point {}",
            data.scenario_id(),
            self.header.sequence
        );
        Ok(ScenarioDataChanges::new())
    }
}
