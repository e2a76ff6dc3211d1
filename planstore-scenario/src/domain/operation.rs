use planstore_codec::{CodecError, CodecResult, Decode, Encode, Layout, Reader, VersionTable, Writer};
use planstore_model::{Entity, RestoreContext, WeakRef};
use planstore_types::EntityId;

use crate::domain::Resource;

/// One step of a job, run on a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    id: EntityId,
    name: String,
    pub resource: WeakRef<Resource>,
    pub duration_minutes: i64,
}

impl Operation {
    #[must_use]
    pub fn new(name: impl Into<String>, resource: WeakRef<Resource>, duration_minutes: i64) -> Self {
        Self {
            name: name.into(),
            resource,
            duration_minutes,
            ..Self::default()
        }
    }
}

impl Entity for Operation {
    const KIND: &'static str = "Operation";

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

    fn reconnect(&mut self, ctx: &mut RestoreContext) {
        self.resource.reconnect(ctx);
    }
}

impl Encode for Operation {
    fn encode(&self, writer: &mut Writer) {
        writer.write_entity_id(self.id);
        writer.write_str(&self.name);
        writer.write_i64(self.duration_minutes);
        self.resource.encode(writer);
    }
}

// Durations were int32 minutes and operations were not yet tied to a
// resource.
fn read_v1(reader: &mut Reader<'_>) -> CodecResult<Operation> {
    Ok(Operation {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        duration_minutes: i64::from(reader.read_i32()?),
        ..Operation::default()
    })
}

fn read_v7(reader: &mut Reader<'_>) -> CodecResult<Operation> {
    let id = reader.read_entity_id()?;
    let name = reader.read_string()?;
    let duration_minutes = reader.read_i64()?;
    if duration_minutes < 0 {
        return Err(CodecError::InvalidValue {
            what: "operation duration",
            value: duration_minutes,
        });
    }
    Ok(Operation {
        id,
        name,
        resource: WeakRef::decode(reader)?,
        duration_minutes,
    })
}

pub(crate) static LAYOUTS: VersionTable<Operation> = VersionTable::new(
    "operation",
    &[Layout::reads(7, read_v7), Layout::reads(1, read_v1)],
);

impl Decode for Operation {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        LAYOUTS.read(reader)
    }
}
