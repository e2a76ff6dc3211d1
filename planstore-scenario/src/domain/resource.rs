use planstore_codec::{CodecResult, Decode, Encode, Layout, Reader, VersionTable, Writer};
use planstore_model::{Entity, RestoreContext, WeakRef};
use planstore_types::EntityId;

use crate::domain::Plant;

/// A machine or crew that performs operations, located at one plant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    id: EntityId,
    name: String,
    external_id: Option<String>,
    pub plant: WeakRef<Plant>,
    /// Parallel operations the resource can run.
    pub capacity: f64,
}

impl Resource {
    #[must_use]
    pub fn new(name: impl Into<String>, plant: WeakRef<Plant>) -> Self {
        Self {
            name: name.into(),
            plant,
            capacity: 1.0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

impl Entity for Resource {
    const KIND: &'static str = "Resource";

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

    fn reconnect(&mut self, ctx: &mut RestoreContext) {
        self.plant.reconnect(ctx);
    }
}

impl Encode for Resource {
    fn encode(&self, writer: &mut Writer) {
        writer.write_entity_id(self.id);
        writer.write_str(&self.name);
        writer.write_opt_str(self.external_id.as_deref());
        self.plant.encode(writer);
        writer.write_f64(self.capacity);
    }
}

fn read_v1(reader: &mut Reader<'_>) -> CodecResult<Resource> {
    Ok(Resource {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        plant: WeakRef::decode(reader)?,
        capacity: 1.0,
        ..Resource::default()
    })
}

fn read_v6(reader: &mut Reader<'_>) -> CodecResult<Resource> {
    Ok(Resource {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        external_id: reader.read_opt_string()?,
        plant: WeakRef::decode(reader)?,
        capacity: reader.read_f64()?,
    })
}

pub(crate) static LAYOUTS: VersionTable<Resource> = VersionTable::new(
    "resource",
    &[Layout::reads(6, read_v6), Layout::reads(1, read_v1)],
);

impl Decode for Resource {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        LAYOUTS.read(reader)
    }
}
