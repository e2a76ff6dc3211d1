use planstore_codec::{CodecResult, Decode, Encode, Layout, Reader, VersionTable, Writer};
use planstore_model::Entity;
use planstore_types::EntityId;

/// A production site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plant {
    id: EntityId,
    name: String,
    external_id: Option<String>,
    pub description: String,
    /// Hours available per day.
    pub capacity: f64,
}

impl Plant {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

impl Entity for Plant {
    const KIND: &'static str = "Plant";

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
}

impl Encode for Plant {
    fn encode(&self, writer: &mut Writer) {
        writer.write_entity_id(self.id);
        writer.write_str(&self.name);
        writer.write_opt_str(self.external_id.as_deref());
        writer.write_str(&self.description);
        writer.write_f64(self.capacity);
    }
}

fn read_v1(reader: &mut Reader<'_>) -> CodecResult<Plant> {
    Ok(Plant {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        ..Plant::default()
    })
}

fn read_v4(reader: &mut Reader<'_>) -> CodecResult<Plant> {
    Ok(Plant {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        external_id: reader.read_opt_string()?,
        ..Plant::default()
    })
}

fn read_v8(reader: &mut Reader<'_>) -> CodecResult<Plant> {
    Ok(Plant {
        id: reader.read_entity_id()?,
        name: reader.read_string()?,
        external_id: reader.read_opt_string()?,
        description: reader.read_string()?,
        capacity: reader.read_f64()?,
    })
}

pub(crate) static LAYOUTS: VersionTable<Plant> = VersionTable::new(
    "plant",
    &[
        Layout::reads(8, read_v8),
        Layout::reads(4, read_v4),
        Layout::reads(1, read_v1),
    ],
);

impl Decode for Plant {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        LAYOUTS.read(reader)
    }
}
