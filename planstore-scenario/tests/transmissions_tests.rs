use planstore_codec::{CodecError, Polymorphic, Reader, TypeTag, Writer};
use planstore_model::{Entity, ModelError};
use planstore_scenario::domain::EntityKind;
use planstore_scenario::transmission::{
    AddJobT, AddOperationT, AddPlantT, AddResourceT, DeleteEntityT, RestorePointT, SetExternalIdT,
    Transmission, TransmissionHeader, transmission_factory,
};
use planstore_scenario::{Scenario, ScenarioConfig, ScenarioError, ScenarioResult};
use planstore_types::{EntityId, InstigatorId, ScenarioDataChanges};
use pretty_assertions::assert_eq;

const SCENARIO: EntityId = EntityId::from_raw(1);

struct Session {
    scenario: Scenario,
    sequence: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            scenario: Scenario::new(SCENARIO, "Test", ScenarioConfig::default()),
            sequence: 0,
        }
    }

    fn header(&mut self) -> TransmissionHeader {
        self.sequence += 1;
        TransmissionHeader::new(SCENARIO, InstigatorId::system(), self.sequence)
    }

    fn send<T, F>(&mut self, build: F) -> ScenarioResult<ScenarioDataChanges>
    where
        T: Transmission + 'static,
        F: FnOnce(TransmissionHeader) -> T,
    {
        let header = self.header();
        self.scenario.receive(Box::new(build(header)))
    }

    fn plant(&mut self, name: &str) -> EntityId {
        let changes = self.send(|h| AddPlantT::new(h, name)).unwrap();
        only_added(&changes, "Plant")
    }

    fn resource(&mut self, plant: EntityId, name: &str) -> EntityId {
        let changes = self.send(|h| AddResourceT::new(h, plant, name)).unwrap();
        only_added(&changes, "Resource")
    }

    fn job(&mut self, name: &str) -> EntityId {
        let changes = self.send(|h| AddJobT::new(h, name)).unwrap();
        only_added(&changes, "Job")
    }

    fn operation(&mut self, job: EntityId, resource: EntityId, minutes: i64) -> EntityId {
        let changes = self
            .send(|h| AddOperationT::new(h, job, resource, "", minutes))
            .unwrap();
        only_added(&changes, "Operation")
    }
}

fn only_added(changes: &ScenarioDataChanges, kind: &str) -> EntityId {
    let set = changes.get(kind).expect("kind changed");
    assert_eq!(set.added.len(), 1);
    *set.added.iter().next().unwrap()
}

// ── Adding ──────────────────────────────────────────────────────

#[test]
fn add_plant_assigns_id_and_default_name() {
    let mut s = Session::new();
    let first = s.plant("");
    let second = s.plant("Berlin");
    let third = s.plant("");

    let data = s.scenario.read();
    assert_eq!(data.plants().count(), 3);
    assert_eq!(data.plants().get_by_id(first).unwrap().name(), "Plant 1");
    assert_eq!(data.plants().get_by_id(second).unwrap().name(), "Berlin");
    assert_eq!(data.plants().get_by_id(third).unwrap().name(), "Plant 2");
}

#[test]
fn add_plant_with_external_id_is_indexed() {
    let mut s = Session::new();
    s.send(|h| AddPlantT::new(h, "Berlin").with_external_id("ERP-1"))
        .unwrap();

    let data = s.scenario.read();
    assert!(data.plants().is_external_index_enabled());
    assert_eq!(
        data.plants().get_by_external_id("ERP-1").unwrap().name(),
        "Berlin"
    );
}

#[test]
fn add_resource_points_at_its_plant() {
    let mut s = Session::new();
    let plant = s.plant("Berlin");
    let resource = s.resource(plant, "Lathe");

    let data = s.scenario.read();
    let lathe = data.resources().get_by_id(resource).unwrap();
    assert_eq!(lathe.plant.id(), plant);
    assert_eq!(lathe.plant.resolve(data.plants()).unwrap().name(), "Berlin");
    assert_eq!(lathe.capacity, 1.0);
}

#[test]
fn add_resource_to_missing_plant_is_rejected() {
    let mut s = Session::new();
    let result = s.send(|h| AddResourceT::new(h, EntityId::from_raw(42), "Lathe"));

    assert!(matches!(
        result,
        Err(ScenarioError::Model(ModelError::NotFound { kind: "Plant", .. }))
    ));
    assert!(s.scenario.read().resources().is_empty());
}

#[test]
fn operations_are_numbered_across_jobs() {
    let mut s = Session::new();
    let plant = s.plant("Berlin");
    let lathe = s.resource(plant, "Lathe");
    let a = s.job("A");
    let b = s.job("B");

    let a1 = s.operation(a, lathe, 30);
    let b1 = s.operation(b, lathe, 45);
    let a2 = s.operation(a, EntityId::NULL, 15);

    assert_eq!(
        [a1, b1, a2],
        [EntityId::from_raw(1), EntityId::from_raw(2), EntityId::from_raw(3)]
    );
    let data = s.scenario.read();
    let job_a = data.jobs().get_by_id(a).unwrap();
    assert_eq!(job_a.operations().count(), 2);
    assert_eq!(job_a.duration_minutes(), 45);
    assert!(job_a.operations().get_by_id(a2).unwrap().resource.is_null());
    assert_eq!(data.find_operation(b1).map(|(job, _)| job), Some(b));
    assert_eq!(data.entity_counts().operations, 3);
}

#[test]
fn negative_duration_is_rejected() {
    let mut s = Session::new();
    let job = s.job("A");
    let result = s.send(|h| AddOperationT::new(h, job, EntityId::NULL, "Cut", -5));

    assert!(matches!(result, Err(ScenarioError::InvalidTransmission(_))));
    assert!(s.scenario.read().jobs().get_by_id(job).unwrap().operations().is_empty());
}

#[test]
fn operation_on_missing_resource_is_rejected() {
    let mut s = Session::new();
    let job = s.job("A");
    let result = s.send(|h| AddOperationT::new(h, job, EntityId::from_raw(9), "Cut", 5));

    assert!(matches!(
        result,
        Err(ScenarioError::Model(ModelError::NotFound { kind: "Resource", .. }))
    ));
}

// ── External ids ───────────────────────────────────────────────

#[test]
fn set_external_id_updates_index_and_reports_update() {
    let mut s = Session::new();
    let plant = s.plant("Berlin");
    let changes = s
        .send(|h| SetExternalIdT::new(h, EntityKind::Plant, plant, Some("ERP-7".into())))
        .unwrap();

    assert!(changes.get("Plant").unwrap().updated.contains(&plant));
    let data = s.scenario.read();
    assert_eq!(data.plants().get_by_external_id("ERP-7").unwrap().id(), plant);
}

#[test]
fn clearing_external_id_frees_the_key() {
    let mut s = Session::new();
    let job = s.job("A");
    s.send(|h| SetExternalIdT::new(h, EntityKind::Job, job, Some("J-1".into())))
        .unwrap();
    s.send(|h| SetExternalIdT::new(h, EntityKind::Job, job, None))
        .unwrap();

    let data = s.scenario.read();
    assert!(!data.jobs().contains_external_id("J-1"));
    assert_eq!(data.jobs().get_by_id(job).unwrap().external_id(), None);
}

#[test]
fn duplicate_external_id_is_rejected() {
    let mut s = Session::new();
    let plant = s.plant("Berlin");
    let first = s.resource(plant, "Lathe");
    let second = s.resource(plant, "Mill");
    s.send(|h| SetExternalIdT::new(h, EntityKind::Resource, first, Some("R".into())))
        .unwrap();

    let result =
        s.send(|h| SetExternalIdT::new(h, EntityKind::Resource, second, Some("R".into())));

    assert!(matches!(
        result,
        Err(ScenarioError::Model(ModelError::DuplicateKey { .. }))
    ));
    let data = s.scenario.read();
    assert_eq!(data.resources().get_by_external_id("R").unwrap().id(), first);
    assert_eq!(data.resources().get_by_id(second).unwrap().external_id(), None);
}

#[test]
fn operations_have_no_external_id() {
    let mut s = Session::new();
    let job = s.job("A");
    let op = s.operation(job, EntityId::NULL, 10);
    let result = s.send(|h| SetExternalIdT::new(h, EntityKind::Operation, op, Some("X".into())));
    assert!(matches!(result, Err(ScenarioError::InvalidTransmission(_))));
}

// ── Deleting ───────────────────────────────────────────────────

#[test]
fn plant_in_use_cannot_be_deleted() {
    let mut s = Session::new();
    let plant = s.plant("Berlin");
    let resource = s.resource(plant, "Lathe");

    let result = s.send(|h| DeleteEntityT::new(h, EntityKind::Plant, plant));
    assert!(matches!(result, Err(ScenarioError::InvalidTransmission(_))));

    s.send(|h| DeleteEntityT::new(h, EntityKind::Resource, resource))
        .unwrap();
    let changes = s
        .send(|h| DeleteEntityT::new(h, EntityKind::Plant, plant))
        .unwrap();
    assert!(changes.get("Plant").unwrap().deleted.contains(&plant));
    assert!(s.scenario.read().plants().is_empty());
}

#[test]
fn deleting_resource_unassigns_its_operations() {
    let mut s = Session::new();
    let plant = s.plant("Berlin");
    let lathe = s.resource(plant, "Lathe");
    let mill = s.resource(plant, "Mill");
    let job = s.job("A");
    let on_lathe = s.operation(job, lathe, 10);
    let on_mill = s.operation(job, mill, 10);

    let changes = s
        .send(|h| DeleteEntityT::new(h, EntityKind::Resource, lathe))
        .unwrap();

    assert!(changes.get("Resource").unwrap().deleted.contains(&lathe));
    let updated = &changes.get("Operation").unwrap().updated;
    assert!(updated.contains(&on_lathe));
    assert!(!updated.contains(&on_mill));

    let data = s.scenario.read();
    let ops = data.jobs().get_by_id(job).unwrap().operations();
    assert!(ops.get_by_id(on_lathe).unwrap().resource.is_null());
    assert_eq!(ops.get_by_id(on_mill).unwrap().resource.id(), mill);
}

#[test]
fn deleting_job_deletes_its_operations() {
    let mut s = Session::new();
    let job = s.job("A");
    let first = s.operation(job, EntityId::NULL, 10);
    let second = s.operation(job, EntityId::NULL, 20);

    let changes = s
        .send(|h| DeleteEntityT::new(h, EntityKind::Job, job))
        .unwrap();

    let deleted = &changes.get("Operation").unwrap().deleted;
    assert!(deleted.contains(&first) && deleted.contains(&second));
    assert!(changes.get("Job").unwrap().deleted.contains(&job));
    assert_eq!(s.scenario.read().entity_counts().operations, 0);
}

#[test]
fn deleting_operation_needs_its_job() {
    let mut s = Session::new();
    let job = s.job("A");
    let op = s.operation(job, EntityId::NULL, 10);

    let orphan = s.send(|h| DeleteEntityT::new(h, EntityKind::Operation, op));
    assert!(matches!(orphan, Err(ScenarioError::InvalidTransmission(_))));

    let changes = s
        .send(|h| DeleteEntityT::operation(h, job, op))
        .unwrap();
    assert!(changes.get("Operation").unwrap().deleted.contains(&op));
    assert!(s.scenario.read().find_operation(op).is_none());
}

#[test]
fn deleting_missing_entity_is_not_found() {
    let mut s = Session::new();
    let result = s.send(|h| DeleteEntityT::new(h, EntityKind::Job, EntityId::from_raw(3)));
    assert!(matches!(
        result,
        Err(ScenarioError::Model(ModelError::NotFound { kind: "Job", .. }))
    ));
}

// ── Factory ────────────────────────────────────────────────────

fn header(sequence: u64) -> TransmissionHeader {
    TransmissionHeader::new(SCENARIO, InstigatorId::new(), sequence)
}

#[test]
fn factory_knows_every_transmission() {
    let factory = transmission_factory().unwrap();
    assert_eq!(factory.len(), 7);
    assert_eq!(factory.type_name(AddPlantT::TAG), Some("AddPlantT"));
    assert_eq!(factory.type_name(DeleteEntityT::TAG), Some("DeleteEntityT"));
    assert_eq!(factory.type_name(RestorePointT::TAG), Some("RestorePointT"));
}

#[test]
fn transmissions_survive_the_factory() {
    let factory = transmission_factory().unwrap();
    let originals: Vec<Box<dyn Transmission>> = vec![
        Box::new(AddPlantT::new(header(1), "Berlin").with_external_id("P")),
        Box::new(AddResourceT::new(header(2), EntityId::from_raw(1), "Lathe")),
        Box::new(AddJobT::new(header(3), "A").with_external_id("J")),
        Box::new(AddOperationT::new(header(4), EntityId::from_raw(1), EntityId::NULL, "Cut", 15)),
        Box::new(SetExternalIdT::new(header(5), EntityKind::Resource, EntityId::from_raw(1), None)),
        Box::new(DeleteEntityT::operation(header(6), EntityId::from_raw(1), EntityId::from_raw(2))),
        Box::new(RestorePointT::new(header(6), 3)),
    ];

    let mut writer = Writer::new();
    for transmission in &originals {
        factory.serialize(&mut writer, transmission.as_ref());
    }
    let bytes = writer.into_bytes();
    let mut reader = Reader::new(&bytes).unwrap();
    for original in &originals {
        let decoded = factory.deserialize(&mut reader).unwrap();
        assert_eq!(decoded.type_tag(), original.type_tag());
        assert_eq!(decoded.header(), original.header());
        assert_eq!(decoded.description(), original.description());
    }
    assert!(reader.is_at_end());
}

#[test]
fn unknown_transmission_tag_is_rejected() {
    let factory = transmission_factory().unwrap();
    let mut writer = Writer::new();
    writer.write_i32(77);
    let bytes = writer.into_bytes();
    let mut reader = Reader::new(&bytes).unwrap();

    match factory.deserialize(&mut reader) {
        Err(CodecError::UnknownTypeTag { tag, .. }) => assert_eq!(tag, TypeTag(77)),
        other => panic!("expected unknown tag, got {other:?}"),
    }
}

#[test]
fn unknown_entity_kind_code_is_rejected() {
    let factory = transmission_factory().unwrap();
    let mut writer = Writer::new();
    writer.write_i32(DeleteEntityT::TAG.0);
    let mut body = Writer::headerless();
    // Header fields, then a kind code nothing maps to.
    body.write_uuid(header(1).id.as_uuid());
    body.write_entity_id(SCENARIO);
    body.write_uuid(InstigatorId::system().as_uuid());
    body.write_u64(1);
    body.write_i32(9);
    body.write_entity_id(EntityId::from_raw(1));
    body.write_entity_id(EntityId::NULL);
    let mut bytes = writer.into_bytes();
    bytes.extend_from_slice(&body.into_bytes());

    let mut reader = Reader::new(&bytes).unwrap();
    assert!(matches!(
        factory.deserialize(&mut reader),
        Err(CodecError::InvalidValue { what: "entity kind", value: 9 })
    ));
}
