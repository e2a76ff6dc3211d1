use planstore_codec::{CodecResult, Decode, Encode, Reader, Writer, from_bytes, to_bytes};
use planstore_model::{EntityManager, ModelError, Entity};
use planstore_types::{EntityId, IdGenerator};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[derive(Debug, Clone, Default, PartialEq)]
struct Job {
    id: EntityId,
    name: String,
    external_id: Option<String>,
    priority: i32,
}

impl Job {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn with_id(raw: u64) -> Self {
        Self {
            id: EntityId::from_raw(raw),
            ..Self::default()
        }
    }

    fn keyed(key: &str) -> Self {
        Self {
            external_id: Some(key.to_string()),
            ..Self::default()
        }
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
}

impl Encode for Job {
    fn encode(&self, writer: &mut Writer) {
        writer.write_entity_id(self.id);
        writer.write_str(&self.name);
        writer.write_opt_str(self.external_id.as_deref());
        writer.write_i32(self.priority);
    }
}

impl Decode for Job {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            id: reader.read_entity_id()?,
            name: reader.read_string()?,
            external_id: reader.read_opt_string()?,
            priority: reader.read_i32()?,
        })
    }
}

struct Jobs(EntityManager<Job>);

impl Encode for Jobs {
    fn encode(&self, writer: &mut Writer) {
        self.0.encode(writer);
    }
}

impl Decode for Jobs {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        EntityManager::decode_with(reader, IdGenerator::new(Job::KIND), "Job").map(Jobs)
    }
}

fn manager() -> EntityManager<Job> {
    EntityManager::new("Job")
}

fn id(raw: u64) -> EntityId {
    EntityId::from_raw(raw)
}

fn names(m: &EntityManager<Job>) -> Vec<String> {
    m.iter().map(|job| job.name.clone()).collect()
}

// ── Add ──────────────────────────────────────────────────────────

#[test]
fn add_assigns_id_to_null_entity() {
    let mut m = manager();
    let added = m.add(Job::named("a")).unwrap().id;
    assert_eq!(added, id(1));
    assert_eq!(m.count(), 1);
}

#[test]
fn add_is_idempotent_by_id() {
    let mut m = manager();
    m.add(Job {
        priority: 1,
        ..Job::with_id(5)
    })
    .unwrap();

    let existing = m
        .add(Job {
            priority: 99,
            ..Job::with_id(5)
        })
        .unwrap();

    assert_eq!(existing.priority, 1);
    assert_eq!(m.count(), 1);
}

#[test]
fn add_observes_explicit_ids() {
    let mut m = manager();
    m.add(Job::with_id(41)).unwrap();
    assert_eq!(m.next_id(), id(42));
}

#[test]
fn add_copy_with_original_id_allocates_fresh_id() {
    let mut m = manager();
    let original = m.add(Job::named("orig")).unwrap().clone();

    let copy = m.add_copy(&original, original.clone(), original.id).unwrap();
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.name, "orig");
    assert_eq!(m.count(), 2);
}

#[test]
fn add_copy_uses_requested_id() {
    let mut m = manager();
    let original = m.add(Job::named("orig")).unwrap().clone();

    let copy = m.add_copy(&original, original.clone(), id(10)).unwrap();
    assert_eq!(copy.id, id(10));
}

#[test]
fn add_copy_with_null_id_allocates() {
    let mut m = manager();
    let original = m.add(Job::named("orig")).unwrap().clone();

    let copy = m.add_copy(&original, original.clone(), EntityId::NULL).unwrap();
    assert!(!copy.id.is_null());
    assert_ne!(copy.id, original.id);
}

// ── Remove & clear ───────────────────────────────────────────────

#[test]
fn remove_returns_entity() {
    let mut m = manager();
    m.add(Job::with_id(3)).unwrap();
    let removed = m.remove(id(3)).unwrap();
    assert_eq!(removed.id, id(3));
    assert!(m.is_empty());
    assert!(m.remove(id(3)).is_none());
}

#[test]
fn remove_at_uses_id_order() {
    let mut m = manager();
    for raw in [30, 10, 20] {
        m.add(Job::with_id(raw)).unwrap();
    }
    let removed = m.remove_at(1).unwrap();
    assert_eq!(removed.id, id(20));
    assert!(m.remove_at(5).is_none());
}

#[test]
fn clear_empties_manager() {
    let mut m = manager();
    m.add(Job::named("")).unwrap();
    m.add(Job::named("")).unwrap();
    m.clear();
    assert_eq!(m.count(), 0);
    // Naming restarts from a fresh scan.
    assert_eq!(m.add(Job::named("")).unwrap().name, "Job 1");
}

// ── Lookup ───────────────────────────────────────────────────────

#[test]
fn get_by_id_missing_is_none() {
    let m = manager();
    assert!(m.get_by_id(id(1)).is_none());
    assert!(!m.contains(id(1)));
}

#[test]
fn get_by_index_follows_id_order() {
    let mut m = manager();
    m.add(Job {
        name: "late".into(),
        ..Job::with_id(9)
    })
    .unwrap();
    m.add(Job {
        name: "early".into(),
        ..Job::with_id(2)
    })
    .unwrap();
    assert_eq!(m.get_by_index(0).unwrap().name, "early");
    assert_eq!(m.get_by_index(1).unwrap().name, "late");
    assert!(m.get_by_index(2).is_none());
}

#[test]
fn validate_existence_reports_missing_id() {
    let m = manager();
    let err = m.validate_existence(id(7)).unwrap_err();
    assert!(matches!(err, ModelError::NotFound { kind: "Job", id } if id == EntityId::from_raw(7)));
    assert_eq!(err.to_string(), "Job 7 not found");
}

#[test]
fn get_by_id_mut_changes_untracked_fields() {
    let mut m = manager();
    m.add(Job::with_id(1)).unwrap();
    m.get_by_id_mut(id(1)).unwrap().priority = 4;
    assert_eq!(m.get_by_id(id(1)).unwrap().priority, 4);
}

#[test]
fn rename_missing_entity_fails() {
    let mut m = manager();
    assert!(matches!(
        m.rename(id(1), "x"),
        Err(ModelError::NotFound { .. })
    ));
}

// ── Default naming ───────────────────────────────────────────────

#[test]
fn unnamed_entities_are_numbered() {
    let mut m = manager();
    for _ in 0..3 {
        m.add(Job::named("")).unwrap();
    }
    assert_eq!(names(&m), vec!["Job 1", "Job 2", "Job 3"]);
}

#[test]
fn removing_latest_auto_named_entity_rolls_counter_back() {
    let mut m = manager();
    for _ in 0..3 {
        m.add(Job::named("")).unwrap();
    }
    let job3 = m.iter().find(|job| job.name == "Job 3").unwrap().id;
    m.remove(job3);

    assert_eq!(m.add(Job::named("")).unwrap().name, "Job 3");
}

#[test]
fn removal_after_explicit_higher_name_does_not_reuse_it() {
    let mut m = manager();
    let holder = m.add(Job::named("")).unwrap().id;
    m.add(Job::named("Job 10")).unwrap();
    m.remove(holder);

    assert_eq!(m.add(Job::named("")).unwrap().name, "Job 11");
    assert_eq!(names(&m), vec!["Job 10", "Job 11"]);
}

#[test]
fn two_managers_replaying_same_sequence_agree_on_names() {
    let replay = |m: &mut EntityManager<Job>| {
        m.add(Job::named("")).unwrap();
        let second = m.add(Job::named("")).unwrap().id;
        m.remove(second);
        m.add(Job::named("")).unwrap();
        names(m)
    };
    let mut a = manager();
    let mut b = manager();
    assert_eq!(replay(&mut a), replay(&mut b));
    assert_eq!(names(&a), vec!["Job 1", "Job 2"]);
}

#[test]
fn first_auto_name_skips_existing_numbers() {
    let mut m = manager();
    m.add(Job::named("Job 7")).unwrap();
    assert_eq!(m.add(Job::named("")).unwrap().name, "Job 8");
}

#[test]
fn rename_to_higher_number_advances_counter() {
    let mut m = manager();
    let first = m.add(Job::named("")).unwrap().id;
    m.rename(first, "Job 20").unwrap();
    assert_eq!(m.add(Job::named("")).unwrap().name, "Job 21");
}

// ── External ids ─────────────────────────────────────────────────

#[test]
fn duplicate_external_id_rejected_while_indexed() {
    let mut m = manager();
    m.enable_external_index().unwrap();
    m.add(Job::keyed("ERP-1")).unwrap();

    let err = m.add(Job {
        name: "second".into(),
        ..Job::keyed("ERP-1")
    });

    assert!(matches!(err, Err(ModelError::DuplicateKey { kind: "Job", ref key }) if key == "ERP-1"));
    assert_eq!(m.count(), 1);
    assert!(m.iter().all(|job| job.name != "second"));
}

#[test]
fn duplicate_external_id_allowed_without_index() {
    let mut m = manager();
    m.add(Job::keyed("ERP-1")).unwrap();
    m.add(Job::keyed("ERP-1")).unwrap();
    assert_eq!(m.count(), 2);
}

#[test]
fn enabling_index_over_duplicates_fails_and_stays_disabled() {
    let mut m = manager();
    m.add(Job::keyed("ERP-1")).unwrap();
    m.add(Job::keyed("ERP-1")).unwrap();
    assert!(m.enable_external_index().is_err());
    assert!(!m.is_external_index_enabled());
}

#[test]
fn lookup_by_external_id_with_and_without_index() {
    let mut m = manager();
    let added = m.add(Job::keyed("ERP-9")).unwrap().id;

    assert_eq!(m.get_by_external_id("ERP-9").unwrap().id, added);
    m.enable_external_index().unwrap();
    assert_eq!(m.get_by_external_id("ERP-9").unwrap().id, added);
    assert!(m.contains_external_id("ERP-9"));
    assert!(!m.contains_external_id("nope"));
}

#[test]
fn index_tracks_remove_and_external_id_changes() {
    let mut m = manager();
    m.enable_external_index().unwrap();
    let a = m.add(Job::keyed("A")).unwrap().id;

    m.set_external_id(a, Some("B".into())).unwrap();
    assert!(!m.contains_external_id("A"));
    assert_eq!(m.get_by_external_id("B").unwrap().id, a);

    m.remove(a);
    assert!(!m.contains_external_id("B"));
    // The key is free again.
    m.add(Job::keyed("B")).unwrap();
}

#[test]
fn set_external_id_to_taken_key_fails_without_change() {
    let mut m = manager();
    m.enable_external_index().unwrap();
    m.add(Job::keyed("A")).unwrap();
    let b = m.add(Job::keyed("B")).unwrap().id;

    assert!(m.set_external_id(b, Some("A".into())).is_err());
    assert_eq!(m.get_by_id(b).unwrap().external_id.as_deref(), Some("B"));
}

#[test]
fn clear_keeps_index_enabled_but_empty() {
    let mut m = manager();
    m.enable_external_index().unwrap();
    m.add(Job::keyed("A")).unwrap();
    m.clear();
    assert!(m.is_external_index_enabled());
    assert!(!m.contains_external_id("A"));
}

// ── Shared family generator ──────────────────────────────────────

#[test]
fn managers_sharing_a_generator_never_collide() {
    let family = IdGenerator::new(Job::KIND);
    let mut a = EntityManager::<Job>::with_generator(family.clone(), "Job");
    let mut b = EntityManager::<Job>::with_generator(family.clone(), "Job");

    let x = a.add(Job::named("x")).unwrap().id;
    let y = b.add(Job::named("y")).unwrap().id;
    let z = a.add(Job::with_id(50)).unwrap().id;

    assert_ne!(x, y);
    assert_eq!(z, id(50));
    assert_eq!(b.next_id(), id(51));
}

#[test]
fn adopt_generator_advances_past_held_ids() {
    let mut m = manager();
    m.add(Job::with_id(12)).unwrap();
    let family = IdGenerator::new(Job::KIND);
    m.adopt_generator(family.clone());
    assert!(m.generator().same_family(&family));
    assert_eq!(family.peek(), id(13));
}

// ── Codec ────────────────────────────────────────────────────────

#[test]
fn manager_roundtrips_through_codec() {
    let mut m = manager();
    m.add(Job {
        name: "one".into(),
        external_id: Some("E1".into()),
        priority: 3,
        ..Job::with_id(4)
    })
    .unwrap();
    m.add(Job::named("")).unwrap();

    let bytes = to_bytes(&Jobs(m));
    let Jobs(decoded) = from_bytes::<Jobs>(&bytes).unwrap();

    assert_eq!(decoded.count(), 2);
    let first = decoded.get_by_id(id(4)).unwrap();
    assert_eq!(first.name, "one");
    assert_eq!(first.external_id.as_deref(), Some("E1"));
    assert_eq!(first.priority, 3);
    assert_eq!(decoded.next_id(), id(6));
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn enumeration_is_ascending_for_any_insert_order(
        raw_ids in proptest::collection::hash_set(1u64..10_000, 0..50)
    ) {
        let mut m = manager();
        for raw in &raw_ids {
            m.add(Job::with_id(*raw)).unwrap();
        }
        let ids: Vec<_> = m.ids().collect();
        let mut sorted = ids.clone();
        sorted.sort();
        prop_assert_eq!(ids, sorted);
        prop_assert_eq!(m.count(), raw_ids.len());
    }

    #[test]
    fn next_id_never_returns_live_id(
        raw_ids in proptest::collection::vec(0u64..500, 0..40),
        fresh in 1usize..20,
    ) {
        let mut m = manager();
        for raw in raw_ids {
            m.add(Job::with_id(raw)).unwrap();
        }
        for _ in 0..fresh {
            let next = m.next_id();
            prop_assert!(!m.contains(next));
            m.add(Job::with_id(next.raw())).unwrap();
        }
    }
}
