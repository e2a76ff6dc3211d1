use planstore_types::{EntityId, IdGenerator, InstigatorId, TransmissionId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

// ── EntityId ──────────────────────────────────────────────────────

#[test]
fn null_is_default_and_null() {
    assert_eq!(EntityId::default(), EntityId::NULL);
    assert!(EntityId::NULL.is_null());
    assert!(!EntityId::from_raw(1).is_null());
}

#[test]
fn entity_id_orders_by_value() {
    let a = EntityId::from_raw(3);
    let b = EntityId::from_raw(10);
    assert!(a < b);
    assert_eq!(a, EntityId::from_raw(3));
}

#[test]
fn entity_id_display_and_parse() {
    let id = EntityId::from_raw(42);
    assert_eq!(id.to_string(), "42");
    assert_eq!(EntityId::parse("42").unwrap(), id);
    assert_eq!(EntityId::from_str(" 42 ").unwrap(), id);
}

#[test]
fn null_displays_as_placeholder() {
    assert_eq!(EntityId::NULL.to_string(), "<null>");
}

#[test]
fn entity_id_parse_invalid() {
    assert!(EntityId::parse("not-a-number").is_err());
    assert!(EntityId::parse("-3").is_err());
}

#[test]
fn entity_id_serialization_is_transparent() {
    let id = EntityId::from_raw(7);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "7");
    let parsed: EntityId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

// ── IdGenerator ───────────────────────────────────────────────────

#[test]
fn generator_starts_at_one() {
    let generator = IdGenerator::new("job");
    assert_eq!(generator.family(), "job");
    assert_eq!(generator.next_id(), EntityId::from_raw(1));
    assert_eq!(generator.next_id(), EntityId::from_raw(2));
}

#[test]
fn generator_skips_observed_ids() {
    let generator = IdGenerator::new("job");
    generator.observe(EntityId::from_raw(40));
    assert_eq!(generator.next_id(), EntityId::from_raw(41));
    // Observing something smaller never moves the counter backwards.
    generator.observe(EntityId::from_raw(5));
    assert_eq!(generator.next_id(), EntityId::from_raw(42));
}

#[test]
fn observing_null_is_ignored() {
    let generator = IdGenerator::new("job");
    generator.observe(EntityId::NULL);
    assert_eq!(generator.peek(), EntityId::from_raw(1));
}

#[test]
fn clones_share_the_family_counter() {
    let a = IdGenerator::new("operation");
    let b = a.clone();
    assert!(a.same_family(&b));
    let first = a.next_id();
    let second = b.next_id();
    assert_ne!(first, second);
    assert!(!a.same_family(&IdGenerator::new("operation")));
}

#[test]
fn reset_restarts_numbering() {
    let generator = IdGenerator::new("plant");
    generator.observe(EntityId::from_raw(99));
    generator.reset();
    assert_eq!(generator.next_id(), EntityId::from_raw(1));
}

#[test]
fn generator_is_unique_across_threads() {
    let generator = IdGenerator::new("job");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let g = generator.clone();
            std::thread::spawn(move || (0..250).map(|_| g.next_id()).collect::<Vec<_>>())
        })
        .collect();
    let mut seen = HashSet::new();
    for h in handles {
        for id in h.join().unwrap() {
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), 1000);
}

proptest! {
    #[test]
    fn next_id_never_returns_an_observed_id(live in prop::collection::vec(1u64..10_000, 0..50)) {
        let generator = IdGenerator::new("job");
        for raw in &live {
            generator.observe(EntityId::from_raw(*raw));
        }
        let live: HashSet<u64> = live.into_iter().collect();
        for _ in 0..20 {
            let id = generator.next_id();
            prop_assert!(!live.contains(&id.raw()));
        }
    }
}

// ── InstigatorId / TransmissionId ────────────────────────────────

#[test]
fn instigator_id_new_is_unique() {
    assert_ne!(InstigatorId::new(), InstigatorId::new());
}

#[test]
fn instigator_system_is_nil() {
    assert!(InstigatorId::system().as_uuid().is_nil());
}

#[test]
fn instigator_id_display_and_parse() {
    let id = InstigatorId::new();
    let parsed = InstigatorId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
    assert!(InstigatorId::from_str("garbage").is_err());
}

#[test]
fn transmission_ids_are_time_ordered() {
    let a = TransmissionId::new();
    let b = TransmissionId::new();
    assert_ne!(a, b);
    assert!(a <= b);
}

#[test]
fn transmission_id_roundtrips_through_uuid() {
    let uuid = uuid::Uuid::now_v7();
    assert_eq!(TransmissionId::from_uuid(uuid).as_uuid(), uuid);
}
