use planstore_model::{ExternalIndex, ModelError};
use planstore_types::EntityId;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn id(raw: u64) -> EntityId {
    EntityId::from_raw(raw)
}

// ── Reference counting ───────────────────────────────────────────

#[test]
fn starts_disabled() {
    let index = ExternalIndex::new();
    assert!(!index.is_enabled());
    assert_eq!(index.ref_count(), 0);
    assert_eq!(index.lookup("a"), None);
}

#[test]
fn first_enable_builds_index() {
    let index = ExternalIndex::new();
    index.enable("Job", [("a", id(1)), ("b", id(2))]).unwrap();
    assert!(index.is_enabled());
    assert_eq!(index.lookup("a"), Some(Some(id(1))));
    assert_eq!(index.lookup("zz"), Some(None));
}

#[test]
fn index_survives_until_last_disable() {
    let index = ExternalIndex::new();
    index.enable("Job", [("a", id(1))]).unwrap();
    index.enable("Job", Vec::<(&str, EntityId)>::new()).unwrap();
    assert_eq!(index.ref_count(), 2);

    assert!(!index.disable());
    assert!(index.is_enabled());
    // The second enable did not rebuild from its (empty) entries.
    assert_eq!(index.lookup("a"), Some(Some(id(1))));

    assert!(index.disable());
    assert!(!index.is_enabled());
}

#[test]
fn extra_disable_is_harmless() {
    let index = ExternalIndex::new();
    assert!(!index.disable());
    assert_eq!(index.ref_count(), 0);
}

#[test]
fn duplicate_keys_leave_index_disabled() {
    let index = ExternalIndex::new();
    let err = index.enable("Plant", [("k", id(1)), ("k", id(2))]).unwrap_err();
    assert!(matches!(err, ModelError::DuplicateKey { kind: "Plant", .. }));
    assert!(!index.is_enabled());
    assert_eq!(index.ref_count(), 0);
}

// ── Bounded waits ────────────────────────────────────────────────

#[test]
fn try_enable_and_disable_succeed_uncontended() {
    let index = ExternalIndex::new();
    let acquired = index
        .try_enable("Job", [("a", id(1))], Duration::from_millis(10))
        .unwrap();
    assert!(acquired);
    assert_eq!(index.try_disable(Duration::from_millis(10)), Some(true));
}

#[test]
fn concurrent_enable_disable_balance_out() {
    let index = Arc::new(ExternalIndex::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for _ in 0..100 {
                    index.enable("Job", [("a", id(1))]).unwrap();
                    assert_eq!(index.lookup("a"), Some(Some(id(1))));
                    index.disable();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(index.ref_count(), 0);
    assert!(!index.is_enabled());
}
