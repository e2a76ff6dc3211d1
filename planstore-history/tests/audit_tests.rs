use planstore_codec::{Encode, Writer};
use planstore_history::{AuditEntry, AuditLog, ChangeKind};
use planstore_types::EntityId;
use pretty_assertions::assert_eq;

struct Snapshot(i32);

impl Encode for Snapshot {
    fn encode(&self, writer: &mut Writer) {
        writer.write_i32(self.0);
    }
}

fn id(raw: u64) -> EntityId {
    EntityId::from_raw(raw)
}

#[test]
fn additions_carry_no_snapshot() {
    let entry = AuditEntry::added("Plant", id(1));
    assert_eq!(entry.change, ChangeKind::Added);
    assert!(entry.before.is_none());
}

#[test]
fn changes_carry_headerless_encoding() {
    let entry = AuditEntry::changed("Plant", id(1), &Snapshot(7));
    assert_eq!(entry.before, Some(7i32.to_le_bytes().to_vec()));

    let entry = AuditEntry::deleted("Plant", id(1), &Snapshot(-1));
    assert_eq!(entry.change, ChangeKind::Deleted);
    assert_eq!(entry.before.unwrap().len(), 4);
}

#[test]
fn drain_preserves_order_and_empties() {
    let mut log = AuditLog::new();
    log.record(AuditEntry::added("Job", id(2)));
    log.record(AuditEntry::added("Job", id(1)));
    assert_eq!(log.len(), 2);

    let subjects: Vec<_> = log.drain().map(|e| e.subject).collect();
    assert_eq!(subjects, vec![id(2), id(1)]);
    assert!(log.is_empty());
}

#[test]
fn entries_fold_into_change_sets() {
    let mut log = AuditLog::new();
    log.record(AuditEntry::added("Job", id(1)));
    log.record(AuditEntry::changed("Plant", id(4), &Snapshot(0)));
    log.record(AuditEntry::deleted("Plant", id(5), &Snapshot(0)));

    let changes = log.changes();
    assert!(changes.get("Job").unwrap().added.contains(&id(1)));
    let plants = changes.get("Plant").unwrap();
    assert!(plants.updated.contains(&id(4)));
    assert!(plants.deleted.contains(&id(5)));
    assert_eq!(log.entries().len(), 3);
}
