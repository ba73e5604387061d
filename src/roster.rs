use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::model::attendance::AttendanceRecord;
use crate::store::{ChangeEvent, ChangeKind, DocumentStore, collections};

/// Local read cache of the attendance collection, most recent first.
///
/// The store subscription is the roster's only writer; workflows mutate
/// the store and read their result back through here, so local state can
/// never drift ahead of what the store accepted.
pub struct Roster {
    records: RwLock<Vec<AttendanceRecord>>,
}

impl Roster {
    fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to the attendance collection and replay whatever is
    /// already in it, so attaching late still converges.
    pub fn attach(store: &dyn DocumentStore) -> Arc<Roster> {
        let roster = Arc::new(Roster::new());

        let sink = Arc::clone(&roster);
        store.subscribe(
            collections::ATTENDANCE,
            Box::new(move |event| sink.apply(event)),
        );

        match store.all(collections::ATTENDANCE) {
            Ok(docs) => {
                for doc in docs {
                    roster.apply(&ChangeEvent {
                        collection: collections::ATTENDANCE.to_owned(),
                        kind: ChangeKind::Added,
                        doc,
                    });
                }
            }
            Err(e) => warn!(error = %e, "attendance replay failed"),
        }

        roster
    }

    fn apply(&self, event: &ChangeEvent) {
        match event.kind {
            ChangeKind::Added => match AttendanceRecord::from_document(&event.doc) {
                Ok(record) => self.add(record),
                Err(e) => {
                    warn!(id = %event.doc.id, error = %e, "skipping malformed attendance document")
                }
            },
            ChangeKind::Modified => match AttendanceRecord::from_document(&event.doc) {
                Ok(record) => self.update(record),
                Err(e) => {
                    warn!(id = %event.doc.id, error = %e, "skipping malformed attendance document")
                }
            },
            ChangeKind::Removed => self.remove(&event.doc.id),
        }
    }

    /// New records go to the front so the console shows the latest
    /// check-in first.
    fn add(&self, record: AttendanceRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert(0, record);
        }
    }

    /// Replace in place, keeping display position.
    fn update(&self, record: AttendanceRecord) {
        if let Ok(mut records) = self.records.write() {
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => *slot = record,
                // a modify we never saw the add for, e.g. replay races
                None => records.insert(0, record),
            }
        }
    }

    fn remove(&self, id: &str) {
        if let Ok(mut records) = self.records.write() {
            records.retain(|r| r.id != id);
        }
    }

    pub fn get(&self, id: &str) -> Option<AttendanceRecord> {
        self.records
            .read()
            .ok()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn all(&self) -> Vec<AttendanceRecord> {
        self.records
            .read()
            .map(|records| records.to_vec())
            .unwrap_or_default()
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<AttendanceRecord>
    where
        F: Fn(&AttendanceRecord) -> bool,
    {
        self.records
            .read()
            .map(|records| records.iter().filter(|r| predicate(r)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn record_value(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "driver": "John Doe",
            "team_members": [{"name": "Maria Garcia", "role": "collector"}],
            "check_in_at": "2026-08-07T05:30:00Z",
            "check_out_at": null,
            "status": "pending",
            "location": null,
            "notes": null
        })
    }

    #[test]
    fn store_adds_flow_into_the_roster_newest_first() {
        let store = MemoryStore::new();
        let roster = Roster::attach(&store);

        store.add(collections::ATTENDANCE, Some("a-1"), record_value("a-1")).unwrap();
        store.add(collections::ATTENDANCE, Some("a-2"), record_value("a-2")).unwrap();

        let all = roster.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a-2");
        assert_eq!(all[1].id, "a-1");
    }

    #[test]
    fn attach_replays_existing_documents() {
        let store = MemoryStore::new();
        store.add(collections::ATTENDANCE, Some("a-1"), record_value("a-1")).unwrap();

        let roster = Roster::attach(&store);
        assert_eq!(roster.len(), 1);
        assert!(roster.get("a-1").is_some());
    }

    #[test]
    fn malformed_documents_are_skipped() {
        let store = MemoryStore::new();
        let roster = Roster::attach(&store);

        store
            .add(collections::ATTENDANCE, Some("bad"), json!({"driver": 42}))
            .unwrap();
        store.add(collections::ATTENDANCE, Some("a-1"), record_value("a-1")).unwrap();

        assert_eq!(roster.len(), 1);
        assert!(roster.get("bad").is_none());
    }

    #[test]
    fn updates_keep_display_position() {
        let store = MemoryStore::new();
        let roster = Roster::attach(&store);

        store.add(collections::ATTENDANCE, Some("a-1"), record_value("a-1")).unwrap();
        store.add(collections::ATTENDANCE, Some("a-2"), record_value("a-2")).unwrap();
        store
            .update(collections::ATTENDANCE, "a-1", json!({"status": "verified"}))
            .unwrap();

        let all = roster.all();
        assert_eq!(all[1].id, "a-1");
        assert_eq!(all[1].status.to_string(), "verified");
    }

    #[test]
    fn removed_documents_leave_the_roster() {
        let store = MemoryStore::new();
        let roster = Roster::attach(&store);

        store.add(collections::ATTENDANCE, Some("a-1"), record_value("a-1")).unwrap();
        store.delete(collections::ATTENDANCE, "a-1").unwrap();

        assert!(roster.is_empty());
    }
}
