use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{ChangeEvent, ChangeKind, Document, DocumentStore, Listener, StoreError};

/// In-process document store. Collections are plain vectors so insertion
/// order survives; listeners are invoked synchronously after the
/// collection lock is released.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    listeners: RwLock<Vec<(String, Listener)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    fn notify(&self, collection: &str, kind: ChangeKind, doc: Document) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners,
            Err(_) => return,
        };

        let event = ChangeEvent {
            collection: collection.to_owned(),
            kind,
            doc,
        };

        for (subscribed, listener) in listeners.iter() {
            if subscribed == collection {
                listener(&event);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn add(&self, collection: &str, id: Option<&str>, data: Value) -> Result<Document, StoreError> {
        let id = id
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let doc = Document {
            id: id.clone(),
            data,
            created_at: Utc::now(),
        };

        {
            let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
            let docs = collections.entry(collection.to_owned()).or_default();

            if docs.iter().any(|d| d.id == id) {
                return Err(StoreError::Conflict {
                    collection: collection.to_owned(),
                    id,
                });
            }

            docs.push(doc.clone());
        }

        self.notify(collection, ChangeKind::Added, doc.clone());
        Ok(doc)
    }

    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Document, StoreError> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => return Err(StoreError::InvalidPatch),
        };

        let doc = {
            let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_owned(),
                    id: id.to_owned(),
                })?;

            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_owned(),
                    id: id.to_owned(),
                })?;

            match &mut doc.data {
                Value::Object(data) => {
                    for (key, value) in patch {
                        data.insert(key, value);
                    }
                }
                _ => return Err(StoreError::InvalidPatch),
            }

            doc.clone()
        };

        self.notify(collection, ChangeKind::Modified, doc.clone());
        Ok(doc)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let doc = {
            let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_owned(),
                    id: id.to_owned(),
                })?;

            let position =
                docs.iter()
                    .position(|d| d.id == id)
                    .ok_or_else(|| StoreError::NotFound {
                        collection: collection.to_owned(),
                        id: id.to_owned(),
                    })?;

            docs.remove(position)
        };

        self.notify(collection, ChangeKind::Removed, doc);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    fn all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    fn subscribe(&self, collection: &str, listener: Listener) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((collection.to_owned(), listener));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn all_preserves_insertion_order() {
        let store = MemoryStore::new();
        store.add("trucks", Some("t-1"), json!({"plate": "AAA"})).unwrap();
        store.add("trucks", Some("t-2"), json!({"plate": "BBB"})).unwrap();
        store.add("trucks", Some("t-3"), json!({"plate": "CCC"})).unwrap();

        let ids: Vec<String> = store
            .all("trucks")
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["t-1", "t-2", "t-3"]);
    }

    #[test]
    fn update_merges_top_level_keys() {
        let store = MemoryStore::new();
        store
            .add("reports", Some("r-1"), json!({"status": "pending", "barangay": "Poblacion"}))
            .unwrap();

        let doc = store
            .update("reports", "r-1", json!({"status": "resolved"}))
            .unwrap();

        assert_eq!(doc.data["status"], "resolved");
        assert_eq!(doc.data["barangay"], "Poblacion");
    }

    #[test]
    fn update_rejects_non_object_patch() {
        let store = MemoryStore::new();
        store.add("reports", Some("r-1"), json!({})).unwrap();

        assert!(matches!(
            store.update("reports", "r-1", json!(42)),
            Err(StoreError::InvalidPatch)
        ));
    }

    #[test]
    fn duplicate_id_conflicts() {
        let store = MemoryStore::new();
        store.add("users", Some("u-1"), json!({})).unwrap();

        assert!(matches!(
            store.add("users", Some("u-1"), json!({})),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn missing_document_is_not_found() {
        let store = MemoryStore::new();

        assert!(matches!(
            store.update("users", "nope", json!({"a": 1})),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("users", "nope"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(store.get("users", "nope").unwrap().is_none());
    }

    #[test]
    fn subscribers_see_every_change() {
        let store = MemoryStore::new();
        let events: Arc<Mutex<Vec<(ChangeKind, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        store.subscribe(
            "reports",
            Box::new(move |event| {
                sink.lock().unwrap().push((event.kind, event.doc.id.clone()));
            }),
        );

        let doc = store.add("reports", None, json!({"x": 1})).unwrap();
        store.update("reports", &doc.id, json!({"x": 2})).unwrap();
        store.delete("reports", &doc.id).unwrap();

        let seen = events.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (ChangeKind::Added, doc.id.clone()),
                (ChangeKind::Modified, doc.id.clone()),
                (ChangeKind::Removed, doc.id.clone()),
            ]
        );
    }

    #[test]
    fn subscription_is_per_collection() {
        let store = MemoryStore::new();
        let count = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&count);

        store.subscribe(
            "reports",
            Box::new(move |_| {
                *sink.lock().unwrap() += 1;
            }),
        );

        store.add("trucks", None, json!({})).unwrap();
        store.add("reports", None, json!({})).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
