use chrono::{DateTime, Utc};
use derive_more::Display;
use serde_json::Value;

pub mod memory;

pub use memory::MemoryStore;

/// Collection names used by the console. Free-form key/value documents
/// live under each one.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ATTENDANCE: &str = "attendance";
    pub const SCHEDULES: &str = "schedules";
    pub const REPORTS: &str = "reports";
    pub const TRUCKS: &str = "trucks";
    pub const SESSIONS: &str = "sessions";
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// Delivered to subscribers after every mutation of a collection.
/// For `Removed` the document carries its last known contents.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: String,
    pub kind: ChangeKind,
    pub doc: Document,
}

pub type Listener = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "document {}/{} not found", collection, id)]
    NotFound { collection: String, id: String },
    #[display(fmt = "document {}/{} already exists", collection, id)]
    Conflict { collection: String, id: String },
    #[display(fmt = "patch must be a JSON object")]
    InvalidPatch,
    #[display(fmt = "malformed document payload: {}", _0)]
    Codec(serde_json::Error),
    #[display(fmt = "store lock poisoned")]
    Poisoned,
}

impl std::error::Error for StoreError {}

/// Collection-style document storage. The sole implementation here keeps
/// everything in process memory; a hosted document database would slot in
/// behind the same trait.
pub trait DocumentStore: Send + Sync {
    /// Insert a document. When `id` is absent one is generated.
    fn add(&self, collection: &str, id: Option<&str>, data: Value) -> Result<Document, StoreError>;

    /// Shallow-merge `patch`'s top-level keys into an existing document.
    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Document, StoreError>;

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Every document of a collection, in insertion order.
    fn all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Register a live subscription; the listener fires synchronously
    /// inside the mutating call.
    fn subscribe(&self, collection: &str, listener: Listener);
}
