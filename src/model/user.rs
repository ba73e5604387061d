use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Document, StoreError};

/// Console account. The password field always holds an argon2 hash; raw
/// passwords never reach a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role_id: u8,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        serde_json::from_value(doc.data.clone()).map_err(StoreError::Codec)
    }

    pub fn to_value(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(StoreError::Codec)
    }
}
