use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::store::{Document, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Truck {
    pub id: String,

    #[schema(example = "KDL-3491")]
    pub plate_number: String,

    #[schema(example = "Isuzu ELF", nullable = true)]
    pub model: Option<String>,

    #[schema(example = 3500, nullable = true)]
    pub capacity_kg: Option<u32>,

    pub is_active: bool,
}

impl Truck {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        serde_json::from_value(doc.data.clone()).map_err(StoreError::Codec)
    }

    pub fn to_value(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(StoreError::Codec)
    }
}
