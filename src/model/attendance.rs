use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::store::{Document, StoreError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MemberRole {
    Collector,
    Palero,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TeamMember {
    #[schema(example = "Maria Garcia")]
    pub name: String,
    #[schema(example = "collector")]
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "3f1b2a6c-9d4e-4f0a-8c21-5a7d90e3b1aa",
    "driver": "John Doe",
    "team_members": [
        {"name": "Maria Garcia", "role": "collector"},
        {"name": "Ahmed Ali", "role": "collector"}
    ],
    "check_in_at": "2026-08-07T05:30:00Z",
    "check_out_at": null,
    "status": "pending",
    "location": "Barangay Poblacion",
    "notes": null
}))]
pub struct AttendanceRecord {
    pub id: String,

    #[schema(example = "John Doe")]
    pub driver: String,

    /// Selection order, never reordered after check-in
    pub team_members: Vec<TeamMember>,

    #[schema(example = "2026-08-07T05:30:00Z", format = "date-time", value_type = String)]
    pub check_in_at: DateTime<Utc>,

    #[schema(example = "2026-08-07T13:30:00Z", format = "date-time", value_type = Option<String>, nullable = true)]
    pub check_out_at: Option<DateTime<Utc>>,

    #[schema(example = "pending")]
    pub status: AttendanceStatus,

    #[schema(example = "Barangay Poblacion", nullable = true)]
    pub location: Option<String>,

    pub notes: Option<String>,
}

impl AttendanceRecord {
    /// Documents are validated here, at the store boundary, and nowhere
    /// downstream.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        serde_json::from_value(doc.data.clone()).map_err(StoreError::Codec)
    }

    pub fn to_value(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(StoreError::Codec)
    }

    pub fn is_pending(&self) -> bool {
        self.status == AttendanceStatus::Pending
    }
}
