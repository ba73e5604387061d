use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::store::{Document, StoreError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::Resolved | ReportStatus::Dismissed)
    }

    /// Triage moves forward only; resolved and dismissed reports stay put.
    pub fn can_become(self, next: ReportStatus) -> bool {
        match self {
            ReportStatus::Pending => matches!(
                next,
                ReportStatus::InProgress | ReportStatus::Resolved | ReportStatus::Dismissed
            ),
            ReportStatus::InProgress => {
                matches!(next, ReportStatus::Resolved | ReportStatus::Dismissed)
            }
            ReportStatus::Resolved | ReportStatus::Dismissed => false,
        }
    }
}

/// Resident-submitted waste report, triaged from the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WasteReport {
    pub id: String,

    #[schema(example = "Uncollected garbage pile beside the covered court")]
    pub description: String,

    /// Grouping key for the map-pin filter
    #[schema(example = "Poblacion")]
    pub barangay: String,

    #[schema(example = 14.5995, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 120.9842, nullable = true)]
    pub longitude: Option<f64>,

    #[schema(example = "pending")]
    pub status: ReportStatus,

    pub reported_by: Option<String>,

    #[schema(example = "2026-08-07T05:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(format = "date-time", value_type = Option<String>, nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WasteReport {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        serde_json::from_value(doc.data.clone()).map_err(StoreError::Codec)
    }

    pub fn to_value(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(StoreError::Codec)
    }
}

#[cfg(test)]
mod tests {
    use super::ReportStatus::*;

    #[test]
    fn triage_moves_forward_only() {
        assert!(Pending.can_become(InProgress));
        assert!(Pending.can_become(Resolved));
        assert!(Pending.can_become(Dismissed));
        assert!(InProgress.can_become(Resolved));
        assert!(InProgress.can_become(Dismissed));

        assert!(!InProgress.can_become(Pending));
        assert!(!Resolved.can_become(InProgress));
        assert!(!Dismissed.can_become(Pending));
        assert!(!Pending.can_become(Pending));
    }

    #[test]
    fn terminal_states() {
        assert!(Resolved.is_terminal());
        assert!(Dismissed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!InProgress.is_terminal());
    }
}
