use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::store::{Document, StoreError};
use crate::workflow::ValidationError;

/// Collection trucks always roll with a fixed crew size.
pub const COLLECTORS_PER_TRUCK: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "7acde1b0-21d7-4d6f-9b0e-f3a4c1529914",
    "date": "2026-08-07",
    "start_time": "06:00:00",
    "end_time": "10:00:00",
    "truck_id": "t-01",
    "driver_id": "u-42",
    "collector_ids": ["u-11", "u-12", "u-13"],
    "locations": ["Poblacion", "San Isidro"]
}))]
pub struct ScheduleEntry {
    pub id: String,

    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "06:00:00", value_type = String)]
    pub start_time: NaiveTime,

    #[schema(example = "10:00:00", value_type = String)]
    pub end_time: NaiveTime,

    pub truck_id: String,
    pub driver_id: String,

    /// Exactly three collectors ride along
    pub collector_ids: Vec<String>,

    /// Barangays covered by the run, at least one
    pub locations: Vec<String>,
}

impl ScheduleEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end_time <= self.start_time {
            return Err(ValidationError::InvalidTimeRange);
        }
        if self.collector_ids.len() != COLLECTORS_PER_TRUCK {
            return Err(ValidationError::CollectorCount);
        }
        if self.locations.is_empty() {
            return Err(ValidationError::EmptyLocations);
        }
        Ok(())
    }

    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        serde_json::from_value(doc.data.clone()).map_err(StoreError::Codec)
    }

    pub fn to_value(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(StoreError::Codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            id: "s-1".into(),
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            truck_id: "t-1".into(),
            driver_id: "d-1".into(),
            collector_ids: vec!["c-1".into(), "c-2".into(), "c-3".into()],
            locations: vec!["Poblacion".into()],
        }
    }

    #[test]
    fn valid_entry_passes() {
        assert!(entry().validate().is_ok());
    }

    #[test]
    fn end_must_be_after_start() {
        let mut e = entry();
        e.end_time = e.start_time;
        assert_eq!(e.validate(), Err(ValidationError::InvalidTimeRange));
    }

    #[test]
    fn crew_size_is_fixed() {
        let mut e = entry();
        e.collector_ids.pop();
        assert_eq!(e.validate(), Err(ValidationError::CollectorCount));
    }

    #[test]
    fn at_least_one_location() {
        let mut e = entry();
        e.locations.clear();
        assert_eq!(e.validate(), Err(ValidationError::EmptyLocations));
    }
}
