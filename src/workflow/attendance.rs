use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::{ValidationError, WorkflowError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, MemberRole, TeamMember};
use crate::roster::Roster;
use crate::store::{DocumentStore, StoreError, collections};

/// Check-in form input as submitted by the team leader.
#[derive(Debug, Clone, Default)]
pub struct CheckIn {
    pub driver: String,
    pub members: Vec<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Open a new attendance record for a collection team.
pub fn check_in(
    store: &dyn DocumentStore,
    roster: &Roster,
    input: CheckIn,
) -> Result<AttendanceRecord, WorkflowError> {
    if input.driver.trim().is_empty() {
        return Err(ValidationError::MissingDriver.into());
    }
    if input.members.is_empty() {
        return Err(ValidationError::EmptyTeam.into());
    }

    // Every member is recorded as a collector at check-in; the palero
    // distinction from the picker does not carry into the roster.
    let team_members = input
        .members
        .into_iter()
        .map(|name| TeamMember {
            name,
            role: MemberRole::Collector,
        })
        .collect();

    let record = AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        driver: input.driver.trim().to_owned(),
        team_members,
        check_in_at: Utc::now(),
        check_out_at: None,
        status: AttendanceStatus::Pending,
        location: input.location,
        notes: input.notes,
    };

    store.add(collections::ATTENDANCE, Some(&record.id), record.to_value()?)?;
    read_back(roster, &record.id)
}

/// Close an open record. Status stays pending until an admin verifies.
pub fn check_out(
    store: &dyn DocumentStore,
    roster: &Roster,
    id: &str,
    notes: Option<String>,
) -> Result<AttendanceRecord, WorkflowError> {
    let record = roster.get(id).ok_or(ValidationError::NotFound)?;

    // The console only offers check-out for open records; still refuse a
    // double check-out arriving through any other path.
    if record.check_out_at.is_some() {
        return Err(ValidationError::AlreadyCheckedOut.into());
    }

    let mut patch = json!({ "check_out_at": Utc::now() });
    if let Some(notes) = notes {
        patch["notes"] = json!(notes);
    }

    store.update(collections::ATTENDANCE, id, patch)?;
    read_back(roster, id)
}

/// Admin sign-off. A team that never checked out is closed on the spot.
pub fn verify(
    store: &dyn DocumentStore,
    roster: &Roster,
    id: &str,
) -> Result<AttendanceRecord, WorkflowError> {
    let record = roster.get(id).ok_or(ValidationError::NotFound)?;
    if !record.is_pending() {
        return Err(ValidationError::NotPending.into());
    }

    let mut patch = json!({ "status": AttendanceStatus::Verified });
    if record.check_out_at.is_none() {
        patch["check_out_at"] = json!(Utc::now());
    }

    store.update(collections::ATTENDANCE, id, patch)?;
    read_back(roster, id)
}

/// Admin rejection. The check-out time, present or not, is left alone.
pub fn reject(
    store: &dyn DocumentStore,
    roster: &Roster,
    id: &str,
) -> Result<AttendanceRecord, WorkflowError> {
    let record = roster.get(id).ok_or(ValidationError::NotFound)?;
    if !record.is_pending() {
        return Err(ValidationError::NotPending.into());
    }

    store.update(
        collections::ATTENDANCE,
        id,
        json!({ "status": AttendanceStatus::Rejected }),
    )?;
    read_back(roster, id)
}

// The subscription is the roster's only writer; a record the roster cannot
// see after the store accepted it means the cache diverged.
fn read_back(roster: &Roster, id: &str) -> Result<AttendanceRecord, WorkflowError> {
    roster.get(id).ok_or_else(|| {
        WorkflowError::Collaborator(StoreError::NotFound {
            collection: collections::ATTENDANCE.to_owned(),
            id: id.to_owned(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn setup() -> (MemoryStore, Arc<Roster>) {
        let store = MemoryStore::new();
        let roster = Roster::attach(&store);
        (store, roster)
    }

    fn full_team() -> CheckIn {
        CheckIn {
            driver: "John Doe".into(),
            members: vec![
                "Maria Garcia".into(),
                "Ahmed Ali".into(),
                "Carlos Rodriguez".into(),
            ],
            location: Some("Barangay Poblacion".into()),
            notes: None,
        }
    }

    fn validation_code(err: WorkflowError) -> String {
        match err {
            WorkflowError::Validation(e) => e.to_string(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn check_in_opens_a_pending_record() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();

        assert_eq!(record.status, AttendanceStatus::Pending);
        assert!(record.check_out_at.is_none());
        assert_eq!(record.team_members.len(), 3);
        assert_eq!(record.driver, "John Doe");
        assert_eq!(record.location.as_deref(), Some("Barangay Poblacion"));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn members_default_to_collector() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();

        assert!(
            record
                .team_members
                .iter()
                .all(|m| m.role == MemberRole::Collector)
        );
    }

    #[test]
    fn missing_driver_is_rejected_and_roster_untouched() {
        let (store, roster) = setup();

        let mut input = full_team();
        input.driver = String::new();
        let err = check_in(&store, &roster, input).unwrap_err();

        assert_eq!(validation_code(err), "missing-driver");
        assert_eq!(roster.len(), 0);
    }

    #[test]
    fn whitespace_driver_counts_as_missing() {
        let (store, roster) = setup();

        let mut input = full_team();
        input.driver = "   ".into();
        let err = check_in(&store, &roster, input).unwrap_err();

        assert_eq!(validation_code(err), "missing-driver");
        assert!(roster.is_empty());
    }

    #[test]
    fn empty_team_is_rejected_and_roster_untouched() {
        let (store, roster) = setup();

        let mut input = full_team();
        input.members.clear();
        let err = check_in(&store, &roster, input).unwrap_err();

        assert_eq!(validation_code(err), "empty-team");
        assert_eq!(roster.len(), 0);
    }

    #[test]
    fn newest_check_in_is_listed_first() {
        let (store, roster) = setup();

        check_in(&store, &roster, full_team()).unwrap();
        let mut second = full_team();
        second.driver = "Pedro Cruz".into();
        let latest = check_in(&store, &roster, second).unwrap();

        assert_eq!(roster.all()[0].id, latest.id);
    }

    #[test]
    fn check_out_closes_an_open_record() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        let closed = check_out(&store, &roster, &record.id, None).unwrap();

        assert!(closed.check_out_at.is_some());
        assert!(closed.check_out_at.unwrap() >= closed.check_in_at);
        assert_eq!(closed.status, AttendanceStatus::Pending);
    }

    #[test]
    fn check_out_can_replace_notes() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        let closed = check_out(
            &store,
            &roster,
            &record.id,
            Some("route done early".into()),
        )
        .unwrap();

        assert_eq!(closed.notes.as_deref(), Some("route done early"));
    }

    #[test]
    fn double_check_out_is_refused() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        let closed = check_out(&store, &roster, &record.id, None).unwrap();

        let err = check_out(&store, &roster, &record.id, None).unwrap_err();
        assert_eq!(validation_code(err), "already-checked-out");

        // the original close time survives the refused attempt
        assert_eq!(
            roster.get(&record.id).unwrap().check_out_at,
            closed.check_out_at
        );
    }

    #[test]
    fn check_out_of_unknown_record_is_not_found() {
        let (store, roster) = setup();

        let err = check_out(&store, &roster, "missing", None).unwrap_err();
        assert_eq!(validation_code(err), "not-found");
    }

    #[test]
    fn verify_fills_missing_check_out() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        let verified = verify(&store, &roster, &record.id).unwrap();

        assert_eq!(verified.status, AttendanceStatus::Verified);
        assert!(verified.check_out_at.is_some());
    }

    #[test]
    fn verify_keeps_an_existing_check_out() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        let closed = check_out(&store, &roster, &record.id, None).unwrap();
        let verified = verify(&store, &roster, &record.id).unwrap();

        assert_eq!(verified.check_out_at, closed.check_out_at);
    }

    #[test]
    fn reject_leaves_check_out_untouched() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        let rejected = reject(&store, &roster, &record.id).unwrap();

        assert_eq!(rejected.status, AttendanceStatus::Rejected);
        assert!(rejected.check_out_at.is_none());
    }

    #[test]
    fn verified_records_cannot_be_rejected() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        verify(&store, &roster, &record.id).unwrap();

        let err = reject(&store, &roster, &record.id).unwrap_err();
        assert_eq!(validation_code(err), "not-pending");
    }

    #[test]
    fn rejected_records_cannot_be_verified() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        reject(&store, &roster, &record.id).unwrap();

        let err = verify(&store, &roster, &record.id).unwrap_err();
        assert_eq!(validation_code(err), "not-pending");
    }

    #[test]
    fn full_day_in_the_life() {
        let (store, roster) = setup();

        let record = check_in(&store, &roster, full_team()).unwrap();
        assert_eq!(record.team_members.len(), 3);
        assert_eq!(record.status, AttendanceStatus::Pending);

        let closed = check_out(&store, &roster, &record.id, None).unwrap();
        assert!(closed.check_out_at.is_some());

        let verified = verify(&store, &roster, &record.id).unwrap();
        assert_eq!(verified.status, AttendanceStatus::Verified);
        assert_eq!(verified.check_out_at, closed.check_out_at);

        let err = verify(&store, &roster, &record.id).unwrap_err();
        assert_eq!(validation_code(err), "not-pending");
    }
}
