use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::validation_response;
use crate::auth::auth::AuthUser;
use crate::model::schedule::ScheduleEntry;
use crate::store::{DocumentStore, MemoryStore, StoreError, collections};
use crate::workflow::calendar;

/// Entries shown per day cell before the overflow counter kicks in
const DEFAULT_VISIBLE_PER_DAY: usize = 3;

#[derive(Deserialize, ToSchema)]
pub struct CreateSchedule {
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "06:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "10:00:00", value_type = String)]
    pub end_time: NaiveTime,
    #[schema(example = "t-01")]
    pub truck_id: String,
    #[schema(example = "u-42")]
    pub driver_id: String,
    #[schema(example = json!(["u-11", "u-12", "u-13"]))]
    pub collector_ids: Vec<String>,
    #[schema(example = json!(["Poblacion", "San Isidro"]))]
    pub locations: Vec<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ScheduleFilter {
    /// Filter by collection date (YYYY-MM-DD)
    #[schema(example = "2026-08-07")]
    pub date: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    /// Month to render (YYYY-MM); defaults to the current month
    #[schema(example = "2026-08")]
    pub month: Option<String>,
    /// Entries listed per day before the overflow counter
    #[schema(example = 3)]
    pub cap: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarCell {
    #[schema(example = 7)]
    pub day: u32,
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub is_today: bool,
    /// Every entry of the day; the cap only limits what a cell renders
    pub entries: Vec<ScheduleEntry>,
    #[schema(example = 3)]
    pub visible: usize,
    #[schema(example = 1)]
    pub overflow: usize,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarResponse {
    #[schema(example = "2026-08")]
    pub month: String,
    /// Exactly 42 slots, Sunday-first; out-of-month slots are null
    pub cells: Vec<Option<CalendarCell>>,
}

fn load_entries(store: &MemoryStore) -> Result<Vec<ScheduleEntry>, StoreError> {
    Ok(store
        .all(collections::SCHEDULES)?
        .iter()
        .filter_map(|doc| match ScheduleEntry::from_document(doc) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "skipping malformed schedule document");
                None
            }
        })
        .collect())
}

// -------------------- Handlers --------------------

/// Create schedule entry
#[utoipa::path(
    post,
    path = "/api/v1/schedules",
    request_body = CreateSchedule,
    responses(
        (status = 200, description = "Schedule created", body = ScheduleEntry),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "message": "Exactly 3 collectors are required",
            "code": "collector-count"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn create_schedule(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    payload: web::Json<CreateSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let payload = payload.into_inner();
    let entry = ScheduleEntry {
        id: Uuid::new_v4().to_string(),
        date: payload.date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        truck_id: payload.truck_id,
        driver_id: payload.driver_id,
        collector_ids: payload.collector_ids,
        locations: payload.locations,
    };

    if let Err(e) = entry.validate() {
        return Ok(validation_response(e));
    }

    let value = entry.to_value().map_err(|e| {
        tracing::error!(error = %e, "failed to encode schedule");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    store
        .add(collections::SCHEDULES, Some(&entry.id), value)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to store schedule");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    tracing::info!(id = %entry.id, date = %entry.date, by = %auth.email, "schedule created");
    Ok(HttpResponse::Ok().json(entry))
}

/// List schedule entries
#[utoipa::path(
    get,
    path = "/api/v1/schedules",
    params(ScheduleFilter),
    responses(
        (status = 200, description = "Schedule entries", body = [ScheduleEntry]),
        (status = 400, description = "Bad filter value"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn list_schedules(
    _auth: AuthUser,
    store: web::Data<MemoryStore>,
    query: web::Query<ScheduleFilter>,
) -> actix_web::Result<impl Responder> {
    let date = match query.date.as_deref() {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "date must be formatted YYYY-MM-DD"
                })));
            }
        },
        None => None,
    };

    let mut entries = load_entries(store.get_ref()).map_err(|e| {
        tracing::error!(error = %e, "failed to load schedules");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if let Some(date) = date {
        entries.retain(|e| e.date == date);
    }

    Ok(HttpResponse::Ok().json(entries))
}

/// Delete schedule entry
#[utoipa::path(
    delete,
    path = "/api/v1/schedules/{id}",
    params(
        ("id" = String, Path, description = "Schedule entry id")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Schedule entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn delete_schedule(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let id = path.into_inner();

    match store.delete(collections::SCHEDULES, &id) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully deleted"
        }))),
        Err(StoreError::NotFound { .. }) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Schedule entry not found"
        }))),
        Err(e) => {
            tracing::error!(error = %e, id = %id, "failed to delete schedule");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Month calendar with schedule entries overlaid per day
#[utoipa::path(
    get,
    path = "/api/v1/schedules/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "42-cell month grid", body = CalendarResponse),
        (status = 400, description = "Bad month value"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn calendar_view(
    _auth: AuthUser,
    store: web::Data<MemoryStore>,
    query: web::Query<CalendarQuery>,
) -> actix_web::Result<impl Responder> {
    let anchor = match query.month.as_deref() {
        Some(raw) => match parse_month(raw) {
            Some(anchor) => anchor,
            None => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "month must be formatted YYYY-MM"
                })));
            }
        },
        None => Local::now().date_naive(),
    };

    let cap = query.cap.unwrap_or(DEFAULT_VISIBLE_PER_DAY).max(1);

    let entries = load_entries(store.get_ref()).map_err(|e| {
        tracing::error!(error = %e, "failed to load schedules");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let cells = calendar::month_grid(anchor)
        .into_iter()
        .map(|slot| {
            slot.map(|cell| {
                let day_entries: Vec<ScheduleEntry> = calendar::schedules_on(&entries, cell.date)
                    .into_iter()
                    .cloned()
                    .collect();
                let (visible, overflow) = {
                    let (shown, overflow) = calendar::split_visible(&day_entries, cap);
                    (shown.len(), overflow)
                };

                CalendarCell {
                    day: cell.day,
                    date: cell.date,
                    is_today: cell.is_today,
                    entries: day_entries,
                    visible,
                    overflow,
                }
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(CalendarResponse {
        month: format!("{:04}-{:02}", anchor.year(), anchor.month()),
        cells,
    }))
}

fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_parsing() {
        assert_eq!(
            parse_month("2026-08"),
            Some(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap())
        );
        assert!(parse_month("2026").is_none());
        assert!(parse_month("2026-13").is_none());
        assert!(parse_month("august").is_none());
    }
}
