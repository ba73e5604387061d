use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::api::workflow_response;
use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::roster::Roster;
use crate::store::MemoryStore;
use crate::workflow::attendance::{self as workflow, CheckIn};

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    #[schema(example = "John Doe")]
    pub driver: String,
    /// Names of everyone riding along, selection order
    #[schema(example = json!(["Maria Garcia", "Ahmed Ali", "Carlos Rodriguez"]))]
    pub members: Vec<String>,
    #[schema(example = "Barangay Poblacion", nullable = true)]
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckOutReq {
    #[schema(example = "route finished early", nullable = true)]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Filter by record status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Filter by check-in date (YYYY-MM-DD)
    #[schema(example = "2026-08-07")]
    pub date: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<usize>,
    /// Pagination per page number
    #[schema(example = 20)]
    pub per_page: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: usize,
    #[schema(example = 20)]
    pub per_page: usize,
    #[schema(example = 1)]
    pub total: usize,
}

/* =========================
Team check-in
========================= */
/// Swagger doc for check_in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body(
        content = CheckInReq,
        description = "Check-in payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Team checked in", body = AttendanceRecord),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "message": "Driver name is required",
            "code": "missing-driver"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage backend unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    roster: web::Data<Roster>,
    payload: web::Json<CheckInReq>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let input = CheckIn {
        driver: payload.driver,
        members: payload.members,
        location: payload.location,
        notes: payload.notes,
    };

    match workflow::check_in(store.get_ref(), roster.get_ref(), input) {
        Ok(record) => {
            tracing::info!(id = %record.id, by = %auth.email, "team checked in");
            Ok(HttpResponse::Ok().json(record))
        }
        Err(e) => Ok(workflow_response(e)),
    }
}

/* =========================
Team check-out
========================= */
/// Swagger doc for check_out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}/check-out",
    params(
        ("id" = String, Path, description = "Attendance record id")
    ),
    request_body = CheckOutReq,
    responses(
        (status = 200, description = "Team checked out", body = AttendanceRecord),
        (status = 400, description = "Already checked out", body = Object, example = json!({
            "message": "Team is already checked out",
            "code": "already-checked-out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Record not found"),
        (status = 503, description = "Storage backend unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    roster: web::Data<Roster>,
    path: web::Path<String>,
    payload: web::Json<CheckOutReq>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    match workflow::check_out(
        store.get_ref(),
        roster.get_ref(),
        &id,
        payload.into_inner().notes,
    ) {
        Ok(record) => {
            tracing::info!(id = %record.id, by = %auth.email, "team checked out");
            Ok(HttpResponse::Ok().json(record))
        }
        Err(e) => Ok(workflow_response(e)),
    }
}

/* =========================
Verify attendance (Dispatcher/Admin)
========================= */
/// Swagger doc for verify endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}/verify",
    params(
        ("id" = String, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Record verified", body = AttendanceRecord),
        (status = 400, description = "Record already processed", body = Object, example = json!({
            "message": "Record was already processed",
            "code": "not-pending"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn verify(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    roster: web::Data<Roster>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let id = path.into_inner();

    match workflow::verify(store.get_ref(), roster.get_ref(), &id) {
        Ok(record) => {
            tracing::info!(id = %record.id, by = %auth.email, "attendance verified");
            Ok(HttpResponse::Ok().json(record))
        }
        Err(e) => Ok(workflow_response(e)),
    }
}

/* =========================
Reject attendance (Dispatcher/Admin)
========================= */
/// Swagger doc for reject endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}/reject",
    params(
        ("id" = String, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Record rejected", body = AttendanceRecord),
        (status = 400, description = "Record already processed", body = Object, example = json!({
            "message": "Record was already processed",
            "code": "not-pending"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn reject(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    roster: web::Data<Roster>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let id = path.into_inner();

    match workflow::reject(store.get_ref(), roster.get_ref(), &id) {
        Ok(record) => {
            tracing::info!(id = %record.id, by = %auth.email, "attendance rejected");
            Ok(HttpResponse::Ok().json(record))
        }
        Err(e) => Ok(workflow_response(e)),
    }
}

/// Attendance listing endpoint
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 400, description = "Bad filter value"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    _auth: AuthUser,
    roster: web::Data<Roster>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Filters
    // -------------------------
    let status = match query.status.as_deref() {
        Some(raw) => match AttendanceStatus::from_str(raw) {
            Ok(status) => Some(status),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "Unknown status. Allowed: pending, verified, rejected"
                })));
            }
        },
        None => None,
    };

    let date = match query.date.as_deref() {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "date must be formatted YYYY-MM-DD"
                })));
            }
        },
        None => None,
    };

    let records = roster.filter(|record| {
        status.map(|s| record.status == s).unwrap_or(true)
            && date
                .map(|d| record.check_in_at.date_naive() == d)
                .unwrap_or(true)
    });

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = records.len();
    let data: Vec<AttendanceRecord> = records.into_iter().skip(offset).take(per_page).collect();

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::config::Config;
    use actix_web::{App, test};
    use serde_json::json;
    use std::sync::Arc;

    fn test_config() -> Config {
        Config {
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            seed_admin_email: "admin@wma.local".into(),
            seed_admin_password: "irrelevant".into(),
        }
    }

    #[actix_web::test]
    async fn check_in_then_verify_over_http() {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let roster = Roster::attach(store.as_ref());
        let token = generate_access_token("u-1", "admin@wma.local", 1, &config.jwt_secret, 900);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(Arc::clone(&store)))
                .app_data(web::Data::from(Arc::clone(&roster)))
                .app_data(web::Data::new(config))
                .route("/attendance", web::post().to(check_in))
                .route("/attendance/{id}/verify", web::put().to(verify)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/attendance")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({
                "driver": "John Doe",
                "members": ["Maria Garcia", "Ahmed Ali", "Carlos Rodriguez"]
            }))
            .to_request();
        let record: AttendanceRecord = test::call_and_read_body_json(&app, req).await;

        assert_eq!(record.status, AttendanceStatus::Pending);
        assert_eq!(record.team_members.len(), 3);

        let req = test::TestRequest::put()
            .uri(&format!("/attendance/{}/verify", record.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let verified: AttendanceRecord = test::call_and_read_body_json(&app, req).await;

        assert_eq!(verified.status, AttendanceStatus::Verified);
        assert!(verified.check_out_at.is_some());
    }

    #[actix_web::test]
    async fn crew_cannot_verify() {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let roster = Roster::attach(store.as_ref());
        let crew_token = generate_access_token("u-9", "crew@wma.local", 3, &config.jwt_secret, 900);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(Arc::clone(&store)))
                .app_data(web::Data::from(Arc::clone(&roster)))
                .app_data(web::Data::new(config))
                .route("/attendance/{id}/verify", web::put().to(verify)),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/attendance/whatever/verify")
            .insert_header(("Authorization", format!("Bearer {crew_token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::FORBIDDEN);
    }
}
