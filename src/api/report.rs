use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::validation_response;
use crate::auth::auth::AuthUser;
use crate::model::report::{ReportStatus, WasteReport};
use crate::store::{DocumentStore, MemoryStore, StoreError, collections};
use crate::workflow::ValidationError;

#[derive(Deserialize, ToSchema)]
pub struct CreateReport {
    #[schema(example = "Uncollected garbage pile beside the covered court")]
    pub description: String,
    #[schema(example = "Poblacion")]
    pub barangay: String,
    #[schema(example = 14.5995, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 120.9842, nullable = true)]
    pub longitude: Option<f64>,
    #[schema(example = "resident hotline", nullable = true)]
    pub reported_by: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportFilter {
    /// Filter pins by barangay
    #[schema(example = "Poblacion")]
    pub barangay: Option<String>,
    /// Filter by triage status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<usize>,
    /// Pagination per page number
    #[schema(example = 20)]
    pub per_page: Option<usize>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateReportStatus {
    #[schema(example = "in-progress")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReportListResponse {
    pub data: Vec<WasteReport>,
    #[schema(example = 1)]
    pub page: usize,
    #[schema(example = 20)]
    pub per_page: usize,
    #[schema(example = 1)]
    pub total: usize,
}

fn load_reports(store: &MemoryStore) -> Result<Vec<WasteReport>, StoreError> {
    Ok(store
        .all(collections::REPORTS)?
        .iter()
        .filter_map(|doc| match WasteReport::from_document(doc) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "skipping malformed report document");
                None
            }
        })
        .collect())
}

/* =========================
File report
========================= */
/// Swagger doc for create_report endpoint
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = CreateReport,
    responses(
        (status = 200, description = "Report filed", body = WasteReport),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn create_report(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    payload: web::Json<CreateReport>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    if payload.description.trim().is_empty() || payload.barangay.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "description and barangay are required"
        })));
    }

    let report = WasteReport {
        id: Uuid::new_v4().to_string(),
        description: payload.description.trim().to_owned(),
        barangay: payload.barangay.trim().to_owned(),
        latitude: payload.latitude,
        longitude: payload.longitude,
        status: ReportStatus::Pending,
        reported_by: payload.reported_by,
        created_at: Utc::now(),
        updated_at: None,
    };

    let value = report.to_value().map_err(|e| {
        tracing::error!(error = %e, "failed to encode report");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    store
        .add(collections::REPORTS, Some(&report.id), value)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to store report");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    tracing::info!(id = %report.id, barangay = %report.barangay, by = %auth.email, "report filed");
    Ok(HttpResponse::Ok().json(report))
}

/* =========================
Triage report (Dispatcher/Admin)
========================= */
/// Swagger doc for update_report_status endpoint
#[utoipa::path(
    put,
    path = "/api/v1/reports/{id}/status",
    params(
        ("id" = String, Path, description = "Report id")
    ),
    request_body = UpdateReportStatus,
    responses(
        (status = 200, description = "Report status updated", body = WasteReport),
        (status = 400, description = "Report already processed", body = Object, example = json!({
            "message": "Report was already processed",
            "code": "invalid-transition"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Report not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn update_report_status(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
    payload: web::Json<UpdateReportStatus>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let id = path.into_inner();

    let next = match ReportStatus::from_str(&payload.status) {
        Ok(status) => status,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Unknown status. Allowed: pending, in-progress, resolved, dismissed"
            })));
        }
    };

    let doc = store.get(collections::REPORTS, &id).map_err(|e| {
        tracing::error!(error = %e, id = %id, "failed to fetch report");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let report = match doc.as_ref().map(WasteReport::from_document) {
        Some(Ok(report)) => report,
        Some(Err(e)) => {
            tracing::error!(error = %e, id = %id, "malformed report document");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })));
        }
        None => return Ok(validation_response(ValidationError::NotFound)),
    };

    if !report.status.can_become(next) {
        return Ok(validation_response(ValidationError::InvalidTransition));
    }

    let updated = store
        .update(
            collections::REPORTS,
            &id,
            json!({ "status": next, "updated_at": Utc::now() }),
        )
        .map_err(|e| {
            tracing::error!(error = %e, id = %id, "failed to update report");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let report = WasteReport::from_document(&updated).map_err(|e| {
        tracing::error!(error = %e, id = %id, "malformed report after update");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tracing::info!(id = %report.id, status = %report.status, by = %auth.email, "report triaged");
    Ok(HttpResponse::Ok().json(report))
}

/// Report detail endpoint
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    params(
        ("id" = String, Path, description = "Report id")
    ),
    responses(
        (status = 200, description = "Report found", body = WasteReport),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found", body = Object, example = json!({
            "message": "Report not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn get_report(
    _auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let doc = store.get(collections::REPORTS, &id).map_err(|e| {
        tracing::error!(error = %e, id = %id, "failed to fetch report");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match doc.as_ref().map(WasteReport::from_document) {
        Some(Ok(report)) => Ok(HttpResponse::Ok().json(report)),
        Some(Err(e)) => {
            tracing::error!(error = %e, id = %id, "malformed report document");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Report not found"
        }))),
    }
}

/// Report listing endpoint
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(ReportFilter),
    responses(
        (status = 200, description = "Paginated report list", body = ReportListResponse),
        (status = 400, description = "Bad filter value"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn list_reports(
    _auth: AuthUser,
    store: web::Data<MemoryStore>,
    query: web::Query<ReportFilter>,
) -> actix_web::Result<impl Responder> {
    let status = match query.status.as_deref() {
        Some(raw) => match ReportStatus::from_str(raw) {
            Ok(status) => Some(status),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Unknown status. Allowed: pending, in-progress, resolved, dismissed"
                })));
            }
        },
        None => None,
    };

    let mut reports = load_reports(store.get_ref()).map_err(|e| {
        tracing::error!(error = %e, "failed to load reports");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // newest first, matching the console's triage queue
    reports.reverse();

    reports.retain(|report| {
        status.map(|s| report.status == s).unwrap_or(true)
            && query
                .barangay
                .as_deref()
                .map(|b| report.barangay.eq_ignore_ascii_case(b))
                .unwrap_or(true)
    });

    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = reports.len();
    let data: Vec<WasteReport> = reports.into_iter().skip(offset).take(per_page).collect();

    Ok(HttpResponse::Ok().json(ReportListResponse {
        data,
        page,
        per_page,
        total,
    }))
}
