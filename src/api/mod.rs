use actix_web::HttpResponse;
use serde_json::json;
use tracing::error;

use crate::workflow::{ValidationError, WorkflowError};

pub mod attendance;
pub mod report;
pub mod schedule;
pub mod truck;
pub mod user;

/// Inline form errors carry a stable machine code next to the message.
pub fn validation_response(err: ValidationError) -> HttpResponse {
    let body = json!({
        "message": err.message(),
        "code": err.to_string(),
    });

    match err {
        ValidationError::NotFound => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Validation goes back to the form; collaborator trouble becomes a
/// transient retry notice.
pub fn workflow_response(err: WorkflowError) -> HttpResponse {
    match err {
        WorkflowError::Validation(e) => validation_response(e),
        WorkflowError::Collaborator(e) => {
            error!(error = %e, "storage collaborator failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "message": "Storage backend unavailable, retry shortly"
            }))
        }
    }
}
