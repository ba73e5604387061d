use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::model::truck::Truck;
use crate::store::{DocumentStore, MemoryStore, StoreError, collections};

#[derive(Deserialize, ToSchema)]
pub struct CreateTruck {
    #[schema(example = "KDL-3491")]
    pub plate_number: String,
    #[schema(example = "Isuzu ELF", nullable = true)]
    pub model: Option<String>,
    #[schema(example = 3500, nullable = true)]
    pub capacity_kg: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTruck {
    pub plate_number: Option<String>,
    pub model: Option<String>,
    pub capacity_kg: Option<u32>,
    pub is_active: Option<bool>,
}

/// Register truck
#[utoipa::path(
    post,
    path = "/api/v1/trucks",
    request_body = CreateTruck,
    responses(
        (status = 200, description = "Truck registered", body = Truck),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Plate number already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Truck"
)]
pub async fn create_truck(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    payload: web::Json<CreateTruck>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let payload = payload.into_inner();
    let plate = payload.plate_number.trim().to_uppercase();

    if plate.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "plate_number is required"
        })));
    }

    let docs = store.all(collections::TRUCKS).map_err(|e| {
        tracing::error!(error = %e, "failed to scan trucks");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    let duplicate = docs
        .iter()
        .any(|doc| doc.data.get("plate_number").and_then(|v| v.as_str()) == Some(plate.as_str()));
    if duplicate {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Plate number already registered"
        })));
    }

    let truck = Truck {
        id: Uuid::new_v4().to_string(),
        plate_number: plate,
        model: payload.model,
        capacity_kg: payload.capacity_kg,
        is_active: true,
    };

    let value = truck.to_value().map_err(|e| {
        tracing::error!(error = %e, "failed to encode truck");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    store
        .add(collections::TRUCKS, Some(&truck.id), value)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to store truck");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    tracing::info!(id = %truck.id, plate = %truck.plate_number, "truck registered");
    Ok(HttpResponse::Ok().json(truck))
}

/// List trucks
#[utoipa::path(
    get,
    path = "/api/v1/trucks",
    responses(
        (status = 200, description = "Registered trucks", body = [Truck]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Truck"
)]
pub async fn list_trucks(
    _auth: AuthUser,
    store: web::Data<MemoryStore>,
) -> actix_web::Result<impl Responder> {
    let trucks: Vec<Truck> = store
        .all(collections::TRUCKS)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to load trucks");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .iter()
        .filter_map(|doc| match Truck::from_document(doc) {
            Ok(truck) => Some(truck),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "skipping malformed truck document");
                None
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(trucks))
}

/// Update truck
#[utoipa::path(
    put,
    path = "/api/v1/trucks/{id}",
    params(
        ("id" = String, Path, description = "Truck id")
    ),
    request_body = UpdateTruck,
    responses(
        (status = 200, description = "Truck updated", body = Truck),
        (status = 400, description = "No fields provided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Truck not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Truck"
)]
pub async fn update_truck(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
    payload: web::Json<UpdateTruck>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let id = path.into_inner();
    let payload = payload.into_inner();

    let mut patch = Map::new();
    if let Some(plate) = payload.plate_number {
        patch.insert(
            "plate_number".into(),
            Value::String(plate.trim().to_uppercase()),
        );
    }
    if let Some(model) = payload.model {
        patch.insert("model".into(), Value::String(model));
    }
    if let Some(capacity) = payload.capacity_kg {
        patch.insert("capacity_kg".into(), json!(capacity));
    }
    if let Some(active) = payload.is_active {
        patch.insert("is_active".into(), Value::Bool(active));
    }

    if patch.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No fields provided for update"
        })));
    }

    match store.update(collections::TRUCKS, &id, Value::Object(patch)) {
        Ok(doc) => match Truck::from_document(&doc) {
            Ok(truck) => Ok(HttpResponse::Ok().json(truck)),
            Err(e) => {
                tracing::error!(error = %e, id = %id, "malformed truck after update");
                Ok(HttpResponse::InternalServerError().json(json!({
                    "message": "Internal Server Error"
                })))
            }
        },
        Err(StoreError::NotFound { .. }) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Truck not found"
        }))),
        Err(e) => {
            tracing::error!(error = %e, id = %id, "failed to update truck");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Retire truck
#[utoipa::path(
    delete,
    path = "/api/v1/trucks/{id}",
    params(
        ("id" = String, Path, description = "Truck id")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Truck not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Truck"
)]
pub async fn delete_truck(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_dispatcher_or_admin()?;

    let id = path.into_inner();

    match store.delete(collections::TRUCKS, &id) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully deleted"
        }))),
        Err(StoreError::NotFound { .. }) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Truck not found"
        }))),
        Err(e) => {
            tracing::error!(error = %e, id = %id, "failed to delete truck");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
