use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::handlers::{insert_user, is_email_available};
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::UserReq;
use crate::store::{DocumentStore, MemoryStore, StoreError, collections};
use crate::utils::email_cache;
use crate::utils::email_filter;
use crate::utils::patch::build_document_patch;

/// Fields an admin may patch on an account
const UPDATABLE_FIELDS: &[&str] = &["email", "display_name", "password", "role_id", "is_active"];

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "dispatch@wma.local", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "Ana Dela Cruz")]
    pub display_name: String,
    pub password: String,
    /// 1 = admin, 2 = dispatcher, 3 = crew
    #[schema(example = 2)]
    pub role_id: u8,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Filter by role id
    #[schema(example = 3)]
    pub role_id: Option<u8>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    /// Search by name or email
    #[schema(example = "ana")]
    pub search: Option<String>,
    #[schema(example = 1)]
    pub page: Option<usize>,
    #[schema(example = 20)]
    pub per_page: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    #[schema(example = "dispatch@wma.local")]
    pub email: String,
    #[schema(example = "Ana Dela Cruz")]
    pub display_name: String,
    #[schema(example = 2)]
    pub role_id: u8,
    pub is_active: bool,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>, nullable = true)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        // the password hash stays out of every response
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role_id: user.role_id,
            is_active: user.is_active,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    #[schema(example = 1)]
    pub page: usize,
    #[schema(example = 20)]
    pub per_page: usize,
    #[schema(example = 1)]
    pub total: usize,
}

fn load_users(store: &MemoryStore) -> Result<Vec<User>, StoreError> {
    Ok(store
        .all(collections::USERS)?
        .iter()
        .filter_map(|doc| match User::from_document(doc) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "skipping malformed user document");
                None
            }
        })
        .collect())
}

/// Create account (Admin)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUser,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let email = payload.email.trim();

    if email.is_empty() || payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Email and password must not be empty"
        })));
    }
    if Role::from_id(payload.role_id).is_none() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Unknown role"
        })));
    }
    if !is_email_available(email, store.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Email already registered"
        })));
    }

    let req = UserReq {
        email: email.to_owned(),
        display_name: payload.display_name,
        password: payload.password,
        role_id: payload.role_id,
    };

    match insert_user(&req, store.get_ref()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(UserResponse::from(user))),
        Err(err_resp) => Ok(err_resp),
    }
}

// -------------------- Handler --------------------

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated account list", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut users = load_users(store.get_ref()).map_err(|e| {
        tracing::error!(error = %e, "failed to load users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // newest account first
    users.reverse();

    let search = query.search.as_deref().map(str::to_lowercase);
    users.retain(|user| {
        query.role_id.map(|r| user.role_id == r).unwrap_or(true)
            && query
                .is_active
                .map(|active| user.is_active == active)
                .unwrap_or(true)
            && search
                .as_deref()
                .map(|needle| {
                    user.email.to_lowercase().contains(needle)
                        || user.display_name.to_lowercase().contains(needle)
                })
                .unwrap_or(true)
    });

    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = users.len();
    let data: Vec<UserResponse> = users
        .into_iter()
        .skip(offset)
        .take(per_page)
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(UserListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Get account by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "Account id")
    ),
    responses(
        (status = 200, description = "Account found", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found", body = Object, example = json!({
            "message": "Account not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let doc = store.get(collections::USERS, &id).map_err(|e| {
        tracing::error!(error = %e, id = %id, "failed to fetch account");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match doc.as_ref().map(User::from_document) {
        Some(Ok(user)) => Ok(HttpResponse::Ok().json(UserResponse::from(user))),
        Some(Err(e)) => {
            tracing::error!(error = %e, id = %id, "malformed user document");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Account not found"
        }))),
    }
}

/// Update account (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "Account id")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let mut patch = build_document_patch(&body, UPDATABLE_FIELDS)?;

    if let Some(role) = patch.get("role_id") {
        let valid = role
            .as_u64()
            .and_then(|r| u8::try_from(r).ok())
            .and_then(Role::from_id)
            .is_some();
        if !valid {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Unknown role"
            })));
        }
    }

    // a changed email must still be unique across the directory
    let new_email = patch
        .get("email")
        .and_then(|v| v.as_str())
        .map(|e| e.trim().to_lowercase());
    if let Some(email) = &new_email {
        if email.is_empty() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "email must not be empty"
            })));
        }

        let current = store
            .get(collections::USERS, &id)
            .ok()
            .flatten()
            .and_then(|doc| {
                doc.data
                    .get("email")
                    .and_then(|v| v.as_str())
                    .map(str::to_owned)
            });

        if current.as_deref() != Some(email.as_str())
            && !is_email_available(email, store.get_ref()).await
        {
            return Ok(HttpResponse::Conflict().json(json!({
                "message": "Email already registered"
            })));
        }

        patch["email"] = Value::String(email.clone());
    }

    match store.update(collections::USERS, &id, patch) {
        Ok(doc) => {
            if let Some(email) = &new_email {
                email_filter::insert(email);
                email_cache::mark_taken(email).await;
            }

            match User::from_document(&doc) {
                Ok(user) => Ok(HttpResponse::Ok().json(UserResponse::from(user))),
                Err(e) => {
                    tracing::error!(error = %e, id = %id, "malformed user after update");
                    Ok(HttpResponse::InternalServerError().json(json!({
                        "message": "Internal Server Error"
                    })))
                }
            }
        }
        Err(StoreError::NotFound { .. }) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Account not found"
        }))),
        Err(e) => {
            tracing::error!(error = %e, id = %id, "failed to update account");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Delete account (Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "Account id")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 400, description = "Cannot delete own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn delete_user(
    auth: AuthUser,
    store: web::Data<MemoryStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    if id == auth.user_id {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot delete your own account"
        })));
    }

    match store.delete(collections::USERS, &id) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully deleted"
        }))),
        Err(StoreError::NotFound { .. }) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Account not found"
        }))),
        Err(e) => {
            tracing::error!(error = %e, id = %id, "failed to delete account");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
