use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, get, web};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::auth::session::{AuthError, IdentityProvider, JwtIdentity};
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::{LoginReqDto, UserReq};
use crate::store::{DocumentStore, MemoryStore, StoreError, collections};
use crate::utils::email_cache;
use crate::utils::email_filter;

// auth end points

/// Inserts a new console account and keeps the availability caches warm
pub async fn insert_user(req: &UserReq, store: &dyn DocumentStore) -> Result<User, HttpResponse> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: req.email.trim().to_lowercase(),
        display_name: req.display_name.trim().to_owned(),
        password: hash_password(&req.password),
        role_id: req.role_id,
        is_active: true,
        created_at: Utc::now(),
        last_login_at: None,
    };

    let value = user.to_value().map_err(|e| {
        tracing::error!(error = %e, "failed to encode user document");
        HttpResponse::InternalServerError().json(json!({
            "error": "Failed to register user"
        }))
    })?;

    match store.add(collections::USERS, Some(&user.id), value) {
        Ok(_) => {
            // keep the filter and cache in step with the directory
            email_filter::insert(&user.email);
            email_cache::mark_taken(&user.email).await;
            Ok(user)
        }
        Err(StoreError::Conflict { .. }) => Err(HttpResponse::Conflict().json(json!({
            "error": "Email already registered"
        }))),
        Err(e) => {
            tracing::error!(error = %e, "failed to store user");
            Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })))
        }
    }
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, store: &dyn DocumentStore) -> bool {
    let email = email.to_lowercase();

    // 1. Cuckoo filter — fast negative
    // if the filter says not seen, the email cannot be registered
    if !email_filter::might_exist(&email) {
        return true;
    }

    // 2. Moka cache — fast positive
    if email_cache::is_taken(&email).await {
        return false;
    }

    // 3. Directory fallback
    let taken = store
        .all(collections::USERS)
        .map(|docs| {
            docs.iter()
                .any(|doc| doc.data.get("email").and_then(|v| v.as_str()) == Some(email.as_str()))
        })
        .unwrap_or(true); // fail-safe

    !taken
}

/// Account registration handler
pub async fn register(user: web::Json<UserReq>, store: web::Data<MemoryStore>) -> impl Responder {
    let email = user.email.trim();

    if email.is_empty() || user.password.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Email and password must not be empty"
        }));
    }

    if Role::from_id(user.role_id).is_none() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Unknown role"
        }));
    }

    if !is_email_available(email, store.get_ref()).await {
        return HttpResponse::Conflict().json(json!({
            "error": "Email already registered"
        }));
    }

    // Safe to insert after the directory check
    match insert_user(&user, store.get_ref()).await {
        Ok(_) => HttpResponse::Created().json(json!({
            "message": "User registered successfully"
        })),
        Err(err_resp) => err_resp,
    }
}

#[instrument(name = "auth_login", skip(identity, user), fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    identity: web::Data<JwtIdentity>,
) -> impl Responder {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().body("Email or password required");
    }

    match identity.create_session(user.email.trim(), &user.password) {
        Ok(session) => {
            info!("Login successful");
            HttpResponse::Ok().json(session)
        }
        Err(AuthError::Disabled) => HttpResponse::Forbidden().json(json!({
            "error": "Account is disabled"
        })),
        Err(AuthError::InvalidCredentials) => {
            info!("Invalid credentials");
            HttpResponse::Unauthorized().body("Invalid credentials")
        }
        Err(AuthError::Backend) => HttpResponse::InternalServerError().finish(),
    }
}

#[get("/protected")]
pub async fn protected(req: HttpRequest) -> impl Responder {
    match req.extensions().get::<AuthUser>() {
        Some(user) => HttpResponse::Ok().body(user.email.clone()),
        None => HttpResponse::Unauthorized().body("No user"),
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

pub async fn refresh_token(req: HttpRequest, identity: web::Data<JwtIdentity>) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    match identity.refresh_session(token) {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(AuthError::Backend) => HttpResponse::InternalServerError().finish(),
        Err(_) => HttpResponse::Unauthorized().finish(),
    }
}

/// Current-session probe used by the console on page load
pub async fn session(req: HttpRequest, identity: web::Data<JwtIdentity>) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().finish(),
    };

    match identity.current_session(token) {
        Some(claims) => HttpResponse::Ok().json(json!({
            "user_id": claims.user_id,
            "email": claims.sub,
            "role_id": claims.role,
        })),
        None => HttpResponse::Unauthorized().finish(),
    }
}

pub async fn logout(req: HttpRequest, identity: web::Data<JwtIdentity>) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    // success even if the token was unknown or already revoked
    let _ = identity.delete_session(token);
    HttpResponse::NoContent().finish()
}
