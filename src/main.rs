use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod docs;
mod model;
mod models;
mod roster;
mod routes;
mod store;
mod utils;
mod workflow;

use config::Config;
use roster::Roster;
use store::{DocumentStore, MemoryStore, collections};

use crate::auth::password::hash_password;
use crate::auth::session::JwtIdentity;
use crate::docs::ApiDoc;
use crate::model::role::Role;
use crate::model::user::User;
use crate::utils::email_cache;
use crate::utils::email_filter;
use chrono::Utc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

#[get("/")]
async fn index() -> impl Responder {
    "Waste Management Admin API"
}

/// First boot has no accounts; provision the configured admin once.
fn seed_admin(store: &dyn DocumentStore, config: &Config) -> anyhow::Result<()> {
    let docs = store
        .all(collections::USERS)
        .map_err(|e| anyhow::anyhow!("user scan failed: {e}"))?;

    let has_admin = docs.iter().any(|doc| {
        doc.data.get("role_id").and_then(|v| v.as_u64()) == Some(Role::Admin.id() as u64)
    });
    if has_admin {
        return Ok(());
    }

    let admin = User {
        id: Uuid::new_v4().to_string(),
        email: config.seed_admin_email.trim().to_lowercase(),
        display_name: "Administrator".to_owned(),
        password: hash_password(&config.seed_admin_password),
        role_id: Role::Admin.id(),
        is_active: true,
        created_at: Utc::now(),
        last_login_at: None,
    };

    let value = admin
        .to_value()
        .map_err(|e| anyhow::anyhow!("encode admin: {e}"))?;
    store
        .add(collections::USERS, Some(&admin.id), value)
        .map_err(|e| anyhow::anyhow!("seed admin: {e}"))?;

    info!(email = %admin.email, "seeded initial admin account");
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let roster = Roster::attach(store.as_ref());
    let identity = Data::new(JwtIdentity::new(config.clone(), Arc::clone(&store)));

    if let Err(e) = seed_admin(store.as_ref(), &config) {
        warn!(error = %e, "admin seeding failed");
    }

    let store_for_filter_warmup = Arc::clone(&store);
    let store_for_cache_warmup = Arc::clone(&store);
    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = email_filter::warmup_email_filter(&store_for_filter_warmup, 100).await {
            eprintln!("Failed to warmup email filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        // Warm up accounts seen in the last 30 days, 250 at a time
        if let Err(e) = email_cache::warmup_email_cache(&store_for_cache_warmup, 30, 250).await {
            eprintln!("Failed to warmup email cache: {:?}", e);
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::from(Arc::clone(&store)))
            .app_data(Data::from(Arc::clone(&roster)))
            .app_data(identity.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
