use std::sync::Arc;

use chrono::Utc;
use derive_more::Display;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, verify_token};
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::model::user::User;
use crate::models::{Claims, TokenType};
use crate::store::{DocumentStore, MemoryStore, StoreError, collections};

#[derive(Debug, Serialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub role_id: u8,
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display(fmt = "invalid credentials")]
    InvalidCredentials,
    #[display(fmt = "account is disabled")]
    Disabled,
    #[display(fmt = "identity backend unavailable")]
    Backend,
}

impl std::error::Error for AuthError {}

/// The session operations the console consumes from the identity
/// collaborator. One create signature; callers never probe for alternate
/// forms of it.
pub trait IdentityProvider: Send + Sync {
    fn create_session(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn current_session(&self, token: &str) -> Option<Claims>;
    fn delete_session(&self, refresh_token: &str) -> Result<(), AuthError>;
}

/// JWT-backed identity over the user directory, with refresh-token
/// records kept in the sessions collection for revocation.
pub struct JwtIdentity {
    config: Config,
    store: Arc<MemoryStore>,
}

impl JwtIdentity {
    pub fn new(config: Config, store: Arc<MemoryStore>) -> Self {
        Self { config, store }
    }

    fn find_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        let docs = self.store.all(collections::USERS)?;
        for doc in docs {
            match User::from_document(&doc) {
                Ok(user) if user.email.eq_ignore_ascii_case(email) => return Ok(Some(user)),
                Ok(_) => {}
                Err(e) => warn!(id = %doc.id, error = %e, "skipping malformed user document"),
            }
        }
        Ok(None)
    }

    fn persist_refresh(&self, claims: &Claims) -> Result<(), StoreError> {
        self.store.add(
            collections::SESSIONS,
            Some(&claims.jti),
            json!({
                "user_id": claims.user_id,
                "jti": claims.jti,
                "expires_at": claims.exp,
                "revoked": false,
            }),
        )?;
        Ok(())
    }

    fn mint(&self, user_id: &str, email: &str, role_id: u8) -> Result<Session, AuthError> {
        let access_token = generate_access_token(
            user_id,
            email,
            role_id,
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        );
        let (refresh_token, refresh_claims) = generate_refresh_token(
            user_id,
            email,
            role_id,
            &self.config.jwt_secret,
            self.config.refresh_token_ttl,
        );

        self.persist_refresh(&refresh_claims).map_err(|e| {
            error!(error = %e, "failed to store refresh token");
            AuthError::Backend
        })?;

        Ok(Session {
            access_token,
            refresh_token,
            user_id: user_id.to_owned(),
            role_id,
        })
    }

    /// Rotate a refresh token: revoke the presented jti, mint a new pair.
    pub fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let claims = verify_token(refresh_token, &self.config.jwt_secret)
            .map_err(|_| AuthError::InvalidCredentials)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidCredentials);
        }

        let record = self
            .store
            .get(collections::SESSIONS, &claims.jti)
            .map_err(|e| {
                error!(error = %e, "session lookup failed");
                AuthError::Backend
            })?;

        let live = record
            .map(|doc| doc.data.get("revoked").and_then(|v| v.as_bool()) == Some(false))
            .unwrap_or(false);
        if !live {
            return Err(AuthError::InvalidCredentials);
        }

        self.store
            .update(collections::SESSIONS, &claims.jti, json!({ "revoked": true }))
            .map_err(|e| {
                error!(error = %e, "failed to revoke refresh token");
                AuthError::Backend
            })?;

        self.mint(&claims.user_id, &claims.sub, claims.role)
    }
}

impl IdentityProvider for JwtIdentity {
    fn create_session(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self
            .find_user(email)
            .map_err(|e| {
                error!(error = %e, "user lookup failed");
                AuthError::Backend
            })?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::Disabled);
        }

        if verify_password(password, &user.password).is_err() {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.mint(&user.id, &user.email, user.role_id)?;

        // Non-fatal bookkeeping; the login proceeds either way.
        if let Err(e) = self.store.update(
            collections::USERS,
            &user.id,
            json!({ "last_login_at": Utc::now() }),
        ) {
            error!(error = %e, "failed to update last_login_at");
        }

        info!(user_id = %session.user_id, "session created");
        Ok(session)
    }

    fn current_session(&self, token: &str) -> Option<Claims> {
        let claims = verify_token(token, &self.config.jwt_secret).ok()?;
        if claims.token_type != TokenType::Access {
            return None;
        }
        Some(claims)
    }

    fn delete_session(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = verify_token(refresh_token, &self.config.jwt_secret)
            .map_err(|_| AuthError::InvalidCredentials)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidCredentials);
        }

        // Idempotent: revoking an unknown jti is a no-op.
        let _ = self
            .store
            .update(collections::SESSIONS, &claims.jti, json!({ "revoked": true }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use uuid::Uuid;

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

    fn seeded_identity(password: &str, active: bool) -> JwtIdentity {
        let store = Arc::new(MemoryStore::new());
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: "dispatch@wma.local".into(),
            display_name: "Dispatch".into(),
            password: hash_password(password),
            role_id: 2,
            is_active: active,
            created_at: Utc::now(),
            last_login_at: None,
        };
        store
            .add(collections::USERS, Some(&user.id), user.to_value().unwrap())
            .unwrap();
        JwtIdentity::new(test_config(), store)
    }

    #[test]
    fn create_session_with_good_credentials() {
        let identity = seeded_identity("hakot-basura", true);

        let session = identity
            .create_session("dispatch@wma.local", "hakot-basura")
            .unwrap();
        assert_eq!(session.role_id, 2);

        let claims = identity.current_session(&session.access_token).unwrap();
        assert_eq!(claims.sub, "dispatch@wma.local");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let identity = seeded_identity("hakot-basura", true);

        assert!(matches!(
            identity.create_session("dispatch@wma.local", "guess"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn disabled_accounts_cannot_sign_in() {
        let identity = seeded_identity("hakot-basura", false);

        assert!(matches!(
            identity.create_session("dispatch@wma.local", "hakot-basura"),
            Err(AuthError::Disabled)
        ));
    }

    #[test]
    fn refresh_rotation_revokes_the_old_token() {
        let identity = seeded_identity("hakot-basura", true);
        let session = identity
            .create_session("dispatch@wma.local", "hakot-basura")
            .unwrap();

        let rotated = identity.refresh_session(&session.refresh_token).unwrap();
        assert_eq!(rotated.user_id, session.user_id);

        // the first refresh token is spent
        assert!(matches!(
            identity.refresh_session(&session.refresh_token),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn refresh_rejects_access_tokens() {
        let identity = seeded_identity("hakot-basura", true);
        let session = identity
            .create_session("dispatch@wma.local", "hakot-basura")
            .unwrap();

        assert!(matches!(
            identity.refresh_session(&session.access_token),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
