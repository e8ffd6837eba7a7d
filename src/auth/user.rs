use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use async_session::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tokio::task;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::entities::{password, prelude::*};

/// The single administrator identity.
pub const ADMIN_USERNAME: &str = "admin";

impl AuthUser for password::Model {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Changing the password invalidates existing admin sessions.
    fn session_auth_hash(&self) -> &[u8] {
        self.hash.as_bytes()
    }
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub password: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Seaorm(#[from] sea_orm::DbErr),

    #[error(transparent)]
    TaskJoin(#[from] task::JoinError),

    #[error("Password hashing failed: {0}")]
    Hash(password_hash::Error),
}

#[derive(Debug, Clone)]
pub struct Backend {
    db: DatabaseConnection,
}

impl Backend {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = password::Model;
    type Credentials = Credentials;
    type Error = BackendError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let Some(admin) = Password::find()
            .filter(password::Column::Username.eq(ADMIN_USERNAME))
            .one(&self.db)
            .await?
        else {
            warn!("Admin login attempted before a password was set");
            return Ok(None);
        };

        // Argon2 verification blocks the thread.
        let hash = admin.hash.clone();
        let matches =
            task::spawn_blocking(move || verify_password(&creds.password, &hash)).await?;

        Ok(matches.then_some(admin))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok(Password::find_by_id(*user_id).one(&self.db).await?)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;

pub fn hash_password(plain: &str) -> Result<String, BackendError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(BackendError::Hash)?;
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(BackendError::Hash)?;
    Ok(hash.to_string())
}

fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored admin hash is not a valid PHC string: {e}");
            false
        }
    }
}

/// Stores a hash of `plain` for the admin unless one already exists.
/// Returns whether a new hash was written.
pub async fn seed_admin(db: &DatabaseConnection, plain: &str) -> Result<bool, BackendError> {
    let existing = Password::find()
        .filter(password::Column::Username.eq(ADMIN_USERNAME))
        .one(db)
        .await?;
    if existing.is_some() {
        debug!("Admin password already set");
        return Ok(false);
    }

    let plain = plain.to_string();
    let hash = task::spawn_blocking(move || hash_password(&plain)).await??;
    password::ActiveModel {
        username: Set(ADMIN_USERNAME.to_string()),
        hash: Set(hash),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Seeded admin password");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::test_db;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not a hash"));
    }

    #[tokio::test]
    async fn test_authenticate_checks_seeded_password() {
        let db = test_db().await;
        let backend = Backend::new(db.clone());
        let attempt = |password: &str| Credentials {
            password: password.to_string(),
        };

        assert!(backend.authenticate(attempt("secret")).await.expect("auth").is_none());

        assert!(seed_admin(&db, "secret").await.expect("seed"));
        assert!(!seed_admin(&db, "other").await.expect("seed again"));

        let admin = backend
            .authenticate(attempt("secret"))
            .await
            .expect("auth")
            .expect("admin");
        assert_eq!(admin.username, ADMIN_USERNAME);
        assert!(backend.authenticate(attempt("other")).await.expect("auth").is_none());
        assert_eq!(
            backend.get_user(&admin.id).await.expect("get").map(|u| u.id),
            Some(admin.id)
        );
    }
}
