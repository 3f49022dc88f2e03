//! Account registration, login and bearer tokens.
//!
//! Credential handling is delegated to `argon2` and token signing to
//! `jsonwebtoken`; this module only wires them to the user table.

mod password;
mod token;

pub use token::{Claims, TokenIssuer};

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::storage::models::UserRecord;
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: Option<String>,
    pub college: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    tokens: TokenIssuer,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(db: Database, tokens: TokenIssuer, store_timeout: Duration) -> Self {
        Self {
            db,
            tokens,
            store_timeout,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn register(&self, registration: Registration) -> Result<UserRecord, AuthError> {
        let email = registration.email.trim().to_string();
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if registration.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let plaintext = registration.password;
        let password_hash = self
            .blocking(move || password::hash_password(&plaintext))
            .await??;

        let user = UserRecord {
            id: uuid::Uuid::now_v7().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
            name: registration.name,
            college: registration.college,
            phone: registration.phone,
        };

        let record = user.clone();
        let created = self
            .db
            .write_within(self.store_timeout, move |db, gate| {
                db.create_user_with(&record, gate)
            })
            .await
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))?;
        if !created {
            return Err(AuthError::EmailTaken);
        }

        tracing::info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    pub async fn login(&self, email: &str, plaintext: &str) -> Result<LoginOutcome, AuthError> {
        let db = self.db.clone();
        let lookup = email.trim().to_string();
        let user = self
            .blocking(move || db.get_user_by_email(&lookup))
            .await?
            .map_err(storage_error)?
            .ok_or(AuthError::InvalidCredentials)?;

        let candidate = plaintext.to_string();
        let hash = user.password_hash.clone();
        let matches = self
            .blocking(move || password::verify_password(&candidate, &hash))
            .await??;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id, &user.email)?;
        tracing::debug!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            token,
            user_id: user.id,
        })
    }

    /// Run CPU- or IO-bound work off the runtime, bounded by the store timeout.
    async fn blocking<T, F>(&self, op: F) -> Result<T, AuthError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(self.store_timeout, tokio::task::spawn_blocking(op)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AuthError::Internal(format!("auth task failed: {e}"))),
            Err(_) => Err(AuthError::StorageUnavailable(format!(
                "no response within {}ms",
                self.store_timeout.as_millis()
            ))),
        }
    }
}

fn storage_error(e: DatabaseError) -> AuthError {
    AuthError::StorageUnavailable(e.to_string())
}
