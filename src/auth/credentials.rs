/// Credential Verification
///
/// Checks a username/password pair against an identity store and returns
/// the identity to embed in a token. Passwords are stored as bcrypt hashes.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use lazy_static::lazy_static;
use sqlx::PgPool;

use crate::auth::password::{hash_password_with_cost, verify_password};
use crate::error::AppError;

const UNKNOWN_USER_PASSWORD: &str = "unknown-user-placeholder";

lazy_static! {
    // Unknown usernames are checked against this so they cost a full bcrypt verify.
    static ref UNKNOWN_USER_HASH: Option<String> =
        bcrypt::hash(UNKNOWN_USER_PASSWORD, bcrypt::DEFAULT_COST).ok();
}

fn verify_against_placeholder(password: &str, placeholder: Option<&str>) {
    if let Some(hash) = placeholder {
        let _ = verify_password(password, hash);
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `Ok(Some(identity))` when the credentials match an active account,
    /// `Ok(None)` when they do not.
    ///
    /// # Errors
    /// Returns error if the identity store cannot be queried
    async fn verify(&self, username: &str, password: &str) -> Result<Option<String>, AppError>;
}

/// Postgres-backed identity store
///
/// Expects `users(username TEXT PRIMARY KEY, password_hash TEXT NOT NULL,
/// is_active BOOLEAN NOT NULL)`; see `migrations/`.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialVerifier for PgCredentialStore {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<String>, AppError> {
        let user = sqlx::query_as::<_, (String, String, bool)>(
            "SELECT username, password_hash, is_active FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let (username, password_hash, is_active) = match user {
            Some(row) => row,
            None => {
                verify_against_placeholder(password, UNKNOWN_USER_HASH.as_deref());
                tracing::info!("Login attempt for unknown user");
                return Ok(None);
            }
        };

        let matches = verify_password(password, &password_hash)?;

        if !is_active {
            tracing::warn!(username = %username, "Login attempt for inactive account");
            return Ok(None);
        }

        Ok(matches.then_some(username))
    }
}

/// In-process identity store for tests and local demos
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, String>>,
    cost: u32,
    unknown_user_hash: Option<String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    pub fn with_cost(cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            cost,
            unknown_user_hash: bcrypt::hash(UNKNOWN_USER_PASSWORD, cost).ok(),
        }
    }

    /// Register or replace a user
    ///
    /// # Errors
    /// Returns error if the password fails strength validation
    pub fn add_user(&self, username: &str, password: &str) -> Result<(), AppError> {
        let password_hash = hash_password_with_cost(password, self.cost)?;
        self.users
            .write()
            .map_err(|_| AppError::Internal("credential store lock poisoned".to_string()))?
            .insert(username.to_string(), password_hash);
        Ok(())
    }

    pub fn remove_user(&self, username: &str) -> bool {
        self.users
            .write()
            .map(|mut users| users.remove(username).is_some())
            .unwrap_or(false)
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryCredentialStore {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<String>, AppError> {
        let password_hash = {
            let users = self
                .users
                .read()
                .map_err(|_| AppError::Internal("credential store lock poisoned".to_string()))?;
            users.get(username).cloned()
        };

        let password_hash = match password_hash {
            Some(hash) => hash,
            None => {
                verify_against_placeholder(password, self.unknown_user_hash.as_deref());
                return Ok(None);
            }
        };

        if verify_password(password, &password_hash)? {
            Ok(Some(username.to_string()))
        } else {
            Ok(None)
        }
    }
}
