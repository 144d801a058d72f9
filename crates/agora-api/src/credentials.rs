use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::info;

use agora_db::Database;
use agora_types::models::{User, UserId};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("user not found")]
    NoUser,

    #[error("invalid password")]
    BadPassword,

    #[error("username already exists: {0}")]
    UsernameTaken(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("store error: {0}")]
    Store(#[from] agora_db::Error),
}

/// User accounts. Passwords are stored as salted Argon2id hashes and
/// verified on `authorize`.
pub struct CredentialStore {
    db: Arc<Database>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn authorize(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let row = self
            .db
            .get_user_by_username(username)?
            .ok_or(CredentialError::NoUser)?;

        let parsed_hash =
            PasswordHash::new(&row.password).map_err(|e| CredentialError::Hash(e.to_string()))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| CredentialError::BadPassword)?;

        Ok(User {
            id: row.id,
            username: row.username,
        })
    }

    pub fn register(&self, username: &str, password: &str) -> Result<UserId, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?
            .to_string();

        let id = self
            .db
            .create_user(username, &password_hash)
            .map_err(|e| {
                if e.is_unique_violation() {
                    CredentialError::UsernameTaken(username.to_string())
                } else {
                    CredentialError::Store(e)
                }
            })?;

        info!("Registered user {} ({})", username, id);
        Ok(id)
    }

    pub fn get_by_id(&self, id: UserId) -> Result<User, CredentialError> {
        let row = self.db.get_user_by_id(id)?.ok_or(CredentialError::NoUser)?;
        Ok(User {
            id: row.id,
            username: row.username,
        })
    }
}
