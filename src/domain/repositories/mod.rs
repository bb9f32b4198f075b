use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{NewUser, UserRecord};

/// Errors surfaced by a user store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Username already taken: {username}")]
    DuplicateUsername { username: String },

    #[error("User store unavailable: {message}")]
    Unavailable { message: String },
}

/// Seam to the account side of the external persistence layer.
///
/// The full HR entity model (employees, attendance, advances, loans,
/// designations) is owned by a separate persistence service. The
/// authentication pipeline only needs credential verification and account
/// lookup, so that is all this trait exposes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find an account by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Create a new account. Fails when the username is taken.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Check a username/password pair, returning the account on a match.
    ///
    /// Returns `Ok(None)` both for unknown usernames and wrong passwords so
    /// callers never learn which of the two failed.
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError>;
}

/// In-memory user store keyed by username.
///
/// Passwords are stored as hex-encoded SHA-256 digests salted with the
/// username. Adequate for the in-process store backing tests and local runs;
/// production deployments substitute the external persistence layer behind
/// the same trait.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_password(username: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(username.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            password_hash: Self::hash_password(&user.username, &user.password),
            roles: user.roles,
        };

        use dashmap::mapref::entry::Entry;

        match self.users.entry(user.username) {
            Entry::Occupied(entry) => {
                Err(StoreError::DuplicateUsername { username: entry.key().clone() })
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let candidate = Self::hash_password(username, password);
        Ok(self
            .users
            .get(username)
            .filter(|entry| entry.password_hash == candidate)
            .map(|entry| entry.value().clone()))
    }
}
