//! Persistence seams for the session core.
//!
//! The session controller only needs keyed get/put/delete with two
//! guarantees from the backend: user inserts fail atomically on a taken
//! username or email, and refresh token writes are upserts keyed by user.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{NewUser, RefreshTokenRecord, UniqueField, User};

use async_trait::async_trait;
use uuid::Uuid;

/// Errors raised by store backends
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("unique key already taken: {0:?}")]
    Conflict(Vec<UniqueField>),

    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Persisted user records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Emails compare case-insensitively; stored emails keep their casing
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert a user unless its username or email is taken.
    ///
    /// Fails with [`StoreError::Conflict`] naming the taken fields; the
    /// check and the write are a single atomic step.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
}

/// The currently valid refresh token per user
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Create or overwrite the record for `user_id`
    async fn put(&self, user_id: Uuid, token: &str) -> Result<(), StoreError>;

    async fn find(&self, user_id: Uuid) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Remove the record holding `token`; a missing record is not an error
    async fn delete_by_token(&self, token: &str) -> Result<(), StoreError>;
}
