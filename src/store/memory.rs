//! In-process store used by tests and local development.

use super::{CredentialStore, RefreshTokenStore, StoreError};
use crate::models::{NewUser, RefreshTokenRecord, UniqueField, User};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Both stores behind `RwLock`s; every write takes the lock for its whole
/// check-and-write so inserts and upserts are atomic.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    refresh_tokens: RwLock<HashMap<Uuid, RefreshTokenRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live refresh token records
    pub async fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.read().await.len()
    }
}

/// Emails are unique regardless of case; the stored casing is kept as given.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .any(|u| same_email(&u.email, email)))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        let mut taken = Vec::new();
        if users.values().any(|u| u.username == user.username) {
            taken.push(UniqueField::Username);
        }
        if users.values().any(|u| same_email(&u.email, &user.email)) {
            taken.push(UniqueField::Email);
        }
        if !taken.is_empty() {
            return Err(StoreError::Conflict(taken));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());

        Ok(record)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn put(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        self.refresh_tokens.write().await.insert(
            user_id,
            RefreshTokenRecord {
                user_id,
                token: token.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.refresh_tokens.read().await.get(&user_id).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> Result<(), StoreError> {
        self.refresh_tokens
            .write()
            .await
            .retain(|_, record| record.token != token);
        Ok(())
    }
}
