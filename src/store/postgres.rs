//! PostgreSQL-backed stores.

use super::{CredentialStore, RefreshTokenStore, StoreError};
use crate::models::{NewUser, RefreshTokenRecord, UniqueField, User};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";
const USERNAME_KEY: &str = "users_username_key";
const EMAIL_KEY: &str = "users_email_lower_key";

/// Credential and refresh token store over a shared pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get reference to the database pool
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    /// Create the authentication tables if they do not exist
    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("Running authentication database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                username VARCHAR(30) NOT NULL,
                email VARCHAR(255) NOT NULL,
                name VARCHAR(30) NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT users_username_key UNIQUE (username)
            );
            "#,
        )
        .execute(&self.db)
        .await?;

        // Emails are unique regardless of case but stored as given.
        sqlx::query("ALTER TABLE users DROP CONSTRAINT IF EXISTS users_email_key;")
            .execute(&self.db)
            .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_key ON users (LOWER(email));",
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                token TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_refresh_tokens_token ON refresh_tokens(token);")
            .execute(&self.db)
            .await?;

        tracing::info!("Authentication migrations completed successfully");
        Ok(())
    }

    async fn taken_fields(&self, user: &NewUser) -> Result<Vec<UniqueField>, StoreError> {
        let mut taken = Vec::new();
        if self.username_exists(&user.username).await? {
            taken.push(UniqueField::Username);
        }
        if self.email_exists(&user.email).await? {
            taken.push(UniqueField::Email);
        }
        Ok(taken)
    }
}

/// The user field behind a unique constraint, if it guards one
fn constraint_field(constraint: &str) -> Option<UniqueField> {
    match constraint {
        USERNAME_KEY => Some(UniqueField::Username),
        EMAIL_KEY => Some(UniqueField::Email),
        _ => None,
    }
}

fn unique_violation(err: &sqlx::Error) -> Option<UniqueField> {
    let db_err = err.as_database_error()?;
    if db_err.code().as_deref() != Some(UNIQUE_VIOLATION) {
        return None;
    }

    db_err.constraint().and_then(constraint_field)
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.db)
                .await?;
        Ok(exists.0)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(exists.0)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(err) => match unique_violation(&err) {
                Some(field) => {
                    // The constraint error names one key; report every key
                    // that is taken now, falling back to the one reported.
                    let mut taken = self.taken_fields(&user).await?;
                    if taken.is_empty() {
                        taken.push(field);
                    }
                    Err(StoreError::Conflict(taken))
                }
                None => Err(err.into()),
            },
        }
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn put(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                token = EXCLUDED.token,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT user_id, token, updated_at FROM refresh_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }

    async fn delete_by_token(&self, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("No refresh token record matched on delete");
        }

        Ok(())
    }
}
