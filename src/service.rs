//! Session Service
//!
//! Register, login, logout and refresh over the credential store, the
//! refresh token store, the password hasher and the token issuer. Results
//! are plain values; the HTTP layer turns them into cookies and status codes.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::*;
use crate::password::PasswordHasher;
use crate::store::{CredentialStore, RefreshTokenStore};
use crate::token::TokenIssuer;

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Authentication service
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        Ok(Self {
            users,
            refresh_tokens,
            hasher: PasswordHasher::new(&config)?,
            tokens: TokenIssuer::new(&config),
            config,
        })
    }

    /// Create a service whose two stores are the same backend
    pub fn with_store<S>(store: Arc<S>, config: AuthConfig) -> Result<Self, AuthError>
    where
        S: CredentialStore + RefreshTokenStore + 'static,
    {
        Self::new(store.clone(), store, config)
    }

    /// Get reference to config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Get reference to the token issuer
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    // ============================================
    // Registration
    // ============================================

    /// Register a new user and open a session for it
    pub async fn register(&self, req: RegisterRequest) -> Result<Session, AuthError> {
        req.validate()?;

        // Both keys are checked so the caller learns every taken field.
        let mut taken = Vec::new();
        if self.users.username_exists(&req.username).await? {
            taken.push(UniqueField::Username);
        }
        if self.users.email_exists(&req.email).await? {
            taken.push(UniqueField::Email);
        }
        if !taken.is_empty() {
            return Err(AuthError::Conflict(taken));
        }

        let password_hash = self.hasher.hash_blocking(req.password).await?;

        // A concurrent registration can still take a key between the check
        // above and this insert; the store reports that as a conflict.
        let user = self
            .users
            .insert(NewUser {
                username: req.username,
                email: req.email,
                name: req.name,
                password_hash,
            })
            .await?;

        let session = self.open_session(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(session)
    }

    // ============================================
    // Login / Logout
    // ============================================

    /// Authenticate a user by username and password
    pub async fn login(&self, req: LoginRequest) -> Result<Session, AuthError> {
        req.validate()?;

        let user = self
            .users
            .find_by_username(&req.username)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid username".to_string()))?;

        let matches = self
            .hasher
            .verify_blocking(req.password, user.password_hash.clone())
            .await;

        if !matches {
            tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(AuthError::Unauthorized("Invalid password".to_string()));
        }

        let session = self.open_session(&user).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(session)
    }

    /// Drop the stored refresh token matching the caller's cookie.
    ///
    /// The token is not verified. Logout always succeeds from the caller's
    /// point of view; a store failure is only logged.
    pub async fn logout(&self, refresh_token: Option<&str>) {
        let Some(token) = refresh_token else {
            return;
        };

        match self.refresh_tokens.delete_by_token(token).await {
            Ok(()) => tracing::info!("User logged out"),
            Err(e) => tracing::error!("Failed to delete refresh token on logout: {}", e),
        }
    }

    // ============================================
    // Token Refresh
    // ============================================

    /// Exchange the current refresh token for a new token pair (rotation)
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<Session, AuthError> {
        let presented = refresh_token.ok_or_else(AuthError::unauthorized)?;

        let user_id = self
            .tokens
            .verify_refresh(presented)
            .map_err(|_| AuthError::unauthorized())?;

        match self.refresh_tokens.find(user_id).await? {
            Some(current) if current.token == presented => {}
            Some(current) => {
                tracing::warn!(
                    user_id = %user_id,
                    rotated_at = %current.updated_at,
                    "Superseded refresh token presented"
                );
                return Err(AuthError::unauthorized());
            }
            None => {
                tracing::debug!(user_id = %user_id, "No refresh token on record");
                return Err(AuthError::unauthorized());
            }
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(AuthError::unauthorized)?;

        // Two refreshes racing with the same token both get here; the last
        // write wins and the other caller's new token is already stale.
        let session = self.open_session(&user).await?;

        tracing::info!(user_id = %user.id, "Session refreshed");

        Ok(session)
    }

    // ============================================
    // Access Tokens
    // ============================================

    /// Resolve the user behind an access token
    pub async fn authenticate(&self, access_token: &str) -> Result<UserResponse, AuthError> {
        let user_id = self
            .tokens
            .verify_access(access_token)
            .map_err(|_| AuthError::unauthorized())?;

        self.current_user(user_id).await
    }

    /// Get the sanitized projection of a user by ID
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(AuthError::unauthorized)
    }

    /// Issue a token pair and make its refresh token the only live one
    async fn open_session(&self, user: &User) -> Result<Session, AuthError> {
        let access_token = self.tokens.issue_access(user.id)?;
        let refresh_token = self.tokens.issue_refresh(user.id)?;

        self.refresh_tokens.put(user.id, &refresh_token).await?;

        Ok(Session {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
        })
    }
}
