//! Authentication Models
//!
//! Data structures for authentication requests, responses, and stored records.

use crate::validation::validate_password;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ============================================
// Stored Records
// ============================================

/// User record from the credential store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user about to be inserted; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// The single live refresh token of a user
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub token: String,
    pub updated_at: DateTime<Utc>,
}

/// Fields that must be unique across all users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => write!(f, "username"),
            UniqueField::Email => write!(f, "email"),
        }
    }
}

// ============================================
// Request DTOs
// ============================================

/// Registration request
///
/// `confirmPassword` is optional; when present it must equal `password`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "validate_confirmation"))]
pub struct RegisterRequest {
    #[validate(length(min = 5, max = 30, message = "Username must be 5-30 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 30, message = "Name must be 1-30 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,

    #[serde(default)]
    pub confirm_password: Option<String>,
}

fn validate_confirmation(req: &RegisterRequest) -> Result<(), ValidationError> {
    match &req.confirm_password {
        Some(confirm) if *confirm != req.password => {
            let mut err = ValidationError::new("confirm_password");
            err.message = Some("Passwords do not match".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(length(min = 5, max = 30, message = "Username must be 5-30 characters"))]
    pub username: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

// ============================================
// Response DTOs
// ============================================

/// User response (public user data without sensitive fields)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Body returned by every session endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: Option<UserResponse>,
    pub auth: bool,
}

impl AuthResponse {
    pub fn signed_in(user: UserResponse) -> Self {
        Self {
            user: Some(user),
            auth: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            auth: false,
        }
    }
}

/// Outcome of register, login and refresh: the user plus the new token pair
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

// ============================================
// JWT Claims
// ============================================

/// Which of the two token kinds a JWT is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Token kind
    pub kind: TokenKind,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience, one per token kind
    pub aud: String,
    /// JWT ID (unique identifier)
    pub jti: Uuid,
}
