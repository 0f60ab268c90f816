//! Blog Authentication
//!
//! Account and session lifecycle for the blog platform:
//! - User registration and login
//! - JWT access and refresh tokens delivered as HTTP-only cookies
//! - Argon2id password hashing
//! - Refresh token rotation with one live session per account
//! - Logout and an access-token guard for protected routes
//!
//! # Configuration
//!
//! All configuration is loaded from environment variables:
//! - `JWT_SECRET` - Secret key for signing JWTs (required, min 32 chars)
//! - `JWT_ACCESS_EXPIRATION` - Access token lifetime in seconds (default: 1800)
//! - `JWT_REFRESH_EXPIRATION` - Refresh token lifetime in seconds (default: 3600)
//! - `JWT_ISSUER` - JWT issuer claim (default: "blog-auth")
//! - `COOKIE_SECURE` - Mark session cookies `Secure` (default: false)
//! - `DATABASE_URL` - PostgreSQL connection string (required by the server)
//!
//! # Usage
//!
//! ```rust,ignore
//! use blog_auth::{build_app, AuthConfig, AuthService, PgStore};
//!
//! let store = Arc::new(PgStore::new(pool));
//! store.migrate().await?;
//!
//! let service = AuthService::with_store(store, AuthConfig::from_env()?)?;
//! let app = build_app(Arc::new(service));
//! ```

pub mod config;
pub mod cookies;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;
pub mod validation;

// Re-export commonly used types
pub use config::{AuthConfig, ServerConfig};
pub use error::AuthError;
pub use extractors::{AuthUser, ClientInfo, RefreshCookie};
pub use handlers::AuthState;
pub use models::*;
pub use password::PasswordHasher;
pub use service::AuthService;
pub use store::{CredentialStore, MemoryStore, PgStore, RefreshTokenStore, StoreError};
pub use token::TokenIssuer;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create authentication routes
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    handlers::create_routes(auth_service)
}

/// Authentication routes with request tracing, ready to serve
pub fn build_app(auth_service: Arc<AuthService>) -> Router {
    create_routes(auth_service).layer(TraceLayer::new_for_http())
}
