//! Authentication Configuration
//!
//! All configuration values are loaded from environment variables.
//! No hardcoded secrets or sensitive data.

use crate::error::AuthError;
use std::env;
use std::str::FromStr;

/// Longest accepted token lifetime, in seconds (30 days)
pub const MAX_TOKEN_LIFETIME: i64 = 30 * 24 * 60 * 60;

/// Authentication configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing tokens (from JWT_SECRET env var)
    pub jwt_secret: String,

    /// Access token lifetime in seconds (from JWT_ACCESS_EXPIRATION env var)
    pub access_token_expiration: i64,

    /// Refresh token lifetime in seconds (from JWT_REFRESH_EXPIRATION env var)
    pub refresh_token_expiration: i64,

    /// JWT issuer (from JWT_ISSUER env var)
    pub jwt_issuer: String,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,

    /// Mark session cookies `Secure` (from COOKIE_SECURE env var)
    pub cookie_secure: bool,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| {
            AuthError::Config("JWT_SECRET environment variable must be set".to_string())
        })?;

        let config = Self {
            jwt_secret,
            access_token_expiration: env_or("JWT_ACCESS_EXPIRATION", 1800)?, // 30 minutes
            refresh_token_expiration: env_or("JWT_REFRESH_EXPIRATION", 3600)?, // 60 minutes
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "blog-auth".to_string()),
            argon2_memory_cost: env_or("ARGON2_MEMORY_COST", 19456)?, // 19 MiB
            argon2_time_cost: env_or("ARGON2_TIME_COST", 2)?,
            argon2_parallelism: env_or("ARGON2_PARALLELISM", 1)?,
            cookie_secure: env_or("COOKIE_SECURE", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.len() < 32 {
            return Err(AuthError::Config(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.access_token_expiration <= 0 {
            return Err(AuthError::Config(
                "JWT_ACCESS_EXPIRATION must be positive".to_string(),
            ));
        }

        if self.refresh_token_expiration > MAX_TOKEN_LIFETIME {
            return Err(AuthError::Config(format!(
                "JWT_REFRESH_EXPIRATION must not exceed {} seconds",
                MAX_TOKEN_LIFETIME
            )));
        }

        if self.refresh_token_expiration <= self.access_token_expiration {
            return Err(AuthError::Config(
                "JWT_REFRESH_EXPIRATION must be greater than JWT_ACCESS_EXPIRATION".to_string(),
            ));
        }

        Ok(())
    }

    /// Max-Age of the `accessToken` cookie, matching the token it carries
    pub fn access_cookie_max_age(&self) -> i64 {
        self.access_token_expiration
    }

    /// Max-Age of the `refreshToken` cookie, matching the token it carries
    pub fn refresh_cookie_max_age(&self) -> i64 {
        self.refresh_token_expiration
    }
}

/// Process-level settings for the server binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection string (from DATABASE_URL env var)
    pub database_url: String,

    /// Listen address (from BIND_ADDRESS env var)
    pub bind_address: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            AuthError::Config("DATABASE_URL environment variable must be set".to_string())
        })?;

        Ok(Self {
            database_url,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, AuthError> {
    parse_or(key, env::var(key).ok(), default)
}

/// An unset variable takes the default; a set but unparsable one is an error
fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AuthError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            AuthError::Config(format!("{} has an invalid value: {:?}", key, value))
        }),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "a".repeat(32),
        access_token_expiration: 1800,
        refresh_token_expiration: 3600,
        jwt_issuer: "test".to_string(),
        argon2_memory_cost: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        cookie_secure: false,
    }
}
