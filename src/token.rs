//! Token issuing and verification
//!
//! Access and refresh tokens are HS256 JWTs signed with the server secret.
//! Each kind carries its own audience, so a token of one kind never verifies
//! as the other. Nothing is revoked here; expiry is the only way a signed
//! token stops verifying.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::{TokenClaims, TokenKind};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// Creates and verifies access/refresh tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            access_lifetime: Duration::seconds(config.access_token_expiration),
            refresh_lifetime: Duration::seconds(config.refresh_token_expiration),
        }
    }

    /// Issue a short-lived access token for a user
    pub fn issue_access(&self, subject: Uuid) -> Result<String, AuthError> {
        self.issue_at(TokenKind::Access, subject, Utc::now())
    }

    /// Issue a refresh token for a user
    pub fn issue_refresh(&self, subject: Uuid) -> Result<String, AuthError> {
        self.issue_at(TokenKind::Refresh, subject, Utc::now())
    }

    /// Verify an access token and return its subject
    pub fn verify_access(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify(TokenKind::Access, token)
    }

    /// Verify a refresh token and return its subject
    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify(TokenKind::Refresh, token)
    }

    pub(crate) fn issue_at(
        &self,
        kind: TokenKind,
        subject: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let lifetime = match kind {
            TokenKind::Access => self.access_lifetime,
            TokenKind::Refresh => self.refresh_lifetime,
        };

        let claims = TokenClaims {
            sub: subject,
            kind,
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience(kind),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[self.audience(kind)]);

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;

        if token_data.claims.kind != kind {
            tracing::debug!(expected = kind.as_str(), "Token kind mismatch");
            return Err(AuthError::unauthorized());
        }

        Ok(token_data.claims.sub)
    }

    fn audience(&self, kind: TokenKind) -> String {
        format!("{}:{}", self.issuer, kind.as_str())
    }
}
