//! Authentication Extractors
//!
//! Axum extractors for session cookies and request metadata.

use crate::cookies::{get_cookie, REFRESH_COOKIE_NAME};
use crate::error::AuthError;
use crate::models::UserResponse;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// The `refreshToken` cookie, if the request carries one
#[derive(Debug, Clone)]
pub struct RefreshCookie(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for RefreshCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RefreshCookie(get_cookie(&parts.headers, REFRESH_COOKIE_NAME)))
    }
}

/// The signed-in user, placed in request extensions by
/// [`require_auth`](crate::middleware::require_auth)
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserResponse);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(AuthError::unauthorized)
    }
}

/// Client information (IP, user agent)
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .headers
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("X-Real-IP")
                    .and_then(|h| h.to_str().ok())
                    .map(String::from)
            });

        let user_agent = parts
            .headers
            .get("User-Agent")
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        Ok(ClientInfo { ip, user_agent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_of(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_refresh_cookie() {
        let mut parts = parts_of(
            Request::builder()
                .header("Cookie", "accessToken=a; refreshToken=r")
                .body(())
                .unwrap(),
        );

        let RefreshCookie(token) = RefreshCookie::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_auth_user_requires_extension() {
        let mut parts = parts_of(Request::builder().body(()).unwrap());

        let result = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_client_info_prefers_forwarded_for() {
        let mut parts = parts_of(
            Request::builder()
                .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
                .header("X-Real-IP", "10.0.0.2")
                .header("User-Agent", "curl/8.0")
                .body(())
                .unwrap(),
        );

        let info = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
    }
}
