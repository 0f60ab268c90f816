//! Authentication Middleware
//!
//! Access-token guard for routes that need a signed-in user.

use crate::cookies::{get_cookie, ACCESS_COOKIE_NAME};
use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::handlers::AuthState;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Require a valid `accessToken` cookie.
///
/// Verifies the token, loads the user it names and stores an [`AuthUser`]
/// in request extensions for handlers.
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token =
        get_cookie(req.headers(), ACCESS_COOKIE_NAME).ok_or_else(AuthError::unauthorized)?;

    let user = auth.authenticate(&token).await?;

    req.extensions_mut().insert(AuthUser(user));

    Ok(next.run(req).await)
}
