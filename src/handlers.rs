//! Authentication HTTP Handlers
//!
//! Thin adapter from the session service to HTTP: JSON bodies in, status
//! codes and `Set-Cookie` headers out.

use crate::cookies::{clear_session_cookies, set_session_cookies};
use crate::error::AuthError;
use crate::extractors::{AuthUser, ClientInfo, RefreshCookie};
use crate::middleware;
use crate::models::*;
use crate::service::AuthService;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    // Public routes (no authentication required)
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", get(refresh));

    // Protected routes (require a valid access token cookie)
    let protected = Router::new()
        .route("/me", get(get_current_user))
        .layer(axum_middleware::from_fn_with_state(
            auth_service.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(auth_service)
}

fn session_response(
    auth: &AuthService,
    status: StatusCode,
    session: Session,
) -> impl IntoResponse {
    let cookies = set_session_cookies(auth.config(), &session.access_token, &session.refresh_token);
    (status, cookies, Json(AuthResponse::signed_in(session.user)))
}

// ============================================
// Registration
// ============================================

/// POST /register
///
/// Create an account and sign it in
pub async fn register(
    State(auth): State<AuthState>,
    ClientInfo { ip, .. }: ClientInfo,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(req) = body?;
    let session = auth.register(req).await?;

    tracing::debug!(user_id = %session.user.id, ip = ?ip, "Registration from client");

    Ok(session_response(&auth, StatusCode::CREATED, session))
}

// ============================================
// Login / Logout
// ============================================

/// POST /login
///
/// Authenticate with username and password
pub async fn login(
    State(auth): State<AuthState>,
    ClientInfo { ip, user_agent }: ClientInfo,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(req) = body?;
    let username = req.username.clone();

    let session = auth.login(req).await.map_err(|e| {
        if let AuthError::Unauthorized(_) = e {
            tracing::info!(username = %username, ip = ?ip, "Failed login attempt");
        }
        e
    })?;

    tracing::debug!(user_id = %session.user.id, ip = ?ip, user_agent = ?user_agent, "Login from client");

    Ok(session_response(&auth, StatusCode::OK, session))
}

/// POST /logout
///
/// Forget the caller's refresh token and clear both cookies
pub async fn logout(
    State(auth): State<AuthState>,
    RefreshCookie(token): RefreshCookie,
) -> impl IntoResponse {
    auth.logout(token.as_deref()).await;

    (
        StatusCode::OK,
        clear_session_cookies(auth.config()),
        Json(AuthResponse::signed_out()),
    )
}

// ============================================
// Token Refresh
// ============================================

/// GET /refresh
///
/// Rotate the token pair using the refresh token cookie
pub async fn refresh(
    State(auth): State<AuthState>,
    RefreshCookie(token): RefreshCookie,
) -> Result<impl IntoResponse, AuthError> {
    let session = auth.refresh(token.as_deref()).await?;

    Ok(session_response(&auth, StatusCode::OK, session))
}

// ============================================
// User Profile
// ============================================

/// GET /me
///
/// Get the signed-in user
pub async fn get_current_user(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(AuthResponse::signed_in(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::cookies::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
    use crate::store::MemoryStore;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::with_store(store, test_config()).unwrap();
        create_routes(Arc::new(service))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_cookie(method: &str, uri: &str, name: &str, value: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, format!("{name}={value}"))
            .body(Body::empty())
            .unwrap()
    }

    fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|c| c.strip_prefix(&format!("{name}=")).map(String::from))
            .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn alice() -> Value {
        json!({
            "username": "alice",
            "name": "Alice",
            "email": "alice@example.com",
            "password": "Abc12345!",
            "confirmPassword": "Abc12345!"
        })
    }

    fn alice_login() -> Value {
        json!({ "username": "alice", "password": "Abc12345!" })
    }

    #[tokio::test]
    async fn test_session_lifecycle_scenario() {
        let app = app();

        let response = app.clone().oneshot(post_json("/register", alice())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let register_access = set_cookie(&response, ACCESS_COOKIE_NAME).unwrap();
        let register_refresh = set_cookie(&response, REFRESH_COOKIE_NAME).unwrap();
        let body = body_json(response).await;
        assert_eq!(body["auth"], true);
        assert_eq!(body["user"]["username"], "alice");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("password_hash").is_none());

        let response = app.clone().oneshot(post_json("/login", alice_login())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let login_access = set_cookie(&response, ACCESS_COOKIE_NAME).unwrap();
        let login_refresh = set_cookie(&response, REFRESH_COOKIE_NAME).unwrap();
        assert_ne!(login_access, register_access);
        assert_ne!(login_refresh, register_refresh);

        let response = app
            .clone()
            .oneshot(with_cookie("GET", "/refresh", REFRESH_COOKIE_NAME, &login_refresh))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rotated_refresh = set_cookie(&response, REFRESH_COOKIE_NAME).unwrap();
        assert_ne!(rotated_refresh, login_refresh);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "user": body["user"].clone(), "auth": true }));

        let response = app
            .clone()
            .oneshot(with_cookie("GET", "/refresh", REFRESH_COOKIE_NAME, &login_refresh))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let app = app();
        app.clone().oneshot(post_json("/register", alice())).await.unwrap();

        let mut duplicate = alice();
        duplicate["email"] = json!("other@example.com");
        let response = app.oneshot(post_json("/register", duplicate)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = body_json(response).await;
        assert_eq!(body["fields"], json!(["username"]));
    }

    #[tokio::test]
    async fn test_register_validation_error() {
        let mut invalid = alice();
        invalid["confirmPassword"] = json!("Different1!");

        let response = app().oneshot(post_json("/register", invalid)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_register_without_confirmation() {
        let mut body = alice();
        body.as_object_mut().unwrap().remove("confirmPassword");

        let response = app().oneshot(post_json("/register", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_register_missing_field_is_json_validation_error() {
        let mut body = alice();
        body.as_object_mut().unwrap().remove("email");

        let response = app().oneshot(post_json("/register", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_register_unknown_field_rejected() {
        let mut body = alice();
        body["isAdmin"] = json!(true);

        let response = app().oneshot(post_json("/register", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_login_rejects_non_json_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("username=alice"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");

        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = app();
        app.clone().oneshot(post_json("/register", alice())).await.unwrap();

        let response = app
            .oneshot(post_json(
                "/login",
                json!({ "username": "alice", "password": "Abc12345?" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_cookies_and_revokes() {
        let app = app();
        let response = app.clone().oneshot(post_json("/register", alice())).await.unwrap();
        let refresh = set_cookie(&response, REFRESH_COOKIE_NAME).unwrap();

        let response = app
            .clone()
            .oneshot(with_cookie("POST", "/logout", REFRESH_COOKIE_NAME, &refresh))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(set_cookie(&response, ACCESS_COOKIE_NAME).as_deref(), Some(""));
        assert_eq!(set_cookie(&response, REFRESH_COOKIE_NAME).as_deref(), Some(""));
        assert_eq!(body_json(response).await, json!({ "user": null, "auth": false }));

        let response = app
            .oneshot(with_cookie("GET", "/refresh", REFRESH_COOKIE_NAME, &refresh))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_without_cookie_still_signs_out() {
        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["auth"], false);
    }

    #[tokio::test]
    async fn test_refresh_without_cookie() {
        let request = Request::builder().uri("/refresh").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_me_requires_access_cookie() {
        let app = app();
        let response = app.clone().oneshot(post_json("/register", alice())).await.unwrap();
        let access = set_cookie(&response, ACCESS_COOKIE_NAME).unwrap();
        let refresh = set_cookie(&response, REFRESH_COOKIE_NAME).unwrap();

        let response = app
            .clone()
            .oneshot(with_cookie("GET", "/me", ACCESS_COOKIE_NAME, &access))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user"]["username"], "alice");

        // A refresh token is not an access token.
        let response = app
            .clone()
            .oneshot(with_cookie("GET", "/me", ACCESS_COOKIE_NAME, &refresh))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder().uri("/me").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
