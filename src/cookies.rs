//! Session cookies
//!
//! Both tokens travel as HTTP-only cookies whose Max-Age matches the
//! lifetime of the token inside them.

use crate::config::AuthConfig;

use axum::http::{header, HeaderMap, HeaderValue};

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Find a cookie value in the request's `Cookie` headers
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Build a `Set-Cookie` value for a session cookie
pub fn session_cookie(config: &AuthConfig, name: &str, value: &str, max_age: i64) -> String {
    let mut cookie = format!("{name}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax");
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` values carrying a fresh token pair
pub fn set_session_cookies(config: &AuthConfig, access_token: &str, refresh_token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(
        &mut headers,
        session_cookie(
            config,
            ACCESS_COOKIE_NAME,
            access_token,
            config.access_cookie_max_age(),
        ),
    );
    append(
        &mut headers,
        session_cookie(
            config,
            REFRESH_COOKIE_NAME,
            refresh_token,
            config.refresh_cookie_max_age(),
        ),
    );
    headers
}

/// `Set-Cookie` values expiring both session cookies
pub fn clear_session_cookies(config: &AuthConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(&mut headers, session_cookie(config, ACCESS_COOKIE_NAME, "", 0));
    append(&mut headers, session_cookie(config, REFRESH_COOKIE_NAME, "", 0));
    headers
}

fn append(headers: &mut HeaderMap, cookie: String) {
    // JWTs and the fixed attributes are always visible ASCII.
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Refusing to emit malformed cookie: {}", e),
    }
}
