//! Session cookie and basic-auth plumbing for the HTTP surface

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use base64::Engine;

use beacon_core::auth::{cookie_value, AuthError};
use beacon_core::{SESSION_COOKIE, SESSION_COOKIE_MAX_AGE_SECS};

/// Basic-auth realm announced on challenge
pub const REALM: &str = "beacon";

/// Authorization failure, rendered as a basic-auth challenge
#[derive(Debug)]
pub struct Challenge;

impl From<AuthError> for Challenge {
    fn from(_: AuthError) -> Self {
        Challenge
    }
}

impl IntoResponse for Challenge {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", REALM))],
            "Unauthorized",
        )
            .into_response()
    }
}

/// Session token from the request's cookies
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| cookie_value(value, SESSION_COOKIE))
}

/// Username and password from an `Authorization: Basic` header
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// `Set-Cookie` value carrying the session token
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}",
        SESSION_COOKIE, token, SESSION_COOKIE_MAX_AGE_SECS
    )
}
