//! Shared-token authentication for beacon
//!
//! There is exactly one credential pair and therefore exactly one valid
//! session token:
//! - The token is a SHA-256 digest over `username ++ password`, hex encoded
//! - It is computed once at startup and never rotated
//! - Every authenticated browser carries the same value in its cookie

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Derive the session token for a credential pair
pub fn compute_token(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Token authenticator bound to the fixed credential pair
pub struct TokenAuth {
    username: String,
    password: String,
    token: String,
}

impl TokenAuth {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            token: compute_token(username, password),
        }
    }

    /// The single valid session token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Check a presented session token
    pub fn verify(&self, presented: &str) -> bool {
        digest_eq(presented.as_bytes(), self.token.as_bytes())
    }

    /// Check a username/password pair against the fixed credential
    ///
    /// Inputs are compared as SHA-256 digests, so timing depends on
    /// neither the content nor the length of the stored pair.
    pub fn challenge(&self, username: &str, password: &str) -> Result<(), AuthError> {
        // Both comparisons always run
        let user_ok = digest_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = digest_eq(password.as_bytes(), self.password.as_bytes());

        if user_ok & pass_ok {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Constant-time equality over fixed-length digests of both inputs
fn digest_eq(a: &[u8], b: &[u8]) -> bool {
    constant_time_eq(&Sha256::digest(a), &Sha256::digest(b))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut v: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        v |= x ^ y;
    }
    v == 0
}

/// Find a cookie by name in a `Cookie` or `Set-Cookie` header value
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}
