//! Session identity
//!
//! Every caller is scoped by an opaque, unauthenticated token carried in the
//! `session_id` cookie (or the `x-session-id` header for non-browser
//! clients). Unknown tokens are accepted as-is and simply start with empty
//! state; absent tokens are replaced by a fresh UUID v4 that is sent back on
//! every response. Malformed tokens are rejected instead of being folded into
//! a shared pseudo-session.

use std::fmt;

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::errors::SessionError;

pub const SESSION_COOKIE: &str = "session_id";
pub const SESSION_HEADER: &str = "x-session-id";

const MAX_TOKEN_LEN: usize = 256;

/// Opaque key scoping all per-caller concept state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Fresh unguessable key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied token without checking whether it was ever issued.
    pub fn parse(token: &str) -> Result<Self, SessionError> {
        if token.is_empty() {
            return Err(SessionError::Empty);
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(SessionError::TooLong(token.len()));
        }
        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SessionError::InvalidCharacters);
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of resolving an incoming token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub key: SessionKey,
    /// True when the key was minted for this request.
    pub issued: bool,
}

/// Resolve the caller's session key, minting one when none was supplied.
pub fn resolve(incoming: Option<&str>) -> Result<Resolution, SessionError> {
    match incoming {
        Some(token) => Ok(Resolution {
            key: SessionKey::parse(token)?,
            issued: false,
        }),
        None => Ok(Resolution {
            key: SessionKey::generate(),
            issued: true,
        }),
    }
}

/// Pull the raw token from the request, header first, then cookie.
pub fn incoming_token(headers: &HeaderMap) -> Result<Option<String>, SessionError> {
    if let Some(value) = headers.get(SESSION_HEADER) {
        let token = value.to_str().map_err(|_| SessionError::InvalidCharacters)?;
        return Ok(Some(token.trim().to_string()));
    }

    for value in headers.get_all(header::COOKIE) {
        let raw = value.to_str().map_err(|_| SessionError::InvalidCharacters)?;
        for pair in raw.split(';') {
            if let Some((name, token)) = pair.trim().split_once('=') {
                if name.trim() == SESSION_COOKIE {
                    return Ok(Some(token.trim().trim_matches('"').to_string()));
                }
            }
        }
    }

    Ok(None)
}

fn set_cookie_value(key: &SessionKey) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, key)
}

/// Middleware resolving the session key into a request extension and
/// echoing it back as a cookie on every response.
pub async fn session_layer(mut req: Request, next: Next) -> Response {
    let resolution = match incoming_token(req.headers()).and_then(|t| resolve(t.as_deref())) {
        Ok(resolution) => resolution,
        Err(e) => {
            warn!("Session resolution failed: {}", e);
            return ApiError::bad_request(format!("Session resolution failed: {}", e))
                .into_response();
        }
    };

    if resolution.issued {
        debug!("Issued new session {}", resolution.key);
    }

    let key = resolution.key;
    req.extensions_mut().insert(key.clone());
    let mut response = next.run(req).await;

    match HeaderValue::from_str(&set_cookie_value(&key)) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Could not encode session cookie: {}", e),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keeps_supplied_token() {
        let resolution = resolve(Some("abc-123_DEF")).unwrap();
        assert_eq!(resolution.key.as_str(), "abc-123_DEF");
        assert!(!resolution.issued);
    }

    #[test]
    fn test_resolve_mints_uuid_when_absent() {
        let resolution = resolve(None).unwrap();
        assert!(resolution.issued);
        assert!(Uuid::parse_str(resolution.key.as_str()).is_ok());
        assert_ne!(resolve(None).unwrap().key, resolution.key);
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        assert_eq!(resolve(Some("")).unwrap_err(), SessionError::Empty);
        assert_eq!(
            resolve(Some("bad token;")).unwrap_err(),
            SessionError::InvalidCharacters
        );
        let long = "a".repeat(300);
        assert_eq!(
            resolve(Some(&long)).unwrap_err(),
            SessionError::TooLong(300)
        );
    }

    #[test]
    fn test_token_read_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=s-42; other=1"),
        );
        assert_eq!(incoming_token(&headers).unwrap().as_deref(), Some("s-42"));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_id=from-cookie"));
        headers.insert(SESSION_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(
            incoming_token(&headers).unwrap().as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_no_token_present() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(incoming_token(&headers).unwrap(), None);
    }

    #[test]
    fn test_cookie_value_shape() {
        let key = SessionKey::parse("abc").unwrap();
        assert_eq!(
            set_cookie_value(&key),
            "session_id=abc; Path=/; HttpOnly; SameSite=Lax"
        );
    }
}
