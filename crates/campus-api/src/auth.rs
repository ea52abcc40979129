//! The authentication gate.
//!
//! Every user-scoped route runs one of these checks before touching any
//! data: the session token from the `x-session-key` header must resolve, and
//! for per-user resources the resolved user must match the user named in the
//! request. Whether the underlying resource exists is never revealed to a
//! caller who fails the gate.

use axum::http::HeaderMap;
use campus_core::{session::SessionStore, user::UserId};

use crate::error::ApiError;

/// Header carrying the opaque session token.
pub const SESSION_HEADER: &str = "x-session-key";

/// Extract the raw token from the request headers.
pub fn session_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  headers
    .get(SESSION_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthenticated)
}

/// Require a valid session; return the user it belongs to.
pub fn require_session(
  headers: &HeaderMap,
  sessions: &SessionStore,
) -> Result<UserId, ApiError> {
  let token = session_token(headers)?;
  match sessions.resolve(token) {
    Some(user_id) => Ok(user_id),
    None => {
      tracing::warn!("request with unknown session key");
      Err(ApiError::Unauthenticated)
    }
  }
}

/// Require a valid session bound to exactly `user_id`.
pub fn require_user(
  headers: &HeaderMap,
  sessions: &SessionStore,
  user_id: UserId,
) -> Result<(), ApiError> {
  let session_user = require_session(headers, sessions)?;
  if session_user != user_id {
    tracing::warn!(
      session_user,
      requested_user = user_id,
      "session does not match requested user"
    );
    return Err(ApiError::Unauthorized);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderMap, HeaderValue};

  use super::*;

  fn headers_with(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(SESSION_HEADER, HeaderValue::from_str(token).unwrap());
    headers
  }

  #[test]
  fn missing_header_is_unauthenticated() {
    let sessions = SessionStore::new();
    let result = require_session(&HeaderMap::new(), &sessions);
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn unknown_token_is_unauthenticated() {
    let sessions = SessionStore::new();
    let result = require_session(&headers_with("deadbeef"), &sessions);
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn valid_token_resolves_to_its_user() {
    let sessions = SessionStore::new();
    let token = sessions.create(7);
    let user = require_session(&headers_with(&token), &sessions).unwrap();
    assert_eq!(user, 7);
  }

  #[test]
  fn matching_user_passes_the_gate() {
    let sessions = SessionStore::new();
    let token = sessions.create(7);
    assert!(require_user(&headers_with(&token), &sessions, 7).is_ok());
  }

  #[test]
  fn mismatched_user_is_unauthorized() {
    let sessions = SessionStore::new();
    let token = sessions.create(7);
    let result = require_user(&headers_with(&token), &sessions, 8);
    assert!(matches!(result, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn revoked_token_fails_the_gate() {
    let sessions = SessionStore::new();
    let token = sessions.create(7);
    sessions.revoke(&token);
    let result = require_user(&headers_with(&token), &sessions, 7);
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }
}
