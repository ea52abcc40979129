//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! One taxonomy for every handler: validation failures are rejected before
//! any mutation, conflicts map to 409, a storage timeout maps to 503 (the
//! client may retry), and unexpected storage failures are logged in full but
//! surfaced as an opaque 500.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No session token, or a token the session store does not know.
  #[error("invalid session key")]
  Unauthenticated,

  /// Valid token, but bound to a different user than the request names.
  #[error("session does not match the requested user")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// The storage deadline elapsed; nothing committed. Retryable.
  #[error("storage temporarily unavailable")]
  Unavailable,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    // Authorization failures are 400 — the contract the existing clients
    // rely on — and deliberately do not say whether the token or the user
    // was the problem.
    let (status, message) = match &self {
      ApiError::Unauthenticated | ApiError::Unauthorized => {
        (StatusCode::BAD_REQUEST, self.to_string())
      }
      ApiError::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unavailable => {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
      }
      ApiError::Store(e) => {
        // Full detail to the log, nothing internal to the client.
        tracing::error!(error = %e, "storage failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "internal server error".to_string(),
        )
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<campus_core::Error> for ApiError {
  fn from(e: campus_core::Error) -> Self {
    use campus_core::Error as E;
    match e {
      E::UserNotFound(_)
      | E::BenefitNotFound(_)
      | E::EventNotFound(_)
      | E::ChallengeNotFound(_)
      | E::BalanceMissing(_) => ApiError::NotFound(e.to_string()),

      E::EmailTaken(_)
      | E::AlreadyRedeemed { .. }
      | E::InsufficientPoints { .. }
      | E::AlreadyAttended { .. }
      | E::AlreadyRegistered { .. }
      | E::AlreadyCompleted { .. }
      | E::NotRegistered { .. } => ApiError::Conflict(e.to_string()),

      E::ZeroDelta => ApiError::InvalidInput(e.to_string()),
    }
  }
}

impl From<campus_store_sqlite::Error> for ApiError {
  fn from(e: campus_store_sqlite::Error) -> Self {
    use campus_store_sqlite::Error as E;
    match e {
      E::Domain(domain) => ApiError::from(domain),
      E::Timeout => ApiError::Unavailable,
      other => ApiError::Store(Box::new(other)),
    }
  }
}

// Lets test doubles with infallible stores satisfy the router bounds.
impl From<std::convert::Infallible> for ApiError {
  fn from(e: std::convert::Infallible) -> Self { match e {} }
}
