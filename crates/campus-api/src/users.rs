//! Handlers for `/users` endpoints: accounts, sessions, points.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/signup` | Body: `{"name","email","password"}` |
//! | `POST` | `/users/login` | Returns `{"token","user_id"}` |
//! | `POST` | `/users/signout` | Revokes the session key |
//! | `GET`  | `/users/:id/profile` | Session must match `:id` |
//! | `PUT`  | `/users/:id/photo` | Body: `{"photo_path"}` |
//! | `GET`  | `/users/:id/points` | `{"points": n}`; 404 if no record |
//! | `GET`  | `/users/:id/points/history` | Newest first |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use campus_core::{
  points::LedgerRecord,
  store::RewardsStore,
  user::{NewUser, Profile, UserId},
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, auth, error::ApiError};

// ─── Sign-up ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /users/signup`
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  if body.name.trim().is_empty()
    || body.email.trim().is_empty()
    || body.password.is_empty()
  {
    return Err(ApiError::InvalidInput(
      "name, email, and password are required".into(),
    ));
  }

  let salt = SaltString::generate(&mut OsRng);
  let password_hash = Argon2::default()
    .hash_password(body.password.as_bytes(), &salt)
    .map_err(|e| ApiError::Store(e.to_string().into()))?
    .to_string();

  let user = state
    .store
    .create_user(NewUser {
      email: body.email,
      password_hash,
      name: body.name,
    })
    .await?;

  tracing::info!(user_id = user.user_id, "account created");
  Ok((StatusCode::CREATED, Json(user.profile())))
}

// ─── Login / sign-out ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:   String,
  pub user_id: UserId,
}

/// `POST /users/login` — verify credentials and issue a session key.
///
/// Unknown email and wrong password are deliberately indistinguishable.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  let Some(user) = state.store.user_by_email(&body.email).await? else {
    return Err(ApiError::Unauthenticated);
  };

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| ApiError::Unauthenticated)?;
  Argon2::default()
    .verify_password(body.password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthenticated)?;

  let token = state.sessions.create(user.user_id);
  tracing::info!(user_id = user.user_id, "session issued");
  Ok(Json(LoginResponse { token, user_id: user.user_id }))
}

/// `POST /users/signout` — revoke the presented session key.
/// Revoking a key the store no longer knows still succeeds.
pub async fn signout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  let token = auth::session_token(&headers)?;
  state.sessions.revoke(token);
  Ok(Json(json!({ "status": "signed out" })))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `GET /users/:id/profile`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  headers: HeaderMap,
) -> Result<Json<Profile>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, id)?;

  let user = state
    .store
    .get_user(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user.profile()))
}

#[derive(Debug, Deserialize)]
pub struct PhotoBody {
  pub photo_path: String,
}

/// `PUT /users/:id/photo`
pub async fn set_photo<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  headers: HeaderMap,
  Json(body): Json<PhotoBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, id)?;

  if body.photo_path.trim().is_empty() {
    return Err(ApiError::InvalidInput("photo_path is required".into()));
  }
  state.store.set_photo(id, body.photo_path).await?;
  Ok(Json(json!({ "status": "photo updated" })))
}

// ─── Points ───────────────────────────────────────────────────────────────────

/// `GET /users/:id/points` — the current balance.
///
/// A user with no balance record gets 404, which is distinct from a balance
/// of zero.
pub async fn points<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, id)?;

  let points = state
    .store
    .balance(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no points record for user {id}")))?;
  Ok(Json(json!({ "points": points })))
}

/// `GET /users/:id/points/history` — full ledger, newest first.
pub async fn points_history<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  headers: HeaderMap,
) -> Result<Json<Vec<LedgerRecord>>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, id)?;

  let history = state.store.history(id).await?;
  Ok(Json(history))
}
