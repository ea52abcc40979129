//! Handlers for challenges: listing, registration, and completion.
//!
//! Registration and completion are separate steps. Registering moves no
//! points; completing a registered challenge credits its points. Both are
//! unique per (user, challenge), and completing without registering is a
//! conflict.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use campus_core::{
  challenge::{Challenge, ChallengeId, NewChallenge},
  store::RewardsStore,
  user::UserId,
};
use serde::Deserialize;

use crate::{AppState, auth, error::ApiError};

/// `GET /challenges` — every open challenge.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Challenge>>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_session(&headers, &state.sessions)?;

  let challenges = state.store.list_challenges().await?;
  Ok(Json(challenges))
}

#[derive(Debug, Deserialize)]
pub struct CreateChallengeBody {
  pub name:        String,
  pub description: String,
  pub points:      i64,
  pub contact:     Option<String>,
  pub deadline:    Option<chrono::NaiveDate>,
}

/// `POST /challenges`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<CreateChallengeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_session(&headers, &state.sessions)?;

  if body.name.trim().is_empty() {
    return Err(ApiError::InvalidInput("challenge name is required".into()));
  }
  if body.points < 0 {
    return Err(ApiError::InvalidInput("points must not be negative".into()));
  }

  let challenge = state
    .store
    .create_challenge(NewChallenge {
      name:        body.name,
      description: body.description,
      points:      body.points,
      contact:     body.contact,
      deadline:    body.deadline,
    })
    .await?;

  tracing::info!(challenge_id = challenge.challenge_id, "challenge created");
  Ok((StatusCode::CREATED, Json(challenge)))
}

#[derive(Debug, Deserialize)]
pub struct ParticipationBody {
  pub user_id: UserId,
}

/// `POST /challenges/:id/registration` — sign the user up. No points move.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Path(challenge_id): Path<ChallengeId>,
  headers: HeaderMap,
  Json(body): Json<ParticipationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, body.user_id)?;

  let registration = state
    .store
    .register_challenge(body.user_id, challenge_id)
    .await?;
  tracing::info!(
    user_id = registration.user_id,
    challenge_id = registration.challenge_id,
    "challenge registration"
  );
  Ok((StatusCode::CREATED, Json(registration)))
}

/// `POST /challenges/:id/completion` — mark a registered challenge done and
/// credit its points.
pub async fn complete<S>(
  State(state): State<AppState<S>>,
  Path(challenge_id): Path<ChallengeId>,
  headers: HeaderMap,
  Json(body): Json<ParticipationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, body.user_id)?;

  let completion = state
    .store
    .complete_challenge(body.user_id, challenge_id)
    .await?;
  tracing::info!(
    user_id = completion.user_id,
    challenge_id = completion.challenge_id,
    "challenge completed"
  );
  Ok(Json(completion))
}

/// `GET /users/:id/challenges` — challenges the user has registered for.
pub async fn user_challenges<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  headers: HeaderMap,
) -> Result<Json<Vec<Challenge>>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, id)?;

  let challenges = state.store.user_challenges(id).await?;
  Ok(Json(challenges))
}
