//! Handlers for campus events and attendance.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use campus_core::{
  event::{AttendedEvent, Event, EventId, NewEvent},
  store::RewardsStore,
  user::UserId,
};
use serde::Deserialize;

use crate::{AppState, auth, error::ApiError};

/// `GET /events` — every scheduled event.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_session(&headers, &state.sessions)?;

  let events = state.store.list_events().await?;
  Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct CreateEventBody {
  pub name:        String,
  pub description: String,
  pub points:      i64,
  pub starts_at:   Option<chrono::DateTime<chrono::Utc>>,
  pub location:    Option<String>,
}

/// `POST /events`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<CreateEventBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_session(&headers, &state.sessions)?;

  if body.name.trim().is_empty() {
    return Err(ApiError::InvalidInput("event name is required".into()));
  }
  if body.points < 0 {
    return Err(ApiError::InvalidInput("points must not be negative".into()));
  }

  let event = state
    .store
    .create_event(NewEvent {
      name:        body.name,
      description: body.description,
      points:      body.points,
      starts_at:   body.starts_at,
      location:    body.location,
    })
    .await?;

  tracing::info!(event_id = event.event_id, "event created");
  Ok((StatusCode::CREATED, Json(event)))
}

#[derive(Debug, Deserialize)]
pub struct AttendBody {
  pub user_id: UserId,
}

/// `POST /events/:id/attendance` — record attendance and credit the points.
/// The same user attending the same event twice is a conflict.
pub async fn attend<S>(
  State(state): State<AppState<S>>,
  Path(event_id): Path<EventId>,
  headers: HeaderMap,
  Json(body): Json<AttendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, body.user_id)?;

  let attendance = state.store.record_attendance(body.user_id, event_id).await?;
  tracing::info!(
    user_id = attendance.user_id,
    event_id = attendance.event_id,
    "attendance recorded"
  );
  Ok(Json(attendance))
}

/// `GET /users/:id/events` — events the user attended, newest first.
pub async fn user_events<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  headers: HeaderMap,
) -> Result<Json<Vec<AttendedEvent>>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, id)?;

  let attended = state.store.attendance_history(id).await?;
  Ok(Json(attended))
}
