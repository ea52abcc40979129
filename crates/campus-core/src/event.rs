//! Campus events. Attending one credits the attendee with the event's points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

pub type EventId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:    EventId,
  pub name:        String,
  pub description: String,
  /// Points credited on attendance.
  pub points:      i64,
  pub starts_at:   Option<DateTime<Utc>>,
  pub location:    Option<String>,
}

/// Input to [`crate::store::RewardsStore::create_event`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
  pub name:        String,
  pub description: String,
  pub points:      i64,
  pub starts_at:   Option<DateTime<Utc>>,
  pub location:    Option<String>,
}

/// One user's attendance at one event; the pair is unique, so an event can
/// award its points to a user at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
  pub user_id:     UserId,
  pub event_id:    EventId,
  pub attended_at: DateTime<Utc>,
}

/// An attended event bundled with when the user attended it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendedEvent {
  #[serde(flatten)]
  pub event:       Event,
  pub attended_at: DateTime<Utc>,
}
