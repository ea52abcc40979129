//! Challenges. Users register first, then completion credits the points.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

pub type ChallengeId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
  pub challenge_id: ChallengeId,
  pub name:         String,
  pub description:  String,
  /// Points credited on completion.
  pub points:       i64,
  /// Who to reach about the challenge, e.g. an organiser email.
  pub contact:      Option<String>,
  pub deadline:     Option<NaiveDate>,
}

/// Input to [`crate::store::RewardsStore::create_challenge`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewChallenge {
  pub name:        String,
  pub description: String,
  pub points:      i64,
  pub contact:     Option<String>,
  pub deadline:    Option<NaiveDate>,
}

/// A user signed up for a challenge. Unique per (user, challenge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
  pub user_id:       UserId,
  pub challenge_id:  ChallengeId,
  pub registered_at: DateTime<Utc>,
}

/// A registered challenge finished by the user. Unique per (user, challenge);
/// recording one credits the challenge's points in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
  pub user_id:      UserId,
  pub challenge_id: ChallengeId,
  pub completed_at: DateTime<Utc>,
}
