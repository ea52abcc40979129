//! Error types for `campus-core`.

use thiserror::Error;

use crate::{
  benefit::BenefitId, challenge::ChallengeId, event::EventId, user::UserId,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("no point balance recorded for user {0}")]
  BalanceMissing(UserId),

  #[error("a point adjustment must have a non-zero delta")]
  ZeroDelta,

  #[error("benefit not found: {0}")]
  BenefitNotFound(BenefitId),

  #[error("benefit {benefit_id} already redeemed by user {user_id}")]
  AlreadyRedeemed { user_id: UserId, benefit_id: BenefitId },

  #[error("insufficient points: benefit costs {cost}, balance is {balance}")]
  InsufficientPoints { cost: i64, balance: i64 },

  #[error("event not found: {0}")]
  EventNotFound(EventId),

  #[error("user {user_id} already attended event {event_id}")]
  AlreadyAttended { user_id: UserId, event_id: EventId },

  #[error("challenge not found: {0}")]
  ChallengeNotFound(ChallengeId),

  #[error("user {user_id} already registered for challenge {challenge_id}")]
  AlreadyRegistered { user_id: UserId, challenge_id: ChallengeId },

  #[error("user {user_id} already completed challenge {challenge_id}")]
  AlreadyCompleted { user_id: UserId, challenge_id: ChallengeId },

  #[error("user {user_id} is not registered for challenge {challenge_id}")]
  NotRegistered { user_id: UserId, challenge_id: ChallengeId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
