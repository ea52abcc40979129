//! Benefits — redeemable rewards with a point cost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

pub type BenefitId = i64;

/// A catalog item users can spend points on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benefit {
  pub benefit_id:  BenefitId,
  pub name:        String,
  pub description: String,
  /// Point cost; always positive.
  pub cost:        i64,
  pub expires_at:  Option<DateTime<Utc>>,
}

/// Input to [`crate::store::RewardsStore::create_benefit`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewBenefit {
  pub name:        String,
  pub description: String,
  pub cost:        i64,
  pub expires_at:  Option<DateTime<Utc>>,
}

/// Proof that a user exchanged points for a benefit. The (user, benefit)
/// pair is unique: a benefit can be redeemed at most once per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
  pub user_id:     UserId,
  pub benefit_id:  BenefitId,
  pub redeemed_at: DateTime<Utc>,
}

/// A redeemed benefit bundled with when it was purchased.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemedBenefit {
  #[serde(flatten)]
  pub benefit:     Benefit,
  pub redeemed_at: DateTime<Utc>,
}
