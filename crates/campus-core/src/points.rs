//! The points ledger — the fundamental record of the rewards system.
//!
//! Every change to a user's balance is mirrored by exactly one ledger entry;
//! the two are written in the same storage transaction so neither can exist
//! without the other. Entries are append-only and never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  benefit::BenefitId, challenge::ChallengeId, event::EventId, user::UserId,
};

// ─── Cause ───────────────────────────────────────────────────────────────────

/// The entity responsible for a ledger entry's delta. At most one cause is
/// ever attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Cause {
  Benefit(BenefitId),
  Event(EventId),
  Challenge(ChallengeId),
  None,
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// Whether an entry added points or spent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
  Credit,
  Debit,
}

/// One append-only ledger row. `recorded_at` is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub entry_id:    i64,
  pub user_id:     UserId,
  pub recorded_at: DateTime<Utc>,
  /// Signed point change; never zero.
  pub delta:       i64,
  pub cause:       Cause,
}

impl LedgerEntry {
  pub fn kind(&self) -> EntryKind {
    if self.delta >= 0 { EntryKind::Credit } else { EntryKind::Debit }
  }
}

/// A ledger entry annotated for display: the human-readable name of its
/// cause, resolved by the store at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
  #[serde(flatten)]
  pub entry:      LedgerEntry,
  pub kind:       EntryKind,
  /// Name of the benefit/event/challenge behind this entry, if any.
  pub cause_name: Option<String>,
}
