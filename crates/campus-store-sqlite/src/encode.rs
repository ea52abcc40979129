//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings; challenge deadlines as
//! `YYYY-MM-DD`. A ledger cause is spread across three nullable id columns,
//! of which at most one is ever set (enforced by a CHECK constraint).

use campus_core::{
  benefit::Benefit,
  challenge::Challenge,
  event::Event,
  points::{Cause, LedgerEntry, LedgerRecord},
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Cause ───────────────────────────────────────────────────────────────────

/// Spread a cause over the three `points_ledger` id columns.
pub fn cause_columns(cause: Cause) -> (Option<i64>, Option<i64>, Option<i64>) {
  match cause {
    Cause::Benefit(id) => (Some(id), None, None),
    Cause::Event(id) => (None, Some(id), None),
    Cause::Challenge(id) => (None, None, Some(id)),
    Cause::None => (None, None, None),
  }
}

/// Rebuild a cause from the three id columns. Priority when more than one is
/// set (which the schema forbids): benefit, then event, then challenge.
pub fn decode_cause(
  benefit_id: Option<i64>,
  event_id: Option<i64>,
  challenge_id: Option<i64>,
) -> Cause {
  if let Some(id) = benefit_id {
    Cause::Benefit(id)
  } else if let Some(id) = event_id {
    Cause::Event(id)
  } else if let Some(id) = challenge_id {
    Cause::Challenge(id)
  } else {
    Cause::None
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `benefits` row as read from SQLite, before date parsing.
pub struct RawBenefit {
  pub benefit_id:  i64,
  pub name:        String,
  pub description: String,
  pub cost:        i64,
  pub expires_at:  Option<String>,
}

impl RawBenefit {
  pub fn into_benefit(self) -> Result<Benefit> {
    Ok(Benefit {
      benefit_id:  self.benefit_id,
      name:        self.name,
      description: self.description,
      cost:        self.cost,
      expires_at:  self.expires_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// An `events` row as read from SQLite.
pub struct RawEvent {
  pub event_id:    i64,
  pub name:        String,
  pub description: String,
  pub points:      i64,
  pub starts_at:   Option<String>,
  pub location:    Option<String>,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:    self.event_id,
      name:        self.name,
      description: self.description,
      points:      self.points,
      starts_at:   self.starts_at.as_deref().map(decode_dt).transpose()?,
      location:    self.location,
    })
  }
}

/// A `challenges` row as read from SQLite.
pub struct RawChallenge {
  pub challenge_id: i64,
  pub name:         String,
  pub description:  String,
  pub points:       i64,
  pub contact:      Option<String>,
  pub deadline:     Option<String>,
}

impl RawChallenge {
  pub fn into_challenge(self) -> Result<Challenge> {
    Ok(Challenge {
      challenge_id: self.challenge_id,
      name:         self.name,
      description:  self.description,
      points:       self.points,
      contact:      self.contact,
      deadline:     self.deadline.as_deref().map(decode_date).transpose()?,
    })
  }
}

/// A `points_ledger` row joined with its cause name.
pub struct RawLedgerRecord {
  pub entry_id:     i64,
  pub user_id:      i64,
  pub recorded_at:  String,
  pub delta:        i64,
  pub benefit_id:   Option<i64>,
  pub event_id:     Option<i64>,
  pub challenge_id: Option<i64>,
  pub cause_name:   Option<String>,
}

impl RawLedgerRecord {
  pub fn into_record(self) -> Result<LedgerRecord> {
    let entry = LedgerEntry {
      entry_id:    self.entry_id,
      user_id:     self.user_id,
      recorded_at: decode_dt(&self.recorded_at)?,
      delta:       self.delta,
      cause:       decode_cause(
        self.benefit_id,
        self.event_id,
        self.challenge_id,
      ),
    };
    let kind = entry.kind();
    Ok(LedgerRecord { entry, kind, cause_name: self.cause_name })
  }
}
