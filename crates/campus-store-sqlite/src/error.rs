//! Error type for `campus-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain-level outcome (conflict, missing record, bad input) detected
  /// inside a store operation. Carries the full taxonomy from
  /// [`campus_core::Error`] so callers can map each case individually.
  #[error(transparent)]
  Domain(#[from] campus_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The operation exceeded the configured deadline. The transaction never
  /// committed; the caller may retry.
  #[error("database operation timed out")]
  Timeout,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
