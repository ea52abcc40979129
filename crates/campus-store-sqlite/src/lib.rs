//! SQLite backend for the Campus Rewards store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every operation that touches more than
//! one table runs inside a single SQLite transaction; the invariants the rest
//! of the system relies on (balance/ledger lockstep, at-most-once redemption)
//! are enforced here and nowhere else.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
