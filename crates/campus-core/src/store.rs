//! The `RewardsStore` trait.
//!
//! Implemented by storage backends (e.g. `campus-store-sqlite`). The API
//! layer depends on this abstraction, not on any concrete backend.
//!
//! Correctness contract for implementors: every operation that touches the
//! point balance AND another table (`adjust`, `redeem`, `record_attendance`,
//! `complete_challenge`) must execute as one storage transaction, so that a
//! balance change and its ledger entry land together or not at all. Process-
//! local locking is not a substitute — multiple server instances may share
//! the database.

use std::future::Future;

use crate::{
  benefit::{Benefit, BenefitId, NewBenefit, RedeemedBenefit, Redemption},
  challenge::{
    Challenge, ChallengeId, Completion, NewChallenge, Registration,
  },
  event::{Attendance, AttendedEvent, Event, EventId, NewEvent},
  points::{Cause, LedgerEntry, LedgerRecord},
  user::{NewUser, User, UserId},
};

/// Abstraction over a Campus Rewards storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RewardsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user together with a zero point balance, atomically.
  /// Fails if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user by email for credential verification.
  /// Returns `None` if no account exists.
  fn user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Replace the user's profile photo reference.
  fn set_photo(
    &self,
    id: UserId,
    photo_path: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Points ledger ─────────────────────────────────────────────────────

  /// Current balance. `Ok(None)` means "no balance record", which callers
  /// must report distinctly from a zero balance.
  fn balance(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Full ledger history, newest first, with cause names resolved.
  fn history(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<LedgerRecord>, Self::Error>> + Send + '_;

  /// Move the balance by `delta` and append the matching ledger entry in one
  /// transaction. This is the only mutation path for points, so no caller
  /// can update the balance without the ledger or vice versa. `delta` must
  /// be non-zero.
  fn adjust(
    &self,
    user_id: UserId,
    delta: i64,
    cause: Cause,
  ) -> impl Future<Output = Result<LedgerEntry, Self::Error>> + Send + '_;

  // ── Benefits ──────────────────────────────────────────────────────────

  fn list_benefits(
    &self,
  ) -> impl Future<Output = Result<Vec<Benefit>, Self::Error>> + Send + '_;

  fn get_benefit(
    &self,
    id: BenefitId,
  ) -> impl Future<Output = Result<Option<Benefit>, Self::Error>> + Send + '_;

  fn create_benefit(
    &self,
    input: NewBenefit,
  ) -> impl Future<Output = Result<Benefit, Self::Error>> + Send + '_;

  fn delete_benefit(
    &self,
    id: BenefitId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Redeem `benefit_id` for `user_id`: ownership check, server-side balance
  /// check, balance debit, redemption insert, and ledger append — all inside
  /// one transaction. The storage-level UNIQUE constraint on the
  /// (user, benefit) pair is the authoritative at-most-once guard; a
  /// constraint violation surfaces as "already redeemed".
  fn redeem(
    &self,
    user_id: UserId,
    benefit_id: BenefitId,
  ) -> impl Future<Output = Result<Redemption, Self::Error>> + Send + '_;

  /// Benefits the user has already redeemed, newest first.
  fn redemptions(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<RedeemedBenefit>, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  fn create_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Record attendance and credit the event's points in one transaction.
  /// A user can attend a given event at most once.
  fn record_attendance(
    &self,
    user_id: UserId,
    event_id: EventId,
  ) -> impl Future<Output = Result<Attendance, Self::Error>> + Send + '_;

  /// Events the user attended, newest first.
  fn attendance_history(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<AttendedEvent>, Self::Error>> + Send + '_;

  // ── Challenges ────────────────────────────────────────────────────────

  fn list_challenges(
    &self,
  ) -> impl Future<Output = Result<Vec<Challenge>, Self::Error>> + Send + '_;

  fn create_challenge(
    &self,
    input: NewChallenge,
  ) -> impl Future<Output = Result<Challenge, Self::Error>> + Send + '_;

  /// Challenges the user has registered for.
  fn user_challenges(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<Challenge>, Self::Error>> + Send + '_;

  /// Sign the user up for a challenge. No points move; unique per pair.
  fn register_challenge(
    &self,
    user_id: UserId,
    challenge_id: ChallengeId,
  ) -> impl Future<Output = Result<Registration, Self::Error>> + Send + '_;

  /// Mark a registered challenge as completed and credit its points in one
  /// transaction. Requires a prior registration; unique per pair.
  fn complete_challenge(
    &self,
    user_id: UserId,
    challenge_id: ChallengeId,
  ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + '_;
}
