//! Integration tests for `SqliteStore` against an in-memory database.

use campus_core::{
  Error as CoreError,
  benefit::NewBenefit,
  challenge::NewChallenge,
  event::NewEvent,
  points::{Cause, EntryKind},
  store::RewardsStore,
  user::{NewUser, User},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(email: &str) -> NewUser {
  NewUser {
    email:         email.into(),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    name:          "Alice Liddell".into(),
  }
}

async fn user_with_points(s: &SqliteStore, email: &str, points: i64) -> User {
  let user = s.create_user(new_user(email)).await.unwrap();
  if points != 0 {
    s.adjust(user.user_id, points, Cause::None).await.unwrap();
  }
  user
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;

  let user = s.create_user(new_user("alice@example.edu")).await.unwrap();
  assert_eq!(user.email, "alice@example.edu");

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.user_id, user.user_id);
  assert_eq!(fetched.name, "Alice Liddell");
  assert!(fetched.photo_path.is_none());
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(999).await.unwrap().is_none());
}

#[tokio::test]
async fn user_by_email_round_trip() {
  let s = store().await;
  let user = s.create_user(new_user("bob@example.edu")).await.unwrap();

  let fetched = s.user_by_email("bob@example.edu").await.unwrap().unwrap();
  assert_eq!(fetched.user_id, user.user_id);

  assert!(s.user_by_email("nobody@example.edu").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.create_user(new_user("dup@example.edu")).await.unwrap();

  let err = s.create_user(new_user("dup@example.edu")).await.unwrap_err();
  assert!(matches!(err, Error::Domain(CoreError::EmailTaken(_))));
}

#[tokio::test]
async fn new_user_starts_with_zero_balance() {
  let s = store().await;
  let user = s.create_user(new_user("zero@example.edu")).await.unwrap();
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(0));
}

#[tokio::test]
async fn set_photo_updates_profile() {
  let s = store().await;
  let user = s.create_user(new_user("pic@example.edu")).await.unwrap();

  s.set_photo(user.user_id, "avatars/pic.png".into())
    .await
    .unwrap();
  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.photo_path.as_deref(), Some("avatars/pic.png"));
}

#[tokio::test]
async fn set_photo_for_missing_user_fails() {
  let s = store().await;
  let err = s.set_photo(42, "x.png".into()).await.unwrap_err();
  assert!(matches!(err, Error::Domain(CoreError::UserNotFound(42))));
}

// ─── Points ledger ───────────────────────────────────────────────────────────

#[tokio::test]
async fn balance_missing_is_distinct_from_zero() {
  let s = store().await;
  // No balance row at all — must be None, not Some(0).
  assert_eq!(s.balance(12345).await.unwrap(), None);
}

#[tokio::test]
async fn adjust_moves_balance_and_appends_exactly_one_entry() {
  let s = store().await;
  let user = s.create_user(new_user("adj@example.edu")).await.unwrap();

  let entry = s.adjust(user.user_id, 150, Cause::None).await.unwrap();
  assert_eq!(entry.delta, 150);
  assert_eq!(entry.kind(), EntryKind::Credit);

  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(150));

  let history = s.history(user.user_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].entry.delta, 150);
  assert_eq!(history[0].entry.cause, Cause::None);
  assert_eq!(history[0].kind, EntryKind::Credit);
  assert!(history[0].cause_name.is_none());
}

#[tokio::test]
async fn adjust_with_negative_delta_debits() {
  let s = store().await;
  let user = user_with_points(&s, "debit@example.edu", 100).await;

  s.adjust(user.user_id, -30, Cause::None).await.unwrap();
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(70));

  let history = s.history(user.user_id).await.unwrap();
  assert_eq!(history[0].kind, EntryKind::Debit);
}

#[tokio::test]
async fn adjust_rejects_zero_delta() {
  let s = store().await;
  let user = s.create_user(new_user("zed@example.edu")).await.unwrap();

  let err = s.adjust(user.user_id, 0, Cause::None).await.unwrap_err();
  assert!(matches!(err, Error::Domain(CoreError::ZeroDelta)));
  assert!(s.history(user.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_adjust_writes_no_ledger_entry() {
  let s = store().await;

  // No such user, so no balance row: the update hits zero rows and the
  // transaction rolls back before the ledger insert.
  let err = s.adjust(777, 50, Cause::None).await.unwrap_err();
  assert!(matches!(err, Error::Domain(CoreError::BalanceMissing(777))));
  assert!(s.history(777).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_newest_first_with_cause_names() {
  let s = store().await;
  let user = user_with_points(&s, "hist@example.edu", 500).await;

  let event = s
    .create_event(NewEvent {
      name:        "Welcome Fair".into(),
      description: "Semester kickoff".into(),
      points:      25,
      starts_at:   None,
      location:    None,
    })
    .await
    .unwrap();
  s.record_attendance(user.user_id, event.event_id)
    .await
    .unwrap();

  let benefit = s
    .create_benefit(NewBenefit {
      name:        "Coffee Voucher".into(),
      description: "One free coffee".into(),
      cost:        100,
      expires_at:  None,
    })
    .await
    .unwrap();
  s.redeem(user.user_id, benefit.benefit_id).await.unwrap();

  let history = s.history(user.user_id).await.unwrap();
  assert_eq!(history.len(), 3);

  // Newest first: redemption, then attendance, then the seed credit.
  assert_eq!(history[0].entry.delta, -100);
  assert_eq!(history[0].cause_name.as_deref(), Some("Coffee Voucher"));
  assert_eq!(history[0].entry.cause, Cause::Benefit(benefit.benefit_id));

  assert_eq!(history[1].entry.delta, 25);
  assert_eq!(history[1].cause_name.as_deref(), Some("Welcome Fair"));

  assert_eq!(history[2].entry.delta, 500);
  assert!(history[2].cause_name.is_none());
}

// ─── Benefits & redemption ───────────────────────────────────────────────────

async fn seed_benefit(s: &SqliteStore, name: &str, cost: i64) -> i64 {
  s.create_benefit(NewBenefit {
    name:        name.into(),
    description: "test benefit".into(),
    cost,
    expires_at:  None,
  })
  .await
  .unwrap()
  .benefit_id
}

#[tokio::test]
async fn list_and_get_benefits() {
  let s = store().await;
  seed_benefit(&s, "A", 10).await;
  let b = seed_benefit(&s, "B", 20).await;

  assert_eq!(s.list_benefits().await.unwrap().len(), 2);
  let fetched = s.get_benefit(b).await.unwrap().unwrap();
  assert_eq!(fetched.name, "B");
  assert!(s.get_benefit(999).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_benefit_removes_it() {
  let s = store().await;
  let b = seed_benefit(&s, "Gone", 10).await;

  s.delete_benefit(b).await.unwrap();
  assert!(s.get_benefit(b).await.unwrap().is_none());

  let err = s.delete_benefit(b).await.unwrap_err();
  assert!(matches!(err, Error::Domain(CoreError::BenefitNotFound(_))));
}

#[tokio::test]
async fn redeem_debits_balance_and_records_everything() {
  let s = store().await;
  let user = user_with_points(&s, "shopper@example.edu", 200).await;
  let benefit = seed_benefit(&s, "Gym Pass", 150).await;

  let redemption = s.redeem(user.user_id, benefit).await.unwrap();
  assert_eq!(redemption.benefit_id, benefit);

  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(50));

  let history = s.history(user.user_id).await.unwrap();
  assert_eq!(history[0].entry.delta, -150);
  assert_eq!(history[0].entry.cause, Cause::Benefit(benefit));

  let owned = s.redemptions(user.user_id).await.unwrap();
  assert_eq!(owned.len(), 1);
  assert_eq!(owned[0].benefit.benefit_id, benefit);
}

#[tokio::test]
async fn second_redemption_conflicts_and_changes_nothing() {
  let s = store().await;
  let user = user_with_points(&s, "twice@example.edu", 200).await;
  let benefit = seed_benefit(&s, "Gym Pass", 150).await;

  s.redeem(user.user_id, benefit).await.unwrap();

  let err = s.redeem(user.user_id, benefit).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::AlreadyRedeemed { .. })
  ));

  // Balance and ledger are exactly as after the first call.
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(50));
  assert_eq!(s.history(user.user_id).await.unwrap().len(), 2);
  assert_eq!(s.redemptions(user.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn insufficient_points_causes_zero_mutations() {
  let s = store().await;
  let user = user_with_points(&s, "broke@example.edu", 100).await;
  let benefit = seed_benefit(&s, "Gym Pass", 150).await;

  let err = s.redeem(user.user_id, benefit).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::InsufficientPoints { cost: 150, balance: 100 })
  ));

  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(100));
  assert_eq!(s.history(user.user_id).await.unwrap().len(), 1);
  assert!(s.redemptions(user.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn redeem_unknown_benefit_fails() {
  let s = store().await;
  let user = user_with_points(&s, "ghost@example.edu", 100).await;

  let err = s.redeem(user.user_id, 404).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::BenefitNotFound(404))
  ));
}

#[tokio::test]
async fn concurrent_redemption_debits_exactly_once() {
  let s = store().await;
  let user = user_with_points(&s, "race@example.edu", 200).await;
  let benefit = seed_benefit(&s, "Gym Pass", 150).await;

  let (a, b) = tokio::join!(
    {
      let s = s.clone();
      async move { s.redeem(user.user_id, benefit).await }
    },
    {
      let s = s.clone();
      async move { s.redeem(user.user_id, benefit).await }
    },
  );

  let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
  assert_eq!(successes, 1, "exactly one redemption must win");
  for r in [a, b] {
    if let Err(e) = r {
      assert!(matches!(
        e,
        Error::Domain(CoreError::AlreadyRedeemed { .. })
      ));
    }
  }

  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(50));
  assert_eq!(s.redemptions(user.user_id).await.unwrap().len(), 1);
}

// ─── Events ──────────────────────────────────────────────────────────────────

async fn seed_event(s: &SqliteStore, name: &str, points: i64) -> i64 {
  s.create_event(NewEvent {
    name:        name.into(),
    description: "test event".into(),
    points,
    starts_at:   None,
    location:    Some("Main Hall".into()),
  })
  .await
  .unwrap()
  .event_id
}

#[tokio::test]
async fn attendance_awards_event_points_once() {
  let s = store().await;
  let user = s.create_user(new_user("att@example.edu")).await.unwrap();
  let event = seed_event(&s, "Blood Drive", 40).await;

  s.record_attendance(user.user_id, event).await.unwrap();
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(40));

  let history = s.history(user.user_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].entry.cause, Cause::Event(event));
  assert_eq!(history[0].cause_name.as_deref(), Some("Blood Drive"));

  let err = s.record_attendance(user.user_id, event).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::AlreadyAttended { .. })
  ));
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(40));
  assert_eq!(s.history(user.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn attendance_at_unknown_event_fails() {
  let s = store().await;
  let user = s.create_user(new_user("noev@example.edu")).await.unwrap();

  let err = s.record_attendance(user.user_id, 31337).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::EventNotFound(31337))
  ));
}

#[tokio::test]
async fn attendance_history_lists_attended_events() {
  let s = store().await;
  let user = s.create_user(new_user("hist2@example.edu")).await.unwrap();
  let first = seed_event(&s, "First", 10).await;
  let second = seed_event(&s, "Second", 10).await;

  s.record_attendance(user.user_id, first).await.unwrap();
  s.record_attendance(user.user_id, second).await.unwrap();

  let attended = s.attendance_history(user.user_id).await.unwrap();
  assert_eq!(attended.len(), 2);

  assert!(s.attendance_history(999).await.unwrap().is_empty());
}

// ─── Challenges ──────────────────────────────────────────────────────────────

async fn seed_challenge(s: &SqliteStore, name: &str, points: i64) -> i64 {
  s.create_challenge(NewChallenge {
    name:        name.into(),
    description: "test challenge".into(),
    points,
    contact:     Some("organiser@example.edu".into()),
    deadline:    None,
  })
  .await
  .unwrap()
  .challenge_id
}

#[tokio::test]
async fn register_then_complete_awards_points() {
  let s = store().await;
  let user = s.create_user(new_user("ch@example.edu")).await.unwrap();
  let challenge = seed_challenge(&s, "Steps Week", 60).await;

  s.register_challenge(user.user_id, challenge).await.unwrap();
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(0));

  let mine = s.user_challenges(user.user_id).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].name, "Steps Week");

  s.complete_challenge(user.user_id, challenge).await.unwrap();
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(60));

  let history = s.history(user.user_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].entry.cause, Cause::Challenge(challenge));
  assert_eq!(history[0].cause_name.as_deref(), Some("Steps Week"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
  let s = store().await;
  let user = s.create_user(new_user("dupreg@example.edu")).await.unwrap();
  let challenge = seed_challenge(&s, "Steps Week", 60).await;

  s.register_challenge(user.user_id, challenge).await.unwrap();
  let err = s
    .register_challenge(user.user_id, challenge)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::AlreadyRegistered { .. })
  ));
}

#[tokio::test]
async fn completion_requires_registration() {
  let s = store().await;
  let user = s.create_user(new_user("unreg@example.edu")).await.unwrap();
  let challenge = seed_challenge(&s, "Steps Week", 60).await;

  let err = s
    .complete_challenge(user.user_id, challenge)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::NotRegistered { .. })
  ));
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(0));
}

#[tokio::test]
async fn duplicate_completion_conflicts_without_double_credit() {
  let s = store().await;
  let user = s.create_user(new_user("dupdone@example.edu")).await.unwrap();
  let challenge = seed_challenge(&s, "Steps Week", 60).await;

  s.register_challenge(user.user_id, challenge).await.unwrap();
  s.complete_challenge(user.user_id, challenge).await.unwrap();

  let err = s
    .complete_challenge(user.user_id, challenge)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::AlreadyCompleted { .. })
  ));
  assert_eq!(s.balance(user.user_id).await.unwrap(), Some(60));
  assert_eq!(s.history(user.user_id).await.unwrap().len(), 1);
}
