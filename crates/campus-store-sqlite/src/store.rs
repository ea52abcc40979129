//! [`SqliteStore`] — the SQLite implementation of [`RewardsStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use campus_core::{
  Error as CoreError,
  benefit::{Benefit, BenefitId, NewBenefit, RedeemedBenefit, Redemption},
  challenge::{
    Challenge, ChallengeId, Completion, NewChallenge, Registration,
  },
  event::{Attendance, AttendedEvent, Event, EventId, NewEvent},
  points::{Cause, LedgerEntry, LedgerRecord},
  store::RewardsStore,
  user::{NewUser, User, UserId},
};

use crate::{
  Error, Result,
  encode::{
    RawBenefit, RawChallenge, RawEvent, RawLedgerRecord, cause_columns,
    encode_date, encode_dt,
  },
  schema::SCHEMA,
};

/// Deadline applied to every database round trip.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// `true` for any SQLite constraint failure (UNIQUE, CHECK, FK). Inside a
/// transaction that has already validated its inputs, the UNIQUE pair
/// constraints are the only ones left to trip, so the violation itself is
/// the duplicate signal.
fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
  Ok(User {
    user_id:       row.get(0)?,
    email:         row.get(1)?,
    password_hash: row.get(2)?,
    name:          row.get(3)?,
    photo_path:    row.get(4)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Campus Rewards store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:       tokio_rusqlite::Connection,
  op_timeout: Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, op_timeout: DEFAULT_OP_TIMEOUT };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, op_timeout: DEFAULT_OP_TIMEOUT };
    store.init_schema().await?;
    Ok(store)
  }

  /// Override the per-operation deadline.
  pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
    self.op_timeout = timeout;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run `f` on the connection's worker thread, bounded by the operation
  /// deadline. On timeout the statement never committed and the caller may
  /// retry; nothing is retried here.
  async fn call<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(
        &mut rusqlite::Connection,
      ) -> std::result::Result<T, tokio_rusqlite::Error>
      + Send
      + 'static,
  {
    match tokio::time::timeout(self.op_timeout, self.conn.call(f)).await {
      Ok(res) => Ok(res?),
      Err(_) => Err(Error::Timeout),
    }
  }
}

// ─── RewardsStore impl ───────────────────────────────────────────────────────

impl RewardsStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let NewUser { email, password_hash, name } = input;

    let out: campus_core::Result<User> = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let inserted = tx.execute(
          "INSERT INTO users (email, password_hash, name) VALUES (?1, ?2, ?3)",
          rusqlite::params![email, password_hash, name],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => {
            return Ok(Err(CoreError::EmailTaken(email)));
          }
          Err(e) => return Err(e.into()),
        }
        let user_id = tx.last_insert_rowid();

        // The zero balance row is created with the account, so a freshly
        // signed-up user always has a balance record.
        tx.execute(
          "INSERT INTO point_balances (user_id, points) VALUES (?1, 0)",
          rusqlite::params![user_id],
        )?;

        tx.commit()?;
        Ok(Ok(User { user_id, email, password_hash, name, photo_path: None }))
      })
      .await?;
    Ok(out?)
  }

  async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();
    self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, name, photo_path
               FROM users WHERE email = ?1",
              rusqlite::params![email],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, name, photo_path
               FROM users WHERE user_id = ?1",
              rusqlite::params![id],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await
  }

  async fn set_photo(&self, id: UserId, photo_path: String) -> Result<()> {
    let out: campus_core::Result<()> = self
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE users SET photo_path = ?1 WHERE user_id = ?2",
          rusqlite::params![photo_path, id],
        )?;
        if updated == 0 {
          return Ok(Err(CoreError::UserNotFound(id)));
        }
        Ok(Ok(()))
      })
      .await?;
    Ok(out?)
  }

  // ── Points ledger ─────────────────────────────────────────────────────────

  async fn balance(&self, user_id: UserId) -> Result<Option<i64>> {
    self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT points FROM point_balances WHERE user_id = ?1",
              rusqlite::params![user_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await
  }

  async fn history(&self, user_id: UserId) -> Result<Vec<LedgerRecord>> {
    let raws: Vec<RawLedgerRecord> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             l.entry_id, l.user_id, l.recorded_at, l.delta,
             l.benefit_id, l.event_id, l.challenge_id,
             COALESCE(b.name, e.name, c.name) AS cause_name
           FROM points_ledger l
           LEFT JOIN benefits   b ON b.benefit_id   = l.benefit_id
           LEFT JOIN events     e ON e.event_id     = l.event_id
           LEFT JOIN challenges c ON c.challenge_id = l.challenge_id
           WHERE l.user_id = ?1
           ORDER BY l.recorded_at DESC, l.entry_id DESC",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok(RawLedgerRecord {
              entry_id:     row.get(0)?,
              user_id:      row.get(1)?,
              recorded_at:  row.get(2)?,
              delta:        row.get(3)?,
              benefit_id:   row.get(4)?,
              event_id:     row.get(5)?,
              challenge_id: row.get(6)?,
              cause_name:   row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLedgerRecord::into_record).collect()
  }

  async fn adjust(
    &self,
    user_id: UserId,
    delta: i64,
    cause: Cause,
  ) -> Result<LedgerEntry> {
    if delta == 0 {
      return Err(CoreError::ZeroDelta.into());
    }

    let recorded_at = Utc::now();
    let at_str = encode_dt(recorded_at);

    let out: campus_core::Result<LedgerEntry> = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let updated = tx.execute(
          "UPDATE point_balances SET points = points + ?1 WHERE user_id = ?2",
          rusqlite::params![delta, user_id],
        )?;
        if updated == 0 {
          return Ok(Err(CoreError::BalanceMissing(user_id)));
        }

        let (benefit_id, event_id, challenge_id) = cause_columns(cause);
        tx.execute(
          "INSERT INTO points_ledger
             (user_id, recorded_at, delta, benefit_id, event_id, challenge_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            user_id, at_str, delta, benefit_id, event_id, challenge_id
          ],
        )?;
        let entry_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok(Ok(LedgerEntry { entry_id, user_id, recorded_at, delta, cause }))
      })
      .await?;
    Ok(out?)
  }

  // ── Benefits ──────────────────────────────────────────────────────────────

  async fn list_benefits(&self) -> Result<Vec<Benefit>> {
    let raws: Vec<RawBenefit> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT benefit_id, name, description, cost, expires_at
           FROM benefits ORDER BY benefit_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawBenefit {
              benefit_id:  row.get(0)?,
              name:        row.get(1)?,
              description: row.get(2)?,
              cost:        row.get(3)?,
              expires_at:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBenefit::into_benefit).collect()
  }

  async fn get_benefit(&self, id: BenefitId) -> Result<Option<Benefit>> {
    let raw: Option<RawBenefit> = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT benefit_id, name, description, cost, expires_at
               FROM benefits WHERE benefit_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawBenefit {
                  benefit_id:  row.get(0)?,
                  name:        row.get(1)?,
                  description: row.get(2)?,
                  cost:        row.get(3)?,
                  expires_at:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBenefit::into_benefit).transpose()
  }

  async fn create_benefit(&self, input: NewBenefit) -> Result<Benefit> {
    let NewBenefit { name, description, cost, expires_at } = input;
    let expires_str = expires_at.map(encode_dt);

    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO benefits (name, description, cost, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, description, cost, expires_str],
        )?;
        let benefit_id = conn.last_insert_rowid();
        Ok(Benefit { benefit_id, name, description, cost, expires_at })
      })
      .await
  }

  async fn delete_benefit(&self, id: BenefitId) -> Result<()> {
    let out: campus_core::Result<()> = self
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM benefits WHERE benefit_id = ?1",
          rusqlite::params![id],
        )?;
        if deleted == 0 {
          return Ok(Err(CoreError::BenefitNotFound(id)));
        }
        Ok(Ok(()))
      })
      .await?;
    Ok(out?)
  }

  async fn redeem(
    &self,
    user_id: UserId,
    benefit_id: BenefitId,
  ) -> Result<Redemption> {
    let redeemed_at = Utc::now();
    let at_str = encode_dt(redeemed_at);

    let out: campus_core::Result<Redemption> = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let cost: Option<i64> = tx
          .query_row(
            "SELECT cost FROM benefits WHERE benefit_id = ?1",
            rusqlite::params![benefit_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(cost) = cost else {
          return Ok(Err(CoreError::BenefitNotFound(benefit_id)));
        };

        // The INSERT is the ownership check: the UNIQUE (user, benefit)
        // constraint makes it impossible for two concurrent redemptions to
        // both get past this point.
        let inserted = tx.execute(
          "INSERT INTO benefit_redemptions (user_id, benefit_id, redeemed_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, benefit_id, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => {
            return Ok(Err(CoreError::AlreadyRedeemed { user_id, benefit_id }));
          }
          Err(e) => return Err(e.into()),
        }

        // Balance is re-derived here, inside the transaction; a total
        // claimed by the client is never trusted.
        let balance: Option<i64> = tx
          .query_row(
            "SELECT points FROM point_balances WHERE user_id = ?1",
            rusqlite::params![user_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(balance) = balance else {
          return Ok(Err(CoreError::BalanceMissing(user_id)));
        };
        if balance < cost {
          // Returning without commit rolls back the redemption insert.
          return Ok(Err(CoreError::InsufficientPoints { cost, balance }));
        }

        tx.execute(
          "UPDATE point_balances SET points = points - ?1 WHERE user_id = ?2",
          rusqlite::params![cost, user_id],
        )?;
        tx.execute(
          "INSERT INTO points_ledger (user_id, recorded_at, delta, benefit_id)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, at_str, -cost, benefit_id],
        )?;

        tx.commit()?;
        Ok(Ok(Redemption { user_id, benefit_id, redeemed_at }))
      })
      .await?;
    Ok(out?)
  }

  async fn redemptions(&self, user_id: UserId) -> Result<Vec<RedeemedBenefit>> {
    let raws: Vec<(RawBenefit, String)> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.benefit_id, b.name, b.description, b.cost, b.expires_at,
                  r.redeemed_at
           FROM benefit_redemptions r
           JOIN benefits b ON b.benefit_id = r.benefit_id
           WHERE r.user_id = ?1
           ORDER BY r.redeemed_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok((
              RawBenefit {
                benefit_id:  row.get(0)?,
                name:        row.get(1)?,
                description: row.get(2)?,
                cost:        row.get(3)?,
                expires_at:  row.get(4)?,
              },
              row.get::<_, String>(5)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, redeemed_at)| {
        Ok(RedeemedBenefit {
          benefit:     raw.into_benefit()?,
          redeemed_at: crate::encode::decode_dt(&redeemed_at)?,
        })
      })
      .collect()
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, name, description, points, starts_at, location
           FROM events ORDER BY event_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawEvent {
              event_id:    row.get(0)?,
              name:        row.get(1)?,
              description: row.get(2)?,
              points:      row.get(3)?,
              starts_at:   row.get(4)?,
              location:    row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn create_event(&self, input: NewEvent) -> Result<Event> {
    let NewEvent { name, description, points, starts_at, location } = input;
    let starts_str = starts_at.map(encode_dt);

    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (name, description, points, starts_at, location)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![name, description, points, starts_str, location],
        )?;
        let event_id = conn.last_insert_rowid();
        Ok(Event { event_id, name, description, points, starts_at, location })
      })
      .await
  }

  async fn record_attendance(
    &self,
    user_id: UserId,
    event_id: EventId,
  ) -> Result<Attendance> {
    let attended_at = Utc::now();
    let at_str = encode_dt(attended_at);

    let out: campus_core::Result<Attendance> = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let points: Option<i64> = tx
          .query_row(
            "SELECT points FROM events WHERE event_id = ?1",
            rusqlite::params![event_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(points) = points else {
          return Ok(Err(CoreError::EventNotFound(event_id)));
        };

        let inserted = tx.execute(
          "INSERT INTO event_attendance (user_id, event_id, attended_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, event_id, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => {
            return Ok(Err(CoreError::AlreadyAttended { user_id, event_id }));
          }
          Err(e) => return Err(e.into()),
        }

        // Zero-point events record attendance without touching the ledger.
        if points != 0 {
          let updated = tx.execute(
            "UPDATE point_balances SET points = points + ?1
             WHERE user_id = ?2",
            rusqlite::params![points, user_id],
          )?;
          if updated == 0 {
            return Ok(Err(CoreError::BalanceMissing(user_id)));
          }
          tx.execute(
            "INSERT INTO points_ledger (user_id, recorded_at, delta, event_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user_id, at_str, points, event_id],
          )?;
        }

        tx.commit()?;
        Ok(Ok(Attendance { user_id, event_id, attended_at }))
      })
      .await?;
    Ok(out?)
  }

  async fn attendance_history(
    &self,
    user_id: UserId,
  ) -> Result<Vec<AttendedEvent>> {
    let raws: Vec<(RawEvent, String)> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT e.event_id, e.name, e.description, e.points, e.starts_at,
                  e.location, a.attended_at
           FROM event_attendance a
           JOIN events e ON e.event_id = a.event_id
           WHERE a.user_id = ?1
           ORDER BY a.attended_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok((
              RawEvent {
                event_id:    row.get(0)?,
                name:        row.get(1)?,
                description: row.get(2)?,
                points:      row.get(3)?,
                starts_at:   row.get(4)?,
                location:    row.get(5)?,
              },
              row.get::<_, String>(6)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, attended_at)| {
        Ok(AttendedEvent {
          event:       raw.into_event()?,
          attended_at: crate::encode::decode_dt(&attended_at)?,
        })
      })
      .collect()
  }

  // ── Challenges ────────────────────────────────────────────────────────────

  async fn list_challenges(&self) -> Result<Vec<Challenge>> {
    let raws: Vec<RawChallenge> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT challenge_id, name, description, points, contact, deadline
           FROM challenges ORDER BY challenge_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawChallenge {
              challenge_id: row.get(0)?,
              name:         row.get(1)?,
              description:  row.get(2)?,
              points:       row.get(3)?,
              contact:      row.get(4)?,
              deadline:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChallenge::into_challenge).collect()
  }

  async fn create_challenge(&self, input: NewChallenge) -> Result<Challenge> {
    let NewChallenge { name, description, points, contact, deadline } = input;
    let deadline_str = deadline.map(encode_date);

    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO challenges (name, description, points, contact, deadline)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![name, description, points, contact, deadline_str],
        )?;
        let challenge_id = conn.last_insert_rowid();
        Ok(Challenge {
          challenge_id,
          name,
          description,
          points,
          contact,
          deadline,
        })
      })
      .await
  }

  async fn user_challenges(&self, user_id: UserId) -> Result<Vec<Challenge>> {
    let raws: Vec<RawChallenge> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.challenge_id, c.name, c.description, c.points, c.contact,
                  c.deadline
           FROM challenge_registrations g
           JOIN challenges c ON c.challenge_id = g.challenge_id
           WHERE g.user_id = ?1
           ORDER BY g.registered_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok(RawChallenge {
              challenge_id: row.get(0)?,
              name:         row.get(1)?,
              description:  row.get(2)?,
              points:       row.get(3)?,
              contact:      row.get(4)?,
              deadline:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChallenge::into_challenge).collect()
  }

  async fn register_challenge(
    &self,
    user_id: UserId,
    challenge_id: ChallengeId,
  ) -> Result<Registration> {
    let registered_at = Utc::now();
    let at_str = encode_dt(registered_at);

    let out: campus_core::Result<Registration> = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM challenges WHERE challenge_id = ?1",
            rusqlite::params![challenge_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(Err(CoreError::ChallengeNotFound(challenge_id)));
        }

        let inserted = tx.execute(
          "INSERT INTO challenge_registrations
             (user_id, challenge_id, registered_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, challenge_id, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => {
            return Ok(Err(CoreError::AlreadyRegistered {
              user_id,
              challenge_id,
            }));
          }
          Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(Ok(Registration { user_id, challenge_id, registered_at }))
      })
      .await?;
    Ok(out?)
  }

  async fn complete_challenge(
    &self,
    user_id: UserId,
    challenge_id: ChallengeId,
  ) -> Result<Completion> {
    let completed_at = Utc::now();
    let at_str = encode_dt(completed_at);

    let out: campus_core::Result<Completion> = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let points: Option<i64> = tx
          .query_row(
            "SELECT points FROM challenges WHERE challenge_id = ?1",
            rusqlite::params![challenge_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(points) = points else {
          return Ok(Err(CoreError::ChallengeNotFound(challenge_id)));
        };

        let registered: bool = tx
          .query_row(
            "SELECT 1 FROM challenge_registrations
             WHERE user_id = ?1 AND challenge_id = ?2",
            rusqlite::params![user_id, challenge_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !registered {
          return Ok(Err(CoreError::NotRegistered { user_id, challenge_id }));
        }

        let inserted = tx.execute(
          "INSERT INTO challenge_completions
             (user_id, challenge_id, completed_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, challenge_id, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => {
            return Ok(Err(CoreError::AlreadyCompleted {
              user_id,
              challenge_id,
            }));
          }
          Err(e) => return Err(e.into()),
        }

        if points != 0 {
          let updated = tx.execute(
            "UPDATE point_balances SET points = points + ?1
             WHERE user_id = ?2",
            rusqlite::params![points, user_id],
          )?;
          if updated == 0 {
            return Ok(Err(CoreError::BalanceMissing(user_id)));
          }
          tx.execute(
            "INSERT INTO points_ledger
               (user_id, recorded_at, delta, challenge_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user_id, at_str, points, challenge_id],
          )?;
        }

        tx.commit()?;
        Ok(Ok(Completion { user_id, challenge_id, completed_at }))
      })
      .await?;
    Ok(out?)
  }
}
