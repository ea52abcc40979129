//! SQL schema for the Campus Rewards SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    name          TEXT NOT NULL,
    photo_path    TEXT
);

-- Denormalised running balance. Kept in lockstep with points_ledger by
-- writing both inside the same transaction; the ledger is the source of
-- truth for reconciliation.
CREATE TABLE IF NOT EXISTS point_balances (
    user_id INTEGER PRIMARY KEY REFERENCES users(user_id),
    points  INTEGER NOT NULL
);

-- The ledger is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS points_ledger (
    entry_id     INTEGER PRIMARY KEY,
    user_id      INTEGER NOT NULL REFERENCES users(user_id),
    recorded_at  TEXT NOT NULL,     -- ISO 8601 UTC; server-assigned
    delta        INTEGER NOT NULL CHECK (delta != 0),
    benefit_id   INTEGER,           -- at most one cause column is set
    event_id     INTEGER,
    challenge_id INTEGER,
    CHECK ((benefit_id IS NOT NULL) + (event_id IS NOT NULL)
         + (challenge_id IS NOT NULL) <= 1)
);

CREATE TABLE IF NOT EXISTS benefits (
    benefit_id  INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    cost        INTEGER NOT NULL CHECK (cost > 0),
    expires_at  TEXT
);

-- Existence of a row means 'already purchased'. The UNIQUE pair is the
-- authoritative at-most-once guard: the redemption INSERT itself is the
-- ownership check, so concurrent redemptions cannot both succeed.
CREATE TABLE IF NOT EXISTS benefit_redemptions (
    user_id     INTEGER NOT NULL REFERENCES users(user_id),
    benefit_id  INTEGER NOT NULL REFERENCES benefits(benefit_id),
    redeemed_at TEXT NOT NULL,
    UNIQUE (user_id, benefit_id)
);

CREATE TABLE IF NOT EXISTS events (
    event_id    INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    points      INTEGER NOT NULL,
    starts_at   TEXT,
    location    TEXT
);

CREATE TABLE IF NOT EXISTS event_attendance (
    user_id     INTEGER NOT NULL REFERENCES users(user_id),
    event_id    INTEGER NOT NULL REFERENCES events(event_id),
    attended_at TEXT NOT NULL,
    UNIQUE (user_id, event_id)
);

CREATE TABLE IF NOT EXISTS challenges (
    challenge_id INTEGER PRIMARY KEY,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL,
    points       INTEGER NOT NULL,
    contact      TEXT,
    deadline     TEXT               -- YYYY-MM-DD
);

CREATE TABLE IF NOT EXISTS challenge_registrations (
    user_id       INTEGER NOT NULL REFERENCES users(user_id),
    challenge_id  INTEGER NOT NULL REFERENCES challenges(challenge_id),
    registered_at TEXT NOT NULL,
    UNIQUE (user_id, challenge_id)
);

CREATE TABLE IF NOT EXISTS challenge_completions (
    user_id      INTEGER NOT NULL REFERENCES users(user_id),
    challenge_id INTEGER NOT NULL REFERENCES challenges(challenge_id),
    completed_at TEXT NOT NULL,
    UNIQUE (user_id, challenge_id)
);

CREATE INDEX IF NOT EXISTS ledger_user_idx      ON points_ledger(user_id);
CREATE INDEX IF NOT EXISTS ledger_recorded_idx  ON points_ledger(recorded_at);
CREATE INDEX IF NOT EXISTS redemptions_user_idx ON benefit_redemptions(user_id);
CREATE INDEX IF NOT EXISTS attendance_user_idx  ON event_attendance(user_id);

PRAGMA user_version = 1;
";
