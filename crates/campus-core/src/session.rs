//! In-memory session store.
//!
//! Binds opaque tokens to user ids for the lifetime of the process. Sessions
//! are deliberately not persisted: a restart invalidates every token and
//! clients must log in again. That is documented behavior, not a defect.
//!
//! The store is internally synchronised and meant to be shared via `Arc`
//! through application state — never held as a global.

use std::{
  collections::HashMap,
  sync::Mutex,
};

use rand_core::{OsRng, RngCore as _};

use crate::user::UserId;

/// Number of random bytes per token; 16 bytes gives 128 bits, which is the
/// floor for an unguessable credential.
const TOKEN_BYTES: usize = 16;

/// Process-wide token → user binding.
#[derive(Debug, Default)]
pub struct SessionStore {
  sessions: Mutex<HashMap<String, UserId>>,
}

impl SessionStore {
  pub fn new() -> Self { Self::default() }

  /// Issue a fresh token bound to `user_id`.
  pub fn create(&self, user_id: UserId) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    self
      .sessions
      .lock()
      .expect("session store mutex poisoned")
      .insert(token.clone(), user_id);
    token
  }

  /// Look up the user bound to `token`. `None` means "not authenticated",
  /// a normal outcome rather than an error.
  pub fn resolve(&self, token: &str) -> Option<UserId> {
    self
      .sessions
      .lock()
      .expect("session store mutex poisoned")
      .get(token)
      .copied()
  }

  /// Remove the binding for `token`. Revoking an absent token is a no-op.
  pub fn revoke(&self, token: &str) {
    self
      .sessions
      .lock()
      .expect("session store mutex poisoned")
      .remove(token);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn created_token_resolves_to_its_user() {
    let store = SessionStore::new();
    let token = store.create(42);
    assert_eq!(store.resolve(&token), Some(42));
  }

  #[test]
  fn tokens_are_distinct_across_creates() {
    let store = SessionStore::new();
    let a = store.create(1);
    let b = store.create(1);
    assert_ne!(a, b);
    assert_eq!(store.resolve(&a), Some(1));
    assert_eq!(store.resolve(&b), Some(1));
  }

  #[test]
  fn token_is_hex_of_128_bits() {
    let store = SessionStore::new();
    let token = store.create(7);
    assert_eq!(token.len(), TOKEN_BYTES * 2);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn unknown_token_resolves_to_none() {
    let store = SessionStore::new();
    assert_eq!(store.resolve("deadbeef"), None);
  }

  #[test]
  fn revoked_token_resolves_to_none() {
    let store = SessionStore::new();
    let token = store.create(9);
    store.revoke(&token);
    assert_eq!(store.resolve(&token), None);
  }

  #[test]
  fn revoking_absent_token_is_a_noop() {
    let store = SessionStore::new();
    store.revoke("not-a-token");
    store.revoke("not-a-token");
  }

  #[test]
  fn concurrent_creates_and_revokes_do_not_lose_sessions() {
    use std::sync::Arc;

    let store = Arc::new(SessionStore::new());
    let mut handles = Vec::new();

    for user in 0..8i64 {
      let store = Arc::clone(&store);
      handles.push(std::thread::spawn(move || {
        let token = store.create(user);
        assert_eq!(store.resolve(&token), Some(user));
        store.revoke(&token);
        assert_eq!(store.resolve(&token), None);
      }));
    }

    for handle in handles {
      handle.join().unwrap();
    }
  }
}
