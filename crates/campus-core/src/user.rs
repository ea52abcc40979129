//! User accounts.
//!
//! Credentials are stored as argon2 PHC strings; hashing and verification
//! happen at the API layer, never here.

use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// A registered account, as stored. Carries the password hash, so this type
/// is never serialised onto the wire — handlers expose a [`Profile`] instead.
#[derive(Debug, Clone)]
pub struct User {
  pub user_id:       UserId,
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub name:          String,
  /// Path to the profile photo, relative to the configured photo directory.
  pub photo_path:    Option<String>,
}

impl User {
  pub fn profile(&self) -> Profile {
    Profile {
      user_id:    self.user_id,
      email:      self.email.clone(),
      name:       self.name.clone(),
      photo_path: self.photo_path.clone(),
    }
  }
}

/// The wire-safe view of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:    UserId,
  pub email:      String,
  pub name:       String,
  pub photo_path: Option<String>,
}

/// Input to [`crate::store::RewardsStore::create_user`].
/// `user_id` is assigned by the store; a zero point balance is created in the
/// same transaction.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub password_hash: String,
  pub name:          String,
}
