//! Users, roles, sessions, and the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Role {
  Admin,
  #[default]
  Customer,
}

/// A registered user. The password hash is kept by the store and never
/// appears on this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
}

/// Profile fields for a new account; the password travels separately.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub username:   String,
  pub email:      String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
  pub username:   Option<String>,
  pub email:      Option<String>,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
}

/// A bearer-token session. Only the digest of the token is ever stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

/// The identity a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Caller {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  /// Owners may act on their own records; admins on anyone's.
  pub fn may_act_for(&self, owner: Uuid) -> bool {
    self.is_admin() || self.user_id == owner
  }
}
