use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use super::{Service, not_found, require_admin, require_owner, required, required_opt};
use crate::{
  Error, Result,
  store::DepotStore,
  user::{Caller, NewUser, Role, Session, User, UserPatch},
};

// ─── Accounts ────────────────────────────────────────────────────────────────

impl<S: DepotStore> Service<S> {
  /// Self-service sign-up. The very first account becomes an admin.
  pub async fn register(&self, input: NewUser, password_hash: &str) -> Result<User> {
    let existing = self.store.count_users().await.map_err(Error::store)?;
    let role = if existing == 0 { Role::Admin } else { Role::Customer };
    self.insert_account(input, password_hash, role).await
  }

  /// Admin-created account; always a customer.
  pub async fn create_user(
    &self,
    caller: &Caller,
    input: NewUser,
    password_hash: &str,
  ) -> Result<User> {
    require_admin(caller)?;
    self.insert_account(input, password_hash, Role::Customer).await
  }

  /// The user registered under `email` and their stored password hash.
  pub async fn credentials_for_email(&self, email: &str) -> Result<Option<(User, String)>> {
    let email = normalize_email(email);
    self.store.find_user_by_email(&email).await.map_err(Error::store)
  }

  async fn insert_account(&self, input: NewUser, password_hash: &str, role: Role) -> Result<User> {
    let username = required("username", input.username)?;
    let email = validate_email(input.email)?;
    self.ensure_username_free(&username, None).await?;
    self.ensure_email_free(&email, None).await?;

    let user = User {
      user_id: Uuid::new_v4(),
      username,
      email,
      first_name: input.first_name.trim().to_owned(),
      last_name: input.last_name.trim().to_owned(),
      role,
      created_at: Utc::now(),
      updated_at: None,
    };

    self
      .store
      .insert_user(&user, password_hash)
      .await
      .map_err(Error::store)?;
    info!(user_id = %user.user_id, username = %user.username, role = %role, "user created");
    Ok(user)
  }

  async fn ensure_username_free(&self, username: &str, except: Option<Uuid>) -> Result<()> {
    let taken = self
      .store
      .find_user_by_username(username)
      .await
      .map_err(Error::store)?
      .is_some_and(|u| Some(u.user_id) != except);
    if taken {
      return Err(Error::Validation("username already exists".into()));
    }
    Ok(())
  }

  async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<()> {
    let taken = self
      .store
      .find_user_by_email(email)
      .await
      .map_err(Error::store)?
      .is_some_and(|(u, _)| Some(u.user_id) != except);
    if taken {
      return Err(Error::Validation("email already exists".into()));
    }
    Ok(())
  }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

impl<S: DepotStore> Service<S> {
  pub async fn open_session(
    &self,
    user_id: Uuid,
    token_hash: String,
    ttl: Duration,
  ) -> Result<Session> {
    let now = Utc::now();
    let session = Session {
      token_hash,
      user_id,
      created_at: now,
      expires_at: now + ttl,
    };
    self.store.insert_session(&session).await.map_err(Error::store)?;
    info!(user_id = %user_id, expires_at = %session.expires_at, "session opened");
    Ok(session)
  }

  /// Turn a token digest into the caller it authenticates. Expired sessions
  /// are removed on sight.
  pub async fn resolve_session(&self, token_hash: &str) -> Result<Caller> {
    let unauthorized = || Error::Unauthorized("invalid or expired token".into());

    let session = self
      .store
      .get_session(token_hash)
      .await
      .map_err(Error::store)?
      .ok_or_else(unauthorized)?;

    if session.is_expired(Utc::now()) {
      self.store.delete_session(token_hash).await.map_err(Error::store)?;
      return Err(unauthorized());
    }

    let user = self
      .store
      .get_user(session.user_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(unauthorized)?;

    Ok(Caller { user_id: user.user_id, role: user.role })
  }

  pub async fn close_session(&self, token_hash: &str) -> Result<()> {
    self.store.delete_session(token_hash).await.map_err(Error::store)?;
    Ok(())
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

impl<S: DepotStore> Service<S> {
  pub async fn get_user(&self, caller: &Caller, id: Uuid) -> Result<User> {
    require_owner(caller, id, "user")?;
    self.find_user(id).await
  }

  pub async fn list_users(&self, caller: &Caller) -> Result<Vec<User>> {
    require_admin(caller)?;
    self.store.list_users().await.map_err(Error::store)
  }

  pub async fn update_user(&self, caller: &Caller, id: Uuid, patch: UserPatch) -> Result<User> {
    require_owner(caller, id, "user")?;
    let mut user = self.find_user(id).await?;

    if let Some(username) = required_opt("username", patch.username)? {
      self.ensure_username_free(&username, Some(id)).await?;
      user.username = username;
    }
    if let Some(email) = patch.email {
      let email = validate_email(email)?;
      self.ensure_email_free(&email, Some(id)).await?;
      user.email = email;
    }
    if let Some(first_name) = patch.first_name {
      user.first_name = first_name.trim().to_owned();
    }
    if let Some(last_name) = patch.last_name {
      user.last_name = last_name.trim().to_owned();
    }
    user.updated_at = Some(Utc::now());

    self.save_user(user).await
  }

  pub async fn delete_user(&self, caller: &Caller, id: Uuid) -> Result<()> {
    require_admin(caller)?;
    let user = self.find_user(id).await?;
    self.ensure_not_last_admin(&user, "delete").await?;

    if !self.store.delete_user(id).await.map_err(Error::store)? {
      return Err(not_found("user", id));
    }
    info!(user_id = %id, "user deleted");
    Ok(())
  }

  pub async fn promote(&self, caller: &Caller, id: Uuid) -> Result<User> {
    require_admin(caller)?;
    let mut user = self.find_user(id).await?;
    user.role = Role::Admin;
    user.updated_at = Some(Utc::now());
    self.save_user(user).await
  }

  /// Demote an admin to customer. The last remaining admin cannot be
  /// demoted.
  pub async fn demote(&self, caller: &Caller, id: Uuid) -> Result<User> {
    require_admin(caller)?;
    let mut user = self.find_user(id).await?;
    self.ensure_not_last_admin(&user, "demote").await?;
    user.role = Role::Customer;
    user.updated_at = Some(Utc::now());
    self.save_user(user).await
  }

  async fn find_user(&self, id: Uuid) -> Result<User> {
    self
      .store
      .get_user(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found("user", id))
  }

  async fn save_user(&self, user: User) -> Result<User> {
    if !self.store.update_user(&user).await.map_err(Error::store)? {
      return Err(not_found("user", user.user_id));
    }
    info!(user_id = %user.user_id, role = %user.role, "user updated");
    Ok(user)
  }

  async fn ensure_not_last_admin(&self, user: &User, action: &str) -> Result<()> {
    if user.role != Role::Admin {
      return Ok(());
    }
    let admins = self.store.count_admins().await.map_err(Error::store)?;
    if admins <= 1 {
      return Err(Error::Validation(format!("cannot {action} the last admin")));
    }
    Ok(())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

fn validate_email(email: String) -> Result<String> {
  let email = normalize_email(&email);
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
    _ => Err(Error::Validation("email is not a valid address".into())),
  }
}
