//! The resource service: validation, authorisation and notification on top
//! of a [`DepotStore`].
//!
//! Handlers never touch the store directly. Each operation validates its
//! input, checks the [`Caller`] where ownership or role matters, performs the
//! store writes, and only then hands an [`Event`] to the broadcaster. No
//! operation retries.

mod catalog;
mod orders;
mod tickets;
mod users;

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  event::{Broadcaster, Event},
  store::DepotStore,
  user::Caller,
};

/// Entry point for every resource operation.
///
/// Cloning is cheap; the store and the broadcaster are shared.
pub struct Service<S> {
  store:  Arc<S>,
  events: Arc<dyn Broadcaster>,
}

impl<S> Clone for Service<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      events: Arc::clone(&self.events),
    }
  }
}

impl<S: DepotStore> Service<S> {
  pub fn new(store: Arc<S>, events: Arc<dyn Broadcaster>) -> Self {
    Self { store, events }
  }

  fn publish(&self, event: Event) {
    tracing::debug!(event = event.name(), "publishing change event");
    self.events.broadcast(event);
  }
}

// ─── Shared checks ───────────────────────────────────────────────────────────

fn require_admin(caller: &Caller) -> Result<()> {
  if caller.is_admin() {
    Ok(())
  } else {
    Err(Error::Forbidden("admin role required".into()))
  }
}

fn require_owner(caller: &Caller, owner: Uuid, what: &str) -> Result<()> {
  if caller.may_act_for(owner) {
    Ok(())
  } else {
    Err(Error::Forbidden(format!("not allowed to modify this {what}")))
  }
}

/// Trim `value` and reject it if nothing is left.
fn required(field: &str, value: String) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    Err(Error::Validation(format!("{field} is required")))
  } else {
    Ok(trimmed.to_owned())
  }
}

fn required_opt(field: &str, value: Option<String>) -> Result<Option<String>> {
  value.map(|v| required(field, v)).transpose()
}

fn not_found(what: &str, id: Uuid) -> Error {
  Error::NotFound(format!("{what} {id} not found"))
}
