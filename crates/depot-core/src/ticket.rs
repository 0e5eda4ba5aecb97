//! Tickets: support requests raised by users and worked by admins.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status label ────────────────────────────────────────────────────────────

/// A free-form status label such as `Open`, `InProgress` or `Closed`.
///
/// Any trimmed, non-empty label up to [`StatusLabel::MAX_LEN`] characters is
/// accepted. No transition rules are enforced between labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatusLabel(String);

impl StatusLabel {
  pub const MAX_LEN: usize = 64;

  pub fn new(label: impl Into<String>) -> Result<Self> {
    let label = label.into();
    let trimmed = label.trim();
    if trimmed.is_empty() {
      return Err(Error::Validation("status must not be empty".into()));
    }
    if trimmed.chars().count() > Self::MAX_LEN {
      return Err(Error::Validation(format!(
        "status must be at most {} characters",
        Self::MAX_LEN
      )));
    }
    Ok(Self(trimmed.to_owned()))
  }

  /// Label assigned to tickets that do not name one.
  pub fn open() -> Self { Self("Open".to_owned()) }

  /// Label assigned to new orders.
  pub fn pending() -> Self { Self("Pending".to_owned()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for StatusLabel {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<StatusLabel> for String {
  fn from(value: StatusLabel) -> Self { value.0 }
}

impl fmt::Display for StatusLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Ticket ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:     Uuid,
  pub title:         String,
  pub description:   String,
  pub status:        StatusLabel,
  pub admin_comment: Option<String>,
  /// The user who raised the ticket.
  pub user_id:       Uuid,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
}

/// Input for [`Service::create_ticket`](crate::service::Service::create_ticket).
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
  pub title:       String,
  pub description: String,
  #[serde(default)]
  pub status:      Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketPatch {
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub status:        Option<String>,
  pub admin_comment: Option<String>,
}

/// Filters for listing tickets. Empty means "all tickets".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketQuery {
  pub status:  Option<String>,
  pub user_id: Option<Uuid>,
}
