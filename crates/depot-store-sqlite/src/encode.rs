//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Order line items are stored as compact JSON.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use depot_core::{
  catalog::{Category, Product, ProductDetail, Tag},
  order::{Order, OrderItem},
  ticket::{StatusLabel, Ticket},
  user::{Role, Session, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_opt_dt(dt: Option<DateTime<Utc>>) -> Option<String> { dt.map(encode_dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Money ────────────────────────────────────────────────────────────────────

pub fn encode_cents(cents: u64) -> Result<i64> {
  i64::try_from(cents).map_err(|_| Error::InvalidColumn {
    column: "price_cents",
    value:  cents.to_string(),
  })
}

pub fn decode_cents(column: &'static str, raw: i64) -> Result<u64> {
  u64::try_from(raw).map_err(|_| Error::InvalidColumn { column, value: raw.to_string() })
}

// ─── Labels ───────────────────────────────────────────────────────────────────

pub fn decode_status(s: String) -> Result<StatusLabel> {
  StatusLabel::new(s.as_str()).map_err(|_| Error::InvalidColumn { column: "status", value: s })
}

pub fn decode_role(s: String) -> Result<Role> {
  Role::from_str(&s).map_err(|_| Error::InvalidColumn { column: "role", value: s })
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_items(items: &[OrderItem]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

/// Decode a `json_group_array(...)` aggregate of strings.
fn decode_string_array(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

fn decode_uuid_array(s: &str) -> Result<Vec<Uuid>> {
  decode_string_array(s)?.iter().map(|s| decode_uuid(s)).collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawTicket`]'s field order.
pub const TICKET_COLUMNS: &str =
  "ticket_id, title, description, status, admin_comment, user_id, created_at, updated_at";

/// Raw strings read directly from a `tickets` row.
pub struct RawTicket {
  pub ticket_id:     String,
  pub title:         String,
  pub description:   String,
  pub status:        String,
  pub admin_comment: Option<String>,
  pub user_id:       String,
  pub created_at:    String,
  pub updated_at:    Option<String>,
}

impl RawTicket {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ticket_id:     row.get(0)?,
      title:         row.get(1)?,
      description:   row.get(2)?,
      status:        row.get(3)?,
      admin_comment: row.get(4)?,
      user_id:       row.get(5)?,
      created_at:    row.get(6)?,
      updated_at:    row.get(7)?,
    })
  }

  pub fn into_ticket(self) -> Result<Ticket> {
    Ok(Ticket {
      ticket_id:     decode_uuid(&self.ticket_id)?,
      title:         self.title,
      description:   self.description,
      status:        decode_status(self.status)?,
      admin_comment: self.admin_comment,
      user_id:       decode_uuid(&self.user_id)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Column list matching [`RawProduct`]'s field order; `p` aliases `products`.
pub const PRODUCT_COLUMNS: &str = "
  p.product_id, p.title, p.description, p.image_url, p.barcode,
  p.price_cents, p.release_date, p.created_at, p.updated_at,
  (SELECT json_group_array(name) FROM (
     SELECT c.name FROM product_categories pc
     JOIN categories c ON c.category_id = pc.category_id
     WHERE pc.product_id = p.product_id
     ORDER BY c.name
  )) AS categories";

pub struct RawProduct {
  pub product_id:   String,
  pub title:        String,
  pub description:  String,
  pub image_url:    String,
  pub barcode:      String,
  pub price_cents:  i64,
  pub release_date: String,
  pub created_at:   String,
  pub updated_at:   Option<String>,
  pub categories:   String,
}

impl RawProduct {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:   row.get(0)?,
      title:        row.get(1)?,
      description:  row.get(2)?,
      image_url:    row.get(3)?,
      barcode:      row.get(4)?,
      price_cents:  row.get(5)?,
      release_date: row.get(6)?,
      created_at:   row.get(7)?,
      updated_at:   row.get(8)?,
      categories:   row.get(9)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      product_id:   decode_uuid(&self.product_id)?,
      title:        self.title,
      description:  self.description,
      image_url:    self.image_url,
      barcode:      self.barcode,
      price_cents:  decode_cents("price_cents", self.price_cents)?,
      release_date: decode_dt(&self.release_date)?,
      categories:   decode_string_array(&self.categories)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Column list matching [`RawCategory`]'s field order; `c` aliases
/// `categories`.
pub const CATEGORY_COLUMNS: &str = "
  c.category_id, c.name, c.created_at, c.updated_at,
  (SELECT json_group_array(product_id) FROM (
     SELECT pc.product_id FROM product_categories pc
     WHERE pc.category_id = c.category_id
     ORDER BY pc.product_id
  )) AS product_ids";

pub struct RawCategory {
  pub category_id: String,
  pub name:        String,
  pub created_at:  String,
  pub updated_at:  Option<String>,
  pub product_ids: String,
}

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      category_id: row.get(0)?,
      name:        row.get(1)?,
      created_at:  row.get(2)?,
      updated_at:  row.get(3)?,
      product_ids: row.get(4)?,
    })
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id: decode_uuid(&self.category_id)?,
      name:        self.name,
      product_ids: decode_uuid_array(&self.product_ids)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Column list matching [`RawTag`]'s field order; `t` aliases `tags`.
pub const TAG_COLUMNS: &str = "
  t.tag_id, t.name, t.created_at, t.updated_at,
  (SELECT json_group_array(product_id) FROM (
     SELECT pt.product_id FROM product_tags pt
     WHERE pt.tag_id = t.tag_id
     ORDER BY pt.product_id
  )) AS product_ids";

pub struct RawTag {
  pub tag_id:      String,
  pub name:        String,
  pub created_at:  String,
  pub updated_at:  Option<String>,
  pub product_ids: String,
}

impl RawTag {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tag_id:      row.get(0)?,
      name:        row.get(1)?,
      created_at:  row.get(2)?,
      updated_at:  row.get(3)?,
      product_ids: row.get(4)?,
    })
  }

  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      tag_id:      decode_uuid(&self.tag_id)?,
      name:        self.name,
      product_ids: decode_uuid_array(&self.product_ids)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_opt_dt(self.updated_at)?,
    })
  }
}

pub const DETAIL_COLUMNS: &str =
  "product_id, specifications, warranty, created_at, updated_at";

pub struct RawDetail {
  pub product_id:     String,
  pub specifications: String,
  pub warranty:       String,
  pub created_at:     String,
  pub updated_at:     Option<String>,
}

impl RawDetail {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:     row.get(0)?,
      specifications: row.get(1)?,
      warranty:       row.get(2)?,
      created_at:     row.get(3)?,
      updated_at:     row.get(4)?,
    })
  }

  pub fn into_detail(self) -> Result<ProductDetail> {
    Ok(ProductDetail {
      product_id:     decode_uuid(&self.product_id)?,
      specifications: self.specifications,
      warranty:       self.warranty,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_opt_dt(self.updated_at)?,
    })
  }
}

pub const ORDER_COLUMNS: &str =
  "order_id, user_id, items, total_cents, status, created_at, updated_at";

pub struct RawOrder {
  pub order_id:    String,
  pub user_id:     String,
  pub items:       String,
  pub total_cents: i64,
  pub status:      String,
  pub created_at:  String,
  pub updated_at:  Option<String>,
}

impl RawOrder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:    row.get(0)?,
      user_id:     row.get(1)?,
      items:       row.get(2)?,
      total_cents: row.get(3)?,
      status:      row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      order_id:    decode_uuid(&self.order_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      items:       serde_json::from_str(&self.items)?,
      total_cents: decode_cents("total_cents", self.total_cents)?,
      status:      decode_status(self.status)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Column list matching [`RawUser`]'s field order. The password hash is the
/// last column so callers that need it can read index 8.
pub const USER_COLUMNS: &str =
  "user_id, username, email, first_name, last_name, role, created_at, updated_at, password_hash";

pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub role:          String,
  pub created_at:    String,
  pub updated_at:    Option<String>,
  pub password_hash: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      first_name:    row.get(3)?,
      last_name:     row.get(4)?,
      role:          row.get(5)?,
      created_at:    row.get(6)?,
      updated_at:    row.get(7)?,
      password_hash: row.get(8)?,
    })
  }

  /// Split into the public user record and the stored password hash.
  pub fn into_user(self) -> Result<(User, String)> {
    let user = User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      email:      self.email,
      first_name: self.first_name,
      last_name:  self.last_name,
      role:       decode_role(self.role)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_opt_dt(self.updated_at)?,
    };
    Ok((user, self.password_hash))
  }
}

pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_survive_encoding() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    assert_eq!(decode_opt_dt(encode_opt_dt(None)).unwrap(), None);
  }

  #[test]
  fn bad_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn negative_cents_are_rejected() {
    assert!(decode_cents("price_cents", -1).is_err());
    assert!(encode_cents(u64::MAX).is_err());
  }

  #[test]
  fn unknown_role_names_the_column() {
    let err = decode_role("root".into()).unwrap_err();
    assert!(err.to_string().contains("role"));
  }
}
