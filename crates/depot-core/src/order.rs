//! Orders and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ticket::StatusLabel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub order_id:    Uuid,
  pub user_id:     Uuid,
  pub items:       Vec<OrderItem>,
  pub total_cents: u64,
  pub status:      StatusLabel,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  Option<DateTime<Utc>>,
}

/// One priced order line. The price is the product's price at the time the
/// line was (re)priced, not a live reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub product_id:           Uuid,
  pub quantity:             u32,
  pub price_at_order_cents: u64,
}

impl OrderItem {
  pub fn line_total(&self) -> Option<u64> {
    self.price_at_order_cents.checked_mul(u64::from(self.quantity))
  }
}

/// Sum of all line totals, or `None` on overflow.
pub fn order_total(items: &[OrderItem]) -> Option<u64> {
  items
    .iter()
    .try_fold(0u64, |acc, item| acc.checked_add(item.line_total()?))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
  pub product_id: Uuid,
  pub quantity:   u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
  /// Defaults to the caller. Only admins may order on behalf of others.
  #[serde(default)]
  pub user_id: Option<Uuid>,
  pub items:   Vec<NewOrderItem>,
}

/// Partial update. `items: Some(..)` replaces and re-prices every line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
  pub status: Option<String>,
  pub items:  Option<Vec<NewOrderItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
  pub user_id: Option<Uuid>,
  pub status:  Option<String>,
}
