//! Products, the categories and tags that group them, and per-product
//! details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest amount, in minor units, a price or an order total may hold.
pub const MAX_CENTS: u64 = i64::MAX as u64;

// ─── Product ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub product_id:   Uuid,
  pub title:        String,
  pub description:  String,
  pub image_url:    String,
  pub barcode:      String,
  /// Price in minor currency units.
  pub price_cents:  u64,
  pub release_date: DateTime<Utc>,
  /// Names of the categories this product is tagged with, sorted.
  pub categories:   Vec<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub title:        String,
  #[serde(default)]
  pub description:  String,
  #[serde(default)]
  pub image_url:    String,
  pub barcode:      String,
  pub price_cents:  u64,
  /// Defaults to the creation time.
  pub release_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub categories:   Vec<String>,
}

/// Partial update. `categories: Some(..)` replaces the whole category set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub title:        Option<String>,
  pub description:  Option<String>,
  pub image_url:    Option<String>,
  pub barcode:      Option<String>,
  pub price_cents:  Option<u64>,
  pub release_date: Option<DateTime<Utc>>,
  pub categories:   Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
  /// Exact category name.
  pub category: Option<String>,
  /// Case-insensitive substring over title and description.
  pub search:   Option<String>,
}

// ─── Category ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: Uuid,
  pub name:        String,
  /// Products tagged with this category. Derived on read.
  #[serde(default)]
  pub product_ids: Vec<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub name: String,
}

// ─── Tag ─────────────────────────────────────────────────────────────────────

/// A named group of products, independent of categories. Membership is set
/// from the tag side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:      Uuid,
  pub name:        String,
  /// Sorted and unique.
  pub product_ids: Vec<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
  pub name:        String,
  #[serde(default)]
  pub product_ids: Vec<Uuid>,
}

/// Partial update. `product_ids: Some(..)` replaces the whole member set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagPatch {
  pub name:        Option<String>,
  pub product_ids: Option<Vec<Uuid>>,
}

// ─── Product details ─────────────────────────────────────────────────────────

/// Specifications and warranty terms for one product. At most one per
/// product, keyed by `product_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
  pub product_id:     Uuid,
  pub specifications: String,
  pub warranty:       String,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProductDetail {
  pub product_id:     Uuid,
  #[serde(default)]
  pub specifications: String,
  #[serde(default)]
  pub warranty:       String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDetailPatch {
  pub specifications: Option<String>,
  pub warranty:       Option<String>,
}

/// Trim, drop blanks, and de-duplicate a list of category names, keeping
/// them sorted so stored and returned order is stable.
pub fn normalize_category_names(names: Vec<String>) -> Vec<String> {
  let mut names: Vec<String> = names
    .into_iter()
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
    .collect();
  names.sort();
  names.dedup();
  names
}

/// Sort and de-duplicate a list of product ids.
pub fn normalize_product_ids(mut ids: Vec<Uuid>) -> Vec<Uuid> {
  ids.sort();
  ids.dedup();
  ids
}
