//! [`SqliteStore`]: the SQLite implementation of [`DepotStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, functions::FunctionFlags};
use uuid::Uuid;

use depot_core::{
  catalog::{Category, Product, ProductDetail, ProductQuery, Tag},
  order::{Order, OrderQuery},
  store::DepotStore,
  ticket::{Ticket, TicketQuery},
  user::{Role, Session, User},
};

use crate::{
  Result,
  encode::{
    CATEGORY_COLUMNS, DETAIL_COLUMNS, ORDER_COLUMNS, PRODUCT_COLUMNS, RawCategory, RawDetail,
    RawOrder, RawProduct, RawSession, RawTag, RawTicket, RawUser, TAG_COLUMNS, TICKET_COLUMNS,
    USER_COLUMNS, encode_cents, encode_dt, encode_items, encode_opt_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Depot store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        register_casefold(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single `DELETE`/`UPDATE` keyed by one text parameter and report
  /// whether any row matched.
  async fn execute_keyed(&self, sql: &'static str, key: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params![key])?))
      .await?;
    Ok(changed > 0)
  }

  async fn count(&self, sql: &'static str, args: Vec<String>) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(sql, rusqlite::params_from_iter(args), |row| row.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }
}

/// `casefold(text)`: full Unicode lowercasing. SQLite's own `lower()` and
/// `LIKE` only fold ASCII.
fn register_casefold(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "casefold",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: String = ctx.get(0)?;
      Ok(text.to_lowercase())
    },
  )
}

fn where_clause(conds: &[&str]) -> String {
  if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  }
}

/// Link `tag_id` to every product in `product_ids`.
fn link_tag_products(
  conn: &rusqlite::Connection,
  tag_id: &str,
  product_ids: &[Uuid],
) -> rusqlite::Result<()> {
  for product_id in product_ids {
    conn.execute(
      "INSERT OR IGNORE INTO product_tags (product_id, tag_id) VALUES (?1, ?2)",
      rusqlite::params![encode_uuid(*product_id), tag_id],
    )?;
  }
  Ok(())
}

/// Link `product_id` to every name in `names`, creating missing categories.
fn link_categories(
  conn: &rusqlite::Connection,
  product_id: &str,
  names: &[String],
  now: &str,
) -> rusqlite::Result<()> {
  for name in names {
    conn.execute(
      "INSERT OR IGNORE INTO categories (category_id, name, created_at) VALUES (?1, ?2, ?3)",
      rusqlite::params![encode_uuid(Uuid::new_v4()), name, now],
    )?;
    conn.execute(
      "INSERT OR IGNORE INTO product_categories (product_id, category_id)
       SELECT ?1, category_id FROM categories WHERE name = ?2",
      rusqlite::params![product_id, name],
    )?;
  }
  Ok(())
}

// ─── DepotStore impl ─────────────────────────────────────────────────────────

impl DepotStore for SqliteStore {
  type Error = crate::Error;

  // ── Tickets ───────────────────────────────────────────────────────────────

  async fn insert_ticket(&self, ticket: &Ticket) -> Result<()> {
    let id_str      = encode_uuid(ticket.ticket_id);
    let title       = ticket.title.clone();
    let description = ticket.description.clone();
    let status      = ticket.status.to_string();
    let comment     = ticket.admin_comment.clone();
    let user_str    = encode_uuid(ticket.user_id);
    let created_str = encode_dt(ticket.created_at);
    let updated_str = encode_opt_dt(ticket.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tickets (
             ticket_id, title, description, status, admin_comment,
             user_id, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            title,
            description,
            status,
            comment,
            user_str,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTicket> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1"),
              rusqlite::params![id_str],
              RawTicket::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTicket::into_ticket).transpose()
  }

  async fn list_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
    let status   = query.status.clone();
    let user_str = query.user_id.map(encode_uuid);

    let raws: Vec<RawTicket> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut args: Vec<&dyn rusqlite::ToSql> = vec![];
        if let Some(s) = &status {
          conds.push("status = ?");
          args.push(s);
        }
        if let Some(u) = &user_str {
          conds.push("user_id = ?");
          args.push(u);
        }

        let sql = format!(
          "SELECT {TICKET_COLUMNS} FROM tickets {} ORDER BY created_at, rowid",
          where_clause(&conds)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(args.as_slice(), RawTicket::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTicket::into_ticket).collect()
  }

  async fn update_ticket(&self, ticket: &Ticket) -> Result<bool> {
    let id_str      = encode_uuid(ticket.ticket_id);
    let title       = ticket.title.clone();
    let description = ticket.description.clone();
    let status      = ticket.status.to_string();
    let comment     = ticket.admin_comment.clone();
    let updated_str = encode_opt_dt(ticket.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tickets
           SET title = ?2, description = ?3, status = ?4, admin_comment = ?5, updated_at = ?6
           WHERE ticket_id = ?1",
          rusqlite::params![id_str, title, description, status, comment, updated_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_ticket(&self, id: Uuid) -> Result<bool> {
    self
      .execute_keyed("DELETE FROM tickets WHERE ticket_id = ?1", encode_uuid(id))
      .await
  }

  // ── Products ──────────────────────────────────────────────────────────────

  async fn insert_product(&self, product: &Product) -> Result<()> {
    let id_str       = encode_uuid(product.product_id);
    let title        = product.title.clone();
    let description  = product.description.clone();
    let image_url    = product.image_url.clone();
    let barcode      = product.barcode.clone();
    let price        = encode_cents(product.price_cents)?;
    let release_str  = encode_dt(product.release_date);
    let created_str  = encode_dt(product.created_at);
    let updated_str  = encode_opt_dt(product.updated_at);
    let categories   = product.categories.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO products (
             product_id, title, description, image_url, barcode,
             price_cents, release_date, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            title,
            description,
            image_url,
            barcode,
            price,
            release_str,
            created_str,
            updated_str,
          ],
        )?;
        link_categories(&tx, &id_str, &categories, &created_str)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.product_id = ?1"),
              rusqlite::params![id_str],
              RawProduct::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProduct::into_product).transpose()
  }

  async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
    let category = query
      .category
      .as_deref()
      .map(str::trim)
      .filter(|c| !c.is_empty())
      .map(str::to_owned);
    let needle = query
      .search
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_lowercase);

    let raws: Vec<RawProduct> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut args: Vec<&dyn rusqlite::ToSql> = vec![];
        if let Some(c) = &category {
          conds.push(
            "EXISTS (SELECT 1 FROM product_categories pc
                     JOIN categories c ON c.category_id = pc.category_id
                     WHERE pc.product_id = p.product_id AND c.name = ?)",
          );
          args.push(c);
        }
        // instr() has no wildcards, so `%` and `_` match literally.
        if let Some(n) = &needle {
          conds.push(
            "(instr(casefold(p.title), ?) > 0 OR instr(casefold(p.description), ?) > 0)",
          );
          args.push(n);
          args.push(n);
        }

        let sql = format!(
          "SELECT {PRODUCT_COLUMNS} FROM products p {} ORDER BY p.created_at, p.rowid",
          where_clause(&conds)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(args.as_slice(), RawProduct::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn update_product(&self, product: &Product) -> Result<bool> {
    let id_str      = encode_uuid(product.product_id);
    let title       = product.title.clone();
    let description = product.description.clone();
    let image_url   = product.image_url.clone();
    let barcode     = product.barcode.clone();
    let price       = encode_cents(product.price_cents)?;
    let release_str = encode_dt(product.release_date);
    let updated_str = encode_opt_dt(product.updated_at);
    let now_str     = encode_dt(product.updated_at.unwrap_or_else(Utc::now));
    let categories  = product.categories.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE products
           SET title = ?2, description = ?3, image_url = ?4, barcode = ?5,
               price_cents = ?6, release_date = ?7, updated_at = ?8
           WHERE product_id = ?1",
          rusqlite::params![
            id_str,
            title,
            description,
            image_url,
            barcode,
            price,
            release_str,
            updated_str,
          ],
        )?;
        if changed == 0 {
          return Ok(0);
        }
        tx.execute(
          "DELETE FROM product_categories WHERE product_id = ?1",
          rusqlite::params![id_str],
        )?;
        link_categories(&tx, &id_str, &categories, &now_str)?;
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    self
      .execute_keyed("DELETE FROM products WHERE product_id = ?1", encode_uuid(id))
      .await
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn insert_category(&self, category: &Category) -> Result<()> {
    let id_str      = encode_uuid(category.category_id);
    let name        = category.name.clone();
    let created_str = encode_dt(category.created_at);
    let updated_str = encode_opt_dt(category.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, name, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, created_str, updated_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.category_id = ?1"),
              rusqlite::params![id_str],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
    let name = name.to_owned();

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.name = ?1"),
              rusqlite::params![name],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {CATEGORY_COLUMNS} FROM categories c ORDER BY c.name"))?;
        let rows = stmt
          .query_map([], RawCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn update_category(&self, category: &Category) -> Result<bool> {
    let id_str      = encode_uuid(category.category_id);
    let name        = category.name.clone();
    let updated_str = encode_opt_dt(category.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE categories SET name = ?2, updated_at = ?3 WHERE category_id = ?1",
          rusqlite::params![id_str, name, updated_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    self
      .execute_keyed("DELETE FROM categories WHERE category_id = ?1", encode_uuid(id))
      .await
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn insert_tag(&self, tag: &Tag) -> Result<()> {
    let id_str      = encode_uuid(tag.tag_id);
    let name        = tag.name.clone();
    let created_str = encode_dt(tag.created_at);
    let updated_str = encode_opt_dt(tag.updated_at);
    let product_ids = tag.product_ids.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO tags (tag_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, created_str, updated_str],
        )?;
        link_tag_products(&tx, &id_str, &product_ids)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.tag_id = ?1"),
              rusqlite::params![id_str],
              RawTag::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }

  async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
    let name = name.to_owned();

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.name = ?1"),
              rusqlite::params![name],
              RawTag::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }

  async fn list_tags(&self) -> Result<Vec<Tag>> {
    let raws: Vec<RawTag> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {TAG_COLUMNS} FROM tags t ORDER BY t.name"))?;
        let rows = stmt
          .query_map([], RawTag::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  async fn update_tag(&self, tag: &Tag) -> Result<bool> {
    let id_str      = encode_uuid(tag.tag_id);
    let name        = tag.name.clone();
    let updated_str = encode_opt_dt(tag.updated_at);
    let product_ids = tag.product_ids.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE tags SET name = ?2, updated_at = ?3 WHERE tag_id = ?1",
          rusqlite::params![id_str, name, updated_str],
        )?;
        if changed == 0 {
          return Ok(0);
        }
        tx.execute("DELETE FROM product_tags WHERE tag_id = ?1", rusqlite::params![id_str])?;
        link_tag_products(&tx, &id_str, &product_ids)?;
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_tag(&self, id: Uuid) -> Result<bool> {
    self
      .execute_keyed("DELETE FROM tags WHERE tag_id = ?1", encode_uuid(id))
      .await
  }

  // ── Product details ───────────────────────────────────────────────────────

  async fn insert_product_detail(&self, detail: &ProductDetail) -> Result<()> {
    let product_str    = encode_uuid(detail.product_id);
    let specifications = detail.specifications.clone();
    let warranty       = detail.warranty.clone();
    let created_str    = encode_dt(detail.created_at);
    let updated_str    = encode_opt_dt(detail.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO product_details (
             product_id, specifications, warranty, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![product_str, specifications, warranty, created_str, updated_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_product_detail(&self, product_id: Uuid) -> Result<Option<ProductDetail>> {
    let product_str = encode_uuid(product_id);

    let raw: Option<RawDetail> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DETAIL_COLUMNS} FROM product_details WHERE product_id = ?1"),
              rusqlite::params![product_str],
              RawDetail::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDetail::into_detail).transpose()
  }

  async fn list_product_details(&self) -> Result<Vec<ProductDetail>> {
    let raws: Vec<RawDetail> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DETAIL_COLUMNS} FROM product_details ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawDetail::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDetail::into_detail).collect()
  }

  async fn update_product_detail(&self, detail: &ProductDetail) -> Result<bool> {
    let product_str    = encode_uuid(detail.product_id);
    let specifications = detail.specifications.clone();
    let warranty       = detail.warranty.clone();
    let updated_str    = encode_opt_dt(detail.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE product_details SET specifications = ?2, warranty = ?3, updated_at = ?4
           WHERE product_id = ?1",
          rusqlite::params![product_str, specifications, warranty, updated_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_product_detail(&self, product_id: Uuid) -> Result<bool> {
    self
      .execute_keyed(
        "DELETE FROM product_details WHERE product_id = ?1",
        encode_uuid(product_id),
      )
      .await
  }

  // ── Orders ────────────────────────────────────────────────────────────────

  async fn insert_order(&self, order: &Order) -> Result<()> {
    let id_str      = encode_uuid(order.order_id);
    let user_str    = encode_uuid(order.user_id);
    let items       = encode_items(&order.items)?;
    let total       = encode_cents(order.total_cents)?;
    let status      = order.status.to_string();
    let created_str = encode_dt(order.created_at);
    let updated_str = encode_opt_dt(order.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO orders (
             order_id, user_id, items, total_cents, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, user_str, items, total, status, created_str, updated_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawOrder> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1"),
              rusqlite::params![id_str],
              RawOrder::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOrder::into_order).transpose()
  }

  async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
    let user_str = query.user_id.map(encode_uuid);
    let status   = query.status.clone();

    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut args: Vec<&dyn rusqlite::ToSql> = vec![];
        if let Some(u) = &user_str {
          conds.push("user_id = ?");
          args.push(u);
        }
        if let Some(s) = &status {
          conds.push("status = ?");
          args.push(s);
        }

        let sql = format!(
          "SELECT {ORDER_COLUMNS} FROM orders {} ORDER BY created_at, rowid",
          where_clause(&conds)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(args.as_slice(), RawOrder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }

  async fn update_order(&self, order: &Order) -> Result<bool> {
    let id_str      = encode_uuid(order.order_id);
    let items       = encode_items(&order.items)?;
    let total       = encode_cents(order.total_cents)?;
    let status      = order.status.to_string();
    let updated_str = encode_opt_dt(order.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE orders SET items = ?2, total_cents = ?3, status = ?4, updated_at = ?5
           WHERE order_id = ?1",
          rusqlite::params![id_str, items, total, status, updated_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    self
      .execute_keyed("DELETE FROM orders WHERE order_id = ?1", encode_uuid(id))
      .await
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, user: &User, password_hash: &str) -> Result<()> {
    let id_str      = encode_uuid(user.user_id);
    let username    = user.username.clone();
    let email       = user.email.clone();
    let first_name  = user.first_name.clone();
    let last_name   = user.last_name.clone();
    let hash        = password_hash.to_owned();
    let role        = user.role.to_string();
    let created_str = encode_dt(user.created_at);
    let updated_str = encode_opt_dt(user.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, username, email, first_name, last_name,
             password_hash, role, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            username,
            email,
            first_name,
            last_name,
            hash,
            role,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user).transpose()?.map(|(user, _)| user))
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              rusqlite::params![email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user).transpose()?.map(|(user, _)| user))
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid"))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_user().map(|(user, _)| user))
      .collect()
  }

  async fn update_user(&self, user: &User) -> Result<bool> {
    let id_str      = encode_uuid(user.user_id);
    let username    = user.username.clone();
    let email       = user.email.clone();
    let first_name  = user.first_name.clone();
    let last_name   = user.last_name.clone();
    let role        = user.role.to_string();
    let updated_str = encode_opt_dt(user.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users
           SET username = ?2, email = ?3, first_name = ?4, last_name = ?5,
               role = ?6, updated_at = ?7
           WHERE user_id = ?1",
          rusqlite::params![id_str, username, email, first_name, last_name, role, updated_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    // Sessions go with the user via ON DELETE CASCADE.
    self
      .execute_keyed("DELETE FROM users WHERE user_id = ?1", encode_uuid(id))
      .await
  }

  async fn count_users(&self) -> Result<u64> {
    self.count("SELECT COUNT(*) FROM users", vec![]).await
  }

  async fn count_admins(&self) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM users WHERE role = ?1", vec![Role::Admin.to_string()])
      .await
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn insert_session(&self, session: &Session) -> Result<()> {
    let token_hash  = session.token_hash.clone();
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![token_hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let token_hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT token_hash, user_id, created_at, expires_at
               FROM sessions WHERE token_hash = ?1",
              rusqlite::params![token_hash],
              |row| {
                Ok(RawSession {
                  token_hash: row.get(0)?,
                  user_id:    row.get(1)?,
                  created_at: row.get(2)?,
                  expires_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<bool> {
    self
      .execute_keyed("DELETE FROM sessions WHERE token_hash = ?1", token_hash.to_owned())
      .await
  }
}
