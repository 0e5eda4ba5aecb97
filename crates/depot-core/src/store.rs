//! The `DepotStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `depot-store-sqlite`).
//! The service layer depends on this abstraction, not on any concrete
//! backend. The store does no validation or authorisation; it only persists
//! what the service hands it.
//!
//! `update_*` and `delete_*` return `false` when no row matched the id.

use std::future::Future;

use uuid::Uuid;

use crate::{
  catalog::{Category, Product, ProductDetail, ProductQuery, Tag},
  order::{Order, OrderQuery},
  ticket::{Ticket, TicketQuery},
  user::{Session, User},
};

/// Errors a store backend reports back to the service.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// A client-facing message when the failed write broke a uniqueness
  /// constraint, e.g. two sign-ups racing for the same email.
  fn conflict(&self) -> Option<String> { None }
}

/// Abstraction over a Depot store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DepotStore: Send + Sync {
  type Error: StoreError;

  // ── Tickets ───────────────────────────────────────────────────────────

  fn insert_ticket<'a>(
    &'a self,
    ticket: &'a Ticket,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_ticket(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Ticket>, Self::Error>> + Send + '_;

  /// All tickets matching every set filter, oldest first.
  fn list_tickets<'a>(
    &'a self,
    query: &'a TicketQuery,
  ) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + 'a;

  /// Replace the stored ticket with the same `ticket_id`.
  fn update_ticket<'a>(
    &'a self,
    ticket: &'a Ticket,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn delete_ticket(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Products ──────────────────────────────────────────────────────────

  /// Insert a product and link it to `product.categories`, creating any
  /// category name that does not exist yet.
  fn insert_product<'a>(
    &'a self,
    product: &'a Product,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_product(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  fn list_products<'a>(
    &'a self,
    query: &'a ProductQuery,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + 'a;

  /// Replace the product row and its whole category link set.
  fn update_product<'a>(
    &'a self,
    product: &'a Product,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete a product with its category and tag links and its details.
  fn delete_product(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  fn insert_category<'a>(
    &'a self,
    category: &'a Category,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  fn find_category_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + 'a;

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// Update name and timestamps. `product_ids` is ignored.
  fn update_category<'a>(
    &'a self,
    category: &'a Category,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn delete_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Insert a tag and link it to `tag.product_ids`.
  fn insert_tag<'a>(
    &'a self,
    tag: &'a Tag,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_tag(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  fn find_tag_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + 'a;

  fn list_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  /// Replace the tag's name, timestamps and whole product link set.
  fn update_tag<'a>(
    &'a self,
    tag: &'a Tag,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn delete_tag(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Product details ───────────────────────────────────────────────────

  fn insert_product_detail<'a>(
    &'a self,
    detail: &'a ProductDetail,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_product_detail(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Option<ProductDetail>, Self::Error>> + Send + '_;

  fn list_product_details(
    &self,
  ) -> impl Future<Output = Result<Vec<ProductDetail>, Self::Error>> + Send + '_;

  fn update_product_detail<'a>(
    &'a self,
    detail: &'a ProductDetail,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn delete_product_detail(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Orders ────────────────────────────────────────────────────────────

  fn insert_order<'a>(
    &'a self,
    order: &'a Order,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_order(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  fn list_orders<'a>(
    &'a self,
    query: &'a OrderQuery,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;

  fn update_order<'a>(
    &'a self,
    order: &'a Order,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn delete_order(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn insert_user<'a>(
    &'a self,
    user: &'a User,
    password_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by email, returning the stored password hash with it.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<(User, String)>, Self::Error>> + Send + 'a;

  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Update profile fields, role and timestamps. The password hash is kept.
  fn update_user<'a>(
    &'a self,
    user: &'a User,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete a user and every session they hold.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn count_users(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn count_admins(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn insert_session<'a>(
    &'a self,
    session: &'a Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
