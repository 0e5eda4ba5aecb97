//! JSON REST API and real-time hub for Depot.
//!
//! Exposes an axum [`Router`] backed by any [`depot_core::store::DepotStore`].
//! REST routes live under `/api`; `GET /hub` upgrades to a WebSocket that
//! streams change events. TLS and process concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let hub   = Hub::new(256);
//! let state = AppState::new(Arc::new(store), hub, AuthConfig::default());
//! axum::serve(listener, depot_api::router(state)).await?;
//! ```

pub mod account;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod hub;
pub mod orders;
pub mod tickets;
pub mod users;

pub use error::ApiError;
pub use hub::Hub;

use std::sync::Arc;

use axum::{
  Json, Router,
  response::IntoResponse,
  routing::{get, post, put},
};
use depot_core::{service::Service, store::DepotStore};
use serde_json::json;

use auth::AuthConfig;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub service: Service<S>,
  pub hub:     Hub,
  pub auth:    Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      service: self.service.clone(),
      hub:     self.hub.clone(),
      auth:    Arc::clone(&self.auth),
    }
  }
}

impl<S: DepotStore> AppState<S> {
  /// Wire `store` to a service that publishes its events on `hub`.
  pub fn new(store: Arc<S>, hub: Hub, auth: AuthConfig) -> Self {
    let service = Service::new(store, Arc::new(hub.clone()));
    Self { service, hub, auth: Arc::new(auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete Depot router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DepotStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route("/hub", get(hub::connect::<S>))
    .nest("/api", api_router::<S>())
    .with_state(state)
}

fn api_router<S>() -> Router<AppState<S>>
where
  S: DepotStore + 'static,
{
  Router::new()
    // Tickets
    .route("/tickets", get(tickets::list::<S>).post(tickets::create::<S>))
    .route(
      "/tickets/{id}",
      get(tickets::get_one::<S>)
        .put(tickets::update::<S>)
        .delete(tickets::delete::<S>),
    )
    // Catalogue
    .route("/products", get(catalog::list_products::<S>).post(catalog::create_product::<S>))
    .route(
      "/products/{id}",
      get(catalog::get_product::<S>)
        .put(catalog::update_product::<S>)
        .delete(catalog::delete_product::<S>),
    )
    .route(
      "/categories",
      get(catalog::list_categories::<S>).post(catalog::create_category::<S>),
    )
    .route(
      "/categories/{id}",
      get(catalog::get_category::<S>)
        .put(catalog::rename_category::<S>)
        .delete(catalog::delete_category::<S>),
    )
    .route("/tags", get(catalog::list_tags::<S>).post(catalog::create_tag::<S>))
    .route(
      "/tags/{id}",
      get(catalog::get_tag::<S>)
        .put(catalog::update_tag::<S>)
        .delete(catalog::delete_tag::<S>),
    )
    .route(
      "/product-details",
      get(catalog::list_product_details::<S>).post(catalog::create_product_detail::<S>),
    )
    .route(
      "/product-details/{product_id}",
      get(catalog::get_product_detail::<S>)
        .put(catalog::update_product_detail::<S>)
        .delete(catalog::delete_product_detail::<S>),
    )
    // Orders
    .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
    .route(
      "/orders/{id}",
      get(orders::get_one::<S>)
        .put(orders::update::<S>)
        .delete(orders::delete::<S>),
    )
    .route("/orders/{id}/status", put(orders::set_status::<S>))
    .route("/orders/user/{user_id}", get(orders::list_for_user::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      get(users::get_one::<S>)
        .put(users::update::<S>)
        .delete(users::delete::<S>),
    )
    // Accounts
    .route("/auth/register", post(account::register::<S>))
    .route("/auth/login", post(account::login::<S>))
    .route("/auth/logout", post(account::logout::<S>))
    .route("/auth/promote/{user_id}", post(account::promote::<S>))
    .route("/auth/demote/{user_id}", post(account::demote::<S>))
}

/// `GET /health`
async fn health() -> impl IntoResponse { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests;
