//! Handlers for `/orders` endpoints. Every route needs a bearer token;
//! customers only ever see their own orders.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  order::{NewOrder, Order, OrderPatch, OrderQuery},
  store::DepotStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /orders[?user_id=<uuid>&status=<label>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.list_orders(&auth.caller, query).await?))
}

/// `GET /orders/user/{user_id}`
pub async fn list_for_user<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Order>>, ApiError>
where
  S: DepotStore + 'static,
{
  let query = OrderQuery { user_id: Some(user_id), status: None };
  Ok(Json(state.service.list_orders(&auth.caller, query).await?))
}

/// `POST /orders`: body: `{"items":[{"product_id":..,"quantity":2}]}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewOrder>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let order = state.service.create_order(&auth.caller, body).await?;
  Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.get_order(&auth.caller, id).await?))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<OrderPatch>,
) -> Result<Json<Order>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.update_order(&auth.caller, id, patch).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PUT /orders/{id}/status`: admin only; body: `{"status":"Shipped"}`
pub async fn set_status<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.set_order_status(&auth.caller, id, body.status).await?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.delete_order(&auth.caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
