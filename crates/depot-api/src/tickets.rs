//! Handlers for `/tickets` endpoints.
//!
//! | Method   | Path            | Notes |
//! |----------|-----------------|-------|
//! | `GET`    | `/tickets`      | Optional `?status=<label>&user_id=<uuid>` |
//! | `POST`   | `/tickets`      | Bearer; body: `{"title":..,"description":..}` |
//! | `GET`    | `/tickets/{id}` | 404 if not found |
//! | `PUT`    | `/tickets/{id}` | Bearer; owner or admin |
//! | `DELETE` | `/tickets/{id}` | Bearer; owner or admin |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  store::DepotStore,
  ticket::{NewTicket, Ticket, TicketPatch, TicketQuery},
};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /tickets[?status=<label>&user_id=<uuid>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(query): Query<TicketQuery>,
) -> Result<Json<Vec<Ticket>>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.list_tickets(&query).await?))
}

/// `POST /tickets`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewTicket>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let ticket = state.service.create_ticket(&auth.caller, body).await?;
  Ok((StatusCode::CREATED, Json(ticket)))
}

/// `GET /tickets/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Ticket>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.get_ticket(id).await?))
}

/// `PUT /tickets/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<TicketPatch>,
) -> Result<Json<Ticket>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.update_ticket(&auth.caller, id, patch).await?))
}

/// `DELETE /tickets/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.delete_ticket(&auth.caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
