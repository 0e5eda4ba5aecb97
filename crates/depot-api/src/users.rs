//! Handlers for `/users` endpoints.
//!
//! | Method   | Path          | Notes |
//! |----------|---------------|-------|
//! | `GET`    | `/users`      | Admin |
//! | `POST`   | `/users`      | Admin; creates a customer account |
//! | `GET`    | `/users/{id}` | Self or admin |
//! | `PUT`    | `/users/{id}` | Self or admin |
//! | `DELETE` | `/users/{id}` | Admin; the last admin cannot be deleted |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  store::DepotStore,
  user::{User, UserPatch},
};
use uuid::Uuid;

use crate::{
  AppState,
  account::{Credentials, checked_password_hash},
  auth::Authenticated,
  error::ApiError,
};

pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.list_users(&auth.caller).await?))
}

/// `POST /users`: same body as `/auth/register`, but no session is opened.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  if !auth.caller.is_admin() {
    return Err(ApiError::Forbidden("admin role required".into()));
  }
  let (user, password) = body.split();
  let hash = checked_password_hash(password).await?;
  let user = state.service.create_user(&auth.caller, user, &hash).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.get_user(&auth.caller, id).await?))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.update_user(&auth.caller, id, patch).await?))
}

pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.delete_user(&auth.caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
