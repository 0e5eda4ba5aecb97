//! Handlers for `/auth` endpoints: sign-up, login, logout, and role changes.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use depot_core::{
  store::DepotStore,
  user::{NewUser, Role, User},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{self, Authenticated},
  error::ApiError,
};

// ─── Bodies ───────────────────────────────────────────────────────────────────

/// Account details plus the plaintext password.
#[derive(Debug, Deserialize)]
pub struct Credentials {
  pub username:   String,
  pub email:      String,
  pub password:   String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
}

impl Credentials {
  pub fn split(self) -> (NewUser, String) {
    let user = NewUser {
      username:   self.username,
      email:      self.email,
      first_name: self.first_name,
      last_name:  self.last_name,
    };
    (user, self.password)
  }
}

#[derive(Debug, Deserialize)]
pub struct Login {
  pub email:    String,
  pub password: String,
}

/// Issued on successful register or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
  pub token:      String,
  pub user_id:    Uuid,
  pub username:   String,
  pub role:       Role,
  pub expires_at: DateTime<Utc>,
}

/// Reject an empty password, otherwise hash it off the async workers.
pub async fn checked_password_hash(password: String) -> Result<String, ApiError> {
  if password.is_empty() {
    return Err(ApiError::BadRequest("password is required".into()));
  }
  auth::blocking(move || auth::hash_password(&password)).await?
}

async fn issue_session<S>(state: &AppState<S>, user: &User) -> Result<AuthResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let token = auth::new_token();
  let session = state
    .service
    .open_session(user.user_id, auth::token_digest(&token), state.auth.session_ttl)
    .await?;
  Ok(AuthResponse {
    token,
    user_id: user.user_id,
    username: user.username.clone(),
    role: user.role,
    expires_at: session.expires_at,
  })
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `POST /auth/register`: the very first account becomes an admin.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let (new_user, password) = body.split();
  let hash = checked_password_hash(password).await?;
  let user = state.service.register(new_user, &hash).await?;
  let response = issue_session(&state, &user).await?;
  Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Login>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: DepotStore + 'static,
{
  let rejected = || ApiError::Unauthorized("invalid email or password".into());

  let (user, hash) = state
    .service
    .credentials_for_email(&body.email)
    .await?
    .ok_or_else(rejected)?;
  let password = body.password;
  if !auth::blocking(move || auth::verify_password(&password, &hash)).await? {
    info!(user_id = %user.user_id, "login rejected");
    return Err(rejected());
  }

  Ok(Json(issue_session(&state, &user).await?))
}

/// `POST /auth/logout`: ends the session the request was made with.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.close_session(&auth.token_hash).await?;
  info!(user_id = %auth.caller.user_id, "session closed");
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/promote/{user_id}`
pub async fn promote<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.promote(&auth.caller, user_id).await?))
}

/// `POST /auth/demote/{user_id}`: fails for the last remaining admin.
pub async fn demote<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.demote(&auth.caller, user_id).await?))
}
