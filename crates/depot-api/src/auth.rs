//! Password hashing, bearer session tokens and the [`Authenticated`]
//! extractor.
//!
//! A token is 32 bytes from the OS RNG, URL-safe base64 without padding.
//! Only `hex(sha256(token))` is ever stored.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::Duration;
use depot_core::{store::DepotStore, user::Caller};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

use crate::{AppState, error::ApiError};

/// Session settings for this server instance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
  /// How long an issued token stays valid.
  pub session_ttl: Duration,
}

impl Default for AuthConfig {
  fn default() -> Self { Self { session_ttl: Duration::hours(168) } }
}

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Hash `password` into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}").into()))
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// Run CPU-heavy password work on the blocking pool.
pub async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
  F: FnOnce() -> T + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(work)
    .await
    .map_err(|e| ApiError::Internal(Box::new(e)))
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  B64.encode(bytes)
}

/// The digest under which a token's session is stored.
pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// The raw token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a live session token.
#[derive(Debug, Clone)]
pub struct Authenticated {
  pub caller:     Caller,
  /// Digest of the presented token, used to close the session on logout.
  pub token_hash: String,
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: DepotStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;
    let token_hash = token_digest(token);
    let caller = state.service.resolve_session(&token_hash).await?;
    Ok(Authenticated { caller, token_hash })
  }
}
