//! Error types for `depot-core`.
//!
//! Every service operation returns [`Result`]. The variant is the error
//! category the HTTP layer turns into a status code; the payload is the
//! client-visible message.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or malformed, a referenced record does not
  /// exist, or a unique value is already taken.
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Unauthorized(String),

  /// The caller is authenticated but neither owns the record nor is an
  /// admin.
  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The category of an [`Error`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  Unauthorized,
  Forbidden,
  NotFound,
  Store,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Validation(_) => ErrorKind::Validation,
      Error::Unauthorized(_) => ErrorKind::Unauthorized,
      Error::Forbidden(_) => ErrorKind::Forbidden,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::Store(_) => ErrorKind::Store,
    }
  }

  /// Wrap a backend error. A uniqueness conflict reported by the store
  /// becomes [`Error::Validation`] with the store's message.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.conflict() {
      Some(message) => Error::Validation(message),
      None => Error::Store(Box::new(err)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
