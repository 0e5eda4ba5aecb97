//! Error type for `depot-store-sqlite`.

use depot_core::store::StoreError;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value the domain type does not accept.
  #[error("invalid {column} value: {value:?}")]
  InvalidColumn { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  /// Unique and primary-key violations, named after the offending column.
  fn conflict(&self) -> Option<String> {
    let Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      err,
      Some(message),
    ))) = self
    else {
      return None;
    };
    match err.extended_code {
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
        // e.g. "UNIQUE constraint failed: users.email"
        let column = message.rsplit_once('.').map_or(message.as_str(), |(_, c)| c);
        Some(format!("{column} already exists"))
      }
      _ => None,
    }
  }
}
