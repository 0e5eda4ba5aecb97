//! Runtime configuration, layered from an optional TOML file and `DEPOT_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, ensure};
use serde::Deserialize;

/// Environment variables with this prefix override file values, e.g.
/// `DEPOT_PORT=9000`.
pub const ENV_PREFIX: &str = "DEPOT";

/// Upper bound for `session_ttl_hours`: ten years.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  pub session_ttl_hours: i64,
  /// Events buffered per hub subscriber before it starts skipping.
  pub event_capacity:    usize,
  /// Browser origins allowed to call the API. Empty disables CORS.
  pub cors_origins:      Vec<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      store_path:        PathBuf::from("depot.sqlite3"),
      session_ttl_hours: 168,
      event_capacity:    256,
      cors_origins:      Vec::new(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and then the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Reject values that would overflow later arithmetic.
  pub fn validate(&self) -> anyhow::Result<()> {
    ensure!(
      (1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours),
      "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
      self.session_ttl_hours
    );
    Ok(())
  }

  pub fn session_ttl(&self) -> chrono::Duration { chrono::Duration::hours(self.session_ttl_hours) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("depot.sqlite3"));
    assert_eq!(cfg.session_ttl_hours, 168);
    assert_eq!(cfg.event_capacity, 256);
    assert!(cfg.cors_origins.is_empty());
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = from_toml(
      r#"
        port = 9000
        store_path = "~/depot/data.sqlite3"
        cors_origins = ["http://localhost:5173"]
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("~/depot/data.sqlite3"));
    assert_eq!(cfg.cors_origins, ["http://localhost:5173"]);
  }

  #[test]
  fn session_ttl_must_be_positive_and_bounded() {
    assert!(from_toml("").validate().is_ok());
    for hours in [0, -1, MAX_SESSION_TTL_HOURS + 1, i64::MAX] {
      let cfg = from_toml(&format!("session_ttl_hours = {hours}"));
      let err = cfg.validate().unwrap_err();
      assert!(err.to_string().contains("session_ttl_hours"), "{hours}: {err}");
    }
    let cfg = from_toml(&format!("session_ttl_hours = {MAX_SESSION_TTL_HOURS}"));
    assert_eq!(cfg.session_ttl(), chrono::Duration::hours(MAX_SESSION_TTL_HOURS));
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/depot.toml")).unwrap();
    assert_eq!(cfg.event_capacity, 256);
  }
}
