//! Composition helpers for the Chirp server binary.
//!
//! Holds the runtime configuration model and the outer router that mounts the
//! API under `/api` with request tracing.

use std::{path::Path, time::Duration};

use axum::Router;
use chirp_api::AppState;
use chirp_core::{
  directory::IdentityDirectory, limiter::RateLimiter, store::PostStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CHIRP_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: std::path::PathBuf,
  pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       3000,
      store_path: "chirp.db".into(),
      rate_limit: RateLimitConfig::default(),
    }
  }
}

/// Where the write-path limiter keeps its hit log.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LimiterBackend {
  /// In the store's database file; shared by every process using it.
  #[default]
  Sqlite,
  /// In process memory; per-process budgets.
  Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
  pub backend:      LimiterBackend,
  pub max_requests: u32,
  pub window_secs:  u64,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self {
      backend:      LimiterBackend::Sqlite,
      max_requests: 3,
      window_secs:  60,
    }
  }
}

impl RateLimitConfig {
  pub fn window(&self) -> Duration { Duration::from_secs(self.window_secs) }
}

/// Layer the optional TOML file at `path` under `CHIRP_`-prefixed environment
/// variables. Nested keys use `__`, e.g. `CHIRP_RATE_LIMIT__MAX_REQUESTS`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("CHIRP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?
    .try_deserialize()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete HTTP application: the API under `/api`, traced per request.
pub fn app<S, D, L>(state: AppState<S, D, L>) -> Router
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  Router::new()
    .nest("/api", chirp_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::{io::Write as _, sync::Arc};

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chirp_core::limiter::SlidingWindowLimiter;
  use chirp_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = load_config(Path::new("/nonexistent/chirp-config.toml")).unwrap();
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.rate_limit.max_requests, 3);
    assert_eq!(cfg.rate_limit.window(), Duration::from_secs(60));
    assert_eq!(cfg.rate_limit.backend, LimiterBackend::Sqlite);
  }

  #[test]
  fn file_values_override_defaults() {
    let path = std::env::temp_dir().join(format!(
      "chirp-config-{}.toml",
      std::process::id()
    ));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
      file,
      "port = 8080\n\n[rate_limit]\nbackend = \"memory\"\nmax_requests = 5"
    )
    .unwrap();

    let cfg = load_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.rate_limit.backend, LimiterBackend::Memory);
    assert_eq!(cfg.rate_limit.max_requests, 5);
    assert_eq!(cfg.rate_limit.window_secs, 60);
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let limiter = Arc::new(SlidingWindowLimiter::new(3, Duration::from_secs(60)));
    let state = AppState::new(store.clone(), store, limiter);

    let req = Request::builder()
      .uri("/api/trpc/posts.getLatest")
      .body(Body::empty())
      .unwrap();
    let resp = app(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
      .uri("/trpc/posts.getLatest")
      .body(Body::empty())
      .unwrap();
    let resp = app(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
