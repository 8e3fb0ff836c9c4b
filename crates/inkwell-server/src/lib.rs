//! Server assembly for Inkwell: configuration, application state and the
//! HTTP router with request tracing.

use std::{
  num::NonZeroUsize,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, bail};
use axum::Router;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use inkwell_api::{AppState, api_router};
use inkwell_core::{
  cache::{DEFAULT_CACHE_CAPACITY, FeedCache, NoCache, TtlCache},
  feed::{DEFAULT_CACHE_TTL, FeedBuilder, FeedSettings},
  paginate::DEFAULT_PAGE_SIZE,
  store::PostStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `INKWELL_PORT=9000`.
pub const ENV_PREFIX: &str = "INKWELL";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `inkwell.toml` and the
/// environment. Every key is optional.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub page_size:           usize,
  /// Zero disables feed caching.
  pub feed_cache_ttl_secs: u64,
  /// Most cached feed pages held at once.
  pub feed_cache_capacity: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".into(),
      port:                8000,
      store_path:          PathBuf::from("inkwell.db"),
      page_size:           DEFAULT_PAGE_SIZE.get(),
      feed_cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
      feed_cache_capacity: DEFAULT_CACHE_CAPACITY.get(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) layered under `INKWELL_*` environment
  /// variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
    )
  }

  pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let cfg: Self = builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.feed_settings()?;
    cfg.feed_cache()?;
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store path with a leading `~/` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.feed_cache_ttl_secs) }

  pub fn feed_settings(&self) -> anyhow::Result<FeedSettings> {
    let Some(page_size) = NonZeroUsize::new(self.page_size) else {
      bail!("page_size must be greater than zero");
    };
    Ok(FeedSettings {
      page_size,
      cache_ttl: self.cache_ttl(),
    })
  }

  /// The feed cache this configuration asks for.
  pub fn feed_cache(&self) -> anyhow::Result<Arc<dyn FeedCache>> {
    if self.feed_cache_ttl_secs == 0 {
      return Ok(Arc::new(NoCache));
    }
    let Some(capacity) = NonZeroUsize::new(self.feed_cache_capacity) else {
      bail!("feed_cache_capacity must be greater than zero");
    };
    Ok(Arc::new(TtlCache::with_capacity(capacity)))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Wire `store` into the feed builder described by `cfg`.
pub fn app_state<S: PostStore>(store: S, cfg: &ServerConfig) -> anyhow::Result<AppState<S>> {
  let store = Arc::new(store);
  let feeds = FeedBuilder::new(store.clone(), cfg.feed_cache()?, cfg.feed_settings()?);
  Ok(AppState { store, feeds: Arc::new(feeds) })
}

/// The full HTTP application: the API router wrapped in per-request tracing.
pub fn build_app<S>(state: AppState<S>) -> Router
where
  S: PostStore + 'static,
{
  api_router(state).layer(TraceLayer::new_for_http())
}
