//! inkwell server binary.
//!
//! Reads `inkwell.toml` (or the path given with `--config`) plus `INKWELL_*`
//! environment overrides, opens the SQLite store and serves the JSON API.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use inkwell_server::{ServerConfig, app_state, build_app};
use inkwell_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Inkwell feed server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "inkwell.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cfg.feed_cache_ttl_secs == 0 {
    info!("feed cache disabled");
  }
  let app = build_app(app_state(store, &cfg)?);

  let address = cfg.address();
  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  info!("shutting down");
}
