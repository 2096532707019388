// src/logging.rs
// =============================================================================
// Logging setup.
//
// Crawl progress goes through `tracing` and is written to stderr, so stdout
// only ever carries the final summary (or the --json report).
//
// RUST_LOG controls what you see, defaulting to "info":
//   RUST_LOG=debug                  also show every skipped link
//   RUST_LOG=site_mapper=warn       only fetch failures
// =============================================================================

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}
