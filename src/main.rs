//! Pollenwacht - HTTP API for LUMC pollen counts
//!
//! Scrapes the LUMC pollen dashboard on demand, caches the parsed page for a
//! short TTL, and serves the table, per-pollen totals and history graphs over
//! a small JSON/PNG API.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pollenwacht::cli::{Cli, ServerConfig};
use pollenwacht::data::PollenClient;
use pollenwacht::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::from_cli(&cli);

    let client = PollenClient::new(config.base_url.clone(), config.cache_ttl, config.timeout)?;
    server::run_server(Arc::new(client), config.addr).await
}
