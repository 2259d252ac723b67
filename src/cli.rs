//! Command-line interface parsing for the pollen server
//!
//! This module handles parsing of CLI arguments using clap, with environment
//! fallbacks for the listen port (`PORT`) and the upstream base URL
//! (`LUMC_BASE_URL`).

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::data::DEFAULT_BASE_URL;

/// Pollenwacht - serve LUMC pollen counts over HTTP
#[derive(Parser, Debug)]
#[command(name = "pollenwacht")]
#[command(about = "HTTP API serving LUMC pollen counts scraped from the public dashboard")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Base URL of the upstream pollen dashboard
    #[arg(long, env = "LUMC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Seconds to keep the scraped page cached before refetching
    #[arg(long, default_value_t = 900)]
    pub cache_ttl: u64,

    /// Timeout in seconds for upstream requests
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,
}

/// Configuration derived from CLI arguments for server startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the server binds to
    pub addr: SocketAddr,
    /// Upstream base URL, normalized to end with a slash
    pub base_url: String,
    /// How long a fetched page stays cached
    pub cache_ttl: Duration,
    /// Timeout applied to upstream requests
    pub timeout: Duration,
}

impl ServerConfig {
    /// Creates a ServerConfig from parsed CLI arguments.
    ///
    /// Graph links are joined to the base URL by concatenation, so a missing
    /// trailing slash is added here.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut base_url = cli.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], cli.port)),
            base_url,
            cache_ttl: Duration::from_secs(cli.cache_ttl),
            timeout: Duration::from_secs(cli.timeout),
        }
    }
}
