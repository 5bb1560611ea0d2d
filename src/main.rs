//! # Main — CLI Entry Point
//!
//! Routes CLI subcommands to the metrics proxy.
//!
//! ## Subcommands
//!
//! - `serve`: run the HTTP server (`/api/metrics`, `/api/gateway/status`, dashboard).
//! - `snapshot`: build one metrics snapshot and print it as JSON.
//! - `check`: probe the gateway root once and print the status as JSON.
//!
//! ## Global Options
//!
//! - `--gateway-url` / `GATEWAY_URL`: upstream gateway base URL (default `http://localhost:3000`).
//! - `--config` / `METRICS_CONFIG`: optional TOML file with endpoint candidates and timeouts.
//! - `LOG_FORMAT=json`: JSON log lines; `RUST_LOG` sets the filter (default `info`).

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "agent-metrics",
    about = "Aggregate agent gateway metrics and serve them to a dashboard"
)]
struct Cli {
    /// Upstream gateway base URL
    #[arg(long, env = "GATEWAY_URL")]
    gateway_url: Option<String>,

    /// TOML file overriding endpoint candidates and timeouts
    #[arg(long, env = "METRICS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the metrics API and dashboard over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = agent_metrics::config::DEFAULT_PORT)]
        port: u16,
        /// Directory to serve static files from instead of the built-in page
        #[arg(long)]
        static_dir: Option<PathBuf>,
        /// Probe the gateway root every N seconds in the background (0 = off)
        #[arg(long)]
        probe_interval_secs: Option<u64>,
    },
    /// Print one metrics snapshot as JSON and exit
    Snapshot,
    /// Check gateway connectivity once and print the status as JSON
    Check,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // LOG_FORMAT=json for log shippers, human-readable otherwise. Logs go to stderr.
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let rt = tokio::runtime::Runtime::new()?;

    match &cli.command {
        Commands::Serve {
            port,
            static_dir,
            probe_interval_secs,
        } => rt.block_on(cli::run_serve(
            &cli,
            *port,
            static_dir.as_deref(),
            *probe_interval_secs,
        )),
        Commands::Snapshot => rt.block_on(cli::run_snapshot(&cli)),
        Commands::Check => rt.block_on(cli::run_check(&cli)),
    }
}
