//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Each function
//! resolves configuration, builds the shared [`MetricsService`], and runs
//! one subcommand.

use agent_metrics::aggregator::MetricsService;
use agent_metrics::config::{Config, Overrides};
use agent_metrics::dashboard;
use agent_metrics::gateway::GatewayClient;
use agent_metrics::prom_metrics::Metrics;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::Cli;

fn load_config(cli: &Cli, probe_interval_secs: Option<u64>) -> Result<Config> {
    let overrides = Overrides {
        gateway_url: cli.gateway_url.clone(),
        probe_interval_secs,
    };
    Config::load(cli.config.as_deref(), &overrides)
}

fn build_service(config: Config) -> Result<MetricsService> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("agent-metrics/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    Ok(MetricsService::new(
        config,
        GatewayClient::with_client(http),
        Arc::new(Metrics::new()),
    ))
}

pub async fn run_serve(
    cli: &Cli,
    port: u16,
    static_dir: Option<&Path>,
    probe_interval_secs: Option<u64>,
) -> Result<()> {
    let config = load_config(cli, probe_interval_secs)?;
    info!(
        gateway = %config.gateway_url,
        sessions = config.session_endpoints.len(),
        agents = config.agent_endpoints.len(),
        attempt_timeout_ms = config.attempt_timeout.as_millis() as u64,
        "configuration loaded"
    );
    if let Some(dir) = static_dir {
        anyhow::ensure!(dir.is_dir(), "static dir {} does not exist", dir.display());
    }
    let service = build_service(config)?;
    dashboard::run(port, service, static_dir).await
}

pub async fn run_snapshot(cli: &Cli) -> Result<()> {
    let service = build_service(load_config(cli, None)?)?;
    let snapshot = service.collect().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub async fn run_check(cli: &Cli) -> Result<()> {
    let service = build_service(load_config(cli, None)?)?;
    let status = service.check_status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
