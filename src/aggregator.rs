//! # Aggregator — One Metrics Snapshot per Request
//!
//! ```text
//! collect()
//!   ├─ resolve(sessions candidates) ─┐  concurrently; each list is
//!   ├─ resolve(agents candidates)   ─┘  walked strictly in order
//!   ├─ both NotFound → fallback::synthesize (mock: true)
//!   ├─ otherwise     → normalize::normalize
//!   └─ status cache updated from the sessions outcome
//! ```
//!
//! `collect()` has no error path: whatever happens upstream, the caller gets
//! a snapshot.

use crate::config::Config;
use crate::gateway::{GatewayClient, Resolution, Resource};
use crate::prom_metrics::Metrics;
use crate::snapshot::{iso_timestamp, MetricsSnapshot};
use crate::status::{check_gateway, GatewayStatus, StatusCache};
use crate::{fallback, normalize};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct MetricsService {
    config: Config,
    client: GatewayClient,
    status: StatusCache,
    metrics: Arc<Metrics>,
    started: Instant,
}

impl MetricsService {
    pub fn new(config: Config, client: GatewayClient, metrics: Arc<Metrics>) -> Self {
        Self {
            config,
            client,
            status: StatusCache::new(),
            metrics,
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Last recorded gateway status, without probing.
    pub fn cached_status(&self) -> GatewayStatus {
        self.status.snapshot()
    }

    /// Probe the gateway root and record the result.
    pub async fn check_status(&self) -> GatewayStatus {
        let status = check_gateway(
            &self.client,
            &self.config.root_url(),
            self.config.status_timeout,
            &self.status,
        )
        .await;
        self.metrics.set_connected(status.connected);
        status
    }

    async fn resolve(&self, resource: Resource) -> Resolution {
        let candidates = self.config.candidate_urls(resource);
        let resolution = self
            .client
            .resolve(&candidates, self.config.attempt_timeout)
            .await;
        for failed in resolution.failures() {
            self.metrics.record_attempt(resource.as_str(), failed.error.kind());
        }
        if resolution.is_found() {
            self.metrics.record_attempt(resource.as_str(), "ok");
        }
        resolution
    }

    /// Build the snapshot for one `/api/metrics` request.
    pub async fn collect(&self) -> MetricsSnapshot {
        let (sessions, agents) =
            tokio::join!(self.resolve(Resource::Sessions), self.resolve(Resource::Agents));
        let now = Utc::now();
        let uptime = self.uptime_seconds();

        if !sessions.is_found() && !agents.is_found() {
            let error = sessions
                .failure_message()
                .unwrap_or_else(|| "gateway unavailable".to_string());
            info!(error = %error, "gateway unavailable, serving synthetic metrics");
            self.status.record_failure(now, error.clone());
            self.metrics.set_connected(false);
            self.metrics.record_snapshot("fallback");
            return fallback::synthesize(now, uptime, &error);
        }

        let counts = normalize::normalize(sessions.body(), agents.body());
        let mut snapshot = counts.into_snapshot(uptime, iso_timestamp(now));

        match sessions.failure_message() {
            None => {
                self.status.record_success(now);
            }
            Some(error) => {
                warn!(error = %error, "sessions endpoint unresolved, agents only");
                self.status.record_failure(now, error.clone());
                snapshot.gateway_error = Some(error);
            }
        }
        self.metrics.set_connected(snapshot.gateway_connected);
        self.metrics.record_snapshot("gateway");
        snapshot
    }
}
