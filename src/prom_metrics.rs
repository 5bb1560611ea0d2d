//! # Prometheus Metrics — Self-Observability of the Proxy
//!
//! Exposes the proxy's own operational metrics in the Prometheus text
//! exposition format on `GET /metrics`. These describe how the proxy talks to
//! the gateway, not the agent metrics it serves.
//!
//! ## Metrics Exposed
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `agent_metrics_snapshots_total` | Counter | `source` | Snapshots served (`gateway` / `fallback`) |
//! | `agent_metrics_candidate_attempts_total` | Counter | `resource`, `outcome` | Upstream GETs by result |
//! | `agent_metrics_gateway_connected` | Gauge | — | 1 if the last check/request reached the gateway |
//! | `agent_metrics_http_request_duration_seconds` | Histogram | `method`, `path` | Inbound request latency |

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct SourceLabel {
    pub source: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct AttemptLabel {
    pub resource: String,
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

/// All fields are atomic and safe to update from any task.
pub struct Metrics {
    pub registry: Registry,
    pub snapshots: Family<SourceLabel, Counter>,
    pub candidate_attempts: Family<AttemptLabel, Counter>,
    pub gateway_connected: Gauge,
    pub http_request_duration: Family<HttpLabel, Histogram>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let snapshots = Family::<SourceLabel, Counter>::default();
        registry.register(
            "agent_metrics_snapshots",
            "Metrics snapshots served by data source",
            snapshots.clone(),
        );

        let candidate_attempts = Family::<AttemptLabel, Counter>::default();
        registry.register(
            "agent_metrics_candidate_attempts",
            "Upstream candidate GETs by resource and outcome",
            candidate_attempts.clone(),
        );

        let gateway_connected = Gauge::default();
        registry.register(
            "agent_metrics_gateway_connected",
            "Whether the gateway was reachable at the last check",
            gateway_connected.clone(),
        );

        let http_request_duration =
            Family::<HttpLabel, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 14))
            });
        registry.register(
            "agent_metrics_http_request_duration_seconds",
            "Inbound HTTP request duration",
            http_request_duration.clone(),
        );

        Self {
            registry,
            snapshots,
            candidate_attempts,
            gateway_connected,
            http_request_duration,
        }
    }

    pub fn record_snapshot(&self, source: &str) {
        self.snapshots
            .get_or_create(&SourceLabel {
                source: source.to_string(),
            })
            .inc();
    }

    pub fn record_attempt(&self, resource: &str, outcome: &str) {
        self.candidate_attempts
            .get_or_create(&AttemptLabel {
                resource: resource.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn set_connected(&self, connected: bool) {
        self.gateway_connected.set(i64::from(connected));
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        // Writing into a String cannot fail.
        let _ = encode(&mut buf, &self.registry);
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
