//! Metrics aggregation proxy for an agent gateway.
//!
//! Polls the gateway for session and agent listings, trying several
//! candidate endpoints per resource, normalizes whatever shape comes back,
//! and serves a [`snapshot::MetricsSnapshot`]. When the gateway cannot be
//! reached the snapshot is synthesized instead, so consumers always get data.

pub mod aggregator;
pub mod config;
pub mod dashboard;
pub mod fallback;
pub mod gateway;
pub mod normalize;
pub mod prom_metrics;
pub mod snapshot;
pub mod status;
