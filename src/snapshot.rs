//! # Snapshot — Per-Request Metrics Record
//!
//! The JSON shape returned by `GET /api/metrics`. Built fresh for every
//! request and never stored. Field names are camelCase on the wire because
//! the dashboard frontend reads them directly.
//!
//! | Field | Present | Meaning |
//! |-------|---------|---------|
//! | `activeSessions` | always | sessions reported by the gateway |
//! | `totalTasks` | always | summed or estimated completed tasks |
//! | `agentCount` | always | agents reported by the gateway |
//! | `uptimeSeconds` | always | seconds since this process started |
//! | `timestamp` | always | RFC 3339 time the request was handled |
//! | `gatewayConnected` | always | sessions endpoint answered |
//! | `mock` | fallback only | values are synthetic |
//! | `gatewayError` | on failure | why the gateway could not be used |

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub active_sessions: u64,
    pub total_tasks: u64,
    pub agent_count: u64,
    pub uptime_seconds: f64,
    pub timestamp: String,
    pub gateway_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_error: Option<String>,
}

impl MetricsSnapshot {
    /// True when the values came from the fallback synthesizer.
    pub fn is_mock(&self) -> bool {
        self.mock.unwrap_or(false)
    }
}

/// Format a timestamp the way every wire field in this crate does
/// (RFC 3339, millisecond precision, `Z` suffix).
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
