//! # Fallback — Synthetic Snapshot When the Gateway Is Unreachable
//!
//! The dashboard must always render something, so total upstream failure
//! yields a stand-in snapshot flagged `mock: true`. Values follow a sinusoid
//! over the UTC hour of day: they drift across a simulated day and stay
//! identical for every request within the same hour.
//!
//! With `s = sin(2π·hour/24)`:
//!
//! | Field | Formula | Range |
//! |-------|---------|-------|
//! | `activeSessions` | `round(3 + 2s)` | 1–5 |
//! | `totalTasks` | `round(14.5 + 9.5s)` | 5–24 |
//! | `agentCount` | fixed | 3 |

use crate::snapshot::{iso_timestamp, MetricsSnapshot};
use chrono::{DateTime, Timelike, Utc};
use std::f64::consts::TAU;

pub const MOCK_AGENT_COUNT: u64 = 3;

const SESSIONS_MID: f64 = 3.0;
const SESSIONS_AMPLITUDE: f64 = 2.0;
const TASKS_MID: f64 = 14.5;
const TASKS_AMPLITUDE: f64 = 9.5;

fn day_phase(hour: u32) -> f64 {
    (TAU * f64::from(hour % 24) / 24.0).sin()
}

/// Synthetic `(activeSessions, totalTasks)` for an hour of day.
pub fn synthetic_counts(hour: u32) -> (u64, u64) {
    let s = day_phase(hour);
    let sessions = (SESSIONS_MID + SESSIONS_AMPLITUDE * s).round().max(0.0) as u64;
    let tasks = (TASKS_MID + TASKS_AMPLITUDE * s).round().max(0.0) as u64;
    (sessions, tasks)
}

/// Build the stand-in snapshot for `now`, carrying `error` as `gatewayError`.
pub fn synthesize(now: DateTime<Utc>, uptime_seconds: f64, error: &str) -> MetricsSnapshot {
    let (active_sessions, total_tasks) = synthetic_counts(now.hour());
    MetricsSnapshot {
        active_sessions,
        total_tasks,
        agent_count: MOCK_AGENT_COUNT,
        uptime_seconds,
        timestamp: iso_timestamp(now),
        gateway_connected: false,
        mock: Some(true),
        gateway_error: Some(error.to_string()),
    }
}
