//! # Normalize — Count Extraction from Unknown Payload Shapes
//!
//! Gateways report the same collection in several shapes. Each body is first
//! classified into a [`PayloadShape`], then a count is read from the shape:
//!
//! | Shape | Example | Count |
//! |-------|---------|-------|
//! | `Sequence` | `[{..}, {..}]` | array length |
//! | `KeyedCollection` | `{"sessions": [..]}` | nested array length |
//! | `CountField` | `{"count": 4}` | the number |
//! | `Unrecognized` | `"ok"`, `{}` | 0 |
//!
//! Nested arrays are looked up under the resource name first (`sessions`,
//! `agents`), then under the generic keys in [`GENERIC_COLLECTION_KEYS`].
//!
//! ## Task totals
//!
//! When the sessions collection holds per-session objects, `totalTasks` is the
//! sum of their completed-task fields. Without per-session records it falls
//! back to `activeSessions * TASKS_PER_SESSION`.

use crate::gateway::Resource;
use crate::snapshot::MetricsSnapshot;
use serde_json::Value;

/// Keys tried after the resource name when looking for a nested array.
pub const GENERIC_COLLECTION_KEYS: [&str; 2] = ["data", "items"];

/// Per-record task counter field names, in lookup order.
pub const TASK_FIELDS: [&str; 2] = ["tasksCompleted", "taskscompleted"];

/// Estimated tasks per session when no per-session data is available.
pub const TASKS_PER_SESSION: u64 = 3;

/// Classified payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    Sequence(&'a [Value]),
    KeyedCollection {
        key: &'a str,
        items: &'a [Value],
    },
    CountField(u64),
    Unrecognized,
}

impl<'a> PayloadShape<'a> {
    pub fn classify(body: &'a Value, resource: Resource) -> Self {
        match body {
            Value::Array(items) => PayloadShape::Sequence(items),
            Value::Object(map) => {
                let keys = std::iter::once(resource.as_str()).chain(GENERIC_COLLECTION_KEYS);
                for key in keys {
                    if let Some(Value::Array(items)) = map.get(key) {
                        return PayloadShape::KeyedCollection { key, items };
                    }
                }
                match map.get("count").and_then(non_negative_count) {
                    Some(n) => PayloadShape::CountField(n),
                    None => PayloadShape::Unrecognized,
                }
            }
            _ => PayloadShape::Unrecognized,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            PayloadShape::Sequence(items) => items.len() as u64,
            PayloadShape::KeyedCollection { items, .. } => items.len() as u64,
            PayloadShape::CountField(n) => *n,
            PayloadShape::Unrecognized => 0,
        }
    }

    /// The underlying list, if the payload carried one.
    pub fn items(&self) -> Option<&'a [Value]> {
        match *self {
            PayloadShape::Sequence(items) => Some(items),
            PayloadShape::KeyedCollection { items, .. } => Some(items),
            _ => None,
        }
    }
}

/// Non-negative integer, or a non-negative finite float truncated toward zero.
fn non_negative_count(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    match v.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => Some(f as u64),
        _ => None,
    }
}

/// Count for a resolved body; an absent body counts as zero.
pub fn extract_count(body: Option<&Value>, resource: Resource) -> u64 {
    body.map(|b| PayloadShape::classify(b, resource).count())
        .unwrap_or(0)
}

/// Sum of completed tasks across per-session records, or `None` when the
/// sessions payload is not a non-empty list of objects.
pub fn sum_session_tasks(sessions: &Value) -> Option<u64> {
    let items = PayloadShape::classify(sessions, Resource::Sessions).items()?;
    if items.is_empty() || !items.iter().all(Value::is_object) {
        return None;
    }
    Some(
        items
            .iter()
            .map(|record| {
                TASK_FIELDS
                    .iter()
                    .find_map(|field| record.get(*field).and_then(non_negative_count))
                    .unwrap_or(0)
            })
            .fold(0u64, |acc, n| acc.saturating_add(n)),
    )
}

/// Fields of a snapshot that depend on upstream data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub active_sessions: u64,
    pub total_tasks: u64,
    pub agent_count: u64,
    pub gateway_connected: bool,
}

/// Fold the two resolved bodies into counts. `None` means that resource's
/// candidate list was exhausted.
pub fn normalize(sessions: Option<&Value>, agents: Option<&Value>) -> Counts {
    let active_sessions = extract_count(sessions, Resource::Sessions);
    let agent_count = extract_count(agents, Resource::Agents);
    let total_tasks = match sessions.and_then(sum_session_tasks) {
        Some(sum) => sum,
        None => active_sessions.saturating_mul(TASKS_PER_SESSION),
    };
    Counts {
        active_sessions,
        total_tasks,
        agent_count,
        gateway_connected: sessions.is_some(),
    }
}

impl Counts {
    pub fn into_snapshot(self, uptime_seconds: f64, timestamp: String) -> MetricsSnapshot {
        MetricsSnapshot {
            active_sessions: self.active_sessions,
            total_tasks: self.total_tasks,
            agent_count: self.agent_count,
            uptime_seconds,
            timestamp,
            gateway_connected: self.gateway_connected,
            mock: None,
            gateway_error: None,
        }
    }
}
