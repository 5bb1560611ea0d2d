//! # Status — Last-Known Gateway Connectivity
//!
//! One [`StatusCache`] lives for the whole process. Every metrics request and
//! every status check replaces its contents; the status endpoint reads it.
//! Handlers run on a multi-threaded runtime, so the value sits behind a
//! mutex and is only ever copied in or out (never held across an `.await`).

use crate::gateway::GatewayClient;
use crate::snapshot::iso_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub connected: bool,
    pub last_check: Option<String>,
    pub error: Option<String>,
}

/// Lock a mutex, recovering from poisoning.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct StatusCache {
    inner: Mutex<GatewayStatus>,
}

impl StatusCache {
    /// Starts disconnected and never checked.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> GatewayStatus {
        lock_or_recover(&self.inner).clone()
    }

    pub fn replace(&self, status: GatewayStatus) {
        *lock_or_recover(&self.inner) = status;
    }

    pub fn record_success(&self, at: DateTime<Utc>) -> GatewayStatus {
        let status = GatewayStatus {
            connected: true,
            last_check: Some(iso_timestamp(at)),
            error: None,
        };
        self.replace(status.clone());
        status
    }

    pub fn record_failure(&self, at: DateTime<Utc>, error: impl Into<String>) -> GatewayStatus {
        let status = GatewayStatus {
            connected: false,
            last_check: Some(iso_timestamp(at)),
            error: Some(error.into()),
        };
        self.replace(status.clone());
        status
    }
}

/// Probe the gateway root once and record the outcome.
pub async fn check_gateway(
    client: &GatewayClient,
    root_url: &str,
    timeout: Duration,
    cache: &StatusCache,
) -> GatewayStatus {
    match client.probe(root_url, timeout).await {
        Ok(()) => {
            debug!(url = %root_url, "gateway reachable");
            cache.record_success(Utc::now())
        }
        Err(e) => {
            warn!(url = %root_url, error = %e, "gateway status check failed");
            cache.record_failure(Utc::now(), e.to_string())
        }
    }
}
