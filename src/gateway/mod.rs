//! # Gateway — Upstream Client and Endpoint Discovery
//!
//! The upstream gateway exposes session and agent listings, but which path
//! serves them varies between gateway versions. [`resolver::GatewayClient`]
//! walks an ordered list of candidate URLs per [`Resource`] and keeps the
//! first usable answer.

pub mod resolver;

pub use resolver::{FailedAttempt, GatewayClient, Resolution};

use std::fmt;
use std::time::Duration;

/// Upstream collection the aggregator asks the gateway for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Sessions,
    Agents,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Sessions => "sessions",
            Resource::Agents => "agents",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single GET against one candidate URL was not usable.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// No response within the per-attempt timeout.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// Connection refused, DNS failure, reset, etc.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The gateway answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),
    /// 2xx with nothing (or only whitespace) in the body.
    #[error("empty response body")]
    EmptyBody,
    /// 2xx whose body is not JSON.
    #[error("response is not JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

impl AttemptError {
    /// Short label used for the `outcome` Prometheus label and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Timeout(_) => "timeout",
            AttemptError::Transport(_) => "transport",
            AttemptError::Status(_) => "status",
            AttemptError::EmptyBody => "empty_body",
            AttemptError::InvalidJson(_) => "invalid_json",
        }
    }
}
