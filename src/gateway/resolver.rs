//! Ordered candidate resolution.
//!
//! One GET per candidate, strictly in list order, first usable body wins.
//! A candidate is never retried: the failure being routed around is "this
//! gateway does not serve that path", so the budget goes to breadth.

use super::AttemptError;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// A candidate that was tried and rejected.
#[derive(Debug)]
pub struct FailedAttempt {
    pub url: String,
    pub error: AttemptError,
}

/// Outcome of walking one candidate list.
#[derive(Debug)]
pub enum Resolution {
    Found {
        url: String,
        body: Value,
        /// Candidates tried before `url`, in order.
        skipped: Vec<FailedAttempt>,
    },
    NotFound {
        attempts: Vec<FailedAttempt>,
    },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Resolution::Found { body, .. } => Some(body),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn failures(&self) -> &[FailedAttempt] {
        match self {
            Resolution::Found { skipped, .. } => skipped,
            Resolution::NotFound { attempts } => attempts,
        }
    }

    /// Human-readable reason for a `NotFound`, naming the last candidate tried.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Resolution::Found { .. } => None,
            Resolution::NotFound { attempts } => Some(match attempts.last() {
                Some(last) => format!(
                    "{} candidate(s) failed; last: GET {}: {}",
                    attempts.len(),
                    last.url,
                    last.error
                ),
                None => "no candidate endpoints configured".to_string(),
            }),
        }
    }
}

/// Thin wrapper around a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct GatewayClient {
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Try `candidates` in order; return the first 2xx, non-empty, JSON body.
    pub async fn resolve(&self, candidates: &[String], timeout: Duration) -> Resolution {
        let mut failed = Vec::new();
        for url in candidates {
            match self.fetch_json(url, timeout).await {
                Ok(body) => {
                    debug!(url = %url, skipped = failed.len(), "candidate resolved");
                    return Resolution::Found {
                        url: url.clone(),
                        body,
                        skipped: failed,
                    };
                }
                Err(error) => {
                    debug!(url = %url, error = %error, "candidate rejected");
                    failed.push(FailedAttempt {
                        url: url.clone(),
                        error,
                    });
                }
            }
        }
        Resolution::NotFound { attempts: failed }
    }

    /// Single GET; the body must be non-empty JSON.
    pub async fn fetch_json(&self, url: &str, timeout: Duration) -> Result<Value, AttemptError> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| classify(e, timeout))?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(AttemptError::EmptyBody);
        }
        serde_json::from_slice(&bytes).map_err(AttemptError::InvalidJson)
    }

    /// Single GET where any 2xx counts as reachable; the body is ignored.
    pub async fn probe(&self, url: &str, timeout: Duration) -> Result<(), AttemptError> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AttemptError::Status(status.as_u16()))
        }
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> AttemptError {
    if err.is_timeout() {
        AttemptError::Timeout(timeout)
    } else {
        AttemptError::Transport(err)
    }
}
