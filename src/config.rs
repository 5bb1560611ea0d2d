//! # Config — Gateway Location, Candidate Endpoints, Timeouts
//!
//! Resolved once at startup and shared read-only afterwards. Values come from
//! three layers, highest precedence first:
//!
//! 1. CLI flags / environment (`GATEWAY_URL`), passed in as [`Overrides`].
//! 2. An optional TOML file (`--config` / `METRICS_CONFIG`).
//! 3. Built-in defaults.
//!
//! ## TOML layout
//!
//! ```toml
//! [gateway]
//! url = "http://gateway.internal:3000"
//! attempt_timeout_ms = 2000
//! status_timeout_ms = 1500
//! probe_interval_secs = 30
//!
//! [endpoints]
//! sessions = ["/api/sessions", "/sessions"]
//! agents = ["/api/agents", "{base}/v2/agents"]
//! ```
//!
//! Endpoint templates are either paths relative to the gateway URL, absolute
//! `http(s)://` URLs, or strings containing a `{base}` placeholder.

use crate::gateway::Resource;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";
pub const DEFAULT_PORT: u16 = 3005;
const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_STATUS_TIMEOUT_MS: u64 = 1_500;

const DEFAULT_SESSION_ENDPOINTS: [&str; 3] = ["/api/sessions", "/sessions", "/api/v1/sessions"];
const DEFAULT_AGENT_ENDPOINTS: [&str; 3] = ["/api/agents", "/agents", "/api/v1/agents"];

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway base URL without a trailing slash.
    pub gateway_url: String,
    pub session_endpoints: Vec<String>,
    pub agent_endpoints: Vec<String>,
    pub attempt_timeout: Duration,
    pub status_timeout: Duration,
    /// `None` disables the background status probe.
    pub probe_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            session_endpoints: DEFAULT_SESSION_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            agent_endpoints: DEFAULT_AGENT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
            status_timeout: Duration::from_millis(DEFAULT_STATUS_TIMEOUT_MS),
            probe_interval: None,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub gateway_url: Option<String>,
    pub probe_interval_secs: Option<u64>,
}

/// On-disk TOML representation. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub endpoints: EndpointsSection,
}

/// The `[gateway]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    pub url: Option<String>,
    pub attempt_timeout_ms: Option<u64>,
    pub status_timeout_ms: Option<u64>,
    pub probe_interval_secs: Option<u64>,
}

/// The `[endpoints]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointsSection {
    pub sessions: Option<Vec<String>>,
    pub agents: Option<Vec<String>>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config TOML")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

impl Config {
    /// Layer defaults, the optional file, and CLI/env overrides, then validate.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match file {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Self::from_layers(file, overrides)
    }

    pub fn from_layers(file: FileConfig, overrides: &Overrides) -> Result<Self> {
        let mut cfg = Config::default();

        if let Some(url) = file.gateway.url {
            cfg.gateway_url = url;
        }
        if let Some(ms) = file.gateway.attempt_timeout_ms {
            cfg.attempt_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.gateway.status_timeout_ms {
            cfg.status_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = file.gateway.probe_interval_secs {
            cfg.probe_interval = interval_from_secs(secs);
        }
        if let Some(list) = file.endpoints.sessions {
            cfg.session_endpoints = list;
        }
        if let Some(list) = file.endpoints.agents {
            cfg.agent_endpoints = list;
        }

        if let Some(url) = &overrides.gateway_url {
            cfg.gateway_url = url.clone();
        }
        if let Some(secs) = overrides.probe_interval_secs {
            cfg.probe_interval = interval_from_secs(secs);
        }

        cfg.gateway_url = cfg.gateway_url.trim_end_matches('/').to_string();
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.gateway_url)
            .with_context(|| format!("gateway URL {:?} is not a valid URL", self.gateway_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("gateway URL must use http or https, got {:?}", parsed.scheme());
        }
        if self.session_endpoints.is_empty() {
            bail!("at least one sessions endpoint is required");
        }
        if self.agent_endpoints.is_empty() {
            bail!("at least one agents endpoint is required");
        }
        if self.attempt_timeout.is_zero() || self.status_timeout.is_zero() {
            bail!("timeouts must be greater than zero");
        }
        for resource in [Resource::Sessions, Resource::Agents] {
            for candidate in self.candidate_urls(resource) {
                url::Url::parse(&candidate).with_context(|| {
                    format!("{} endpoint {:?} is not a valid URL", resource, candidate)
                })?;
            }
        }
        Ok(())
    }

    /// Expand the endpoint templates for `resource` into absolute URLs, in order.
    pub fn candidate_urls(&self, resource: Resource) -> Vec<String> {
        let templates = match resource {
            Resource::Sessions => &self.session_endpoints,
            Resource::Agents => &self.agent_endpoints,
        };
        templates
            .iter()
            .map(|t| expand_template(&self.gateway_url, t))
            .collect()
    }

    /// Gateway root URL probed by the status check.
    pub fn root_url(&self) -> String {
        format!("{}/", self.gateway_url)
    }
}

fn interval_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn expand_template(base: &str, template: &str) -> String {
    if template.contains("{base}") {
        template.replace("{base}", base)
    } else if template.starts_with("http://") || template.starts_with("https://") {
        template.to_string()
    } else {
        format!("{}/{}", base, template.trim_start_matches('/'))
    }
}
