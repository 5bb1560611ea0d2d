//! # Mock Gateway — In-Process Upstream for Tests
//!
//! A small axum server on `127.0.0.1:0` whose routes are configured per test.
//! Every request path is recorded so tests can assert which candidates the
//! resolver tried and in what order.
//!
//! ```text
//! MockGateway::builder()
//!     .json("/api/sessions", json!([...]))
//!     .status("/api/agents", 500)
//!     .start().await
//!   └─ TcpListener::bind("127.0.0.1:0")
//!   └─ axum::serve(listener, fallback handler)   (background task, aborted on drop)
//! ```
//!
//! Paths without a configured response return 404.

#![allow(dead_code)]

use agent_metrics::aggregator::MetricsService;
use agent_metrics::config::{Config, FileConfig, Overrides};
use agent_metrics::gateway::GatewayClient;
use agent_metrics::prom_metrics::Metrics;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Canned reply for one path.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, MockResponse>,
    requests: Vec<String>,
}

type SharedState = Arc<Mutex<MockState>>;

pub struct MockGateway {
    base_url: String,
    _abort_handle: tokio::task::AbortHandle,
    state: SharedState,
}

impl MockGateway {
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder {
            state: MockState::default(),
        }
    }

    /// Base URL without trailing slash, e.g. `http://127.0.0.1:54321`.
    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    /// Paths requested so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_for(&self, prefix: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|p| p.contains(prefix))
            .collect()
    }
}

pub struct MockGatewayBuilder {
    state: MockState,
}

impl MockGatewayBuilder {
    pub fn respond(mut self, path: &str, response: MockResponse) -> Self {
        self.state.routes.insert(path.to_string(), response);
        self
    }

    /// 200 with a JSON body.
    pub fn json(self, path: &str, body: serde_json::Value) -> Self {
        self.respond(
            path,
            MockResponse {
                status: 200,
                body: body.to_string(),
                delay: None,
            },
        )
    }

    /// 200 with a raw body.
    pub fn raw(self, path: &str, body: &str) -> Self {
        self.respond(
            path,
            MockResponse {
                status: 200,
                body: body.to_string(),
                delay: None,
            },
        )
    }

    /// Given status with a small JSON error body.
    pub fn status(self, path: &str, status: u16) -> Self {
        self.respond(
            path,
            MockResponse {
                status,
                body: serde_json::json!({"error": format!("mock {}", status)}).to_string(),
                delay: None,
            },
        )
    }

    /// 200 with a JSON body, delivered after `delay`.
    pub fn slow_json(self, path: &str, body: serde_json::Value, delay: Duration) -> Self {
        self.respond(
            path,
            MockResponse {
                status: 200,
                body: body.to_string(),
                delay: Some(delay),
            },
        )
    }

    pub async fn start(self) -> MockGateway {
        let shared_state: SharedState = Arc::new(Mutex::new(self.state));

        let app = Router::new()
            .fallback(handle_any)
            .with_state(Arc::clone(&shared_state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock gateway to random port");
        let addr: SocketAddr = listener
            .local_addr()
            .expect("Failed to get mock gateway local address");
        let base_url = format!("http://127.0.0.1:{}", addr.port());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock gateway server failed");
        });

        MockGateway {
            base_url,
            _abort_handle: handle.abort_handle(),
            state: shared_state,
        }
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self._abort_handle.abort();
    }
}

async fn handle_any(State(state): State<SharedState>, req: Request) -> impl IntoResponse {
    let path = req.uri().path().to_string();
    let response = {
        let mut s = state.lock().unwrap();
        s.requests.push(path.clone());
        s.routes.get(&path).cloned()
    };
    match response {
        Some(r) => {
            if let Some(delay) = r.delay {
                tokio::time::sleep(delay).await;
            }
            let status = StatusCode::from_u16(r.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, [("content-type", "application/json")], r.body).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Config pointing at `gateway_url` with short timeouts suitable for tests.
pub fn test_config(gateway_url: &str) -> Config {
    let overrides = Overrides {
        gateway_url: Some(gateway_url.to_string()),
        ..Default::default()
    };
    let mut config = Config::from_layers(FileConfig::default(), &overrides).unwrap();
    config.attempt_timeout = Duration::from_millis(500);
    config.status_timeout = Duration::from_millis(500);
    config
}

/// Client that ignores proxy environment variables, so loopback mocks are hit directly.
pub fn test_client() -> GatewayClient {
    GatewayClient::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

pub fn test_service(gateway_url: &str) -> MetricsService {
    MetricsService::new(
        test_config(gateway_url),
        test_client(),
        Arc::new(Metrics::new()),
    )
}

/// A URL nothing listens on.
pub const DEAD_GATEWAY: &str = "http://127.0.0.1:9";
