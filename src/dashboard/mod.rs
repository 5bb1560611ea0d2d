//! # Dashboard — HTTP Server
//!
//! Axum server for the metrics JSON API, the gateway status endpoint, health
//! and Prometheus endpoints, and the dashboard frontend (either a static
//! directory or the built-in page).
//!
//! | Endpoint | Handler |
//! |----------|---------|
//! | `GET /api/metrics` | [`routes_metrics::handler_api_metrics`] |
//! | `GET /api/gateway/status` | [`routes_gateway::handler_gateway_status`] |
//! | `GET /healthz` | [`routes_health::handler_healthz`] |
//! | `GET /metrics` | [`routes_health::handler_metrics`] |
//! | `GET /` and assets | `ServeDir` or the embedded page |

mod routes_gateway;
mod routes_health;
mod routes_metrics;

use crate::aggregator::MetricsService;
use anyhow::{Context, Result};
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};

pub struct AppState {
    pub service: MetricsService,
}

impl AppState {
    pub fn new(service: MetricsService) -> Arc<Self> {
        Arc::new(AppState { service })
    }
}

/// Records request duration, propagates or generates `x-request-id`, and
/// wraps the request in a tracing span.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .service
        .metrics()
        .http_request_duration
        .get_or_create(&crate::prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Collapse static asset paths into one label so the histogram stays small.
fn normalize_path(path: &str) -> String {
    if path.starts_with("/api/") || matches!(path, "/" | "/healthz" | "/metrics") {
        path.to_string()
    } else {
        "/static".to_string()
    }
}

async fn handler_index() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        include_str!("dashboard.html"),
    )
}

pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/metrics", get(routes_metrics::handler_api_metrics))
        .route(
            "/api/gateway/status",
            get(routes_gateway::handler_gateway_status),
        )
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/metrics", get(routes_health::handler_metrics));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    } else {
        app = app.route("/", get(handler_index));
    }

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .layer(CatchPanicLayer::new())
    .layer(axum::middleware::from_fn_with_state(
        state.clone(),
        metrics_middleware,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(RequestBodyLimitLayer::new(64 * 1024))
    .layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(30),
    ))
    .with_state(state)
}

/// Periodically refresh the status cache so `?cached=true` stays current.
pub fn spawn_status_probe(
    state: Arc<AppState>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            state.service.check_status().await;
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

pub async fn run(port: u16, service: MetricsService, static_dir: Option<&Path>) -> Result<()> {
    let gateway_url = service.config().gateway_url.clone();
    let probe_interval = service.config().probe_interval;
    let state = AppState::new(service);
    let app = build_router(state.clone(), static_dir);

    if let Some(every) = probe_interval {
        info!(interval_secs = every.as_secs(), "background gateway probe enabled");
        spawn_status_probe(state.clone(), every);
    }

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        gateway = %gateway_url,
        "Agent Metrics Dashboard running on http://localhost:{}", port
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
