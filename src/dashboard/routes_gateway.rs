//! Gateway connectivity endpoint.

use super::AppState;
use crate::status::GatewayStatus;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub(super) struct StatusQuery {
    #[serde(default)]
    cached: bool,
}

/// `GET /api/gateway/status` — probes the gateway root and returns the
/// updated status. `?cached=true` returns the last recorded status instead.
pub(super) async fn handler_gateway_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Json<GatewayStatus> {
    if query.cached {
        Json(state.service.cached_status())
    } else {
        Json(state.service.check_status().await)
    }
}
