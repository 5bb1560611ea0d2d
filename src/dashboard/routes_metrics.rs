//! `GET /api/metrics` — the aggregated snapshot. Always 200.

use super::AppState;
use crate::snapshot::MetricsSnapshot;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

pub(super) async fn handler_api_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<MetricsSnapshot> {
    Json(state.service.collect().await)
}
