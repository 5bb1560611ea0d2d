//! Resolver and aggregator behaviour against an in-process mock gateway.
//!
//! Each test starts its own `MockGateway` on a random port, so tests are
//! independent and can run in parallel.

mod common;

use agent_metrics::gateway::{AttemptError, Resolution};
use common::{test_client, test_service, MockGateway, DEAD_GATEWAY};
use serde_json::json;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(500);

fn urls(base: &str, paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| format!("{}{}", base, p)).collect()
}

// == Endpoint Resolver =========================================================

#[tokio::test]
async fn first_success_wins_and_later_candidates_are_not_tried() {
    let gw = MockGateway::builder()
        .json("/a", json!([1]))
        .json("/b", json!([1, 2]))
        .start()
        .await;
    let res = test_client()
        .resolve(&urls(&gw.url(), &["/a", "/b"]), TIMEOUT)
        .await;
    match res {
        Resolution::Found { url, body, skipped } => {
            assert!(url.ends_with("/a"));
            assert_eq!(body, json!([1]));
            assert!(skipped.is_empty());
        }
        other => panic!("expected Found, got {:?}", other),
    }
    assert_eq!(gw.requests(), vec!["/a"]);
}

#[tokio::test]
async fn failing_candidates_are_skipped_in_order() {
    let gw = MockGateway::builder()
        .status("/a", 500)
        .raw("/b", "")
        .raw("/c", "<html>not json</html>")
        .json("/e", json!({"sessions": []}))
        .start()
        .await;
    let res = test_client()
        .resolve(&urls(&gw.url(), &["/a", "/b", "/c", "/d", "/e"]), TIMEOUT)
        .await;
    let failures = res.failures();
    assert_eq!(failures.len(), 4);
    assert!(matches!(failures[0].error, AttemptError::Status(500)));
    assert!(matches!(failures[1].error, AttemptError::EmptyBody));
    assert!(matches!(failures[2].error, AttemptError::InvalidJson(_)));
    assert!(matches!(failures[3].error, AttemptError::Status(404)));
    assert_eq!(res.body(), Some(&json!({"sessions": []})));
    assert_eq!(gw.requests(), vec!["/a", "/b", "/c", "/d", "/e"]);
}

#[tokio::test]
async fn slow_candidate_times_out_and_next_is_used() {
    let gw = MockGateway::builder()
        .slow_json("/slow", json!([1, 2, 3]), Duration::from_secs(3))
        .json("/fast", json!([1]))
        .start()
        .await;
    let res = test_client()
        .resolve(&urls(&gw.url(), &["/slow", "/fast"]), Duration::from_millis(200))
        .await;
    assert!(matches!(res.failures()[0].error, AttemptError::Timeout(_)));
    assert_eq!(res.body(), Some(&json!([1])));
}

#[tokio::test]
async fn exhausted_candidates_are_not_found() {
    let gw = MockGateway::builder().start().await;
    let res = test_client()
        .resolve(&urls(&gw.url(), &["/x", "/y"]), TIMEOUT)
        .await;
    assert!(!res.is_found());
    assert!(res.failure_message().unwrap().contains("/y"));
}

#[tokio::test]
async fn repeated_resolution_is_idempotent() {
    let gw = MockGateway::builder()
        .status("/a", 404)
        .json("/b", json!({"agents": [{"id": 1}]}))
        .json("/c", json!([]))
        .start()
        .await;
    let client = test_client();
    let candidates = urls(&gw.url(), &["/a", "/b", "/c"]);
    let mut seen = Vec::new();
    for _ in 0..3 {
        match client.resolve(&candidates, TIMEOUT).await {
            Resolution::Found { url, body, .. } => seen.push((url, body)),
            other => panic!("expected Found, got {:?}", other),
        }
    }
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
    assert!(seen[0].0.ends_with("/b"));
}

// == Aggregation scenarios =====================================================

#[tokio::test]
async fn session_records_and_agent_list_are_counted() {
    let gw = MockGateway::builder()
        .json(
            "/api/sessions",
            json!([{"taskscompleted": 2}, {"taskscompleted": 5}]),
        )
        .json("/api/agents", json!([{}, {}, {}]))
        .start()
        .await;
    let svc = test_service(&gw.url());
    let snap = svc.collect().await;
    assert_eq!(snap.active_sessions, 2);
    assert_eq!(snap.total_tasks, 7);
    assert_eq!(snap.agent_count, 3);
    assert!(snap.gateway_connected);
    assert!(snap.mock.is_none());
    assert!(snap.gateway_error.is_none());

    let status = svc.cached_status();
    assert!(status.connected);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn unreachable_gateway_serves_synthetic_snapshot() {
    let svc = test_service(DEAD_GATEWAY);
    let snap = svc.collect().await;
    assert_eq!(snap.mock, Some(true));
    assert!(!snap.gateway_connected);
    assert_eq!(snap.agent_count, 3);
    assert!(!snap.gateway_error.as_deref().unwrap_or("").is_empty());
    assert!(!svc.cached_status().connected);
}

#[tokio::test]
async fn keyed_sessions_without_task_data_use_ratio() {
    let gw = MockGateway::builder()
        .json("/api/sessions", json!({"sessions": [1, 2, 3, 4]}))
        .start()
        .await;
    let snap = test_service(&gw.url()).collect().await;
    assert_eq!(snap.active_sessions, 4);
    assert_eq!(snap.total_tasks, 12);
    assert_eq!(snap.agent_count, 0);
    assert!(snap.gateway_connected);
    assert!(snap.mock.is_none());
}

#[tokio::test]
async fn alternate_paths_are_discovered() {
    let gw = MockGateway::builder()
        .json("/api/v1/sessions", json!({"count": 6}))
        .json("/agents", json!({"data": [{}, {}]}))
        .start()
        .await;
    let snap = test_service(&gw.url()).collect().await;
    assert_eq!(snap.active_sessions, 6);
    assert_eq!(snap.total_tasks, 18);
    assert_eq!(snap.agent_count, 2);
    assert_eq!(
        gw.requests_for("sessions"),
        vec!["/api/sessions", "/sessions", "/api/v1/sessions"]
    );
    assert_eq!(gw.requests_for("agents"), vec!["/api/agents", "/agents"]);
}

#[tokio::test]
async fn agents_only_success_is_not_connected() {
    let gw = MockGateway::builder()
        .json("/api/agents", json!([{}, {}]))
        .start()
        .await;
    let svc = test_service(&gw.url());
    let snap = svc.collect().await;
    assert!(!snap.gateway_connected);
    assert!(snap.mock.is_none());
    assert_eq!(snap.agent_count, 2);
    assert_eq!(snap.active_sessions, 0);
    assert!(snap.gateway_error.is_some());
    assert!(!svc.cached_status().connected);
}

#[tokio::test]
async fn status_check_success_updates_cache() {
    let gw = MockGateway::builder().raw("/", "").start().await;
    let svc = test_service(&gw.url());
    let before = chrono::Utc::now() - chrono::Duration::milliseconds(1);
    let status = svc.check_status().await;
    assert!(status.connected);
    assert!(status.error.is_none());
    let checked: chrono::DateTime<chrono::Utc> =
        status.last_check.as_deref().unwrap().parse().unwrap();
    assert!(checked >= before);
    assert_eq!(svc.cached_status(), status);
}

#[tokio::test]
async fn status_check_non_2xx_is_failure() {
    let gw = MockGateway::builder().status("/", 503).start().await;
    let status = test_service(&gw.url()).check_status().await;
    assert!(!status.connected);
    assert_eq!(status.error.as_deref(), Some("HTTP status 503"));
    assert!(status.last_check.is_some());
}

#[tokio::test]
async fn oversized_task_counts_saturate_instead_of_failing() {
    let gw = MockGateway::builder()
        .json(
            "/api/sessions",
            json!([{"tasksCompleted": u64::MAX}, {"tasksCompleted": 1}]),
        )
        .start()
        .await;
    let snap = test_service(&gw.url()).collect().await;
    assert_eq!(snap.active_sessions, 2);
    assert_eq!(snap.total_tasks, u64::MAX);
    assert!(snap.gateway_connected);
}
