use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use remedy_core::approval::{default_labels, ApprovalGate, DEFAULT_ISSUE_TYPE};
use remedy_core::enforcement::DryRunEnforcement;
use remedy_core::ledger::{BlockLedger, LedgerSettings, MemoryBlockStore};
use remedy_core::notify::{LogNotifier, Notifier};
use remedy_core::ticketing::DryRunTicketing;
use remedy_core::Orchestrator;
use remedy_server::backends::SlackNotifier;
use remedy_server::{build_router, AppState};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    app: axum::Router,
    backend: Arc<DryRunEnforcement>,
    tickets: Arc<DryRunTicketing>,
}

fn harness_with_notifier(notifier: Arc<dyn Notifier>) -> Harness {
    let backend = Arc::new(DryRunEnforcement::new());
    let tickets = Arc::new(DryRunTicketing::new("SEC"));
    let ledger = BlockLedger::new(
        backend.clone(),
        Arc::new(MemoryBlockStore::new()),
        LedgerSettings {
            ttl_unit: Duration::from_secs(60),
            ..LedgerSettings::default()
        },
    );
    let gate = ApprovalGate::new(tickets.clone(), DEFAULT_ISSUE_TYPE, default_labels());
    let state = AppState::new(Orchestrator::new(ledger, gate, notifier));
    Harness {
        app: build_router(state),
        backend,
        tickets,
    }
}

fn harness() -> Harness {
    harness_with_notifier(Arc::new(LogNotifier))
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    post_raw(app, uri, serde_json::to_vec(&body).unwrap()).await
}

async fn post_raw(app: axum::Router, uri: &str, body: Vec<u8>) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body))
        .unwrap();
    send(app, req).await
}

async fn send(
    app: axum::Router,
    req: axum::http::Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let (status, body) = get(h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

// ---------------------------------------------------------------------------
// Blocking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn low_severity_block_alias_is_temporary() {
    let h = harness();
    let (status, body) = post_json(
        h.app,
        "/",
        json!({
            "action": "block_ip",
            "severity": "low",
            "target": { "ip": "203.0.113.7" },
            "issue": "credential stuffing"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["action"], "temp_block");
    assert_eq!(body["ip"], "203.0.113.7");
    assert!(body["unblock_at"].is_string());
    assert!(body.get("permanent").is_none());
    assert_eq!(h.backend.rules().len(), 1);
}

#[tokio::test]
async fn critical_block_is_permanent() {
    let h = harness();
    let (status, body) = post_json(
        h.app,
        "/api/remediate",
        json!({
            "action": "BLOCK",
            "severity": "critical",
            "target": { "ip": "2001:db8::1" }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "block");
    assert_eq!(body["permanent"], true);
    assert!(body.get("unblock_at").is_none());
}

#[tokio::test]
async fn block_then_list_then_unblock() {
    let h = harness();
    let (status, _) = post_json(
        h.app.clone(),
        "/api/actions/block",
        json!({ "severity": "high", "target": { "ip": "198.51.100.4" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(h.app.clone(), "/api/blocked").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "list_blocked");
    assert_eq!(body["ips"], json!(["198.51.100.4"]));

    let (status, body) = post_json(
        h.app.clone(),
        "/api/actions/unban_ip",
        json!({ "target": { "ip": "198.51.100.4" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["action"], "unblock");
    assert!(h.backend.rules().is_empty());

    let (_, body) = get(h.app, "/api/blocked").await;
    assert_eq!(body["ips"], json!([]));
}

#[tokio::test]
async fn unblock_unknown_ip_is_not_found() {
    let h = harness();
    let (status, body) = post_json(
        h.app,
        "/",
        json!({ "action": "unblock", "target": { "ip": "192.0.2.55" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("192.0.2.55"));
}

#[tokio::test]
async fn block_without_ip_is_bad_request() {
    let h = harness();
    let (status, body) = post_json(h.app, "/", json!({ "action": "block", "target": {} })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("target.ip"));
    assert!(h.backend.rules().is_empty());
}

#[tokio::test]
async fn malformed_ip_is_bad_request() {
    let h = harness();
    let (status, _) = post_json(
        h.app,
        "/",
        json!({ "action": "block", "target": { "ip": "not-an-ip" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.backend.rules().is_empty());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsupported_action_is_bad_request() {
    let h = harness();
    let (status, body) = post_json(h.app, "/", json!({ "action": "frobnicate" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("frobnicate"));
    assert!(h.backend.rules().is_empty());
    assert!(h.tickets.issued().is_empty());
}

#[tokio::test]
async fn missing_action_is_bad_request() {
    let h = harness();
    let (status, body) = post_json(h.app, "/", json!({ "severity": "low" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn invalid_severity_is_bad_request() {
    let h = harness();
    let (status, _) = post_json(
        h.app,
        "/",
        json!({ "action": "block", "severity": "apocalyptic", "target": { "ip": "192.0.2.1" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let h = harness();
    let (status, body) = post_raw(h.app.clone(), "/", b"{not json".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, _) = post_raw(h.app, "/api/actions/block", b"{not json".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Approval and notification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn drain_opens_approval_ticket_and_returns_accepted() {
    let h = harness();
    let (status, body) = post_json(
        h.app,
        "/",
        json!({
            "action": "drain_node",
            "severity": "high",
            "target": { "service": "checkout" },
            "issue": "node disk pressure"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "pending_approval");
    assert_eq!(body["action"], "drain");
    assert_eq!(body["jira_ticket"], "SEC-1");
    assert_eq!(body["service"], "checkout");

    let issued = h.tickets.issued();
    assert_eq!(issued.len(), 1);
    assert!(issued[0].1.summary.contains("checkout"));
}

#[tokio::test]
async fn scale_without_service_is_bad_request() {
    let h = harness();
    let (status, body) = post_json(
        h.app,
        "/api/actions/scale",
        json!({ "target": { "replicas": 3 } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("target.service"));
    assert!(h.tickets.issued().is_empty());
}

#[tokio::test]
async fn notify_with_log_notifier_succeeds() {
    let h = harness();
    let (status, body) = post_json(
        h.app,
        "/",
        json!({ "action": "alert", "severity": "medium", "issue": "latency spike" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "notify");
}

#[tokio::test]
async fn notify_without_webhook_is_service_unavailable() {
    let h = harness_with_notifier(Arc::new(SlackNotifier::new(None)));
    let (status, body) = post_json(h.app, "/", json!({ "action": "notify", "issue": "x" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
}
