//! In-process scenario tests for the spub-daemon status endpoints.
//!
//! The router is driven via `tower::ServiceExt::oneshot`; no socket is bound.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use spub_daemon::{routes, state};
use spub_transport::ConnectionState;
use tokio::sync::{watch, RwLock};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_router(
    conn: ConnectionState,
    stats: state::BridgeStats,
) -> (axum::Router, watch::Sender<ConnectionState>) {
    let (tx, rx) = watch::channel(conn);
    let st = Arc::new(state::AppState::new(
        "abc123",
        Arc::new(RwLock::new(stats)),
        rx,
    ));
    (routes::build_router(st), tx)
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, serde_json::from_slice(&body).expect("body is not valid JSON"))
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let (router, _tx) = make_router(ConnectionState::Connected, Default::default());
    let (status, json) = get_json(router, "/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "spub-daemon");
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_reports_stats_and_connection() {
    let stats = state::BridgeStats {
        datagrams_received: 7,
        live_accepted: 3,
        last_accepted_ms: Some(1_700_000_000_000),
        ..Default::default()
    };
    let (router, _tx) = make_router(ConnectionState::Connected, stats);
    let (status, json) = get_json(router, "/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config_hash"], "abc123");
    assert_eq!(json["broker_connected"], true);
    assert_eq!(json["broker"]["state"], "connected");
    assert_eq!(json["stats"]["datagrams_received"], 7);
    assert_eq!(json["stats"]["live_accepted"], 3);
    assert_eq!(json["stats"]["last_accepted_ms"], 1_700_000_000_000i64);
}

#[tokio::test]
async fn status_follows_connection_watch() {
    let (router, tx) = make_router(ConnectionState::Connected, Default::default());
    tx.send_replace(ConnectionState::Reconnecting {
        attempt: 3,
        delay_ms: 4000,
    });
    let (_, json) = get_json(router, "/v1/status").await;
    assert_eq!(json["broker_connected"], false);
    assert_eq!(json["broker"]["state"], "reconnecting");
    assert_eq!(json["broker"]["attempt"], 3);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (router, _tx) = make_router(ConnectionState::Connecting, Default::default());
    let req = Request::builder()
        .uri("/v1/run/start")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
