//! Common Test Utilities for Integration Tests
//!
//! An in-process stand-in for the world-clock application, served over real
//! TCP so the HTTP transport is exercised end to end.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use kronos_loadgen::scenario::TIMEZONES;

/// Counters and fault switches shared with the handlers
#[derive(Default)]
pub struct MockClock {
    pub hits: AtomicU64,
    /// When set, `/api/timezones` answers 500
    pub break_timezone_list: AtomicBool,
}

impl MockClock {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Deserialize)]
struct TimeQuery {
    timezone: Option<String>,
}

#[derive(Serialize)]
struct TimeResponse {
    timezone: String,
    datetime: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn index(State(clock): State<Arc<MockClock>>) -> Html<&'static str> {
    clock.hits.fetch_add(1, Ordering::SeqCst);
    Html("<html><body>World Clock</body></html>")
}

async fn time(
    State(clock): State<Arc<MockClock>>,
    Query(query): Query<TimeQuery>,
) -> impl IntoResponse {
    clock.hits.fetch_add(1, Ordering::SeqCst);
    let zone = query.timezone.unwrap_or_else(|| "UTC".to_string());
    if zone != "UTC" && !TIMEZONES.contains(&zone.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unknown timezone: {}", zone),
            }),
        )
            .into_response();
    }
    Json(TimeResponse {
        timezone: zone,
        datetime: Utc::now().to_rfc3339(),
    })
    .into_response()
}

async fn timezones(State(clock): State<Arc<MockClock>>) -> impl IntoResponse {
    clock.hits.fetch_add(1, Ordering::SeqCst);
    if clock.break_timezone_list.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(TIMEZONES.to_vec()).into_response()
}

/// Create the mock world-clock router
pub fn create_mock_app(clock: Arc<MockClock>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/time", get(time))
        .route("/api/timezones", get(timezones))
        .with_state(clock)
}

/// Serve the mock app on an ephemeral port; returns its base URL
pub async fn spawn_mock_app(clock: Arc<MockClock>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock app");
    let addr: SocketAddr = listener.local_addr().expect("mock app address");
    let app = create_mock_app(clock);
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on
pub async fn unused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind scratch listener");
    let addr = listener.local_addr().expect("scratch listener address");
    drop(listener);
    format!("http://{}", addr)
}
