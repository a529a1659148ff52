//! Mock backends for gateway tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU64, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::json;

use crate::router::TrafficRouter;
use crate::traffic::WeightedPicker;
use crate::upstream::Upstream;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_millis(300);
pub(crate) const HEALTH_TIMEOUT: Duration = Duration::from_millis(300);

/// A write as the backend received it
#[derive(Debug, Clone)]
pub(crate) struct RecordedWrite {
    pub method: String,
    pub path: String,
    pub body: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
}

/// Stand-in for the legacy monolith or the replica service
pub(crate) struct MockBackend {
    pub name: &'static str,
    /// Answer every API call with 503
    pub failing: AtomicBool,
    pub health_status: AtomicU16,
    pub hits: AtomicU64,
    pub last_write: Mutex<Option<RecordedWrite>>,
    /// Request headers of the most recent GET
    pub last_read_headers: Mutex<Option<HeaderMap>>,
}

impl MockBackend {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            failing: AtomicBool::new(false),
            health_status: AtomicU16::new(200),
            hits: AtomicU64::new(0),
            last_write: Mutex::new(None),
            last_read_headers: Mutex::new(None),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

async fn health(State(mock): State<Arc<MockBackend>>) -> StatusCode {
    StatusCode::from_u16(mock.health_status.load(Ordering::Relaxed)).unwrap()
}

async fn api(
    State(mock): State<Arc<MockBackend>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.hits.fetch_add(1, Ordering::Relaxed);
    if mock.failing.load(Ordering::Relaxed) {
        return (StatusCode::SERVICE_UNAVAILABLE, "down").into_response();
    }

    if method != Method::GET {
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        *mock.last_write.lock() = Some(RecordedWrite {
            method: method.to_string(),
            path: uri.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
            content_type: header_str(header::CONTENT_TYPE),
            authorization: header_str(header::AUTHORIZATION),
        });
        return (
            StatusCode::CREATED,
            [("x-backend", mock.name)],
            axum::Json(json!({"ok": true})),
        )
            .into_response();
    }

    *mock.last_read_headers.lock() = Some(headers);

    match uri.path() {
        "/api/products" => axum::Json(json!([{"id": 1, "served_by": mock.name}])).into_response(),
        "/api/products/404" => {
            (StatusCode::NOT_FOUND, axum::Json(json!({"error": "not found"}))).into_response()
        }
        "/api/products/500" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "/api/products/slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            axum::Json(json!({"id": 0})).into_response()
        }
        "/api/products/text" => "plain text".into_response(),
        path if path.ends_with("/reviews") => {
            axum::Json(json!({"reviews": [], "averageRating": null, "served_by": mock.name}))
                .into_response()
        }
        path => {
            let id = path.rsplit('/').next().unwrap_or_default().to_string();
            axum::Json(json!({"id": id, "served_by": mock.name})).into_response()
        }
    }
}

/// Serve a mock backend on an ephemeral port, returning its base URL
pub(crate) async fn spawn_backend(mock: Arc<MockBackend>) -> String {
    let app = Router::new()
        .route("/health", get(health))
        .fallback(api)
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// URL that refuses connections
pub(crate) async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub(crate) fn router_for(legacy_url: &str, replica_url: &str, weight: u8) -> TrafficRouter {
    let upstream = Upstream::new(legacy_url, replica_url, REQUEST_TIMEOUT, HEALTH_TIMEOUT).unwrap();
    TrafficRouter::new(upstream, weight)
}

/// Running legacy and replica mocks plus a router in front of them
pub(crate) struct Harness {
    pub legacy: Arc<MockBackend>,
    pub replica: Arc<MockBackend>,
    pub router: TrafficRouter,
}

pub(crate) async fn harness(weight: u8) -> Harness {
    let legacy = MockBackend::new("legacy");
    let replica = MockBackend::new("replica");
    let legacy_url = spawn_backend(legacy.clone()).await;
    let replica_url = spawn_backend(replica.clone()).await;

    Harness {
        legacy,
        replica,
        router: router_for(&legacy_url, &replica_url, weight),
    }
}

/// Picker that always returns the same draw
pub(crate) struct FixedPicker(pub u8);

impl WeightedPicker for FixedPicker {
    fn draw(&self) -> u8 {
        self.0
    }
}

/// Picker that walks 0, 1, .., 99 and wraps
#[derive(Default)]
pub(crate) struct CyclingPicker(AtomicU8);

impl WeightedPicker for CyclingPicker {
    fn draw(&self) -> u8 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (current + 1) % 100;
            match self
                .0
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return current,
                Err(actual) => current = actual,
            }
        }
    }
}
