//! Tests for the Kafka Connect REST client against a mock server

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use shadowmesh_config::ConnectorConfig;
use tokio_util::sync::CancellationToken;

use crate::client::ConnectClient;
use crate::error::ConnectorError;
use crate::registrar::{ConnectorRegistrar, RegistrationOutcome, RetryPolicy};
use crate::status::ConnectorStatus;
use crate::traits::{ConnectorControl, RegisterResponse};

/// Scriptable stand-in for a Kafka Connect worker
struct MockConnect {
    /// Statuses returned by successive registrations; the last one repeats
    register_statuses: Mutex<Vec<u16>>,
    register_calls: AtomicU32,
    last_definition: Mutex<Option<Value>>,
    status_code: AtomicU16,
    status_body: Mutex<String>,
    restart_status: AtomicU16,
    restarted: Mutex<Option<String>>,
}

impl MockConnect {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            register_statuses: Mutex::new(vec![201]),
            register_calls: AtomicU32::new(0),
            last_definition: Mutex::new(None),
            status_code: AtomicU16::new(200),
            status_body: Mutex::new(
                r#"{"name":"monolith-full-sync","connector":{"state":"RUNNING"},"tasks":[{"id":0,"state":"RUNNING"}]}"#
                    .to_string(),
            ),
            restart_status: AtomicU16::new(204),
            restarted: Mutex::new(None),
        })
    }
}

async fn register(State(mock): State<Arc<MockConnect>>, Json(body): Json<Value>) -> StatusCode {
    mock.register_calls.fetch_add(1, Ordering::Relaxed);
    *mock.last_definition.lock() = Some(body);
    let code = {
        let mut statuses = mock.register_statuses.lock();
        if statuses.len() > 1 {
            statuses.remove(0)
        } else {
            statuses[0]
        }
    };
    StatusCode::from_u16(code).unwrap()
}

async fn status(
    State(mock): State<Arc<MockConnect>>,
    Path(_name): Path<String>,
) -> (StatusCode, String) {
    let code = StatusCode::from_u16(mock.status_code.load(Ordering::Relaxed)).unwrap();
    (code, mock.status_body.lock().clone())
}

async fn restart(State(mock): State<Arc<MockConnect>>, Path(name): Path<String>) -> StatusCode {
    *mock.restarted.lock() = Some(name);
    StatusCode::from_u16(mock.restart_status.load(Ordering::Relaxed)).unwrap()
}

async fn spawn_mock(mock: Arc<MockConnect>) -> String {
    let app = Router::new()
        .route("/connectors", post(register))
        .route("/connectors/{name}/status", get(status))
        .route("/connectors/{name}/restart", post(restart))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(url: &str) -> ConnectClient {
    let config = ConnectorConfig {
        connect_url: url.to_string(),
        request_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    ConnectClient::from_config(&config, "monolith").unwrap()
}

/// URL of a port nothing listens on
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// =============================================================================
// register
// =============================================================================

#[tokio::test]
async fn test_register_created_posts_definition() {
    let mock = MockConnect::new();
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);

    assert_eq!(client.register().await.unwrap(), RegisterResponse::Created);

    let body = mock.last_definition.lock().clone().unwrap();
    assert_eq!(body["name"], "monolith-full-sync");
    assert_eq!(body["config"]["topic.prefix"], "monolith");
    assert_eq!(body["config"]["snapshot.mode"], "initial");
    assert_eq!(body["config"]["value.converter.schemas.enable"], "false");
}

#[tokio::test]
async fn test_register_ok_is_created() {
    let mock = MockConnect::new();
    *mock.register_statuses.lock() = vec![200];
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);
    assert_eq!(client.register().await.unwrap(), RegisterResponse::Created);
}

#[tokio::test]
async fn test_register_conflict_is_already_exists() {
    let mock = MockConnect::new();
    *mock.register_statuses.lock() = vec![409];
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);
    assert_eq!(
        client.register().await.unwrap(),
        RegisterResponse::AlreadyExists
    );
}

#[tokio::test]
async fn test_register_server_error() {
    let mock = MockConnect::new();
    *mock.register_statuses.lock() = vec![500];
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);
    let err = client.register().await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::UnexpectedStatus { status: 500, .. }
    ));
}

#[tokio::test]
async fn test_register_unreachable() {
    let client = client_for(&dead_url().await);
    assert!(matches!(
        client.register().await.unwrap_err(),
        ConnectorError::Http(_)
    ));
}

#[tokio::test]
async fn test_registrar_retries_over_http() {
    let mock = MockConnect::new();
    *mock.register_statuses.lock() = vec![503, 503, 201];
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);

    let registrar = ConnectorRegistrar::new(
        client,
        RetryPolicy {
            max_attempts: 10,
            delay: Duration::from_millis(5),
        },
    );
    let outcome = registrar.register(&CancellationToken::new()).await;

    assert_eq!(
        outcome,
        RegistrationOutcome::Registered {
            response: RegisterResponse::Created,
            attempts: 3
        }
    );
    assert_eq!(mock.register_calls.load(Ordering::Relaxed), 3);
}

// =============================================================================
// status / restart
// =============================================================================

#[tokio::test]
async fn test_status_running() {
    let mock = MockConnect::new();
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);
    assert_eq!(client.status().await, ConnectorStatus::Running);
}

#[tokio::test]
async fn test_status_missing() {
    let mock = MockConnect::new();
    mock.status_code.store(404, Ordering::Relaxed);
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);
    assert_eq!(client.status().await, ConnectorStatus::Missing);
}

#[tokio::test]
async fn test_status_failed_task() {
    let mock = MockConnect::new();
    *mock.status_body.lock() = r#"{"connector":{"state":"RUNNING"},"tasks":[{"id":0,"state":"FAILED","trace":"replication slot is active"}]}"#.to_string();
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);
    assert_eq!(
        client.status().await,
        ConnectorStatus::Failed {
            trace: "replication slot is active".into()
        }
    );
}

#[tokio::test]
async fn test_status_server_error() {
    let mock = MockConnect::new();
    mock.status_code.store(500, Ordering::Relaxed);
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);
    assert!(matches!(client.status().await, ConnectorStatus::Error(_)));
}

#[tokio::test]
async fn test_status_unreachable() {
    let client = client_for(&dead_url().await);
    assert!(matches!(
        client.status().await,
        ConnectorStatus::Unreachable(_)
    ));
}

#[tokio::test]
async fn test_restart() {
    let mock = MockConnect::new();
    let client = client_for(&spawn_mock(Arc::clone(&mock)).await);

    client.restart().await.unwrap();
    assert_eq!(
        mock.restarted.lock().as_deref(),
        Some("monolith-full-sync")
    );

    mock.restart_status.store(200, Ordering::Relaxed);
    client.restart().await.unwrap();

    mock.restart_status.store(409, Ordering::Relaxed);
    assert!(matches!(
        client.restart().await.unwrap_err(),
        ConnectorError::UnexpectedStatus { status: 409, .. }
    ));
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let mock = MockConnect::new();
    let url = format!("{}/", spawn_mock(Arc::clone(&mock)).await);
    let client = client_for(&url);
    assert_eq!(client.status().await, ConnectorStatus::Running);
}
