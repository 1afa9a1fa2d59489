//! End-to-end wiring: configuration in, a booked appointment and a Graph
//! API confirmation out.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use bf_01_envelope_codec::{fixtures, open_response, seal_request};
use bf_02_flow_dispatcher::{ConfirmationMessenger, FixedTimeSource, MessagingError};
use booking_runtime::{
    BookingRuntime, CloudApiMessenger, MessagingConfig, RuntimeConfig, ServiceContainer,
};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Clone, Debug)]
struct Captured {
    phone_number_id: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct GraphMock {
    captured: Arc<Mutex<Vec<Captured>>>,
    reject: bool,
}

async fn messages(
    State(mock): State<GraphMock>,
    Path((_version, phone_number_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.captured.lock().push(Captured {
        phone_number_id,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    if mock.reject {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": "Invalid parameter", "code": 100}})),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({"messages": [{"id": "wamid.HBgLMTU1NTAxMDA"}]})),
        )
    }
}

async fn spawn_graph_mock(mock: GraphMock) -> SocketAddr {
    let app = Router::new()
        .route("/:version/:phone_number_id/messages", post(messages))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn write_key(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("flow_private_key.pem");
    std::fs::write(&path, fixtures::SERVICE_KEY_PEM).unwrap();
    path
}

fn base_config(dir: &TempDir) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.gateway.http.host = "127.0.0.1".parse().unwrap();
    config.gateway.http.port = 0;
    config.key.path = write_key(dir);
    config
}

fn messaging_for(addr: SocketAddr) -> MessagingConfig {
    MessagingConfig {
        access_token: Some("test-token".into()),
        phone_number_id: Some("106540352242922".into()),
        api_version: "v21.0".into(),
        base_url: format!("http://{addr}"),
    }
}

fn clock() -> Arc<FixedTimeSource> {
    Arc::new(FixedTimeSource::new(
        Utc.with_ymd_and_hms(2025, 9, 20, 9, 30, 0).unwrap(),
    ))
}

async fn exchange(container: &ServiceContainer, request: Value) -> Value {
    let sealed = seal_request(&fixtures::service_key().public_key(), &request).unwrap();
    let req = Request::builder()
        .method("POST")
        .uri("/flow")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&sealed.envelope).unwrap()))
        .unwrap();

    let response = container.gateway.router().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    open_response(std::str::from_utf8(&body).unwrap(), &sealed.keys).unwrap()
}

#[tokio::test]
async fn booking_sends_confirmation_through_graph_api() {
    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(
        &catalog_path,
        r#"{
            "services": [
                {"id": "haircut", "display_name": "Haircut", "duration_minutes": 45},
                {"id": "retired", "display_name": "Retired", "duration_minutes": 10, "active": false}
            ],
            "locations": [{"id": "main", "display_name": "Main Street", "address": "1 Main St"}]
        }"#,
    )
    .unwrap();

    let mock = GraphMock::default();
    let addr = spawn_graph_mock(mock.clone()).await;

    let mut config = base_config(&dir);
    config.catalog_path = Some(catalog_path);
    config.messaging = messaging_for(addr);

    let container = ServiceContainer::with_clock(config, clock()).unwrap();

    let details = exchange(
        &container,
        json!({
            "version": "3.0",
            "action": "data_exchange",
            "screen": "APPOINTMENT",
            "data": {
                "service": "haircut", "location": "main",
                "date": "2025-09-26", "time": "10:00"
            }
        }),
    )
    .await;
    assert_eq!(details["screen"], "DETAILS");

    let success = exchange(
        &container,
        json!({
            "version": "3.0",
            "action": "data_exchange",
            "screen": "SUMMARY",
            "data": {
                "service": "haircut", "location": "main",
                "date": "2025-09-26", "time": "10:00",
                "name": "Ana", "phone": "+15550100",
                "privacyConsent": true, "termsConsent": true
            }
        }),
    )
    .await;
    assert_eq!(success["screen"], "SUCCESS");
    assert_eq!(container.store.appointment_count(), 1);

    let captured = mock.captured.lock().clone();
    assert_eq!(captured.len(), 1);
    let sent = &captured[0];
    assert_eq!(sent.phone_number_id, "106540352242922");
    assert_eq!(sent.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(sent.body["messaging_product"], "whatsapp");
    assert_eq!(sent.body["to"], "+15550100");
    assert_eq!(sent.body["type"], "text");
    let text = sent.body["text"]["body"].as_str().unwrap();
    assert!(
        text.contains(success["data"]["referenceToken"].as_str().unwrap()),
        "confirmation text: {text}"
    );
}

#[tokio::test]
async fn initial_screen_uses_catalog_file() {
    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(
        &catalog_path,
        r#"{"services": [{"id": "haircut", "display_name": "Haircut", "duration_minutes": 45}],
            "locations": [{"id": "main", "display_name": "Main Street"}]}"#,
    )
    .unwrap();

    let mut config = base_config(&dir);
    config.catalog_path = Some(catalog_path);
    let container = ServiceContainer::with_clock(config, clock()).unwrap();

    let req = Request::builder()
        .uri("/flow/initial-screen")
        .body(Body::empty())
        .unwrap();
    let response = container.gateway.router().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let screen: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(screen["screen"], "APPOINTMENT");
    assert_eq!(screen["data"]["services"][0]["id"], "haircut");
    assert_eq!(screen["data"]["services"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_message_surfaces_status() {
    let mock = GraphMock {
        reject: true,
        ..GraphMock::default()
    };
    let addr = spawn_graph_mock(mock.clone()).await;

    let messenger = CloudApiMessenger::new(&messaging_for(addr), Duration::from_secs(5)).unwrap();
    let err = messenger
        .send_confirmation("+15550100", "Booked")
        .await
        .unwrap_err();

    match err {
        MessagingError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid parameter"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_graph_api_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let messenger =
        CloudApiMessenger::new(&messaging_for(addr), Duration::from_millis(500)).unwrap();
    let err = messenger
        .send_confirmation("+15550100", "Booked")
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::Transport(_)));
}

#[test]
fn missing_key_file_fails_wiring() {
    let dir = TempDir::new().unwrap();
    let mut config = base_config(&dir);
    config.key.path = dir.path().join("absent.pem");

    let err = ServiceContainer::new(config).err().unwrap();
    assert!(format!("{err:#}").contains("Failed to read private key"));
}

#[test]
fn encrypted_key_needs_passphrase() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("encrypted.pem");
    std::fs::write(&path, fixtures::SERVICE_KEY_ENCRYPTED_PEM).unwrap();

    let mut config = base_config(&dir);
    config.key.path = path.clone();
    assert!(ServiceContainer::new(config.clone()).is_err());

    config.key.passphrase = Some(fixtures::SERVICE_KEY_PASSPHRASE.into());
    assert!(ServiceContainer::new(config).is_ok());
}

#[test]
fn invalid_catalog_fails_wiring() {
    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(&catalog_path, "{ not json").unwrap();

    let mut config = base_config(&dir);
    config.catalog_path = Some(catalog_path);

    let err = ServiceContainer::new(config).err().unwrap();
    assert!(format!("{err:#}").contains("Failed to load catalog"));
}

#[tokio::test]
async fn runtime_stops_on_shutdown_signal() {
    let dir = TempDir::new().unwrap();
    let runtime = BookingRuntime::new(base_config(&dir)).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        runtime
            .run(async {
                let _ = rx.await;
            })
            .await
    });

    tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
