use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

use pixelq::api::ErrorCode;
use pixelq::api::models::{ErrorResponse, IdResponse, ReadyResponse};
use pixelq::api::state::{CoordinatorState, GatewayState, StorageState};
use pixelq::coordinator::Coordinator;
use pixelq::directory::ServiceDirectory;
use pixelq::ledger::{LedgerStats, Task, TaskLedger, TaskState};
use pixelq::observability::Metrics;
use pixelq::storage::{BlobStore, ObjectBlobStore, Stage};

const MAX_UPLOAD: usize = 64 * 1024;
const MAX_BLOB: usize = 4 * MAX_UPLOAD;

fn sample_png() -> Vec<u8> {
    let image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    bytes
}

struct TestCluster {
    ledger: TaskLedger,
    blobs: ObjectBlobStore,
    coordinator: Arc<Coordinator>,
    metrics: Arc<Metrics>,
}

impl TestCluster {
    fn new() -> Self {
        let metrics = Arc::new(Metrics::new());
        let ledger = TaskLedger::with_metrics(Duration::from_secs(120), metrics.clone());
        let blobs = ObjectBlobStore::in_memory();
        let coordinator = Arc::new(Coordinator::new(
            Arc::new(ledger.clone()),
            Arc::new(blobs.clone()),
            metrics.clone(),
        ));
        Self {
            ledger,
            blobs,
            coordinator,
            metrics,
        }
    }

    fn ledger_app(&self) -> Router {
        pixelq::api::service(pixelq::api::ledger::router(self.ledger.clone()), "ledger", self.metrics.clone())
    }

    fn coordinator_app(&self) -> Router {
        let state = CoordinatorState {
            coordinator: self.coordinator.clone(),
            max_upload_bytes: MAX_UPLOAD,
        };
        pixelq::api::service(pixelq::api::coordinator::router(state), "coordinator", self.metrics.clone())
    }

    fn storage_app(&self) -> Router {
        let state = StorageState {
            blobs: Arc::new(self.blobs.clone()),
            max_blob_bytes: MAX_BLOB,
        };
        pixelq::api::service(pixelq::api::storage::router(state), "storage", self.metrics.clone())
    }

    fn gateway_app(&self) -> Router {
        let state = GatewayState {
            submissions: self.coordinator.clone(),
            max_upload_bytes: MAX_UPLOAD,
        };
        pixelq::api::service(pixelq::api::gateway::router(state), "gateway", self.metrics.clone())
    }
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn upload(uri: &str, content_type: &str, data: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(data))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn error_code(response: axum::response::Response) -> ErrorCode {
    let body = body_bytes(response).await;
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    error.code
}

// ---------------------------------------------------------------- ledger role

#[tokio::test]
async fn test_ledger_create_lease_complete() {
    let cluster = TestCluster::new();
    let app = cluster.ledger_app();

    let response = app.clone().oneshot(request("POST", "/tasks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: IdResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(created.id.0, 0);

    let response = app.clone().oneshot(request("POST", "/tasks/lease")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let leased: Task = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(leased.state, TaskState::Leased);
    assert_eq!(leased.attempts, 1);

    let response = app.clone().oneshot(request("POST", "/tasks/0/complete")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let completed: Task = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(completed.state, TaskState::Completed);

    let response = app.oneshot(request("GET", "/stats")).await.unwrap();
    let stats: LedgerStats = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.completed, 1);
}

#[tokio::test]
async fn test_ledger_error_codes() {
    let cluster = TestCluster::new();
    let app = cluster.ledger_app();

    let response = app.clone().oneshot(request("POST", "/tasks/lease")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(response).await, ErrorCode::NoWorkAvailable);

    let response = app.clone().oneshot(request("GET", "/tasks/7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(response).await, ErrorCode::NotFound);

    let response = app.clone().oneshot(request("GET", "/tasks/seven")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, ErrorCode::InvalidInput);

    cluster.ledger.create_task().await;
    let response = app.oneshot(request("POST", "/tasks/0/complete")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, ErrorCode::InvalidStateTransition);
}

#[tokio::test]
async fn test_ledger_list_is_ordered() {
    let cluster = TestCluster::new();
    for _ in 0..3 {
        cluster.ledger.create_task().await;
    }
    cluster.ledger.assign_next().await.unwrap();

    let response = cluster.ledger_app().oneshot(request("GET", "/tasks")).await.unwrap();
    let tasks: Vec<Task> = serde_json::from_slice(&body_bytes(response).await).unwrap();

    let ids: Vec<u64> = tasks.iter().map(|task| task.id.0).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(tasks[0].state, TaskState::Leased);
    assert_eq!(tasks[1].state, TaskState::Pending);
}

// ----------------------------------------------------------- coordinator role

#[tokio::test]
async fn test_coordinator_submit_and_poll() {
    let cluster = TestCluster::new();
    let app = cluster.coordinator_app();

    let response = app
        .clone()
        .oneshot(upload("/submit", "image/png", sample_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: IdResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/tasks/{}/ready", created.id)))
        .await
        .unwrap();
    let ready: ReadyResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!ready.ready);

    // Result is absent until a worker stores it
    let response = app
        .clone()
        .oneshot(request("GET", &format!("/tasks/{}/result", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(request("POST", "/lease")).await.unwrap();
    let leased: Task = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(leased.id, created.id);

    cluster
        .blobs
        .put(created.id, Stage::Finished, Bytes::from_static(b"done"))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(request("POST", &format!("/tasks/{}/finished", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/tasks/{}/ready", created.id)))
        .await
        .unwrap();
    let ready: ReadyResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(ready.ready);

    let response = app
        .oneshot(request("GET", &format!("/tasks/{}/result", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"done"));
}

#[tokio::test]
async fn test_coordinator_rejects_bad_uploads_without_creating_tasks() {
    let cluster = TestCluster::new();
    let app = cluster.coordinator_app();

    let response = app
        .clone()
        .oneshot(upload("/submit", "application/json", sample_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(upload("/submit", "image/png", b"definitely not a png".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, ErrorCode::InvalidInput);

    let response = app
        .clone()
        .oneshot(upload("/submit", "image/png", Vec::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(upload("/submit", "application/octet-stream", vec![0u8; MAX_UPLOAD + 1]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_code(response).await, ErrorCode::PayloadTooLarge);

    assert!(cluster.ledger.list().await.is_empty());
}

#[tokio::test]
async fn test_coordinator_stale_finish_report_conflicts() {
    let cluster = TestCluster::new();
    cluster.ledger.create_task().await;

    let response = cluster
        .coordinator_app()
        .oneshot(request("POST", "/tasks/0/finished"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, ErrorCode::InvalidStateTransition);
}

// --------------------------------------------------------------- storage role

#[tokio::test]
async fn test_storage_put_and_get() {
    let cluster = TestCluster::new();
    let app = cluster.storage_app();

    let put = Request::builder()
        .method("PUT")
        .uri("/blobs/working/3")
        .body(Body::from("raw bytes"))
        .unwrap();
    let response = app.clone().oneshot(put).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(request("GET", "/blobs/working/3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"raw bytes"));

    let response = app.clone().oneshot(request("GET", "/blobs/finished/3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(request("GET", "/blobs/archived/3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_storage_accepts_outputs_larger_than_uploads() {
    let cluster = TestCluster::new();
    let app = cluster.storage_app();

    let put = |size: usize| {
        Request::builder()
            .method("PUT")
            .uri("/blobs/finished/0")
            .body(Body::from(vec![7u8; size]))
            .unwrap()
    };

    let response = app.clone().oneshot(put(MAX_UPLOAD * 2)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        cluster.blobs.get(pixelq::ledger::TaskId(0), Stage::Finished).await.unwrap().len(),
        MAX_UPLOAD * 2
    );

    let response = app.oneshot(put(MAX_BLOB + 1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ------------------------------------------------------------- directory role

#[tokio::test]
async fn test_directory_entries() {
    let app = pixelq::api::directory::router(ServiceDirectory::new());

    let put = Request::builder()
        .method("PUT")
        .uri("/entries/ledger_address")
        .body(Body::from("127.0.0.1:3001"))
        .unwrap();
    let response = app.clone().oneshot(put).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(request("GET", "/entries/ledger_address"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"127.0.0.1:3001"));

    let response = app.clone().oneshot(request("GET", "/entries")).await.unwrap();
    let entries: std::collections::BTreeMap<String, String> =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(entries.len(), 1);

    let response = app
        .clone()
        .oneshot(request("DELETE", "/entries/ledger_address"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", "/entries/ledger_address"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --------------------------------------------------------------- gateway role

fn multipart_upload(field: &str, data: &[u8]) -> Request<Body> {
    let boundary = "pixelq-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"in.png\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/submit")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_gateway_upload_and_ready_messages() {
    let cluster = TestCluster::new();
    let app = cluster.gateway_app();

    let response = app.clone().oneshot(request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let form = body_bytes(response).await;
    assert!(String::from_utf8_lossy(&form).contains("uploadfile"));

    let response = app
        .clone()
        .oneshot(multipart_upload("uploadfile", &sample_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"0"));

    let response = app.clone().oneshot(request("GET", "/ready?id=0")).await.unwrap();
    assert_eq!(
        body_bytes(response).await,
        Bytes::from_static(pixelq::api::gateway::NOT_READY_MESSAGE.as_bytes())
    );

    cluster.ledger.assign_next().await.unwrap();
    cluster.ledger.complete(pixelq::ledger::TaskId(0)).await.unwrap();

    let response = app.oneshot(request("GET", "/ready?id=0")).await.unwrap();
    assert_eq!(
        body_bytes(response).await,
        Bytes::from_static(pixelq::api::gateway::READY_MESSAGE.as_bytes())
    );
}

#[tokio::test]
async fn test_gateway_invalid_requests() {
    let cluster = TestCluster::new();
    let app = cluster.gateway_app();

    let response = app.clone().oneshot(request("GET", "/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(request("GET", "/image?id=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(request("GET", "/ready?id=4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(multipart_upload("photo", &sample_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(cluster.ledger.list().await.is_empty());
}

#[tokio::test]
async fn test_gateway_relays_remote_payload_too_large() {
    let cluster = TestCluster::new();

    // A coordinator that accepts far less than the gateway does
    let coordinator = pixelq::api::coordinator::router(CoordinatorState {
        coordinator: cluster.coordinator.clone(),
        max_upload_bytes: 16,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, coordinator).await.unwrap();
    });

    let client = pixelq::remote::build_client(&pixelq::config::HttpConfig::default()).unwrap();
    let state = GatewayState {
        submissions: Arc::new(pixelq::remote::CoordinatorClient::new(client, &address)),
        max_upload_bytes: MAX_UPLOAD,
    };
    let app = pixelq::api::gateway::router(state);

    let response = app
        .oneshot(multipart_upload("uploadfile", &sample_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_code(response).await, ErrorCode::PayloadTooLarge);
    assert!(cluster.ledger.list().await.is_empty());
}

// ------------------------------------------------------------------ shared

#[tokio::test]
async fn test_health_and_metrics_endpoints() {
    let cluster = TestCluster::new();
    cluster.ledger.create_task().await;
    let app = cluster.ledger_app();

    let response = app.clone().oneshot(request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.get("status").and_then(|v| v.as_str()), Some("healthy"));
    assert!(health.get("version").is_some());
    let components = health.get("components").unwrap().as_object().unwrap();
    assert!(components.contains_key("ledger"));

    let response = app.oneshot(request("GET", "/metrics")).await.unwrap();
    let metrics: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(metrics.get("tasks_created").and_then(|v| v.as_u64()), Some(1));
}
