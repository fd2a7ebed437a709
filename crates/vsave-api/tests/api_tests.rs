//! HTTP API tests against an in-memory ledger and a fake object store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use vsave_api::{create_router, ApiConfig, AppState};
use vsave_ledger::SqliteLedger;
use vsave_queue::{DispatchQueue, DispatchReceiver, JobService};
use vsave_storage::{ObjectStore, StorageError, StorageResult};

#[derive(Default)]
struct FakeStore {
    offline: bool,
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn list_keys(&self, _prefix: &str) -> StorageResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn put_file(&self, _path: &Path, _key: &str, _ct: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn put_bytes(&self, _data: Vec<u8>, _key: &str, _ct: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        if self.offline {
            Err(StorageError::AwsSdk("bucket unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Router plus the queue's receiving end, which must outlive the test.
struct TestApp {
    router: Router,
    receiver: DispatchReceiver,
}

async fn app_with(store: FakeStore) -> TestApp {
    let ledger = Arc::new(SqliteLedger::in_memory().await.unwrap());
    let (tx, receiver) = DispatchQueue::channel();
    let jobs = JobService::new(ledger, tx);
    let state = AppState::new(ApiConfig::default(), jobs, Arc::new(store));

    TestApp {
        router: create_router(state, None),
        receiver,
    }
}

async fn app() -> TestApp {
    app_with(FakeStore::default()).await
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn valid_payload(n: u32) -> Value {
    json!({
        "postRef": format!("https://www.reddit.com/r/videos/comments/abc{n}/title/"),
        "outputName": format!("clip{n}")
    })
}

#[tokio::test]
async fn test_root_welcome_message() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Video Scraper API");
}

#[tokio::test]
async fn test_submit_returns_accepted_and_job_is_queued() {
    let mut app = app().await;
    let payload = valid_payload(1);

    let (status, body) = send(&app, Method::POST, "/save-to-s3", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Job successfully queued");
    let job_id = body["job_id"].as_i64().unwrap();

    let (status, job) = send(&app, Method::GET, &format!("/jobs/{job_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["job_id"], job_id);
    assert_eq!(job["status"], "queued");
    assert_eq!(job["data"], payload);
    assert!(job["message"].is_null());

    let dispatched = app.receiver.dequeue().await.unwrap();
    assert_eq!(dispatched.id.0, job_id);
    assert_eq!(dispatched.payload.output_name, "clip1");
}

#[tokio::test]
async fn test_jobs_alias_accepts_submissions() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/jobs", Some(valid_payload(2))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["job_id"].is_i64());
}

#[tokio::test]
async fn test_invalid_payload_is_rejected_without_a_job() {
    let app = app().await;

    for payload in [
        json!({ "postRef": "https://x/post1" }),
        json!({ "postRef": "not a url", "outputName": "clip" }),
        json!({ "postRef": "https://x/post1", "outputName": "../escape" }),
        json!(["https://x/post1", "clip"]),
    ] {
        let (status, body) = send(&app, Method::POST, "/save-to-s3", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload} should be rejected");
        assert!(body["detail"].is_string());
        assert_eq!(body["code"], "invalid_payload");
    }

    let (_, list) = send(&app, Method::GET, "/jobs", None).await;
    assert_eq!(list["jobs"], json!([]));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/save-to-s3")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].as_str().unwrap().starts_with("Bad request"));
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/jobs/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found: Job 999 not found");
}

#[tokio::test]
async fn test_non_numeric_job_id_is_bad_request() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/jobs/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_delete_job_then_delete_again() {
    let app = app().await;
    let (_, body) = send(&app, Method::POST, "/save-to-s3", Some(valid_payload(3))).await;
    let job_id = body["job_id"].as_i64().unwrap();
    let uri = format!("/jobs/{job_id}");

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job deleted successfully");

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_reports_deleted_count() {
    let app = app().await;
    for n in 0..3 {
        send(&app, Method::POST, "/save-to-s3", Some(valid_payload(n))).await;
    }

    let (status, body) = send(&app, Method::DELETE, "/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All jobs cleared successfully");
    assert_eq!(body["deleted"], 3);

    let (_, list) = send(&app, Method::GET, "/jobs", None).await;
    assert_eq!(list["jobs"], json!([]));
}

#[tokio::test]
async fn test_list_returns_jobs_in_submission_order() {
    let app = app().await;
    let mut ids = Vec::new();
    for n in 0..4 {
        let (_, body) = send(&app, Method::POST, "/save-to-s3", Some(valid_payload(n))).await;
        ids.push(body["job_id"].as_i64().unwrap());
    }

    let (status, list) = send(&app, Method::GET, "/jobs", None).await;
    assert_eq!(status, StatusCode::OK);

    let listed: Vec<i64> = list["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|job| job["job_id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["ledger"]["status"], "ok");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn test_ready_degraded_when_storage_unreachable() {
    let app = app_with(FakeStore { offline: true }).await;

    let (status, body) = send(&app, Method::GET, "/ready", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["storage"]["status"], "error");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = app().await;

    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["X-Request-ID"], "req-123");
    assert_eq!(response.headers()["X-Content-Type-Options"], "nosniff");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(!response.headers()["X-Request-ID"].is_empty());
}
