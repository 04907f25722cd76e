//! Route tests over the in-memory store.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use matador_config::{MonitorConfig, ServerConfig};
use matador_monitor::{InMemoryQueueStore, JobRecord, JobState, JobStatus, QueueMonitor};
use matador_server::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn seeded_store() -> InMemoryQueueStore {
    let store = InMemoryQueueStore::new();
    for i in 1..=3 {
        store.add_job(
            "email-queue",
            JobState::Completed,
            JobRecord::new(i.to_string())
                .named("send-welcome")
                .created_at(1_700_000_000_000),
        );
    }
    store.add_job(
        "email-queue",
        JobState::Failed,
        JobRecord::new("4")
            .named("send-digest")
            .created_at(1_700_000_000_000)
            .failed_with("SMTP connection refused"),
    );
    for i in 5..=6 {
        store.add_job(
            "image-processing",
            JobState::Active,
            JobRecord::new(i.to_string())
                .named("resize-ABC-thumb")
                .created_at(1_700_000_000_000),
        );
    }
    store
}

fn app_with(store: &InMemoryQueueStore, server: &ServerConfig) -> (Arc<QueueMonitor>, Router) {
    let monitor = Arc::new(QueueMonitor::new(
        Arc::new(store.clone()),
        &MonitorConfig::default(),
    ));
    let router = create_router(AppState::new(Arc::clone(&monitor)), server);
    (monitor, router)
}

fn app(store: &InMemoryQueueStore) -> Router {
    app_with(store, &ServerConfig::default()).1
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_list_queues() {
    let (status, body) = get(app(&seeded_store()), "/api/queues").await;

    assert_eq!(status, StatusCode::OK);
    let queues = body.as_array().unwrap();
    assert_eq!(queues.len(), 2);
    assert_eq!(queues[0]["name"], "email-queue");
    assert_eq!(queues[0]["isPaused"], false);
    assert_eq!(queues[0]["jobCounts"]["completed"], 3);
    assert_eq!(queues[1]["jobCounts"]["active"], 2);
}

#[tokio::test]
async fn test_list_jobs_with_filters() {
    let store = seeded_store();

    let (status, body) = get(app(&store), "/api/jobs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);

    let (_, body) = get(app(&store), "/api/jobs?queue=email-queue&status=failed").await;
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], "4");
    assert_eq!(jobs[0]["failedReason"], "SMTP connection refused");

    let (_, body) = get(app(&store), "/api/jobs?search=abc").await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_query_values_are_ignored() {
    let (status, body) = get(app(&seeded_store()), "/api/jobs?queue=&status=&search=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_invalid_status_is_bad_request() {
    let (status, body) = get(app(&seeded_store()), "/api/jobs?status=stuck").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("stuck"));
}

#[tokio::test]
async fn test_get_job() {
    let (status, body) = get(app(&seeded_store()), "/api/jobs/image-processing/5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "5");
    assert_eq!(body["queue"], "image-processing");
    assert_eq!(body["status"], JobStatus::Active.as_str());
}

#[tokio::test]
async fn test_missing_job_is_not_found() {
    let (status, body) = get(app(&seeded_store()), "/api/jobs/email-queue/missing-id").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Job not found"}));
}

#[tokio::test]
async fn test_stats() {
    let store = seeded_store();

    let (status, body) = get(app(&store), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"completed": 3, "failed": 1, "active": 2, "waiting": 0, "delayed": 0, "total": 6})
    );

    let (_, body) = get(app(&store), "/api/stats/email-queue").await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["active"], 0);

    let (_, body) = get(app(&store), "/api/stats/unknown").await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let store = seeded_store();
    let (monitor, router) = app_with(&store, &ServerConfig::default());

    let (status, body) = get(router.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = get(router.clone(), "/live").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(router.clone(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    assert!(body.get("redis").is_none());

    monitor.close().await.unwrap();

    let (status, body) = get(router.clone(), "/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");

    let (status, _) = get(router, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_dashboard_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>matador</html>").unwrap();

    let server = ServerConfig {
        static_dir: Some(dir.path().to_string_lossy().into_owned()),
        ..ServerConfig::default()
    };
    let (_, router) = app_with(&seeded_store(), &server);

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/queues/email-queue").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<html>matador</html>");

    let (status, _) = get(router, "/api/queues").await;
    assert_eq!(status, StatusCode::OK);
}
