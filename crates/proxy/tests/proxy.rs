//! Proxy route tests against the full router (middleware included).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use lineops_proxy::config::ProxyConfig;
use lineops_proxy::state::AppState;

fn test_config() -> ProxyConfig {
    ProxyConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".into()],
        request_timeout_secs: 5,
        environment: "test".into(),
        metrics_collector_url: None,
        log_collector_url: None,
        csp_report_url: None,
    }
}

fn app(config: ProxyConfig) -> Router {
    lineops_proxy::build_router(AppState::new(config))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_version_and_environment() {
    let response = app(test_config())
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["environment"], "test");
    assert!(body["uptime_secs"].is_u64());
}

#[tokio::test]
async fn metrics_are_accepted_without_a_collector() {
    let response = app(test_config())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/metrics")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "lcp": 1200 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn csp_reports_accept_non_json_content_types() {
    let response = app(test_config())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/csp-report")
                .header("content-type", "application/csp-report")
                .body(Body::from(r#"{"csp-report":{"blocked-uri":"evil"}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let response = app(test_config())
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[derive(Default)]
struct Collector {
    received: AtomicUsize,
}

async fn collect(State(state): State<Arc<Collector>>) -> StatusCode {
    state.received.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn spawn_collector(collector: Arc<Collector>) -> String {
    let router = Router::new()
        .route("/ingest", post(collect))
        .with_state(collector);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/ingest")
}

#[tokio::test]
async fn logs_are_forwarded_to_the_configured_collector() {
    let collector = Arc::new(Collector::default());
    let url = spawn_collector(collector.clone()).await;

    let mut config = test_config();
    config.log_collector_url = Some(url);

    let response = app(config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logs")
                .header("content-type", "application/json")
                .body(Body::from(json!([{ "level": "error" }]).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // The caller is answered before delivery completes.
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Delivery runs on a background task; give it a moment.
    for _ in 0..50 {
        if collector.received.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(collector.received.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn broken_collector_does_not_affect_the_caller() {
    let mut config = test_config();
    // Nothing listens here.
    config.metrics_collector_url = Some("http://127.0.0.1:1/ingest".into());

    let response = app(config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/metrics")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "cls": 0.02 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
