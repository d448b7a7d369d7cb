//! Entity service and digital-form service tests over a mock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use lineops_client::cache::QueryCache;
use lineops_client::gateway::ApiGateway;
use lineops_client::service::ServiceError;
use lineops_client::ServiceRegistry;
use lineops_core::entities::{CreateTeam, UpdateTeam};
use lineops_core::feedback::NoopNotifier;
use lineops_core::form::FormStatus;
use lineops_core::pagination::ListQuery;
use lineops_workflow::coordinator::{FormTransitionBackend, FormWorkflowCoordinator};

#[derive(Default)]
struct Backend {
    team_list_calls: AtomicUsize,
    team_detail_calls: AtomicUsize,
    team_create_calls: AtomicUsize,
    form_detail_calls: AtomicUsize,
    form_submit_calls: AtomicUsize,
}

fn team_json(id: &str, code: &str, name: &str) -> serde_json::Value {
    json!({ "id": id, "code": code, "name": name, "lineId": "l1", "description": null })
}

fn form_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "formCode": "DF-001",
        "formName": "Line 1 daily",
        "date": "2026-03-02",
        "shiftType": "REGULAR",
        "lineId": "l1",
        "status": status,
        "createdById": null,
        "updatedById": null,
        "submitTime": null,
        "approvalRequestId": null,
        "isExported": false,
        "createdAt": "2026-03-02T00:30:00Z",
        "updatedAt": "2026-03-02T00:30:00Z"
    })
}

async fn list_teams(State(state): State<Arc<Backend>>) -> Json<serde_json::Value> {
    state.team_list_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "data": [team_json("t1", "T-01", "Sewing A"), team_json("t2", "T-02", "Sewing B")],
        "total": 2,
        "page": 1,
        "limit": 10
    }))
}

async fn get_team(
    State(state): State<Arc<Backend>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.team_detail_calls.fetch_add(1, Ordering::SeqCst);
    if id == "flaky" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "backend hiccup", "code": "INTERNAL" })),
        );
    }
    (
        StatusCode::OK,
        Json(team_json(&id, "T-01", "Sewing A (server)")),
    )
}

async fn create_team(State(state): State<Arc<Backend>>) -> Json<serde_json::Value> {
    state.team_create_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "id": "t9" }))
}

async fn update_team(Path(_id): Path<String>) -> StatusCode {
    StatusCode::OK
}

async fn delete_team(Path(_id): Path<String>) -> StatusCode {
    StatusCode::OK
}

async fn get_form(
    State(state): State<Arc<Backend>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    state.form_detail_calls.fetch_add(1, Ordering::SeqCst);
    Json(form_json(&id, "DRAFT"))
}

async fn submit_form(State(state): State<Arc<Backend>>) -> StatusCode {
    state.form_submit_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn spawn_backend(backend: Arc<Backend>) -> String {
    let router = Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}", get(get_team).put(update_team).delete(delete_team))
        .route("/digital-forms/{id}", get(get_form))
        .route("/digital-forms/{id}/submit", post(submit_form))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn registry(base: &str) -> ServiceRegistry {
    ServiceRegistry::new(
        Arc::new(ApiGateway::with_timeout(base, Duration::from_secs(5)).unwrap()),
        Arc::new(QueryCache::new()),
        Arc::new(NoopNotifier),
    )
}

#[tokio::test]
async fn list_primes_detail_cache() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    let page = teams.list(&ListQuery::default()).await.unwrap();
    assert_eq!(page.total, 2);

    // The detail read is served from the list-primed cache entry: same
    // code/name as the list row, no detail round-trip.
    let team = teams.get_by_id("t1").await.unwrap();
    assert_eq!(team.code, page.data[0].code);
    assert_eq!(team.name, page.data[0].name);
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fresh_list_is_served_from_cache() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    let query = ListQuery::default().page(1).limit(10);
    teams.list(&query).await.unwrap();
    teams.list(&query).await.unwrap();
    assert_eq!(backend.team_list_calls.load(Ordering::SeqCst), 1);

    // A different filter set is a different cache key.
    teams.list(&query.clone().filter("lineId", "l1")).await.unwrap();
    assert_eq!(backend.team_list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn update_invalidates_detail_for_next_read() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    teams.get_by_id("t1").await.unwrap();
    teams.get_by_id("t1").await.unwrap();
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 1);

    let dto = UpdateTeam {
        name: Some("Sewing A2".into()),
        description: None,
    };
    teams.update("t1", &dto, false).await.unwrap();

    teams.get_by_id("t1").await.unwrap();
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn forced_update_refetches_immediately() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    let dto = UpdateTeam {
        name: Some("Sewing A2".into()),
        description: None,
    };
    teams.update("t1", &dto, true).await.unwrap();
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 1);

    // The forced refetch left a fresh detail entry behind.
    teams.get_by_id("t1").await.unwrap();
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn forced_update_survives_a_failed_refetch() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    let dto = UpdateTeam {
        name: Some("Sewing A2".into()),
        description: None,
    };
    // The PUT succeeds; only the follow-up detail refetch errors. The
    // mutation must still report success.
    assert!(teams.update("flaky", &dto, true).await.is_ok());
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 1);

    // Nothing usable was cached, so the next read goes to the network.
    let err = teams.get_by_id("flaky").await.unwrap_err();
    assert_matches!(err, ServiceError::Gateway(_));
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_create_dto_never_reaches_the_network() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    let dto = CreateTeam {
        code: String::new(),
        name: "Sewing A".into(),
        line_id: "l1".into(),
        description: None,
    };
    let err = teams.create(&dto).await.unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));
    assert_eq!(backend.team_create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn create_returns_server_id_and_invalidates_lists() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    teams.list(&ListQuery::default()).await.unwrap();

    let dto = CreateTeam {
        code: "T-09".into(),
        name: "Packing".into(),
        line_id: "l1".into(),
        description: None,
    };
    let id = teams.create(&dto).await.unwrap();
    assert_eq!(id, "t9");

    // The stale list is refetched on the next read.
    teams.list(&ListQuery::default()).await.unwrap();
    assert_eq!(backend.team_list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn delete_drops_the_detail_entry() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let teams = registry(&base).teams();

    teams.get_by_id("t1").await.unwrap();
    teams.delete("t1").await.unwrap();
    teams.get_by_id("t1").await.unwrap();
    assert_eq!(backend.team_detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn coordinator_submits_through_the_form_service() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let registry = registry(&base);
    let forms = Arc::new(registry.digital_forms());

    let form = forms.get_by_id("f1").await.unwrap();
    assert_eq!(form.status, FormStatus::Draft);

    let coordinator = FormWorkflowCoordinator::new(forms.clone(), Arc::new(NoopNotifier));
    coordinator.open_form(&form);

    assert!(coordinator.submit_form("f1", Some("ar-1")).await);
    assert_eq!(backend.form_submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.status("f1"), Some(FormStatus::Pending));

    // The transition invalidated the cached form detail.
    forms.get_by_id("f1").await.unwrap();
    assert_eq!(backend.form_detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unroutable_transition_surfaces_backend_error() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend).await;
    let forms = registry(&base).digital_forms();

    // The mock exposes no approve route; the 404 must come back as a
    // backend error, not a panic or silent success.
    let err = forms.approve("f1").await.unwrap_err();
    assert!(err.to_string().contains("404"));
}
