//! Backend client and operation tests against an in-process fake backend

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use backend_api::{HistoryEntry, TemplateHistoryEntry};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use ftdash::authn::AuthGate;
use ftdash::authoring::{InstructionParser, ParserDefaults, StepDraft, TemplateBuilder};
use ftdash::errors::DashboardError;
use ftdash::http::HttpClient;
use ftdash::models::deployment::DeploymentStatus;
use ftdash::models::secret::DbPassword;
use ftdash::models::step::{ServiceOperation, StepType};
use ftdash::models::template::DeploymentTemplate;
use ftdash::options::ClientOptions;
use ftdash::services::{
    HistoryService, LogOrigin, SystemctlOperation, SystemctlRoute, SystemctlService,
    TemplateDeployer, TemplateGenerator,
};
use ftdash::tracker::{Completion, TrackerSettings};

/// Request bodies the fake backend has seen
#[derive(Default)]
struct Recorded {
    saved: Mutex<Vec<Value>>,
    deployed: Mutex<Vec<Value>>,
    cleared: Mutex<Vec<Value>>,
}

type Shared = Arc<Recorded>;

async fn list_templates() -> Json<Value> {
    Json(json!({
        "templates": [
            {"name": "FT-1_template", "ft_number": "FT-1", "total_steps": 2}
        ]
    }))
}

async fn get_template(Path(name): Path<String>) -> Response {
    if name == "missing" {
        return (StatusCode::NOT_FOUND, "template not found").into_response();
    }
    let template = DeploymentTemplate::new(name, Vec::new(), Utc::now());
    Json(serde_json::to_value(template).unwrap()).into_response()
}

async fn save_template(State(recorded): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    recorded.saved.lock().unwrap().push(body);
    Json(json!({"message": "saved", "path": "templates/FT-1_template.json"}))
}

async fn deploy_template(State(recorded): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    recorded.deployed.lock().unwrap().push(body);
    Json(json!({"deploymentId": "dep-1", "status": "running"}))
}

async fn deploy_status(Path(id): Path<String>) -> Json<Value> {
    Json(json!({"logs": [format!("{} started", id), "done"], "status": "success"}))
}

async fn deploy_logs(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "log store offline").into_response(),
        "empty" | "d-embedded" => Json(json!({"logs": [], "status": "success"})).into_response(),
        _ => Json(json!({"logs": ["copied app.jar"], "status": "running"})).into_response(),
    }
}

async fn systemctl_operation() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "No reachable VMs"})),
    )
        .into_response()
}

async fn deploy_systemd() -> Json<Value> {
    Json(json!({"deployment_id": "sys-1"}))
}

async fn systemctl_logs() -> Json<Value> {
    Json(json!({"logs": ["nginx restarted"], "status": "success"}))
}

async fn history() -> Json<Value> {
    Json(json!([
        {"id": "d-1", "type": "file", "status": "success", "timestamp": 1718000000.0}
    ]))
}

async fn clear_history(State(recorded): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    recorded.cleared.lock().unwrap().push(body);
    Json(json!({"message": "cleared"}))
}

async fn vms() -> Json<Value> {
    Json(json!([{"name": "batch1", "status": "up"}, "batch2"]))
}

async fn playbooks() -> Json<Value> {
    Json(json!(["site.yml"]))
}

async fn helm_types() -> Json<Value> {
    Json(json!([{"pod_name": "gateway"}]))
}

async fn users() -> Json<Value> {
    Json(json!(["abpwrk1", {"name": "infadmin"}]))
}

/// Start the fake backend and return its base URL
async fn backend() -> (String, Shared) {
    let recorded = Shared::default();
    let app = Router::new()
        .route("/api/templates", get(list_templates))
        .route("/api/template/{name}", get(get_template))
        .route("/api/templates/save", post(save_template))
        .route("/api/deploy/template", post(deploy_template))
        .route("/api/deploy/systemd", post(deploy_systemd))
        .route("/api/deploy/status/{id}", get(deploy_status))
        .route("/api/deploy/{id}/logs", get(deploy_logs))
        .route("/api/systemctl/operation", post(systemctl_operation))
        .route("/api/systemctl/{id}/logs", get(systemctl_logs))
        .route("/api/deployments/history", get(history))
        .route("/api/deployments/clear", post(clear_history))
        .route("/api/vms", get(vms))
        .route("/api/ansible-playbooks", get(playbooks))
        .route("/api/helm-deployment-types", get(helm_types))
        .route("/api/users", get(users))
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), recorded)
}

fn client(base_url: &str, persist_db_passwords: bool) -> Arc<HttpClient> {
    Arc::new(
        HttpClient::new(&ClientOptions {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            persist_db_passwords,
        })
        .unwrap(),
    )
}

fn signed_in() -> Arc<dyn AuthGate> {
    Arc::new(true)
}

fn fast_tracking() -> TrackerSettings {
    TrackerSettings {
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

fn sql_template() -> DeploymentTemplate {
    let mut draft = StepDraft::new(StepType::SqlDeployment);
    draft.files = vec!["schema.sql".to_string()];
    draft.db_connection = Some("main".to_string());
    draft.db_user = Some("postgres".to_string());
    draft.db_password = Some(DbPassword::new("hunter2"));

    let mut builder = TemplateBuilder::new("FT-1");
    builder.add_step(draft).unwrap();
    builder.generate()
}

#[tokio::test]
async fn test_save_strips_db_passwords() {
    let (url, recorded) = backend().await;
    assert_ok!(client(&url, false).save_template(&sql_template()).await);

    let saved = recorded.saved.lock().unwrap();
    assert_eq!(saved[0]["ft_number"], "FT-1");
    let step = &saved[0]["template"]["steps"][0];
    assert_eq!(step["dbUser"], "postgres");
    assert!(step.get("dbPassword").is_none());
}

#[tokio::test]
async fn test_save_keeps_db_passwords_when_configured() {
    let (url, recorded) = backend().await;
    assert_ok!(client(&url, true).save_template(&sql_template()).await);

    let saved = recorded.saved.lock().unwrap();
    assert!(saved[0]["template"]["steps"][0].get("dbPassword").is_some());
}

#[tokio::test]
async fn test_template_names_are_encoded() {
    let (url, _) = backend().await;
    let c = client(&url, false);

    let template = assert_ok!(c.get_template("FT 12/a_template").await);
    assert_eq!(template.metadata.ft_number, "FT 12/a_template");

    let err = assert_err!(c.get_template("missing").await);
    match err {
        DashboardError::Network(message) => assert!(message.contains("404")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_deploy_saved_template_tracks_to_success() {
    let (url, recorded) = backend().await;
    let deployer = TemplateDeployer::new(client(&url, false), signed_in(), fast_tracking());

    let templates = assert_ok!(deployer.list().await);
    assert_eq!(templates[0].name, "FT-1_template");

    let handle = assert_ok!(deployer.deploy("FT-1_template").await);
    let snapshot = handle.wait().await;
    assert_eq!(snapshot.status, DeploymentStatus::Success);
    assert_eq!(snapshot.completion, Some(Completion::Reported));
    assert_eq!(snapshot.logs, vec!["dep-1 started", "done"]);

    let deployed = recorded.deployed.lock().unwrap();
    assert_eq!(deployed[0]["ft_number"], "FT-1");
    assert_eq!(deployed[0]["template"], "FT-1_template");
}

#[tokio::test]
async fn test_deploy_requires_selection() {
    let (url, _) = backend().await;
    let deployer = TemplateDeployer::new(client(&url, false), signed_in(), fast_tracking());
    let err = assert_err!(deployer.deploy("  ").await);
    assert!(matches!(err, DashboardError::Validation(_)));
}

#[tokio::test]
async fn test_rejected_systemctl_start_fails_tracker() {
    let (url, _) = backend().await;
    let service = SystemctlService::new(client(&url, false), signed_in(), fast_tracking());
    let operation = SystemctlOperation {
        vms: vec!["batch1".to_string()],
        service: "nginx".to_string(),
        operation: ServiceOperation::Restart,
    };

    let handle = assert_ok!(service.execute(&operation, SystemctlRoute::Operation).await);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.status, DeploymentStatus::Failed);
    assert_eq!(snapshot.completion, Some(Completion::StartFailed));
    let message = snapshot.last_error.unwrap();
    assert!(message.starts_with("Failed to execute systemctl operation:"));
    assert!(message.ends_with("503 Service Unavailable - No reachable VMs"));

    let handle = assert_ok!(service.execute(&operation, SystemctlRoute::DeploySystemd).await);
    let snapshot = handle.wait().await;
    assert_eq!(snapshot.deployment_id.as_deref(), Some("sys-1"));
    assert_eq!(snapshot.status, DeploymentStatus::Success);
    assert_eq!(snapshot.logs, vec!["nginx restarted"]);
}

#[tokio::test]
async fn test_history_log_fallbacks() {
    let (url, _) = backend().await;
    let history = HistoryService::new(client(&url, false), signed_in());

    let entries: Vec<HistoryEntry> = assert_ok!(history.deployments().await);
    assert_eq!(entries[0].id, "d-1");

    let mut embedded = entries[0].clone();
    embedded.id = "d-embedded".to_string();
    embedded.logs = Some(vec!["stored line".to_string()]);
    let entries = vec![embedded];

    let logs = assert_ok!(history.logs("d-live", &entries).await);
    assert_eq!(logs.origin, LogOrigin::Backend);
    assert_eq!(logs.status, DeploymentStatus::Running);

    let logs = assert_ok!(history.logs("d-embedded", &entries).await);
    assert_eq!(logs.origin, LogOrigin::HistoryEntry);
    assert_eq!(logs.logs, vec!["stored line"]);
    assert_eq!(logs.status, DeploymentStatus::Completed);

    let logs = assert_ok!(history.logs("empty", &entries).await);
    assert_eq!(logs.origin, LogOrigin::Placeholder);
    assert_eq!(
        logs.logs,
        vec!["No detailed logs available for deployment empty"]
    );

    let logs = assert_ok!(history.logs("boom", &entries).await);
    assert_eq!(logs.origin, LogOrigin::Error);
    assert_eq!(logs.status, DeploymentStatus::Failed);
    assert_eq!(logs.logs, vec!["Error loading logs. Please try again."]);
}

#[tokio::test]
async fn test_template_logs_without_backend_route_report_error() {
    let (url, _) = backend().await;
    let history = HistoryService::new(client(&url, false), signed_in());
    let entries: Vec<TemplateHistoryEntry> = Vec::new();

    let logs = assert_ok!(history.template_logs("t-1", &entries).await);
    assert_eq!(logs.origin, LogOrigin::Error);
    assert_eq!(logs.logs, vec!["Error loading template logs. Please try again."]);
}

#[tokio::test]
async fn test_clear_history() {
    let (url, recorded) = backend().await;
    let history = HistoryService::new(client(&url, false), signed_in());

    let err = assert_err!(history.clear(-1).await);
    assert!(matches!(err, DashboardError::Validation(_)));
    assert!(recorded.cleared.lock().unwrap().is_empty());

    assert_ok!(history.clear(30).await);
    assert_eq!(recorded.cleared.lock().unwrap()[0], json!({"days": 30}));
}

#[tokio::test]
async fn test_operations_require_sign_in() {
    let (url, recorded) = backend().await;
    let signed_out: Arc<dyn AuthGate> = Arc::new(false);
    let c = client(&url, false);

    let deployer = TemplateDeployer::new(c.clone(), signed_out.clone(), fast_tracking());
    let err = assert_err!(deployer.deploy("FT-1_template").await);
    assert!(matches!(err, DashboardError::AuthRequired(_)));
    assert!(recorded.deployed.lock().unwrap().is_empty());

    let parser = InstructionParser::new(ParserDefaults::default()).unwrap();
    let generator = TemplateGenerator::new(c, parser, signed_out);
    let err = assert_err!(generator.generate("FT-1", "restart service nginx").await);
    assert!(matches!(err, DashboardError::AuthRequired(_)));
}

#[tokio::test]
async fn test_generate_saves_template() {
    let (url, recorded) = backend().await;
    let parser = InstructionParser::new(ParserDefaults::default().with_selected_vms(["batch1"]))
        .unwrap();
    let generator = TemplateGenerator::new(client(&url, false), parser, signed_in());

    let generated = assert_ok!(
        generator
            .generate("FT-9", "restart service tomcat\nrun ansible playbook site.yml")
            .await
    );
    assert!(generated.saved);
    assert_eq!(generated.template.metadata.total_steps, 2);
    let lines = generated.log.lines();
    assert!(lines[0].ends_with("Starting template generation for FT-9"));
    assert!(lines[2].ends_with("Identified 2 deployment steps"));
    assert!(lines.last().unwrap().ends_with("Template saved successfully"));

    assert_eq!(recorded.saved.lock().unwrap()[0]["ft_number"], "FT-9");
}

#[tokio::test]
async fn test_generate_keeps_template_when_save_fails() {
    // nothing listens on the discard port
    let parser = InstructionParser::new(ParserDefaults::default()).unwrap();
    let generator = TemplateGenerator::new(client("http://127.0.0.1:9", false), parser, signed_in());

    let generated = assert_ok!(generator.generate("FT-9", "helm upgrade gateway").await);
    assert!(!generated.saved);
    assert_eq!(generated.template.steps.len(), 1);
    assert!(generated
        .log
        .lines()
        .last()
        .unwrap()
        .ends_with("Warning: Template generated but failed to save to backend"));
}

#[tokio::test]
async fn test_seed_parser_defaults_from_inventory() {
    let (url, _) = backend().await;
    let defaults = assert_ok!(
        client(&url, false)
            .seed_parser_defaults(ParserDefaults::default())
            .await
    );
    assert_eq!(defaults.known_vms, vec!["batch1", "batch2"]);
    assert_eq!(defaults.known_playbooks, vec!["site.yml"]);
    assert_eq!(defaults.known_helm_types, vec!["gateway"]);
}

#[tokio::test]
async fn test_users_accept_names_and_records() {
    let (url, _) = backend().await;
    let users = assert_ok!(client(&url, false).users().await);
    assert_eq!(users, vec!["abpwrk1", "infadmin"]);
}
