//! Template builder tests

use chrono::{TimeZone, Utc};
use ftdash::authoring::{StepDraft, TemplateBuilder};
use ftdash::errors::DashboardError;
use ftdash::models::secret::DbPassword;
use ftdash::models::step::{ServiceOperation, StepKind, StepType};

fn file_draft(file: &str) -> StepDraft {
    let mut draft = StepDraft::new(StepType::FileDeployment);
    draft.files = vec![file.to_string()];
    draft.target_path = Some("/opt/app".to_string());
    draft.target_user = Some("appuser".to_string());
    draft.target_vms = vec!["batch1".to_string()];
    draft
}

fn service_draft(service: &str) -> StepDraft {
    let mut draft = StepDraft::new(StepType::ServiceRestart);
    draft.service = Some(service.to_string());
    draft.operation = Some(ServiceOperation::Restart);
    draft.target_vms = vec!["batch1".to_string(), "batch2".to_string()];
    draft
}

#[test]
fn test_add_assigns_sequential_orders() {
    let mut builder = TemplateBuilder::new("FT-7");
    builder.add_step(file_draft("a.jar")).unwrap();
    builder.add_step(service_draft("tomcat")).unwrap();
    builder.add_step(file_draft("b.jar")).unwrap();

    let orders: Vec<_> = builder.steps().map(|(_, s)| s.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(builder.len(), 3);
}

#[test]
fn test_remove_renumbers() {
    let mut builder = TemplateBuilder::new("FT-7");
    let first = builder.add_step(file_draft("a.jar")).unwrap();
    let second = builder.add_step(service_draft("tomcat")).unwrap();
    let third = builder.add_step(file_draft("b.jar")).unwrap();

    let removed = builder.remove_step(second).unwrap();
    assert_eq!(removed.step_type(), StepType::ServiceRestart);

    assert_eq!(builder.step(first).unwrap().order, 1);
    assert_eq!(builder.step(third).unwrap().order, 2);
    assert!(builder.step(second).is_none());

    let template = builder.generate();
    template.check_structure().unwrap();
    assert_eq!(template.metadata.total_steps, 2);
    assert_eq!(template.dependencies[1].depends_on, vec![1]);
}

#[test]
fn test_invalid_draft_is_not_added() {
    let mut builder = TemplateBuilder::new("FT-7");
    let mut draft = StepDraft::new(StepType::HelmUpgrade);
    draft.description = Some("upgrade the gateway".to_string());

    let err = builder.add_step(draft).unwrap_err();
    assert_eq!(err.missing, vec!["helmDeploymentType"]);
    assert!(builder.is_empty());

    let err: DashboardError = err.into();
    assert!(err.to_string().contains("helmDeploymentType"));
}

#[test]
fn test_from_template_reopens_for_editing() {
    let mut builder = TemplateBuilder::new("FT-7");
    builder.add_step(file_draft("a.jar")).unwrap();
    builder.add_step(service_draft("tomcat")).unwrap();
    let template = builder.generate();

    let mut reopened = TemplateBuilder::from_template(&template);
    assert_eq!(reopened.ft_number(), "FT-7");
    assert_eq!(reopened.len(), 2);

    let ids: Vec<_> = reopened.steps().map(|(id, _)| id).collect();
    let original_ids: Vec<_> = builder.steps().map(|(id, _)| id).collect();
    assert!(ids.iter().all(|id| !original_ids.contains(id)));

    reopened.update_step(ids[1], service_draft("nginx")).unwrap();
    reopened.set_ft_number("FT-8");
    let edited = reopened.generate();
    assert_eq!(edited.metadata.ft_number, "FT-8");
    match &edited.steps[1].kind {
        StepKind::ServiceRestart(s) => assert_eq!(s.service, "nginx"),
        other => panic!("unexpected step kind: {:?}", other),
    }
}

#[test]
fn test_sql_password_is_redacted_in_debug() {
    let mut draft = StepDraft::new(StepType::SqlDeployment);
    draft.files = vec!["schema.sql".to_string()];
    draft.db_connection = Some("main".to_string());
    draft.db_user = Some("postgres".to_string());
    draft.db_password = Some(DbPassword::new("hunter2"));

    let mut builder = TemplateBuilder::new("FT-7");
    builder.add_step(draft).unwrap();
    let template = builder.generate();

    assert!(!format!("{:?}", template).contains("hunter2"));
    let stripped = serde_json::to_string(&template.without_db_passwords()).unwrap();
    assert!(!stripped.contains("dbPassword"));
}

#[test]
fn test_generate_twice_is_structurally_identical() {
    let mut builder = TemplateBuilder::new("FT-7");
    builder.add_step(file_draft("a.jar")).unwrap();
    builder.add_step(service_draft("tomcat")).unwrap();

    let first = builder.generate_at(Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap());
    let second = builder.generate_at(Utc.with_ymd_and_hms(2024, 6, 11, 17, 30, 0).unwrap());

    assert_ne!(first.metadata.generated_at, second.metadata.generated_at);
    assert_eq!(first.steps, second.steps);
    assert_eq!(first.dependencies, second.dependencies);
    assert_eq!(first.metadata.total_steps, second.metadata.total_steps);
    assert_eq!(first.digest().unwrap(), second.digest().unwrap());
}
