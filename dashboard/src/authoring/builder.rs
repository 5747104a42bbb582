//! Interactive template builder
//!
//! Steps are entered one at a time as [`StepDraft`]s, validated, kept in
//! order and addressed by a builder-assigned [`StepId`].

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{DashboardError, ValidationError};
use crate::models::secret::DbPassword;
use crate::models::step::{
    AnsiblePlaybook, ConfigChange, DeploymentStep, FileDeployment, HelmUpgrade,
    ServiceOperation, ServiceRestart, SqlDeployment, StepKind, StepType,
};
use crate::models::template::DeploymentTemplate;

/// Builder-assigned step identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId(Uuid);

impl StepId {
    fn new() -> Self {
        StepId(Uuid::new_v4())
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Form input for one step: a declared type plus whatever fields were filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    pub step_type: StepType,
    pub description: Option<String>,
    pub files: Vec<String>,
    pub target_path: Option<String>,
    pub target_user: Option<String>,
    pub target_vms: Vec<String>,
    pub ft_number: Option<String>,
    pub db_connection: Option<String>,
    pub db_user: Option<String>,
    pub db_name: Option<String>,
    pub db_password: Option<DbPassword>,
    pub service: Option<String>,
    pub operation: Option<ServiceOperation>,
    pub playbook: Option<String>,
    pub helm_deployment_type: Option<String>,
}

fn filled(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl StepDraft {
    pub fn new(step_type: StepType) -> Self {
        Self {
            step_type,
            description: None,
            files: Vec::new(),
            target_path: None,
            target_user: None,
            target_vms: Vec::new(),
            ft_number: None,
            db_connection: None,
            db_user: None,
            db_name: None,
            db_password: None,
            service: None,
            operation: None,
            playbook: None,
            helm_deployment_type: None,
        }
    }

    /// Draft pre-filled from an existing step, for editing
    pub fn from_step(step: &DeploymentStep) -> Self {
        let mut draft = StepDraft::new(step.step_type());
        draft.description = Some(step.description.clone());
        match &step.kind {
            StepKind::FileDeployment(f) => {
                draft.files = f.files.clone();
                draft.target_path = Some(f.target_path.clone());
                draft.target_user = Some(f.target_user.clone());
                draft.target_vms = f.target_vms.clone();
                draft.ft_number = f.ft_number.clone();
            }
            StepKind::SqlDeployment(s) => {
                draft.files = s.files.clone();
                draft.db_connection = Some(s.db_connection.clone());
                draft.db_user = Some(s.db_user.clone());
                draft.db_name = s.db_name.clone();
                draft.db_password = s.db_password.clone();
                draft.ft_number = s.ft_number.clone();
            }
            StepKind::ServiceRestart(s) => {
                draft.service = Some(s.service.clone());
                draft.operation = Some(s.operation);
                draft.target_vms = s.target_vms.clone();
            }
            StepKind::AnsiblePlaybook(a) => draft.playbook = Some(a.playbook.clone()),
            StepKind::HelmUpgrade(h) => {
                draft.helm_deployment_type = Some(h.helm_deployment_type.clone())
            }
            StepKind::ConfigChange(_) => {}
        }
        draft
    }

    /// Check required fields for the declared type and build the payload
    ///
    /// Every missing field is reported, not only the first.
    pub fn validate(&self) -> Result<StepKind, ValidationError> {
        let mut missing = Vec::new();
        let mut require = |name: &'static str, value: Option<String>| {
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let kind = match self.step_type {
            StepType::FileDeployment => {
                let files = non_empty(&self.files);
                let target_vms = non_empty(&self.target_vms);
                if files.is_empty() {
                    require("files", None);
                }
                let target_path = require("targetPath", filled(&self.target_path));
                let target_user = require("targetUser", filled(&self.target_user));
                if target_vms.is_empty() {
                    require("targetVMs", None);
                }
                StepKind::FileDeployment(FileDeployment {
                    files,
                    target_path,
                    target_user,
                    target_vms,
                    ft_number: filled(&self.ft_number),
                })
            }
            StepType::SqlDeployment => {
                let files = non_empty(&self.files);
                if files.is_empty() {
                    require("files", None);
                }
                let db_connection = require("dbConnection", filled(&self.db_connection));
                let db_user = require("dbUser", filled(&self.db_user));
                StepKind::SqlDeployment(SqlDeployment {
                    files,
                    db_connection,
                    db_user,
                    db_name: filled(&self.db_name),
                    db_password: self.db_password.clone().filter(|p| !p.is_empty()),
                    ft_number: filled(&self.ft_number),
                })
            }
            StepType::ServiceRestart => {
                let service = require("service", filled(&self.service));
                if self.operation.is_none() {
                    require("operation", None);
                }
                let target_vms = non_empty(&self.target_vms);
                if target_vms.is_empty() {
                    require("targetVMs", None);
                }
                StepKind::ServiceRestart(ServiceRestart {
                    service,
                    operation: self.operation.unwrap_or(ServiceOperation::Restart),
                    target_vms,
                })
            }
            StepType::AnsiblePlaybook => StepKind::AnsiblePlaybook(AnsiblePlaybook {
                playbook: require("playbook", filled(&self.playbook)),
            }),
            StepType::HelmUpgrade => StepKind::HelmUpgrade(HelmUpgrade {
                helm_deployment_type: require(
                    "helmDeploymentType",
                    filled(&self.helm_deployment_type),
                ),
            }),
            StepType::ConfigChange => {
                require("description", filled(&self.description));
                StepKind::ConfigChange(ConfigChange {})
            }
        };

        if missing.is_empty() {
            Ok(kind)
        } else {
            Err(ValidationError::missing(self.step_type.as_str(), missing))
        }
    }

    fn description_for(&self, kind: &StepKind) -> String {
        filled(&self.description).unwrap_or_else(|| kind.summary())
    }
}

/// Builds a template from validated steps
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    ft_number: String,
    entries: Vec<(StepId, DeploymentStep)>,
}

impl TemplateBuilder {
    pub fn new(ft_number: impl Into<String>) -> Self {
        Self {
            ft_number: ft_number.into(),
            entries: Vec::new(),
        }
    }

    /// Re-open a persisted template for editing, with fresh step ids
    pub fn from_template(template: &DeploymentTemplate) -> Self {
        let mut steps = template.steps.clone();
        steps.sort_by_key(|s| s.order);
        let mut builder = TemplateBuilder::new(template.metadata.ft_number.clone());
        builder.entries = steps.into_iter().map(|s| (StepId::new(), s)).collect();
        builder.renumber();
        builder
    }

    pub fn ft_number(&self) -> &str {
        &self.ft_number
    }

    pub fn set_ft_number(&mut self, ft_number: impl Into<String>) {
        self.ft_number = ft_number.into();
    }

    /// Validate and append a step
    pub fn add_step(&mut self, draft: StepDraft) -> Result<StepId, ValidationError> {
        let kind = draft.validate()?;
        let description = draft.description_for(&kind);
        let id = StepId::new();
        let order = self.entries.len() as u32 + 1;
        debug!("Adding step {} ({}) as {}", order, kind.step_type(), id);
        self.entries
            .push((id, DeploymentStep::new(order, description, kind)));
        Ok(id)
    }

    /// Replace a step's fields in place, keeping its position
    pub fn update_step(&mut self, id: StepId, draft: StepDraft) -> Result<(), DashboardError> {
        let index = self.index_of(id)?;
        let kind = draft.validate()?;
        let description = draft.description_for(&kind);
        let step = &mut self.entries[index].1;
        step.kind = kind;
        step.description = description;
        Ok(())
    }

    /// Delete a step and close the gap in ordering
    pub fn remove_step(&mut self, id: StepId) -> Result<DeploymentStep, DashboardError> {
        let index = self.index_of(id)?;
        let (_, step) = self.entries.remove(index);
        self.renumber();
        Ok(step)
    }

    pub fn step(&self, id: StepId) -> Option<&DeploymentStep> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, step)| step)
    }

    /// Steps with their ids, in order
    pub fn steps(&self) -> impl Iterator<Item = (StepId, &DeploymentStep)> {
        self.entries.iter().map(|(id, step)| (*id, step))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze into a template stamped with the current time
    pub fn generate(&self) -> DeploymentTemplate {
        self.generate_at(Utc::now())
    }

    pub fn generate_at(&self, generated_at: DateTime<Utc>) -> DeploymentTemplate {
        let steps = self.entries.iter().map(|(_, s)| s.clone()).collect();
        DeploymentTemplate::new(self.ft_number.clone(), steps, generated_at)
    }

    fn index_of(&self, id: StepId) -> Result<usize, DashboardError> {
        self.entries
            .iter()
            .position(|(entry_id, _)| *entry_id == id)
            .ok_or_else(|| DashboardError::NotFound(format!("step {}", id)))
    }

    fn renumber(&mut self) {
        for (index, (_, step)) in self.entries.iter_mut().enumerate() {
            step.order = index as u32 + 1;
        }
    }
}
