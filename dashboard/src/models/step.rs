//! Deployment step models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::secret::DbPassword;

/// Step type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    FileDeployment,
    SqlDeployment,
    ServiceRestart,
    AnsiblePlaybook,
    HelmUpgrade,
    ConfigChange,
}

impl StepType {
    pub const ALL: [StepType; 6] = [
        StepType::FileDeployment,
        StepType::SqlDeployment,
        StepType::ServiceRestart,
        StepType::AnsiblePlaybook,
        StepType::HelmUpgrade,
        StepType::ConfigChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepType::FileDeployment => "file_deployment",
            StepType::SqlDeployment => "sql_deployment",
            StepType::ServiceRestart => "service_restart",
            StepType::AnsiblePlaybook => "ansible_playbook",
            StepType::HelmUpgrade => "helm_upgrade",
            StepType::ConfigChange => "config_change",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            StepType::FileDeployment => "File Deployment",
            StepType::SqlDeployment => "SQL Deployment",
            StepType::ServiceRestart => "Service Management",
            StepType::AnsiblePlaybook => "Ansible Playbook",
            StepType::HelmUpgrade => "Helm Upgrade",
            StepType::ConfigChange => "Configuration Change",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown step type: {}", s))
    }
}

/// systemctl operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceOperation {
    Start,
    Stop,
    Restart,
    Status,
    Enable,
    Disable,
    Reload,
}

impl ServiceOperation {
    pub const ALL: [ServiceOperation; 7] = [
        ServiceOperation::Start,
        ServiceOperation::Stop,
        ServiceOperation::Restart,
        ServiceOperation::Status,
        ServiceOperation::Enable,
        ServiceOperation::Disable,
        ServiceOperation::Reload,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceOperation::Start => "start",
            ServiceOperation::Stop => "stop",
            ServiceOperation::Restart => "restart",
            ServiceOperation::Status => "status",
            ServiceOperation::Enable => "enable",
            ServiceOperation::Disable => "disable",
            ServiceOperation::Reload => "reload",
        }
    }
}

impl fmt::Display for ServiceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ServiceOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == lowered)
            .ok_or_else(|| format!("Unknown service operation: {}", s))
    }
}

/// Copy files to target VMs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeployment {
    #[serde(default)]
    pub files: Vec<String>,
    pub target_path: String,
    pub target_user: String,
    #[serde(default, rename = "targetVMs")]
    pub target_vms: Vec<String>,
    /// FT the files are taken from, when it differs from the template's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ft_number: Option<String>,
}

/// Execute SQL files against a database connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlDeployment {
    #[serde(default)]
    pub files: Vec<String>,
    pub db_connection: String,
    pub db_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_password: Option<DbPassword>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ft_number: Option<String>,
}

/// Run a systemctl operation on target VMs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRestart {
    pub service: String,
    pub operation: ServiceOperation,
    #[serde(default, rename = "targetVMs")]
    pub target_vms: Vec<String>,
}

/// Run an Ansible playbook from the backend inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsiblePlaybook {
    pub playbook: String,
}

/// Run a Helm upgrade from the backend inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmUpgrade {
    pub helm_deployment_type: String,
}

/// Manual configuration change; the description says what to change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChange {}

/// Type-specific payload of a step, tagged by `type` on the wire
///
/// Unknown extra fields on a step are ignored when reading; an unknown
/// `type` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    FileDeployment(FileDeployment),
    SqlDeployment(SqlDeployment),
    ServiceRestart(ServiceRestart),
    AnsiblePlaybook(AnsiblePlaybook),
    HelmUpgrade(HelmUpgrade),
    ConfigChange(ConfigChange),
}

impl StepKind {
    pub fn step_type(&self) -> StepType {
        match self {
            StepKind::FileDeployment(_) => StepType::FileDeployment,
            StepKind::SqlDeployment(_) => StepType::SqlDeployment,
            StepKind::ServiceRestart(_) => StepType::ServiceRestart,
            StepKind::AnsiblePlaybook(_) => StepType::AnsiblePlaybook,
            StepKind::HelmUpgrade(_) => StepType::HelmUpgrade,
            StepKind::ConfigChange(_) => StepType::ConfigChange,
        }
    }

    /// One-line description used when the operator did not write one
    pub fn summary(&self) -> String {
        match self {
            StepKind::FileDeployment(f) => format!(
                "Copy {} to {} as {} on {}",
                f.files.join(", "),
                f.target_path,
                f.target_user,
                f.target_vms.join(", ")
            ),
            StepKind::SqlDeployment(s) => {
                format!("Run {} on {} as {}", s.files.join(", "), s.db_connection, s.db_user)
            }
            StepKind::ServiceRestart(s) => format!(
                "systemctl {} {} on {}",
                s.operation,
                s.service,
                s.target_vms.join(", ")
            ),
            StepKind::AnsiblePlaybook(a) => format!("Run playbook {}", a.playbook),
            StepKind::HelmUpgrade(h) => format!("Helm upgrade {}", h.helm_deployment_type),
            StepKind::ConfigChange(_) => "Configuration change".to_string(),
        }
    }
}

/// One unit of work in a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStep {
    /// 1-based execution order
    pub order: u32,

    /// Original instruction text
    #[serde(default)]
    pub description: String,

    #[serde(flatten)]
    pub kind: StepKind,
}

impl DeploymentStep {
    pub fn new(order: u32, description: impl Into<String>, kind: StepKind) -> Self {
        Self {
            order,
            description: description.into(),
            kind,
        }
    }

    pub fn step_type(&self) -> StepType {
        self.kind.step_type()
    }

    /// Target VMs, for the step types that have them
    pub fn target_vms(&self) -> Option<&[String]> {
        match &self.kind {
            StepKind::FileDeployment(f) => Some(&f.target_vms),
            StepKind::ServiceRestart(s) => Some(&s.target_vms),
            _ => None,
        }
    }
}
