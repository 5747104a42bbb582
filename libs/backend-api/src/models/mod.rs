//! API models

use serde::{Deserialize, Serialize};

/// Summary of a step as listed alongside a saved template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStepSummary {
    pub order: u32,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub description: String,
}

/// Saved template info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ft_number: String,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub steps: Vec<TemplateStepSummary>,
}

/// Template list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateListResponse {
    #[serde(default)]
    pub templates: Vec<TemplateInfo>,
}

/// Save template request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveTemplateRequest<T> {
    pub ft_number: String,
    pub template: T,
}

/// Deploy template request
///
/// `template` is either the saved template's name or an inline template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployTemplateRequest<T> {
    pub ft_number: String,
    pub template: T,
}

/// Response of every call that starts a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResponse {
    #[serde(rename = "deploymentId", alias = "deployment_id")]
    pub deployment_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "initiatedBy")]
    pub initiated_by: Option<String>,
}

/// Status and logs of a deployment run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ft_number: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub initiated_by: Option<String>,
    #[serde(default)]
    pub total_steps: Option<u32>,
}

/// History timestamp; the backend writes either epoch seconds or ISO-8601
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(f64),
    Text(String),
}

/// Entry of the regular deployment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub ft: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub vms: Option<Vec<String>>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub logs: Option<Vec<String>>,
    #[serde(default)]
    pub original_deployment: Option<String>,
    #[serde(default)]
    pub logged_in_user: Option<String>,
    /// Template name, or the full template for template deployments
    #[serde(default)]
    pub template: Option<serde_json::Value>,
}

/// Entry of the template deployment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateHistoryEntry {
    pub id: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub ft_number: String,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub logged_in_user: Option<String>,
}

/// Clear history request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearHistoryRequest {
    pub days: u32,
}

/// Generic acknowledgement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Service list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListResponse {
    #[serde(default)]
    pub services: Vec<String>,
}

/// Systemctl operation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemctlRequest {
    pub vms: Vec<String>,
    pub service: String,
    pub operation: String,
}

/// Inventory item; the backend serves bare names or records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InventoryItem {
    Name(String),
    Record {
        #[serde(alias = "pod_name")]
        name: String,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },
}

impl InventoryItem {
    pub fn name(&self) -> &str {
        match self {
            InventoryItem::Name(name) => name,
            InventoryItem::Record { name, .. } => name,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
