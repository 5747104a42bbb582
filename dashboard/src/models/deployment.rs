//! Deployment run models

use std::fmt;

use backend_api::StatusResponse;
use serde::{Deserialize, Serialize};

/// Status of an observed deployment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// No deployment id yet
    #[default]
    Idle,

    /// Start call in flight
    Loading,

    /// Being polled
    Running,

    /// Backend reported success
    Success,

    /// Backend reported failure, or the run could not be observed
    Failed,

    /// Finished without an explicit success signal
    Completed,
}

impl DeploymentStatus {
    /// Normalize a status string reported by the backend
    ///
    /// Returns `None` for strings this client does not know; callers treat
    /// those as "still running".
    pub fn from_reported(status: &str) -> Option<Self> {
        match status.trim().to_lowercase().as_str() {
            "idle" => Some(DeploymentStatus::Idle),
            "loading" => Some(DeploymentStatus::Loading),
            "running" | "in_progress" | "pending" => Some(DeploymentStatus::Running),
            "success" => Some(DeploymentStatus::Success),
            "failed" | "error" => Some(DeploymentStatus::Failed),
            "completed" => Some(DeploymentStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeploymentStatus::Success | DeploymentStatus::Failed | DeploymentStatus::Completed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentStatus::Idle => "idle",
            DeploymentStatus::Loading => "loading",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Completed => "completed",
        }
    }

    /// Text shown next to a log panel
    pub fn label(self) -> &'static str {
        match self {
            DeploymentStatus::Idle => "Ready",
            DeploymentStatus::Loading => "Loading...",
            DeploymentStatus::Running => "Running...",
            DeploymentStatus::Success => "Completed Successfully",
            DeploymentStatus::Failed => "Failed",
            DeploymentStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One poll result, normalized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Full log to date
    pub logs: Vec<String>,

    /// Reported status, if the backend sent one this client understands
    pub status: Option<DeploymentStatus>,
}

impl StatusReport {
    pub fn new(logs: Vec<String>, status: Option<DeploymentStatus>) -> Self {
        Self { logs, status }
    }
}

impl From<StatusResponse> for StatusReport {
    fn from(response: StatusResponse) -> Self {
        Self {
            logs: response.logs,
            status: response
                .status
                .as_deref()
                .and_then(DeploymentStatus::from_reported),
        }
    }
}
