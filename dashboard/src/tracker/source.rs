//! Where tracked status comes from

use std::fmt;

use async_trait::async_trait;

use crate::errors::DashboardError;
use crate::models::deployment::StatusReport;

/// Backend route polled for a deployment's logs and status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusEndpoint {
    /// `/api/deploy/status/:id`
    DeployStatus,

    /// `/api/deploy/:id/logs`
    DeployLogs,

    /// `/api/systemctl/:id/logs`
    SystemctlLogs,

    /// `/api/template-deploy/:id/logs`
    TemplateDeployLogs,
}

impl StatusEndpoint {
    /// Unencoded path segments for a deployment id
    pub fn segments(self, deployment_id: &str) -> [&str; 4] {
        match self {
            StatusEndpoint::DeployStatus => ["api", "deploy", "status", deployment_id],
            StatusEndpoint::DeployLogs => ["api", "deploy", deployment_id, "logs"],
            StatusEndpoint::SystemctlLogs => ["api", "systemctl", deployment_id, "logs"],
            StatusEndpoint::TemplateDeployLogs => {
                ["api", "template-deploy", deployment_id, "logs"]
            }
        }
    }
}

impl fmt::Display for StatusEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments(":id").join("/"))
    }
}

/// Status source trait for testability
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the full log to date and the reported status
    async fn fetch_status(
        &self,
        endpoint: StatusEndpoint,
        deployment_id: &str,
    ) -> Result<StatusReport, DashboardError>;
}
