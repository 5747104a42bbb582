//! systemctl operations on target VMs

use std::sync::Arc;

use backend_api::SystemctlRequest;
use tracing::{error, info};

use crate::authn::AuthGate;
use crate::errors::{DashboardError, ValidationError};
use crate::http::client::HttpClient;
use crate::models::step::ServiceOperation;
use crate::tracker::fsm::TrackerSettings;
use crate::tracker::handle::TrackerHandle;
use crate::tracker::source::{StatusEndpoint, StatusSource};

/// Backend route that starts the operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SystemctlRoute {
    /// `/api/systemctl/operation`
    #[default]
    Operation,

    /// `/api/deploy/systemd`
    DeploySystemd,
}

/// One systemctl request as entered by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemctlOperation {
    pub vms: Vec<String>,
    pub service: String,
    pub operation: ServiceOperation,
}

impl SystemctlOperation {
    /// Reject empty VM selections and service names
    pub fn validate(&self) -> Result<SystemctlRequest, ValidationError> {
        let vms: Vec<String> = self
            .vms
            .iter()
            .map(|vm| vm.trim())
            .filter(|vm| !vm.is_empty())
            .map(str::to_string)
            .collect();
        let service = self.service.trim();

        let mut missing = Vec::new();
        if vms.is_empty() {
            missing.push("vms");
        }
        if service.is_empty() {
            missing.push("service");
        }
        if !missing.is_empty() {
            return Err(ValidationError::missing("systemctl operation", missing));
        }

        Ok(SystemctlRequest {
            vms,
            service: service.to_string(),
            operation: self.operation.as_str().to_string(),
        })
    }
}

/// systemctl operations
pub struct SystemctlService {
    client: Arc<HttpClient>,
    auth: Arc<dyn AuthGate>,
    tracker: TrackerSettings,
}

impl SystemctlService {
    pub fn new(client: Arc<HttpClient>, auth: Arc<dyn AuthGate>, tracker: TrackerSettings) -> Self {
        Self {
            client,
            auth,
            tracker,
        }
    }

    /// Services that can be managed
    pub async fn services(&self) -> Result<Vec<String>, DashboardError> {
        self.auth.require("list services")?;
        self.client.systemctl_services().await
    }

    /// VMs in the inventory
    pub async fn vms(&self) -> Result<Vec<String>, DashboardError> {
        self.auth.require("list VMs")?;
        self.client.vms().await
    }

    /// Start an operation and track its logs
    ///
    /// A rejected start yields a tracker already in `failed`.
    pub async fn execute(
        &self,
        operation: &SystemctlOperation,
        route: SystemctlRoute,
    ) -> Result<TrackerHandle, DashboardError> {
        self.auth.require("run systemctl operations")?;
        let request = operation.validate()?;

        let started = match route {
            SystemctlRoute::Operation => self.client.systemctl_operation(&request).await,
            SystemctlRoute::DeploySystemd => self.client.deploy_systemd(&request).await,
        };

        match started {
            Ok(response) => {
                info!(
                    "Systemctl {} {} started on {} VM(s): {}",
                    request.operation,
                    request.service,
                    request.vms.len(),
                    response.deployment_id
                );
                let source: Arc<dyn StatusSource> = self.client.clone();
                Ok(TrackerHandle::spawn(
                    source,
                    StatusEndpoint::SystemctlLogs,
                    response.deployment_id,
                    self.tracker.clone(),
                ))
            }
            Err(e) => {
                error!("Systemctl {} {} failed to start: {}", request.operation, request.service, e);
                Ok(TrackerHandle::failed(
                    self.tracker.clone(),
                    format!("Failed to execute systemctl operation: {}", e),
                ))
            }
        }
    }
}
