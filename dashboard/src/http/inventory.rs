//! Inventory and systemctl API client

use backend_api::{DeployResponse, InventoryItem, ServiceListResponse, SystemctlRequest};
use tracing::debug;

use crate::authoring::defaults::ParserDefaults;
use crate::errors::DashboardError;
use crate::http::client::HttpClient;

fn names(items: Vec<InventoryItem>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.name().to_string())
        .collect()
}

impl HttpClient {
    /// VM names from the backend inventory
    pub async fn vms(&self) -> Result<Vec<String>, DashboardError> {
        let items: Vec<InventoryItem> = self.get(&["api", "vms"]).await?;
        Ok(names(items))
    }

    /// Services that can be managed with systemctl
    pub async fn systemctl_services(&self) -> Result<Vec<String>, DashboardError> {
        let response: ServiceListResponse = self.get(&["api", "systemctl", "services"]).await?;
        Ok(response.services)
    }

    /// Start a systemctl operation
    pub async fn systemctl_operation(
        &self,
        request: &SystemctlRequest,
    ) -> Result<DeployResponse, DashboardError> {
        self.post(&["api", "systemctl", "operation"], request).await
    }

    /// Start a systemctl operation through the deploy route
    pub async fn deploy_systemd(
        &self,
        request: &SystemctlRequest,
    ) -> Result<DeployResponse, DashboardError> {
        self.post(&["api", "deploy", "systemd"], request).await
    }

    pub async fn ansible_playbooks(&self) -> Result<Vec<String>, DashboardError> {
        let items: Vec<InventoryItem> = self.get(&["api", "ansible-playbooks"]).await?;
        Ok(names(items))
    }

    pub async fn helm_deployment_types(&self) -> Result<Vec<String>, DashboardError> {
        let items: Vec<InventoryItem> = self.get(&["api", "helm-deployment-types"]).await?;
        Ok(names(items))
    }

    pub async fn users(&self) -> Result<Vec<String>, DashboardError> {
        let items: Vec<InventoryItem> = self.get(&["api", "users"]).await?;
        Ok(names(items))
    }

    /// Fill the parser's known names from the inventory
    pub async fn seed_parser_defaults(
        &self,
        mut defaults: ParserDefaults,
    ) -> Result<ParserDefaults, DashboardError> {
        defaults.known_vms = self.vms().await?;
        defaults.known_playbooks = self.ansible_playbooks().await?;
        defaults.known_helm_types = self.helm_deployment_types().await?;
        debug!(
            "Inventory: {} VMs, {} playbooks, {} helm types",
            defaults.known_vms.len(),
            defaults.known_playbooks.len(),
            defaults.known_helm_types.len()
        );
        Ok(defaults)
    }
}
