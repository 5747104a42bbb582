//! Loading and deploying saved templates

use std::sync::Arc;

use backend_api::TemplateInfo;
use tracing::{error, info};

use crate::authn::AuthGate;
use crate::errors::{DashboardError, ValidationError};
use crate::http::client::HttpClient;
use crate::http::templates::TemplateRef;
use crate::models::template::DeploymentTemplate;
use crate::tracker::fsm::TrackerSettings;
use crate::tracker::handle::TrackerHandle;
use crate::tracker::source::{StatusEndpoint, StatusSource};

/// FT number encoded in a saved template name (`<ft>_template`)
pub fn ft_number_from_name(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

/// Template deployment operations
pub struct TemplateDeployer {
    client: Arc<HttpClient>,
    auth: Arc<dyn AuthGate>,
    tracker: TrackerSettings,
}

impl TemplateDeployer {
    pub fn new(client: Arc<HttpClient>, auth: Arc<dyn AuthGate>, tracker: TrackerSettings) -> Self {
        Self {
            client,
            auth,
            tracker,
        }
    }

    /// Saved templates
    pub async fn list(&self) -> Result<Vec<TemplateInfo>, DashboardError> {
        self.auth.require("list templates")?;
        self.client.list_templates().await
    }

    /// Load a saved template for review or editing
    pub async fn load(&self, name: &str) -> Result<DeploymentTemplate, DashboardError> {
        self.auth.require("load templates")?;
        let name = selected(name)?;
        let template = self.client.get_template(name).await?;
        info!("Loaded template {} ({} steps)", name, template.steps.len());
        Ok(template)
    }

    /// Deploy a saved template and track it
    ///
    /// A rejected start yields a tracker already in `failed`.
    pub async fn deploy(&self, name: &str) -> Result<TrackerHandle, DashboardError> {
        self.auth.require("deploy templates")?;
        let name = selected(name)?;
        let ft_number = ft_number_from_name(name);
        Ok(self
            .start(ft_number, &TemplateRef::Name(name.to_string()))
            .await)
    }

    /// Deploy a template that was not saved first
    pub async fn deploy_inline(
        &self,
        template: &DeploymentTemplate,
    ) -> Result<TrackerHandle, DashboardError> {
        self.auth.require("deploy templates")?;
        template.check_structure()?;
        let ft_number = template.metadata.ft_number.clone();
        Ok(self
            .start(&ft_number, &TemplateRef::Inline(Box::new(template.clone())))
            .await)
    }

    async fn start(&self, ft_number: &str, template: &TemplateRef) -> TrackerHandle {
        match self.client.deploy_template(ft_number, template).await {
            Ok(response) => {
                info!(
                    "Template deployment initiated with ID: {}",
                    response.deployment_id
                );
                let source: Arc<dyn StatusSource> = self.client.clone();
                TrackerHandle::spawn(
                    source,
                    StatusEndpoint::DeployStatus,
                    response.deployment_id,
                    self.tracker.clone(),
                )
            }
            Err(e) => {
                error!("Template deployment for {} failed to start: {}", ft_number, e);
                TrackerHandle::failed(
                    self.tracker.clone(),
                    format!("Failed to start deployment: {}", e),
                )
            }
        }
    }
}

fn selected(name: &str) -> Result<&str, DashboardError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::missing("template selection", vec!["template"]).into());
    }
    Ok(name)
}
