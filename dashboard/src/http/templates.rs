//! Template API client

use std::borrow::Cow;

use backend_api::{
    AckResponse, DeployResponse, DeployTemplateRequest, SaveTemplateRequest, TemplateInfo,
    TemplateListResponse,
};
use serde::Serialize;
use tracing::debug;

use crate::errors::DashboardError;
use crate::http::client::HttpClient;
use crate::models::template::DeploymentTemplate;

/// Template to deploy: a saved name or the template itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TemplateRef {
    Name(String),
    Inline(Box<DeploymentTemplate>),
}

impl HttpClient {
    /// List saved templates
    pub async fn list_templates(&self) -> Result<Vec<TemplateInfo>, DashboardError> {
        let response: TemplateListResponse = self.get(&["api", "templates"]).await?;
        Ok(response.templates)
    }

    /// Load a saved template and check its structure
    pub async fn get_template(&self, name: &str) -> Result<DeploymentTemplate, DashboardError> {
        let template: DeploymentTemplate = self.get(&["api", "template", name]).await?;
        template.into_checked()
    }

    /// Save a template under its FT number
    ///
    /// SQL passwords are removed first unless the client was configured to
    /// persist them.
    pub async fn save_template(
        &self,
        template: &DeploymentTemplate,
    ) -> Result<AckResponse, DashboardError> {
        let template = if self.persists_db_passwords() {
            Cow::Borrowed(template)
        } else {
            Cow::Owned(template.without_db_passwords())
        };
        debug!(
            "Saving template for {} ({} steps)",
            template.metadata.ft_number,
            template.steps.len()
        );

        let request = SaveTemplateRequest {
            ft_number: template.metadata.ft_number.clone(),
            template: template.as_ref(),
        };
        self.post(&["api", "templates", "save"], &request).await
    }

    /// Start a template deployment
    pub async fn deploy_template(
        &self,
        ft_number: &str,
        template: &TemplateRef,
    ) -> Result<DeployResponse, DashboardError> {
        let request = DeployTemplateRequest {
            ft_number: ft_number.to_string(),
            template,
        };
        self.post(&["api", "deploy", "template"], &request).await
    }
}
