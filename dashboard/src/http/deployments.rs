//! Deployment API client

use async_trait::async_trait;
use backend_api::{
    AckResponse, ClearHistoryRequest, HistoryEntry, StatusResponse, TemplateHistoryEntry,
};

use crate::errors::DashboardError;
use crate::http::client::HttpClient;
use crate::models::deployment::StatusReport;
use crate::tracker::source::{StatusEndpoint, StatusSource};

impl HttpClient {
    /// Raw status and logs from one of the status endpoints
    pub async fn deployment_status(
        &self,
        endpoint: StatusEndpoint,
        deployment_id: &str,
    ) -> Result<StatusResponse, DashboardError> {
        self.get(&endpoint.segments(deployment_id)).await
    }

    /// Regular deployment history, newest first as served
    pub async fn deployment_history(&self) -> Result<Vec<HistoryEntry>, DashboardError> {
        self.get(&["api", "deployments", "history"]).await
    }

    /// Template deployment history
    pub async fn template_deployment_history(
        &self,
    ) -> Result<Vec<TemplateHistoryEntry>, DashboardError> {
        self.get(&["api", "template-deployments", "history"]).await
    }

    /// Delete history entries older than `days` days
    pub async fn clear_history(&self, days: u32) -> Result<AckResponse, DashboardError> {
        self.post(&["api", "deployments", "clear"], &ClearHistoryRequest { days })
            .await
    }
}

#[async_trait]
impl StatusSource for HttpClient {
    async fn fetch_status(
        &self,
        endpoint: StatusEndpoint,
        deployment_id: &str,
    ) -> Result<StatusReport, DashboardError> {
        let response = self.deployment_status(endpoint, deployment_id).await?;
        Ok(StatusReport::from(response))
    }
}
