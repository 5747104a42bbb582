//! Deployment history browsing

use std::sync::Arc;

use backend_api::{HistoryEntry, TemplateHistoryEntry, Timestamp};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::authn::AuthGate;
use crate::errors::{DashboardError, ValidationError};
use crate::http::client::HttpClient;
use crate::models::deployment::DeploymentStatus;
use crate::tracker::source::StatusEndpoint;

const COMMAND_PREVIEW_CHARS: usize = 30;

/// Where a log panel's lines came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOrigin {
    /// The backend's log endpoint
    Backend,
    /// Lines stored on the history entry
    HistoryEntry,
    /// Nothing available; a single placeholder line
    Placeholder,
    /// Loading failed; a single error line
    Error,
}

/// Logs for one history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLogs {
    pub logs: Vec<String>,
    pub status: DeploymentStatus,
    pub origin: LogOrigin,
}

/// Deployment history operations
pub struct HistoryService {
    client: Arc<HttpClient>,
    auth: Arc<dyn AuthGate>,
}

impl HistoryService {
    pub fn new(client: Arc<HttpClient>, auth: Arc<dyn AuthGate>) -> Self {
        Self { client, auth }
    }

    pub async fn deployments(&self) -> Result<Vec<HistoryEntry>, DashboardError> {
        self.auth.require("view deployment history")?;
        self.client.deployment_history().await
    }

    pub async fn template_deployments(
        &self,
    ) -> Result<Vec<TemplateHistoryEntry>, DashboardError> {
        self.auth.require("view deployment history")?;
        self.client.template_deployment_history().await
    }

    /// Logs for a regular deployment
    ///
    /// Falls back to the lines stored on the matching entry of `history`,
    /// then to a placeholder.
    pub async fn logs(
        &self,
        deployment_id: &str,
        history: &[HistoryEntry],
    ) -> Result<HistoryLogs, DashboardError> {
        self.auth.require("view deployment logs")?;
        let embedded = history
            .iter()
            .find(|entry| entry.id == deployment_id)
            .and_then(|entry| Some((entry.logs.clone()?, entry.status.clone())));

        Ok(self
            .resolve(
                StatusEndpoint::DeployLogs,
                deployment_id,
                embedded,
                format!("No detailed logs available for deployment {}", deployment_id),
                "Error loading logs. Please try again.",
            )
            .await)
    }

    /// Logs for a template deployment, with the same fallbacks
    pub async fn template_logs(
        &self,
        deployment_id: &str,
        history: &[TemplateHistoryEntry],
    ) -> Result<HistoryLogs, DashboardError> {
        self.auth.require("view deployment logs")?;
        let embedded = history
            .iter()
            .find(|entry| entry.id == deployment_id)
            .map(|entry| (entry.logs.clone(), entry.status.clone()));

        Ok(self
            .resolve(
                StatusEndpoint::TemplateDeployLogs,
                deployment_id,
                embedded,
                format!(
                    "No detailed logs available for template deployment {}",
                    deployment_id
                ),
                "Error loading template logs. Please try again.",
            )
            .await)
    }

    /// Delete entries older than `days` days
    pub async fn clear(&self, days: i64) -> Result<(), DashboardError> {
        self.auth.require("clear deployment history")?;
        let days = u32::try_from(days).map_err(|_| {
            ValidationError::invalid("clear history", "days must be zero or a positive number")
        })?;
        self.client.clear_history(days).await?;
        debug!("Cleared history older than {} days", days);
        Ok(())
    }

    async fn resolve(
        &self,
        endpoint: StatusEndpoint,
        deployment_id: &str,
        embedded: Option<(Vec<String>, String)>,
        placeholder: String,
        error_line: &str,
    ) -> HistoryLogs {
        match self.client.deployment_status(endpoint, deployment_id).await {
            Ok(response) if !response.logs.is_empty() => HistoryLogs {
                status: settled(response.status.as_deref().unwrap_or_default()),
                logs: response.logs,
                origin: LogOrigin::Backend,
            },
            Ok(_) => match embedded {
                Some((logs, status)) if !logs.is_empty() => HistoryLogs {
                    logs,
                    status: settled(&status),
                    origin: LogOrigin::HistoryEntry,
                },
                _ => HistoryLogs {
                    logs: vec![placeholder],
                    status: DeploymentStatus::Completed,
                    origin: LogOrigin::Placeholder,
                },
            },
            Err(e) => {
                warn!("Loading logs for {} failed: {}", deployment_id, e);
                HistoryLogs {
                    logs: vec![error_line.to_string()],
                    status: DeploymentStatus::Failed,
                    origin: LogOrigin::Error,
                }
            }
        }
    }
}

/// History panels only distinguish running from done
fn settled(status: &str) -> DeploymentStatus {
    match DeploymentStatus::from_reported(status) {
        Some(DeploymentStatus::Running) => DeploymentStatus::Running,
        _ => DeploymentStatus::Completed,
    }
}

/// Render a history timestamp in UTC, `Unknown date` when absent
pub fn format_timestamp(timestamp: Option<&Timestamp>) -> String {
    let parsed = match timestamp {
        None => return "Unknown date".to_string(),
        Some(Timestamp::Epoch(secs)) => Utc.timestamp_millis_opt((secs * 1000.0) as i64).single(),
        Some(Timestamp::Text(text)) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
    };

    match (parsed, timestamp) {
        (Some(dt), _) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        (None, Some(Timestamp::Text(text))) => text.clone(),
        (None, _) => "Unknown date".to_string(),
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("N/A")
}

fn user_prefix(user: Option<&str>) -> String {
    match user.filter(|u| !u.is_empty()) {
        Some(user) => format!("User: {} - ", user),
        None => String::new(),
    }
}

fn template_label(template: Option<&serde_json::Value>) -> String {
    match template {
        Some(serde_json::Value::String(name)) if !name.is_empty() => name.clone(),
        Some(value) => value
            .pointer("/metadata/ft_number")
            .and_then(|ft| ft.as_str())
            .unwrap_or("N/A")
            .to_string(),
        None => "N/A".to_string(),
    }
}

/// One-line summary of a regular history entry
pub fn summarize(entry: &HistoryEntry) -> String {
    let user = user_prefix(entry.logged_in_user.as_deref());
    let when = format_timestamp(entry.timestamp.as_ref());
    let ft = or_na(entry.ft.as_deref());
    let file = or_na(entry.file.as_deref());
    let status = &entry.status;

    match entry.kind.as_str() {
        "file" => format!("{}File: FT={}, File={}, Status={}, {}", user, ft, file, status, when),
        "sql" => format!("{}SQL: {}/{}, Status={}, {}", user, ft, file, status, when),
        "systemd" => format!(
            "{}Systemctl: {} {}, Status={}, {}",
            user,
            or_na(entry.operation.as_deref()),
            or_na(entry.service.as_deref()),
            status,
            when
        ),
        "command" => {
            let command = match entry.command.as_deref() {
                Some(cmd) if !cmd.is_empty() => {
                    let preview: String = cmd.chars().take(COMMAND_PREVIEW_CHARS).collect();
                    if cmd.chars().count() > COMMAND_PREVIEW_CHARS {
                        format!("{}...", preview)
                    } else {
                        preview
                    }
                }
                _ => "N/A".to_string(),
            };
            format!("{}Command: {}, Status={}, {}", user, command, status, when)
        }
        "rollback" => format!("{}Rollback: {}/{}, Status={}, {}", user, ft, file, status, when),
        "template" => format!(
            "{}Template: {}, Status={}, {}",
            user,
            template_label(entry.template.as_ref()),
            status,
            when
        ),
        other => format!("{}{} ({}), {}", user, other, status, when),
    }
}

/// One-line summary of a template history entry
pub fn summarize_template(entry: &TemplateHistoryEntry) -> String {
    format!(
        "{}Template: {}, FT: {}, Status={}, {}",
        user_prefix(entry.logged_in_user.as_deref()),
        entry.template,
        entry.ft_number,
        entry.status,
        format_timestamp(entry.timestamp.as_ref())
    )
}
