//! Settings file management

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DashboardError;
use crate::logs::{LogLevel, LogOptions};
use crate::models::deployment::DeploymentStatus;
use crate::options::{ClientOptions, DashboardOptions};

/// Dashboard settings as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log level for the HTTP stack
    #[serde(default = "default_http_log_level")]
    pub http_log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Status tracking configuration
    #[serde(default)]
    pub tracking: TrackingSettings,

    /// Parser fallbacks
    #[serde(default)]
    pub parser: ParserSettings,
}

fn default_http_log_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            http_log_level: default_http_log_level(),
            json_logs: false,
            backend: BackendSettings::default(),
            tracking: TrackingSettings::default(),
            parser: ParserSettings::default(),
        }
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Keep SQL passwords when saving templates
    #[serde(default)]
    pub persist_db_passwords: bool,
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
            persist_db_passwords: false,
        }
    }
}

/// Status tracking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Poll interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Quiet polls before a run is taken as done
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold: u32,

    /// Failed polls in a row before a run is marked failed
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,

    /// Wall-clock bound in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Status adopted on timeout, `completed` or `failed`
    #[serde(default = "default_timeout_status")]
    pub timeout_status: DeploymentStatus,
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_stall_threshold() -> u32 {
    5
}

fn default_max_failures() -> u32 {
    3
}

fn default_timeout() -> u64 {
    600
}

fn default_timeout_status() -> DeploymentStatus {
    DeploymentStatus::Completed
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            stall_threshold: default_stall_threshold(),
            max_consecutive_failures: default_max_failures(),
            timeout_secs: default_timeout(),
            timeout_status: default_timeout_status(),
        }
    }
}

/// Parser fallback settings; unset fields keep the built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserSettings {
    #[serde(default)]
    pub target_path: Option<String>,
    #[serde(default)]
    pub target_user: Option<String>,
    #[serde(default)]
    pub db_connection: Option<String>,
    #[serde(default)]
    pub db_user: Option<String>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub playbook: Option<String>,
    #[serde(default)]
    pub helm_deployment_type: Option<String>,
}

impl Settings {
    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(json)
            .map_err(|e| DashboardError::Config(format!("invalid settings: {}", e)))
    }

    /// Load settings from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        debug!("Loading settings from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    /// Convert into runtime options
    pub fn into_options(self) -> Result<DashboardOptions, DashboardError> {
        let tracking = self.tracking;
        if tracking.poll_interval_ms == 0 {
            return Err(DashboardError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if !tracking.timeout_status.is_terminal() {
            return Err(DashboardError::Config(format!(
                "timeout_status must be terminal, got {}",
                tracking.timeout_status
            )));
        }

        let mut options = DashboardOptions {
            client: ClientOptions {
                base_url: self.backend.base_url,
                request_timeout: Duration::from_secs(self.backend.request_timeout_secs),
                persist_db_passwords: self.backend.persist_db_passwords,
            },
            logs: LogOptions {
                log_level: self.log_level,
                http_log_level: self.http_log_level,
                json_format: self.json_logs,
            },
            ..Default::default()
        };

        options.tracker.poll_interval = Duration::from_millis(tracking.poll_interval_ms);
        options.tracker.stall_threshold = tracking.stall_threshold;
        options.tracker.max_consecutive_failures = tracking.max_consecutive_failures;
        options.tracker.timeout = Duration::from_secs(tracking.timeout_secs);
        options.tracker.timeout_status = tracking.timeout_status;

        let parser = self.parser;
        let defaults = &mut options.parser;
        let overrides = [
            (&mut defaults.target_path, parser.target_path),
            (&mut defaults.target_user, parser.target_user),
            (&mut defaults.db_connection, parser.db_connection),
            (&mut defaults.db_user, parser.db_user),
            (&mut defaults.service, parser.service),
            (&mut defaults.playbook, parser.playbook),
            (&mut defaults.helm_deployment_type, parser.helm_deployment_type),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        if parser.db_name.is_some() {
            defaults.db_name = parser.db_name;
        }

        Ok(options)
    }
}
