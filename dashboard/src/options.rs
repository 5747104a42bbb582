//! Dashboard configuration options

use std::time::Duration;

use crate::authoring::defaults::ParserDefaults;
use crate::logs::LogOptions;
use crate::tracker::fsm::TrackerSettings;

/// Main dashboard options
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    /// Backend client configuration
    pub client: ClientOptions,

    /// Status tracker settings, shared by every operation
    pub tracker: TrackerSettings,

    /// Parser fallbacks
    pub parser: ParserDefaults,

    /// Logging configuration
    pub logs: LogOptions,
}

/// Backend client options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Backend base URL
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Keep SQL passwords in templates sent to the save endpoint
    pub persist_db_passwords: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(30),
            persist_db_passwords: false,
        }
    }
}
