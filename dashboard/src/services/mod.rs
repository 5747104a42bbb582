//! Operations exposed to the dashboard screens
//!
//! Each operation checks the auth gate first and turns backend failures
//! into a visible status or log line.

pub mod deployer;
pub mod generator;
pub mod history;
pub mod oplog;
pub mod systemctl;

pub use deployer::TemplateDeployer;
pub use generator::{GeneratedTemplate, TemplateGenerator};
pub use history::{HistoryLogs, HistoryService, LogOrigin};
pub use oplog::OperationLog;
pub use systemctl::{SystemctlOperation, SystemctlRoute, SystemctlService};
