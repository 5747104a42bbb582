//! FT Deployment Dashboard Library
//!
//! Core of the deployment dashboard: template authoring, the backend
//! client, deployment status tracking and the operations the screens call.

pub mod authn;
pub mod authoring;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod options;
pub mod services;
pub mod settings;
pub mod tracker;
pub mod utils;

pub use errors::{DashboardError, ValidationError};
