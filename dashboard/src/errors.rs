//! Error types for the deployment dashboard core

use std::fmt;

use thiserror::Error;

/// Main error type for the dashboard core
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Missing or invalid input, caught before anything is sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// What was being validated (a step type, a form)
    pub subject: String,

    /// Required fields that were missing or empty
    pub missing: Vec<&'static str>,

    /// Free-form reason when the problem is not a missing field
    pub reason: Option<String>,
}

impl ValidationError {
    pub fn missing(subject: impl Into<String>, missing: Vec<&'static str>) -> Self {
        Self {
            subject: subject.into(),
            missing,
            reason: None,
        }
    }

    pub fn invalid(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            missing: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.missing.is_empty() {
            write!(
                f,
                "{}: missing required field(s): {}",
                self.subject,
                self.missing.join(", ")
            )?;
            if let Some(reason) = &self.reason {
                write!(f, "; {}", reason)?;
            }
            return Ok(());
        }
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", self.subject, reason),
            None => write!(f, "{}: invalid input", self.subject),
        }
    }
}

impl std::error::Error for ValidationError {}
