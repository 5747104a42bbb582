//! Timestamped operation log shown next to an operation's result

use chrono::{DateTime, Local};
use tracing::info;

use crate::utils::timestamped;

/// Progress lines of one operation, each stamped `[HH:MM:SS]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLog {
    lines: Vec<String>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line stamped with the local time
    pub fn push(&mut self, message: impl AsRef<str>) {
        self.push_at(Local::now(), message);
    }

    pub fn push_at(&mut self, at: DateTime<Local>, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!("{}", message);
        self.lines.push(timestamped(at, message));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
