//! Log domain types

use chrono::{DateTime, Utc};

use super::event::PollEvent;

/// A poll event captured together with the time it happened
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub event: PollEvent,
}

impl LogEntry {
    /// Stamps `event` with the current time and its own level
    pub fn now(event: PollEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            level: event.level(),
            event,
        }
    }

    /// Rendered message, as it appears in the log output
    pub fn message(&self) -> String {
        self.event.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}
