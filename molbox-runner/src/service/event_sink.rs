//! Event sinks
//!
//! Destinations for the poller's [`PollEvent`]s. Production output goes
//! through `tracing`; tests collect events in memory and inspect them.

use molbox_core::domain::event::PollEvent;
use molbox_core::domain::log::LogLevel;
#[cfg(test)]
use molbox_core::domain::log::LogEntry;
#[cfg(test)]
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

/// Receiver of poll events
pub trait EventSink: Send + Sync {
    /// Records a single event
    ///
    /// # Arguments
    /// * `event` - The event to record
    fn emit(&self, event: PollEvent);
}

/// Sink that forwards events to `tracing` at their own level
///
/// Events that name an endpoint carry it as a structured `address` field,
/// failure events carry a `kind` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: PollEvent) {
        let kind = event.failure_kind().map(|k| k.as_str());
        let address = event.address();

        match event.level() {
            LogLevel::Info => info!(address, "{}", event),
            LogLevel::Warning => warn!(kind, "{}", event),
            LogLevel::Error => error!(kind, "{}", event),
        }
    }
}

/// In-memory sink for tests
///
/// Uses Arc<Mutex<Vec<LogEntry>>> so clones share one buffer.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

#[cfg(test)]
impl InMemoryEventSink {
    /// Creates a new, empty in-memory sink
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of every recorded entry
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Returns every recorded event, oldest first
    pub fn events(&self) -> Vec<PollEvent> {
        self.lock().iter().map(|entry| entry.event.clone()).collect()
    }

    /// Returns the rendered message of every recorded event
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(LogEntry::message).collect()
    }

    /// Removes and returns all recorded entries
    pub fn drain(&self) -> Vec<LogEntry> {
        self.lock().drain(..).collect()
    }
}

#[cfg(test)]
impl EventSink for InMemoryEventSink {
    fn emit(&self, event: PollEvent) {
        self.lock().push(LogEntry::now(event));
    }
}
