//! Service layer
//!
//! Output sinks for poll events. The poller reports through the
//! [`EventSink`] trait so the destination can be swapped in tests.

mod event_sink;

// Re-export trait
pub use event_sink::EventSink;

// Re-export implementations
pub use event_sink::TracingEventSink;

#[cfg(test)]
pub use event_sink::InMemoryEventSink;
