//! Scheduler layer for the runner
//!
//! This layer owns the poll loop: it keeps the telnet session alive, sends
//! the configured command on every tick and reconnects after failures.

pub mod clock;
pub mod poller;

pub use clock::{Clock, TokioClock};
pub use poller::{CycleOutcome, Poller};
