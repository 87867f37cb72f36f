//! Core domain types
//!
//! These types describe what the poller observes while it runs. The client
//! crate classifies its errors with [`event::FailureKind`], and the runner
//! reports every state machine step as an [`event::PollEvent`].

pub mod event;
pub mod log;
pub mod session;
