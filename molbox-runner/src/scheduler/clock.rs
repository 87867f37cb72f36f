//! Clock abstraction
//!
//! The poller waits through a [`Clock`] so that tests can observe every
//! interval sleep.

use async_trait::async_trait;
use std::time::Duration;

/// Source of the poll loop's sleeps
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspends the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
