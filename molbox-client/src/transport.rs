//! Transport abstractions
//!
//! The poller only needs a line-oriented connection: write a line, read a
//! line, close. Timeouts are applied by the caller, so implementations may
//! block for as long as the peer takes.

use async_trait::async_trait;

use crate::error::Result;

/// An open line-oriented connection
#[async_trait]
pub trait Transport: Send {
    /// Writes `line` followed by the protocol's line terminator
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Reads the next response line, with surrounding whitespace removed
    ///
    /// Fails with [`crate::TransportError::RemoteClosed`] once the peer has
    /// closed the connection.
    async fn read_line(&mut self) -> Result<String>;

    /// Flushes pending output and closes the connection
    async fn close(&mut self) -> Result<()>;
}

/// Opens [`Transport`]s to a remote endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to `host:port`
    async fn open(&self, host: &str, port: u16) -> Result<Box<dyn Transport>>;
}
