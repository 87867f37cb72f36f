//! Poll events
//!
//! Everything the poller reports while it runs. Events carry plain data so
//! that any sink (tracing, an in-memory buffer in tests) can consume them.

use std::fmt;
use std::time::Duration;

use super::log::LogLevel;

/// Classification of a failed connect, send or receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The connection was not established within the timeout
    ConnectTimeout,

    /// The remote end actively refused the connection
    ConnectRefused,

    /// Any other connect failure (resolution, unreachable network, ...)
    Connect,

    /// An exchange was attempted without an open session
    NotConnected,

    /// Writing the command failed
    Send,

    /// No response line arrived within the timeout
    ReceiveTimeout,

    /// The remote end closed the connection
    RemoteClosed,

    /// Any other I/O or protocol error
    Io,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConnectTimeout => "connect_timeout",
            FailureKind::ConnectRefused => "connect_refused",
            FailureKind::Connect => "connect",
            FailureKind::NotConnected => "not_connected",
            FailureKind::Send => "send",
            FailureKind::ReceiveTimeout => "receive_timeout",
            FailureKind::RemoteClosed => "remote_closed",
            FailureKind::Io => "io",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step of the poller's connect/send/receive/reconnect cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// The poll loop is starting with this configuration
    Starting {
        address: String,
        interval: Duration,
        command: String,
        timeout: Duration,
    },

    Connecting {
        address: String,
    },

    Connected {
        address: String,
    },

    ConnectFailed {
        kind: FailureKind,
        reason: String,
    },

    Disconnected {
        address: String,
    },

    /// Closing the transport failed; the session is dropped anyway
    DisconnectFailed {
        reason: String,
    },

    Sent {
        command: String,
    },

    /// A response line arrived; `response` is already trimmed
    Received {
        response: String,
    },

    /// The send or the receive half of an exchange failed
    ExchangeFailed {
        kind: FailureKind,
        reason: String,
    },

    /// The session is being torn down and re-established after a failure
    Reconnecting,

    /// Connecting failed and the next attempt waits `delay`
    RetryScheduled {
        delay: Duration,
        /// `true` when the failed attempt was a reconnect after a failed exchange
        reconnect: bool,
    },
}

impl PollEvent {
    pub fn level(&self) -> LogLevel {
        match self {
            PollEvent::Starting { .. }
            | PollEvent::Connecting { .. }
            | PollEvent::Connected { .. }
            | PollEvent::Disconnected { .. }
            | PollEvent::Sent { .. }
            | PollEvent::Received { .. } => LogLevel::Info,
            PollEvent::ExchangeFailed {
                kind: FailureKind::ReceiveTimeout,
                ..
            }
            | PollEvent::Reconnecting
            | PollEvent::RetryScheduled { .. } => LogLevel::Warning,
            PollEvent::ConnectFailed { .. }
            | PollEvent::DisconnectFailed { .. }
            | PollEvent::ExchangeFailed { .. } => LogLevel::Error,
        }
    }

    /// The failure kind carried by failure events
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PollEvent::ConnectFailed { kind, .. } | PollEvent::ExchangeFailed { kind, .. } => {
                Some(*kind)
            }
            _ => None,
        }
    }

    /// The `host:port` endpoint, for events that name one
    pub fn address(&self) -> Option<&str> {
        match self {
            PollEvent::Starting { address, .. }
            | PollEvent::Connecting { address }
            | PollEvent::Connected { address }
            | PollEvent::Disconnected { address } => Some(address.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for PollEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollEvent::Starting {
                address,
                interval,
                command,
                timeout,
            } => write!(
                f,
                "Starting poller: address={address}, interval={interval:?}, command={command}, timeout={timeout:?}"
            ),
            PollEvent::Connecting { address } => write!(f, "Connecting to {address}..."),
            PollEvent::Connected { address } => write!(f, "Connected to {address}"),
            PollEvent::ConnectFailed { reason, .. } => write!(f, "Connection failed: {reason}"),
            PollEvent::Disconnected { address } => write!(f, "Disconnected from {address}"),
            PollEvent::DisconnectFailed { reason } => {
                write!(f, "Error during disconnect: {reason}")
            }
            PollEvent::Sent { command } => write!(f, "Sent: {command}"),
            PollEvent::Received { response } => write!(f, "Received: {response}"),
            PollEvent::ExchangeFailed { kind, reason } => match kind {
                FailureKind::ReceiveTimeout => write!(f, "No response received within timeout"),
                FailureKind::RemoteClosed => write!(f, "Connection closed by remote host"),
                _ => write!(f, "Error sending command: {reason}"),
            },
            PollEvent::Reconnecting => write!(f, "Reconnecting due to timeout or error..."),
            PollEvent::RetryScheduled {
                delay,
                reconnect: false,
            } => write!(f, "Retrying connection in {delay:?}..."),
            PollEvent::RetryScheduled {
                delay,
                reconnect: true,
            } => write!(f, "Reconnection failed, retrying in {delay:?}..."),
        }
    }
}
