//! Error types for the molbox transport

use molbox_core::domain::event::FailureKind;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to the remote endpoint
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection was not established in time
    #[error("Connection timeout after {0:?}")]
    ConnectTimeout(Duration),

    /// The remote end refused the connection
    #[error("Connection to {address} refused")]
    ConnectRefused {
        /// Address that was dialled
        address: String,
    },

    /// Any other connect failure
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        /// Address that was dialled
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// No session is open
    #[error("Not connected")]
    NotConnected,

    /// Writing to the connection failed
    #[error("Failed to send: {0}")]
    Send(#[source] std::io::Error),

    /// Writing to the connection did not complete in time
    #[error("Send timeout after {0:?}")]
    SendTimeout(Duration),

    /// No line arrived in time
    #[error("No response within {0:?}")]
    ReceiveTimeout(Duration),

    /// The remote end closed the connection
    #[error("Connection closed by remote host")]
    RemoteClosed,

    /// The peer sent a line longer than the codec accepts
    #[error("Line exceeds {max} bytes")]
    LineTooLong {
        /// Maximum accepted line length
        max: usize,
    },

    /// The peer opened a subnegotiation and kept it open past the limit
    #[error("Subnegotiation exceeds {max} bytes")]
    SubnegotiationTooLong {
        /// Maximum accepted subnegotiation length
        max: usize,
    },

    /// Any other I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Classifies this error for reporting
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConnectTimeout(_) => FailureKind::ConnectTimeout,
            Self::ConnectRefused { .. } => FailureKind::ConnectRefused,
            Self::Connect { .. } => FailureKind::Connect,
            Self::NotConnected => FailureKind::NotConnected,
            Self::Send(_) | Self::SendTimeout(_) => FailureKind::Send,
            Self::ReceiveTimeout(_) => FailureKind::ReceiveTimeout,
            Self::RemoteClosed => FailureKind::RemoteClosed,
            Self::LineTooLong { .. } | Self::SubnegotiationTooLong { .. } | Self::Io(_) => {
                FailureKind::Io
            }
        }
    }

    /// Check if this error happened while establishing a connection
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::ConnectTimeout | FailureKind::ConnectRefused | FailureKind::Connect
        )
    }

    /// Check if this error is a timeout of any operation
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout(_) | Self::SendTimeout(_) | Self::ReceiveTimeout(_)
        )
    }
}
