//! Command poller
//!
//! Keeps one telnet session open to the configured endpoint, sends the
//! command every interval and reads one response line per command.
//! Any failure drops the session; the next attempt happens after the same
//! fixed interval, with no limit on the number of retries.

use molbox_client::{Connector, Transport, TransportError};
use molbox_core::PollerConfig;
use molbox_core::domain::event::PollEvent;
use molbox_core::domain::session::SessionState;
use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use tokio::time;
use tracing::debug;

use crate::scheduler::clock::Clock;
use crate::service::EventSink;

/// What a single pass through the poll loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The command was sent and answered
    Polled,

    /// There was no session and connecting failed
    ConnectFailed,

    /// The exchange failed and a fresh session replaced the old one
    Reconnected,

    /// The exchange failed and so did the reconnect
    ReconnectFailed,
}

/// Periodic command poller
///
/// Owns the session exclusively; only one connect, send or receive is ever
/// in flight.
pub struct Poller {
    config: PollerConfig,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    session: Option<Box<dyn Transport>>,
}

impl Poller {
    /// Creates a new, disconnected poller
    pub fn new(
        config: PollerConfig,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            connector,
            clock,
            sink,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.session {
            Some(_) => SessionState::Connected,
            None => SessionState::Disconnected,
        }
    }

    /// Opens a session, replacing any session that is already open
    ///
    /// The attempt is abandoned after the configured timeout.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.session.is_some() {
            self.disconnect().await;
        }

        let address = self.config.address();
        self.sink.emit(PollEvent::Connecting {
            address: address.clone(),
        });

        let timeout = self.config.timeout;
        let attempt = time::timeout(
            timeout,
            self.connector.open(&self.config.host, self.config.port),
        )
        .await
        .unwrap_or(Err(TransportError::ConnectTimeout(timeout)));

        match attempt {
            Ok(transport) => {
                self.session = Some(transport);
                self.sink.emit(PollEvent::Connected { address });
                Ok(())
            }
            Err(e) => {
                self.sink.emit(PollEvent::ConnectFailed {
                    kind: e.kind(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Closes the session if there is one
    ///
    /// Close errors are reported but the session is dropped regardless.
    pub async fn disconnect(&mut self) {
        let Some(mut transport) = self.session.take() else {
            return;
        };

        let closed = time::timeout(self.config.timeout, transport.close())
            .await
            .unwrap_or_else(|_| Err(io::Error::from(io::ErrorKind::TimedOut).into()));

        match closed {
            Ok(()) => self.sink.emit(PollEvent::Disconnected {
                address: self.config.address(),
            }),
            Err(e) => self.sink.emit(PollEvent::DisconnectFailed {
                reason: e.to_string(),
            }),
        }
    }

    /// Sends the command and waits for one response line
    ///
    /// Returns the trimmed response. The session is left in place on
    /// failure; tearing it down is the caller's decision.
    pub async fn send_command(&mut self) -> Result<String, TransportError> {
        let result = self.exchange().await;

        if let Err(e) = &result {
            self.sink.emit(PollEvent::ExchangeFailed {
                kind: e.kind(),
                reason: e.to_string(),
            });
        }

        result
    }

    async fn exchange(&mut self) -> Result<String, TransportError> {
        let timeout = self.config.timeout;
        let transport = self.session.as_mut().ok_or(TransportError::NotConnected)?;

        time::timeout(timeout, transport.send_line(&self.config.command))
            .await
            .map_err(|_| TransportError::SendTimeout(timeout))??;

        self.sink.emit(PollEvent::Sent {
            command: self.config.command.clone(),
        });

        let line = time::timeout(timeout, transport.read_line())
            .await
            .map_err(|_| TransportError::ReceiveTimeout(timeout))??;
        let response = line.trim().to_string();

        self.sink.emit(PollEvent::Received {
            response: response.clone(),
        });

        Ok(response)
    }

    /// Runs one pass of the poll loop
    ///
    /// Every pass ends with exactly one interval sleep, whatever happened.
    pub async fn cycle(&mut self) -> CycleOutcome {
        if self.session.is_none() && self.connect().await.is_err() {
            self.retry_later(false).await;
            return CycleOutcome::ConnectFailed;
        }

        let outcome = match self.send_command().await {
            Ok(_) => CycleOutcome::Polled,
            Err(_) => {
                self.sink.emit(PollEvent::Reconnecting);
                self.disconnect().await;

                if self.connect().await.is_err() {
                    self.retry_later(true).await;
                    return CycleOutcome::ReconnectFailed;
                }

                CycleOutcome::Reconnected
            }
        };

        self.clock.sleep(self.config.interval).await;
        outcome
    }

    async fn retry_later(&mut self, reconnect: bool) {
        self.sink.emit(PollEvent::RetryScheduled {
            delay: self.config.interval,
            reconnect,
        });
        self.clock.sleep(self.config.interval).await;
    }

    /// Starts the polling loop
    ///
    /// Never returns; the surrounding task decides when to stop.
    pub async fn run(&mut self) -> Infallible {
        self.sink.emit(PollEvent::Starting {
            address: self.config.address(),
            interval: self.config.interval,
            command: self.config.command.clone(),
            timeout: self.config.timeout,
        });

        loop {
            let outcome = self.cycle().await;
            debug!(?outcome, state = %self.state(), "Poll cycle finished");
        }
    }
}
