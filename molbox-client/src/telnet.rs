//! Telnet over TCP
//!
//! [`TelnetConnector`] dials the remote endpoint; [`TelnetTransport`] speaks
//! plain NVT on the resulting stream. Every option the peer proposes is
//! refused, so the device never switches into a mode we would have to
//! interpret.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::codec::{TelnetCodec, TelnetFrame};
use crate::error::{Result, TransportError};
use crate::transport::{Connector, Transport};

/// Connector that opens telnet sessions over TCP
#[derive(Debug, Clone, Default)]
pub struct TelnetConnector {}

impl TelnetConnector {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Connector for TelnetConnector {
    async fn open(&self, host: &str, port: u16) -> Result<Box<dyn Transport>> {
        let address = format!("{}:{}", host, port);

        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| match source.kind() {
                io::ErrorKind::ConnectionRefused => TransportError::ConnectRefused {
                    address: address.clone(),
                },
                _ => TransportError::Connect {
                    address: address.clone(),
                    source,
                },
            })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY for {}: {}", address, e);
        }

        debug!("TCP connection to {} established", address);

        Ok(Box::new(TelnetTransport::new(stream, address)))
    }
}

/// A telnet session on top of any byte stream
pub struct TelnetTransport<S = TcpStream> {
    framed: Framed<S, TelnetCodec>,
    peer: String,
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an already connected stream
    ///
    /// # Arguments
    /// * `stream` - The connected byte stream
    /// * `peer` - Name of the remote end, used in log output
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            framed: Framed::new(stream, TelnetCodec::new()),
            peer: peer.into(),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.framed
            .send(TelnetFrame::Line(line.to_string()))
            .await
            .map_err(|e| match e {
                TransportError::Io(source) => TransportError::Send(source),
                other => other,
            })
    }

    async fn read_line(&mut self) -> Result<String> {
        loop {
            match self.framed.next().await {
                None => return Err(TransportError::RemoteClosed),
                Some(Err(TransportError::Io(e)))
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionReset
                            | io::ErrorKind::ConnectionAborted
                            | io::ErrorKind::UnexpectedEof
                    ) =>
                {
                    return Err(TransportError::RemoteClosed);
                }
                Some(Err(e)) => return Err(e),
                Some(Ok(TelnetFrame::Line(line))) => return Ok(line),
                Some(Ok(TelnetFrame::Negotiate { verb, option })) => {
                    if let Some(reply) = verb.refusal() {
                        debug!(
                            peer = %self.peer,
                            option,
                            "Refusing telnet option ({:?} -> {:?})",
                            verb,
                            reply
                        );
                        self.framed
                            .send(TelnetFrame::Negotiate {
                                verb: reply,
                                option,
                            })
                            .await?;
                    }
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        SinkExt::<TelnetFrame>::close(&mut self.framed).await
    }
}
