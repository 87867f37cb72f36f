//! Molbox transport
//!
//! Line-oriented telnet client used by the molbox poller.
//!
//! The crate is split into:
//! - [`transport`]: the `Connector`/`Transport` traits the poller is written against
//! - [`codec`]: telnet NVT framing on top of `tokio-util`'s codec machinery
//! - [`telnet`]: the TCP implementation of the traits
//!
//! # Example
//!
//! ```no_run
//! use molbox_client::{Connector, TelnetConnector};
//!
//! #[tokio::main]
//! async fn main() -> molbox_client::Result<()> {
//!     let mut session = TelnetConnector::new().open("localhost", 23).await?;
//!
//!     session.send_line("ALLR").await?;
//!     println!("{}", session.read_line().await?);
//!
//!     session.close().await
//! }
//! ```

pub mod codec;
pub mod error;
pub mod telnet;
pub mod transport;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use telnet::{TelnetConnector, TelnetTransport};
pub use transport::{Connector, Transport};
