//! Molbox
//!
//! Periodically sends a command to a telnet device and logs the responses.
//!
//! Architecture:
//! - Configuration: defaults, `~/.molbox_tester`, then flags/environment
//! - Scheduler: the poll loop and its reconnect state machine
//! - Services: where poll events are reported (tracing in production)
//!
//! The poller runs until interrupted; Ctrl-C closes the session and exits
//! with status 0. Any other top-level failure exits non-zero.

mod config;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use molbox_client::TelnetConnector;
use molbox_core::ConfigOverrides;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::scheduler::{Poller, TokioClock};
use crate::service::TracingEventSink;

#[derive(Parser)]
#[command(name = "molbox")]
#[command(
    about = "Sends a command to a telnet device at a fixed interval and logs the responses",
    long_about = None
)]
struct Cli {
    /// Config file [default: ~/.molbox_tester]
    #[arg(long, env = "MOLBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Remote host
    #[arg(long, env = "MOLBOX_HOST")]
    host: Option<String>,

    /// Remote telnet port
    #[arg(long, env = "MOLBOX_PORT")]
    port: Option<u16>,

    /// Seconds between commands
    #[arg(long, env = "MOLBOX_INTERVAL")]
    interval: Option<f64>,

    /// Command to send
    #[arg(long, env = "MOLBOX_COMMAND")]
    command: Option<String>,

    /// Seconds to wait for a connection or a response
    #[arg(long, env = "MOLBOX_TIMEOUT")]
    timeout: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            interval: self.interval,
            command: self.command.clone(),
            timeout: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "molbox=info,molbox_client=info,molbox_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    exit_code(run(cli).await)
}

/// Maps the outcome of [`run`] to the process status
fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Unexpected error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref(), cli.overrides())?;

    let mut poller = Poller::new(
        config,
        Arc::new(TelnetConnector::new()),
        Arc::new(TokioClock),
        Arc::new(TracingEventSink),
    );

    tokio::select! {
        never = poller.run() => match never {},
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for the interrupt signal")?;
        }
    }

    info!("Shutting down gracefully...");
    poller.disconnect().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from(["molbox", "--port", "2323", "--interval", "0.5"]).unwrap();
        let overrides = cli.overrides();

        assert_eq!(overrides.port, Some(2323));
        assert_eq!(overrides.interval, Some(0.5));
        assert_eq!(overrides.timeout, None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Ok(())), ExitCode::SUCCESS);
        assert_eq!(
            exit_code(Err(anyhow::anyhow!("interrupt listener failed"))),
            ExitCode::FAILURE
        );
    }

    #[tokio::test]
    async fn test_invalid_config_exits_non_zero() {
        let cli = Cli::try_parse_from(["molbox", "--port", "0"]).unwrap();
        assert_eq!(exit_code(run(cli).await), ExitCode::FAILURE);
    }
}
