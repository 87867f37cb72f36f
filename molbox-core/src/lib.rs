//! Molbox Core
//!
//! Core types shared by the molbox transport and runner crates.
//!
//! This crate contains:
//! - Configuration: the poller settings and the config file overlay
//! - Domain types: session state, poll events, failure kinds and log entries

pub mod config;
pub mod domain;

pub use config::{ConfigError, ConfigFile, ConfigOverrides, PollerConfig};
