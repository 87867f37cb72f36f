//! Runner configuration
//!
//! Resolves the poller settings from three layers, lowest precedence first:
//! built-in defaults, the `~/.molbox_tester` config file, and command-line
//! flags (each of which can also come from an environment variable).

use anyhow::{Context, Result};
use molbox_core::{ConfigFile, ConfigOverrides, PollerConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the config file looked up in the home directory
pub const CONFIG_FILE_NAME: &str = ".molbox_tester";

/// Default config file location, if the home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Loads and validates the configuration
///
/// # Arguments
/// * `explicit_path` - Config file requested by the user; it must exist
/// * `overrides` - Values given on the command line or in the environment
pub fn load_config(explicit_path: Option<&Path>, overrides: ConfigOverrides) -> Result<PollerConfig> {
    let file = match explicit_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            let file = ConfigFile::load(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            Some(file)
        }
        None => load_default_file()?,
    };

    resolve(file, overrides)
}

fn load_default_file() -> Result<Option<ConfigFile>> {
    let Some(path) = default_config_path() else {
        warn!("Could not determine the home directory, using defaults");
        return Ok(None);
    };

    let file = ConfigFile::load_optional(&path)
        .with_context(|| format!("Failed to load config file {}", path.display()))?;

    match &file {
        Some(_) => info!("Loading configuration from {}", path.display()),
        None => {
            info!(
                "No configuration file found at {}, using defaults",
                path.display()
            );
            info!("You can create a configuration file with the following format:");
            for line in ConfigFile::template().lines() {
                info!("{}", line);
            }
        }
    }

    Ok(file)
}

/// Layers the file and the overrides on top of the defaults
pub fn resolve(file: Option<ConfigFile>, overrides: ConfigOverrides) -> Result<PollerConfig> {
    let mut config = PollerConfig::default();

    if let Some(file) = file {
        config = file
            .molbox
            .apply(config)
            .context("Invalid value in config file")?;
    }

    if !overrides.is_empty() {
        debug!("Applying command-line overrides: {:?}", overrides);
        config = overrides
            .apply(config)
            .context("Invalid command-line value")?;
    }

    config.validate()?;
    Ok(config)
}
