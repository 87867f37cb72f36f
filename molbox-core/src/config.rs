//! Poller configuration
//!
//! [`PollerConfig`] is the immutable record the poller runs with. Every
//! configuration source (the `~/.molbox_tester` file, environment variables,
//! command-line flags) produces a [`ConfigOverrides`] that is layered on top
//! of the defaults.

use ini::{Ini, Properties};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Section of the config file that holds the poller settings
pub const SECTION: &str = "molbox";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 23;
pub const DEFAULT_INTERVAL_SECS: f64 = 2.0;
pub const DEFAULT_COMMAND: &str = "ALLR";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid INI
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] ini::ParseError),

    /// A value is out of its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one poller instance
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Remote host name or address
    pub host: String,

    /// Remote telnet port
    pub port: u16,

    /// Delay between successive commands, also used as the retry delay
    pub interval: Duration,

    /// Command sent on every cycle, without line terminator
    pub command: String,

    /// Upper bound for connecting and for waiting on a response line
    pub timeout: Duration,
}

impl PollerConfig {
    /// `host:port` form of the remote endpoint
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host cannot be empty".into()));
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be greater than 0".into()));
        }

        if self.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "interval must be greater than 0".into(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than 0".into()));
        }

        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            interval: Duration::from_secs_f64(DEFAULT_INTERVAL_SECS),
            command: DEFAULT_COMMAND.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// A partial configuration; `None` fields keep the value underneath
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Seconds, fractional values allowed
    pub interval: Option<f64>,
    pub command: Option<String>,
    /// Whole seconds
    pub timeout: Option<u64>,
}

impl ConfigOverrides {
    /// Returns `true` when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layers these overrides on top of `base`
    pub fn apply(self, base: PollerConfig) -> Result<PollerConfig, ConfigError> {
        let interval = match self.interval {
            Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| {
                ConfigError::Invalid(format!("interval must be a positive number, got {secs}"))
            })?,
            None => base.interval,
        };

        Ok(PollerConfig {
            host: self.host.unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
            interval,
            command: self.command.unwrap_or(base.command),
            timeout: self.timeout.map(Duration::from_secs).unwrap_or(base.timeout),
        })
    }
}

/// Contents of a config file
///
/// The file is INI. Settings live under a `[molbox]` section; anything else
/// in the file is ignored, and a file without that section leaves every
/// default in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub molbox: ConfigOverrides,
}

impl ConfigFile {
    /// Parses a config file from INI text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content)?;
        let Some(section) = ini.section(Some(SECTION)) else {
            return Ok(Self::default());
        };

        Ok(Self {
            molbox: ConfigOverrides {
                host: section.get("host").map(str::to_string),
                port: parse_value(section, "port")?,
                interval: parse_value(section, "interval")?,
                command: section.get("command").map(str::to_string),
                timeout: parse_value(section, "timeout")?,
            },
        })
    }

    /// Loads a config file, failing if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Loads a config file, returning `None` if it does not exist
    pub fn load_optional(path: &Path) -> Result<Option<Self>, ConfigError> {
        match Self::load(path) {
            Ok(file) => Ok(Some(file)),
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Example file content, shown to users who have no config file yet
    pub fn template() -> String {
        format!(
            "[{SECTION}]\nhost = {DEFAULT_HOST}\nport = {DEFAULT_PORT}\ninterval = {DEFAULT_INTERVAL_SECS:.1}\ncommand = {DEFAULT_COMMAND}\ntimeout = {DEFAULT_TIMEOUT_SECS}\n"
        )
    }
}

fn parse_value<T: FromStr>(section: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    section
        .get(key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| ConfigError::Invalid(format!("{key} has an invalid value: {raw:?}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 23);
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.command, "ALLR");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_only_override_keeps_other_defaults() {
        let file = ConfigFile::parse("[molbox]\nport = 2323\n").unwrap();
        let config = file.molbox.apply(PollerConfig::default()).unwrap();

        assert_eq!(
            config,
            PollerConfig {
                port: 2323,
                ..PollerConfig::default()
            }
        );
    }

    #[test]
    fn test_missing_section_yields_defaults() {
        let file = ConfigFile::parse("[other]\nport = 99\n").unwrap();
        assert!(file.molbox.is_empty());

        let config = file.molbox.apply(PollerConfig::default()).unwrap();
        assert_eq!(config, PollerConfig::default());
    }

    #[test]
    fn test_hand_written_file() {
        let file = ConfigFile::parse(
            "; lab device\n[molbox]\nhost = 10.0.0.7\nport = 4001\ninterval = 0.5\ncommand = STAT\ntimeout = 3\nflavour = x\n",
        )
        .unwrap();
        let config = file.molbox.apply(PollerConfig::default()).unwrap();

        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, 4001);
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.command, "STAT");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.address(), "10.0.0.7:4001");
    }

    #[test]
    fn test_command_with_spaces() {
        let file = ConfigFile::parse("[molbox]\ncommand = GET P1\n").unwrap();
        assert_eq!(file.molbox.command.as_deref(), Some("GET P1"));
    }

    #[test]
    fn test_integer_interval_accepted() {
        let file = ConfigFile::parse("[molbox]\ninterval = 5\n").unwrap();
        let config = file.molbox.apply(PollerConfig::default()).unwrap();
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ConfigFile::parse("[molbox]\nport = telnet\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ConfigFile::parse("[molbox]\nport = 70000\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ConfigFile::parse("[molbox]\ntimeout = 2.5\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ConfigFile::parse("[molbox\nport = 23\n"),
            Err(ConfigError::Parse(_))
        ));

        let negative = ConfigOverrides {
            interval: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            negative.apply(PollerConfig::default()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = PollerConfig::default();
        assert!(config.validate().is_ok());

        config.port = 0;
        assert!(config.validate().is_err());
        config.port = 23;

        config.host = "  ".to_string();
        assert!(config.validate().is_err());
        config.host = "localhost".to_string();

        config.interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.interval = Duration::from_secs(1);

        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ConfigFile::load_optional(&dir.path().join(".molbox_tester")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[molbox]\nhost = moxa.local").unwrap();

        let loaded = ConfigFile::load_optional(file.path()).unwrap().unwrap();
        assert_eq!(loaded.molbox.host.as_deref(), Some("moxa.local"));
        assert_eq!(loaded.molbox.port, None);
    }

    #[test]
    fn test_template() {
        let expected =
            "[molbox]\nhost = localhost\nport = 23\ninterval = 2.0\ncommand = ALLR\ntimeout = 10\n";
        assert_eq!(ConfigFile::template(), expected);

        let file = ConfigFile::parse(expected).unwrap();
        assert_eq!(
            file.molbox,
            ConfigOverrides {
                host: Some("localhost".to_string()),
                port: Some(23),
                interval: Some(2.0),
                command: Some("ALLR".to_string()),
                timeout: Some(10),
            }
        );
        let config = file.molbox.apply(PollerConfig::default()).unwrap();
        assert_eq!(config, PollerConfig::default());
    }
}
