//! Shell configuration loaded from `minish.toml`.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ShellError};

/// Environment variable consulted for the config file path.
pub const CONFIG_ENV_VAR: &str = "MINISH_CONFIG";

/// Top-level shell configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub input: InputConfig,
    pub download: DownloadConfig,
    pub http: HttpConfig,
    pub log: LogConfig,
}

/// Input line handling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Lines longer than this (in bytes) are discarded.
    pub max_line_len: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_line_len: 4096,
        }
    }
}

/// `wget` behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Destination used when `wget` is given no file argument.
    pub default_file: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_file: "download".to_string(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// TCP connect timeout. `None` leaves it to the transport.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("minish/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_secs: None,
        }
    }
}

/// Logging settings. `RUST_LOG` still overrides `level`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        if config.input.max_line_len == 0 {
            return Err(ShellError::Config(
                "input.max_line_len must be greater than zero".to_string(),
            ));
        }
        if config.download.default_file.trim().is_empty() {
            return Err(ShellError::Config(
                "download.default_file must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)
                .map_err(|e| ShellError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            },
            Err(e) => Err(ShellError::Config(format!("{}: {e}", path.display()))),
        }
    }
}
