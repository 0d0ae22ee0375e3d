//! Configuration loading and config file resolution
//!
//! Configuration file resolution priority:
//! 1. Explicit path (command-line argument, highest priority)
//! 2. `COVERDESK_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/coverdesk/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable config file never aborts startup. The loader logs a
//! warning and continues with compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "COVERDESK_CONFIG";

/// Environment variable overriding `backend.base_url`
pub const BASE_URL_ENV_VAR: &str = "COVERDESK_BASE_URL";

/// Default backend base URL used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost/api";

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Submission pipeline settings
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL every endpoint path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single network attempt (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent override (defaults to [`get_user_agent`])
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// User-Agent sent with every request
    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(get_user_agent)
    }
}

/// Submission pipeline settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SubmissionConfig {
    /// Error message fragments that mark a submission failure as ambiguous
    /// (eligible for the reduced-payload fallback). `None` keeps the built-in list.
    #[serde(default)]
    pub ambiguous_terms: Option<Vec<String>>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration file
    ///
    /// # Errors
    /// [`Error::Io`] if the file cannot be read, [`Error::Config`] if it does
    /// not parse or validate.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration with graceful degradation
    ///
    /// Resolves the config file (see module docs), falls back to compiled
    /// defaults when no file is found, then applies the `COVERDESK_BASE_URL`
    /// override.
    ///
    /// # Errors
    /// Returns error only when a file is readable but invalid, or when the
    /// environment override is not a valid base URL.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match ConfigFileResolver::new().resolve(explicit_path) {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(Error::Io(e)) => {
                    warn!(
                        "Config file {} unreadable ({}), using compiled defaults",
                        path.display(),
                        e
                    );
                    TomlConfig::default()
                }
                Err(e) => return Err(e),
            },
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                info!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV_VAR) {
            info!("Backend base URL overridden by {}", BASE_URL_ENV_VAR);
            config.backend.base_url = base_url;
            config.validate()?;
        }

        Ok(config)
    }

    /// Validate value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(Error::Config("backend.base_url must not be empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend.base_url must start with http:// or https:// (got '{}')",
                base_url
            )));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(Error::Config(
                "backend.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.backend.connect_timeout_secs == 0 {
            return Err(Error::Config(
                "backend.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Config file resolver following the documented priority order
#[derive(Debug, Clone)]
pub struct ConfigFileResolver {
    env_var_name: String,
}

impl ConfigFileResolver {
    pub fn new() -> Self {
        Self {
            env_var_name: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Resolve which config file to read, if any
    ///
    /// Explicit and environment paths are returned even when they do not
    /// exist, so the caller can report them. The platform default is only
    /// returned when present.
    pub fn resolve(&self, explicit_path: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = explicit_path {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        default_config_path().filter(|path| path.exists())
    }
}

impl Default for ConfigFileResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform default config file location
///
/// - Linux: `~/.config/coverdesk/config.toml`
/// - macOS: `~/Library/Application Support/coverdesk/config.toml`
/// - Windows: `%APPDATA%\coverdesk\config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("coverdesk").join("config.toml"))
}

/// Standard User-Agent string for Coverdesk HTTP clients
pub fn get_user_agent() -> String {
    format!("coverdesk/{}", env!("CARGO_PKG_VERSION"))
}
