//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and
//! `INVESTIGO_*` environment variables, and merging file configurations
//! with proper precedence rules.

use crate::error::InvestigoError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default timeout (as string, e.g., "30s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// SOCKS proxy endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Route probes through the proxy by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_proxy: Option<bool>,

    /// Path of the site catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Also report sites where the handle was not found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Disable colored output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_color: Option<bool>,

    /// User agent sent with every probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, InvestigoError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(InvestigoError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            InvestigoError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            InvestigoError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is loaded first, then the global file in `$HOME`, then the
    /// local file in the current directory; later files win.
    pub fn discover_and_load(&self) -> Result<FileConfig, InvestigoError> {
        let mut merged_config = FileConfig::default();
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "loaded config file");
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => tracing::warn!(path = %path.display(), "ignoring config file: {}", e),
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./investigo.toml", "./.investigo.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".investigo.toml", "investigo.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("investigo").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        let defaults = match (lower.defaults, higher.defaults) {
            (Some(lower), Some(higher)) => Some(DefaultsConfig {
                concurrency: higher.concurrency.or(lower.concurrency),
                timeout: higher.timeout.or(lower.timeout),
                proxy: higher.proxy.or(lower.proxy),
                use_proxy: higher.use_proxy.or(lower.use_proxy),
                database: higher.database.or(lower.database),
                verbose: higher.verbose.or(lower.verbose),
                no_color: higher.no_color.or(lower.no_color),
                user_agent: higher.user_agent.or(lower.user_agent),
            }),
            (lower, higher) => higher.or(lower),
        };

        FileConfig { defaults }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), InvestigoError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > 100 {
                return Err(InvestigoError::config(
                    "Concurrency must be between 1 and 100",
                ));
            }
        }

        if let Some(timeout_str) = &defaults.timeout {
            if parse_timeout_string(timeout_str).is_none() {
                return Err(InvestigoError::config(format!(
                    "Invalid timeout format '{}'. Use format like '30s', '2m'",
                    timeout_str
                )));
            }
        }

        if let Some(proxy) = &defaults.proxy {
            if !proxy.is_empty() && !proxy.contains("://") {
                return Err(InvestigoError::config(format!(
                    "Invalid proxy '{}'. Use a URL like 'socks5://127.0.0.1:9050'",
                    proxy
                )));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub proxy: Option<String>,
    pub use_proxy: Option<bool>,
    pub database: Option<String>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from `INVESTIGO_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an `EnvConfig` from any variable lookup.
fn env_config_from<F: Fn(&str) -> Option<String>>(lookup: F) -> EnvConfig {
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("INVESTIGO_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!("Invalid INVESTIGO_CONCURRENCY='{}', must be 1-100", val),
        }
    }

    if let Some(val) = lookup("INVESTIGO_TIMEOUT") {
        if parse_timeout_string(&val).is_some() {
            env_config.timeout = Some(val);
        } else {
            tracing::warn!(
                "Invalid INVESTIGO_TIMEOUT='{}', use format like '30s', '2m'",
                val
            );
        }
    }

    env_config.proxy = non_empty(lookup("INVESTIGO_PROXY"));
    env_config.database = non_empty(lookup("INVESTIGO_DB"));
    env_config.config = non_empty(lookup("INVESTIGO_CONFIG"));
    env_config.use_proxy = lookup_bool(&lookup, "INVESTIGO_TOR");
    env_config.verbose = lookup_bool(&lookup, "INVESTIGO_VERBOSE");
    env_config.no_color = lookup_bool(&lookup, "INVESTIGO_NO_COLOR");

    env_config
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn lookup_bool<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<bool> {
    let val = lookup(key)?;
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Invalid {}='{}', use true/false", key, val);
            None
        }
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is read as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| m * 60)
    } else {
        timeout_str.parse::<u64>().ok()
    }
}
