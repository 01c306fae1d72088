//! Configuration management for jobtrail.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/jobtrail/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Store and provider-definition locations
    pub storage: StorageConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Reconciliation behavior settings
    pub reconcile: ReconcileConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBTRAIL_DATA_DIR`: Override the store directory
    /// - `JOBTRAIL_HEADLESS`: Override browser headless mode (true/false)
    /// - `JOBTRAIL_PROBE_CAP`: Override the per-run status probe cap
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        // Override from environment
        if let Ok(val) = std::env::var("JOBTRAIL_DATA_DIR") {
            if !val.is_empty() {
                config.storage.data_dir = Some(PathBuf::from(&val));
                tracing::debug!("Override storage.data_dir from env: {}", val);
            }
        }

        if let Ok(val) = std::env::var("JOBTRAIL_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("JOBTRAIL_PROBE_CAP") {
            if let Ok(cap) = val.parse() {
                config.reconcile.probe_cap = cap;
                tracing::debug!("Override reconcile.probe_cap from env: {}", cap);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/jobtrail/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "jobtrail", "jobtrail").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the default data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/jobtrail`
    pub fn default_data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "jobtrail", "jobtrail").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the store directory: the configured override, or the XDG data dir.
    pub fn resolve_data_dir(&self) -> ConfigResult<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_dir(),
        }
    }
}

/// Store and provider-definition locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the per-provider store files (None = XDG data dir)
    pub data_dir: Option<PathBuf>,
    /// Directory holding provider definition TOML files
    /// (None = `provider-definitions/` under the workspace root)
    pub definitions_dir: Option<PathBuf>,
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Whether to run the browser without a visible window
    pub headless: bool,
    /// Per-call navigation timeout in seconds
    pub nav_timeout_secs: u64,
    /// Minimum delay between navigations to the same domain, in milliseconds
    pub min_delay_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            nav_timeout_secs: 30,
            min_delay_ms: 1000,
        }
    }
}

/// Reconciliation behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Maximum number of per-job status probes per run
    pub probe_cap: usize,
    /// Persist the store after this many probed records
    pub persist_every: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            probe_cap: 25,
            persist_every: 10,
        }
    }
}
