use anyhow::{bail, Context, Result};
use chrono::Weekday;
use roast_common::config::GeneralConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DaemonConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseSettings {
    /// Explicit database file. Falls back to `general.data_dir`, then the
    /// platform data directory.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub capture_window_titles: bool,
    pub refresh_interval_secs: u64,
    pub flush_interval_secs: u64,
    pub event_channel_capacity: usize,
    pub store_retry_attempts: u32,
    pub store_retry_backoff_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            capture_window_titles: false,
            refresh_interval_secs: 1,
            flush_interval_secs: 60,
            event_channel_capacity: 256,
            store_retry_attempts: 3,
            store_retry_backoff_ms: 50,
        }
    }
}

impl TrackingConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.store_retry_attempts, Duration::from_millis(self.store_retry_backoff_ms))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub week_starts_on: String,
    pub compulsive_window_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { week_starts_on: "monday".to_string(), compulsive_window_days: 7 }
    }
}

impl AnalyticsConfig {
    pub fn week_start(&self) -> Result<Weekday> {
        self.week_starts_on
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("Invalid week_starts_on: {:?}", self.week_starts_on))
    }
}

impl DaemonConfig {
    /// Default configuration file path, overridable with `ROAST_CONFIG`.
    pub fn default_config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ROAST_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join("roast").join("daemon.toml")
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        debug!("Loading daemon configuration from {:?}", config_path);

        if !config_path.exists() {
            info!(
                "Configuration file not found at {:?}, creating default configuration",
                config_path
            );
            let default_config = Self::default();
            default_config.save_to_path(config_path)?;
            return Ok(default_config);
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: DaemonConfig = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.validate()?;

        info!("Loaded daemon configuration from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        debug!("Saving daemon configuration to {:?}", config_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let config_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Saved daemon configuration to {:?}", config_path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let tracking = &self.tracking;
        if tracking.refresh_interval_secs == 0 {
            bail!("tracking.refresh_interval_secs must be greater than zero");
        }
        if tracking.flush_interval_secs == 0 {
            bail!("tracking.flush_interval_secs must be greater than zero");
        }
        if tracking.event_channel_capacity == 0 {
            bail!("tracking.event_channel_capacity must be greater than zero");
        }
        if self.analytics.compulsive_window_days == 0 {
            bail!("analytics.compulsive_window_days must be greater than zero");
        }
        self.analytics.week_start()?;

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Resolved database file. `DATABASE_URL` wins over everything in the file.
    pub fn database_path(&self) -> String {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            return url;
        }

        if let Some(path) = &self.database.path {
            return path.clone();
        }

        let data_dir = match &self.general.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join("roast"),
        };

        data_dir.join("roast.db").to_string_lossy().to_string()
    }
}
