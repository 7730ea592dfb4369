//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/carelog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/carelog/` (~/.config/carelog/)
//! - Data: `$XDG_DATA_HOME/carelog/` (~/.local/share/carelog/)
//! - State/Logs: `$XDG_STATE_HOME/carelog/` (~/.local/state/carelog/)

use crate::analytics::{ReportSettings, Thresholds, TimeRange};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Report generation settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Recommendation thresholds
    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Report generation settings
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    /// Range used when none is given (7days, 30days, 3months, 6months, 1year)
    #[serde(default = "default_range")]
    pub default_range: String,

    /// Maximum entries in each ranking (triggers, categories, ...)
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// How far a dose may be from its scheduled time and still be on time
    #[serde(default = "default_on_time_tolerance")]
    pub on_time_tolerance_minutes: i64,

    /// Override path for the record store file
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_range: default_range(),
            top_n: default_top_n(),
            on_time_tolerance_minutes: default_on_time_tolerance(),
            store_path: None,
        }
    }
}

fn default_range() -> String {
    "30days".to_string()
}

fn default_top_n() -> usize {
    5
}

fn default_on_time_tolerance() -> i64 {
    30
}

/// A dose more than a day away from its slot belongs to another slot.
const MAX_ON_TIME_TOLERANCE_MINUTES: i64 = 24 * 60;

/// Thresholds that drive recommendations
#[derive(Debug, Deserialize)]
pub struct ThresholdsConfig {
    /// Average pain above this triggers a high-pain recommendation
    #[serde(default = "default_high_pain_level")]
    pub high_pain_level: f64,

    /// Fewer weekly sessions than this triggers an exercise recommendation
    #[serde(default = "default_min_sessions_per_week")]
    pub min_sessions_per_week: u32,

    /// Adherence below this percentage triggers an adherence recommendation
    #[serde(default = "default_min_adherence_rate")]
    pub min_adherence_rate: u32,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            high_pain_level: default_high_pain_level(),
            min_sessions_per_week: default_min_sessions_per_week(),
            min_adherence_rate: default_min_adherence_rate(),
        }
    }
}

fn default_high_pain_level() -> f64 {
    6.0
}

fn default_min_sessions_per_week() -> u32 {
    3
}

fn default_min_adherence_rate() -> u32 {
    80
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.report.default_range.parse::<TimeRange>().is_err() {
            return Err(Error::Config(format!(
                "report.default_range must be one of 7days, 30days, 3months, 6months, 1year (got {:?})",
                self.report.default_range
            )));
        }
        if self.report.top_n == 0 {
            return Err(Error::Config(
                "report.top_n must be at least 1".to_string(),
            ));
        }
        if !(0..=MAX_ON_TIME_TOLERANCE_MINUTES).contains(&self.report.on_time_tolerance_minutes) {
            return Err(Error::Config(format!(
                "report.on_time_tolerance_minutes must be between 0 and {} (got {})",
                MAX_ON_TIME_TOLERANCE_MINUTES, self.report.on_time_tolerance_minutes
            )));
        }
        if !(1.0..=10.0).contains(&self.thresholds.high_pain_level) {
            return Err(Error::Config(
                "thresholds.high_pain_level must be between 1 and 10".to_string(),
            ));
        }
        if self.thresholds.min_adherence_rate > 100 {
            return Err(Error::Config(
                "thresholds.min_adherence_rate must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }

    /// Range to use when the caller does not pick one.
    pub fn default_range(&self) -> TimeRange {
        TimeRange::parse_lenient(&self.report.default_range)
    }

    /// Analytics settings derived from this configuration.
    ///
    /// The tolerance is clamped to the range `validate` accepts, so an
    /// unvalidated config still yields usable settings.
    pub fn report_settings(&self) -> ReportSettings {
        let tolerance = self
            .report
            .on_time_tolerance_minutes
            .clamp(0, MAX_ON_TIME_TOLERANCE_MINUTES);
        ReportSettings {
            top_n: self.report.top_n,
            on_time_tolerance: chrono::Duration::minutes(tolerance),
            thresholds: Thresholds {
                high_pain_level: self.thresholds.high_pain_level,
                min_sessions_per_week: self.thresholds.min_sessions_per_week,
                min_adherence_rate: self.thresholds.min_adherence_rate,
            },
        }
    }

    /// Record store location: the configured override or the XDG default.
    pub fn store_path(&self) -> PathBuf {
        self.report
            .store_path
            .clone()
            .unwrap_or_else(Self::default_store_path)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/carelog/config.toml` (~/.config/carelog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("carelog").join("config.toml")
    }

    /// Returns the data directory path (for the record store)
    ///
    /// `$XDG_DATA_HOME/carelog/` (~/.local/share/carelog/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("carelog")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/carelog/` (~/.local/state/carelog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("carelog")
    }

    /// Returns the default record store path
    ///
    /// `$XDG_DATA_HOME/carelog/records.json`
    pub fn default_store_path() -> PathBuf {
        Self::data_dir().join("records.json")
    }
}
