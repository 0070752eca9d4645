//! TOML Configuration File Support
//!
//! Engine tuning and surface geometry, loaded from
//! `$XDG_CONFIG_HOME/display-engine/display.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables (`DISPLAY_ENGINE_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [engine]
//! settle_delay_ms = 5000
//! frame_interval_ms = 16
//! alert_timeout_secs = 10
//!
//! [surface]
//! width = 1920
//! height = 1080
//! resource_scheme = "display-res"
//!
//! [channels]
//! command_capacity = 256
//! notification_capacity = 256
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::DEFAULT_RESOURCE_SCHEME;
use crate::style::Canvas;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Engine section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineToml {
    /// Delay before a superseded generation is discarded, in milliseconds
    pub settle_delay_ms: Option<u64>,

    /// Redraw frame interval in milliseconds
    pub frame_interval_ms: Option<u64>,

    /// Steady duration of alerts that do not set their own, in seconds
    pub alert_timeout_secs: Option<u64>,
}

/// Surface section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceToml {
    /// Output width in pixels
    pub width: Option<u32>,

    /// Output height in pixels
    pub height: Option<u32>,

    /// Scheme `file://` references are rewritten to
    pub resource_scheme: Option<String>,
}

/// Channel section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsToml {
    /// Capacity of the host → engine input channel
    pub command_capacity: Option<usize>,

    /// Capacity of the engine → host notification channel
    pub notification_capacity: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Engine configuration section
    pub engine: EngineToml,

    /// Surface configuration section
    pub surface: SurfaceToml,

    /// Channel configuration section
    pub channels: ChannelsToml,
}

// =============================================================================
// Main Configuration Structs
// =============================================================================

/// Settings one engine instance runs with
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Delay before a superseded generation is discarded
    pub settle_delay: Duration,

    /// Redraw frame interval
    pub frame_interval: Duration,

    /// Steady duration for alerts with `timeout = 0`
    pub alert_timeout: Duration,

    /// Output geometry
    pub canvas: Canvas,

    /// Scheme `file://` references are rewritten to
    pub resource_scheme: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(5000),
            frame_interval: Duration::from_millis(16),
            alert_timeout: Duration::from_secs(10),
            canvas: Canvas::default(),
            resource_scheme: DEFAULT_RESOURCE_SCHEME.to_string(),
        }
    }
}

/// Centralized configuration for the display engine
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct DisplayConfig {
    /// Engine settings
    pub engine: EngineConfig,

    /// Capacity of the host → engine input channel
    pub command_capacity: usize,

    /// Capacity of the engine → host notification channel
    pub notification_capacity: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            command_capacity: 256,
            notification_capacity: 256,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl DisplayConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check every value is usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.frame_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "frame_interval_ms must be greater than 0".to_string(),
            ));
        }
        if engine.alert_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "alert_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if engine.canvas.width == 0 || engine.canvas.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "surface size must be non-zero, got {}x{}",
                engine.canvas.width, engine.canvas.height
            )));
        }
        if !is_valid_scheme(&engine.resource_scheme) {
            return Err(ConfigError::ValidationError(format!(
                "resource_scheme {:?} is not a valid URL scheme",
                engine.resource_scheme
            )));
        }
        if self.command_capacity == 0 || self.notification_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel capacities must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// RFC 3986 scheme: a letter followed by letters, digits, `+`, `-` or `.`
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/display-engine/display.toml` or
/// `~/.config/display-engine/display.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("display-engine").join("display.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] afterwards.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// result does not validate. A missing config file is not an error.
pub fn load_config() -> Result<DisplayConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or the result does not validate.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<DisplayConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment variables through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<DisplayConfig, ConfigError> {
    let mut config = DisplayConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: DisplayToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut DisplayConfig, toml: &DisplayToml) {
    if let Some(ms) = toml.engine.settle_delay_ms {
        config.engine.settle_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.engine.frame_interval_ms {
        config.engine.frame_interval = Duration::from_millis(ms);
    }
    if let Some(secs) = toml.engine.alert_timeout_secs {
        config.engine.alert_timeout = Duration::from_secs(secs);
    }

    if let Some(width) = toml.surface.width {
        config.engine.canvas.width = width;
    }
    if let Some(height) = toml.surface.height {
        config.engine.canvas.height = height;
    }
    if let Some(ref scheme) = toml.surface.resource_scheme {
        config.engine.resource_scheme.clone_from(scheme);
    }

    if let Some(capacity) = toml.channels.command_capacity {
        config.command_capacity = capacity;
    }
    if let Some(capacity) = toml.channels.notification_capacity {
        config.notification_capacity = capacity;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut DisplayConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(ms) = env("DISPLAY_ENGINE_SETTLE_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.engine.settle_delay = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env("DISPLAY_ENGINE_FRAME_INTERVAL_MS").and_then(|v| v.parse::<u64>().ok())
    {
        config.engine.frame_interval = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = env("DISPLAY_ENGINE_ALERT_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok())
    {
        config.engine.alert_timeout = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(width) = env("DISPLAY_ENGINE_WIDTH").and_then(|v| v.parse::<u32>().ok()) {
        config.engine.canvas.width = width;
        config.source = ConfigSource::Env;
    }
    if let Some(height) = env("DISPLAY_ENGINE_HEIGHT").and_then(|v| v.parse::<u32>().ok()) {
        config.engine.canvas.height = height;
        config.source = ConfigSource::Env;
    }
    if let Some(scheme) = env("DISPLAY_ENGINE_RESOURCE_SCHEME") {
        config.engine.resource_scheme = scheme;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Settle delay override (milliseconds)
    pub settle_delay_ms: Option<u64>,
    /// Frame interval override (milliseconds)
    pub frame_interval_ms: Option<u64>,
    /// Surface width override
    pub width: Option<u32>,
    /// Surface height override
    pub height: Option<u32>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set settle delay override
    #[must_use]
    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = Some(ms);
        self
    }

    /// Set frame interval override
    #[must_use]
    pub fn with_frame_interval_ms(mut self, ms: u64) -> Self {
        self.frame_interval_ms = Some(ms);
        self
    }

    /// Set surface size override
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut DisplayConfig) {
        if self.settle_delay_ms.is_some()
            || self.frame_interval_ms.is_some()
            || self.width.is_some()
            || self.height.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ms) = self.settle_delay_ms {
            config.engine.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.frame_interval_ms {
            config.engine.frame_interval = Duration::from_millis(ms);
        }
        if let Some(width) = self.width {
            config.engine.canvas.width = width;
        }
        if let Some(height) = self.height {
            config.engine.canvas.height = height;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
