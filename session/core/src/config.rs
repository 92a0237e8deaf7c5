//! Session Configuration
//!
//! Loads session settings from `~/.config/agentdeck/session.toml`, then
//! applies environment overrides.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! preview_mode = true
//!
//! [preview]
//! confidence_threshold = 0.8
//! auto_execute_high_confidence = true
//! timeout_ms = 5000
//!
//! [handoff]
//! duration_ms = 2000
//! frame_interval_ms = 50
//!
//! [session]
//! max_history = 500
//! lookup_timeout_ms = 2000
//! queue_capacity = 256
//!
//! [display]
//! mode = "normal"
//! show_thoughts = false
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auto_execute::PreviewConfig;
use crate::display::DisplayMode;
use crate::handoff::HandoffConfig;
use crate::state::DEFAULT_MAX_HISTORY;
use crate::sync::DEFAULT_LOOKUP_TIMEOUT;

/// Default command queue depth for the session runtime
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

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

/// Where the configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
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
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[preview]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewToml {
    /// Below this a preview is flagged as low confidence
    pub confidence_threshold: Option<f64>,
    /// Whether very confident input skips the preview
    pub auto_execute_high_confidence: Option<bool>,
    /// Countdown length in milliseconds
    pub timeout_ms: Option<i64>,
}

/// `[handoff]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffToml {
    /// Animation length in milliseconds
    pub duration_ms: Option<u64>,
    /// Animation frame interval in milliseconds
    pub frame_interval_ms: Option<u64>,
}

/// `[session]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSectionToml {
    /// Messages kept in memory
    pub max_history: Option<usize>,
    /// Workflow lookup timeout in milliseconds
    pub lookup_timeout_ms: Option<u64>,
    /// Runtime command queue depth
    pub queue_capacity: Option<usize>,
}

/// `[display]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Initial display mode
    pub mode: Option<DisplayMode>,
    /// Whether agent thoughts start visible
    pub show_thoughts: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Whether input goes through preview
    pub preview_mode: Option<bool>,
    /// Preview section
    pub preview: PreviewToml,
    /// Handoff animation section
    pub handoff: HandoffToml,
    /// Session section
    pub session: SessionSectionToml,
    /// Display section
    pub display: DisplayToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Whether input goes through preview
    pub preview_mode: bool,
    /// Preview behaviour
    pub preview: PreviewConfig,
    /// Handoff animation timing
    pub handoff: HandoffConfig,
    /// Messages kept in memory
    pub max_history: usize,
    /// Bound on one workflow lookup
    pub lookup_timeout: Duration,
    /// Runtime command queue depth
    pub queue_capacity: usize,
    /// Initial display mode
    pub display_mode: DisplayMode,
    /// Whether agent thoughts start visible
    pub show_thoughts: bool,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_mode: true,
            preview: PreviewConfig::default(),
            handoff: HandoffConfig::default(),
            max_history: DEFAULT_MAX_HISTORY,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            display_mode: DisplayMode::Normal,
            show_thoughts: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl SessionConfig {
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

    /// Check values that would stall the runtime
    ///
    /// A non-positive preview timeout is allowed; it fires on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.handoff.frame_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "handoff.frame_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "session.queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.max_history == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_history must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/agentdeck/session.toml` or the platform
/// equivalent.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("agentdeck").join("session.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read, parsed,
/// or validated. A missing config file is not an error.
pub fn load_config() -> Result<SessionConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read, parsed,
/// or validated.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<SessionConfig, ConfigError> {
    let mut config = SessionConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: SessionToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded session configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut SessionConfig, toml: &SessionToml) {
    if let Some(enabled) = toml.preview_mode {
        config.preview_mode = enabled;
    }

    // Preview
    if let Some(threshold) = toml.preview.confidence_threshold {
        config.preview.confidence_threshold = threshold;
    }
    if let Some(auto) = toml.preview.auto_execute_high_confidence {
        config.preview.auto_execute_high_confidence = auto;
    }
    if let Some(timeout) = toml.preview.timeout_ms {
        config.preview.timeout_ms = timeout;
    }

    // Handoff
    if let Some(ms) = toml.handoff.duration_ms {
        config.handoff.duration = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.handoff.frame_interval_ms {
        config.handoff.frame_interval = Duration::from_millis(ms);
    }

    // Session
    if let Some(max) = toml.session.max_history {
        config.max_history = max;
    }
    if let Some(ms) = toml.session.lookup_timeout_ms {
        config.lookup_timeout = Duration::from_millis(ms);
    }
    if let Some(capacity) = toml.session.queue_capacity {
        config.queue_capacity = capacity;
    }

    // Display
    if let Some(mode) = toml.display.mode {
        config.display_mode = mode;
    }
    if let Some(show) = toml.display.show_thoughts {
        config.show_thoughts = show;
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && value.to_lowercase() != "false"
}

fn apply_env_config(config: &mut SessionConfig) {
    if let Ok(enabled) = std::env::var("AGENTDECK_PREVIEW_MODE") {
        config.preview_mode = parse_flag(&enabled);
        config.source = ConfigSource::Env;
    }
    if let Ok(timeout) = std::env::var("AGENTDECK_PREVIEW_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<i64>() {
            config.preview.timeout_ms = ms;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(auto) = std::env::var("AGENTDECK_AUTO_EXECUTE") {
        config.preview.auto_execute_high_confidence = parse_flag(&auto);
        config.source = ConfigSource::Env;
    }
    if let Ok(threshold) = std::env::var("AGENTDECK_CONFIDENCE_THRESHOLD") {
        if let Ok(t) = threshold.parse::<f64>() {
            config.preview.confidence_threshold = t;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(duration) = std::env::var("AGENTDECK_HANDOFF_DURATION_MS") {
        if let Ok(ms) = duration.parse::<u64>() {
            config.handoff.duration = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(mode) = std::env::var("AGENTDECK_DISPLAY_MODE") {
        match DisplayMode::parse(&mode) {
            Some(m) => {
                config.display_mode = m;
                config.source = ConfigSource::Env;
            }
            None => tracing::warn!(value = %mode, "Ignoring unknown AGENTDECK_DISPLAY_MODE"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
