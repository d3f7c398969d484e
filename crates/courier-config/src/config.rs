//! Main configuration type.

use serde::{Deserialize, Serialize};

use crate::{
    ClientSection, CompressionSection, ConfigError, LevelSetting, LogFormatName, LoggingSection,
};

/// Complete Courier client configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use courier_config::CourierConfig;
///
/// let config = CourierConfig::default();
/// assert_eq!(config.client.label, "courier");
/// assert!(!config.compression.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Client identification and tracing.
    #[serde(default)]
    pub client: ClientSection,

    /// Request body compression.
    #[serde(default)]
    pub compression: CompressionSection,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl CourierConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `client.label` is empty
    /// - a numeric `compression.level` exceeds the codec's maximum
    /// - `logging.level` is not a valid filter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.label.trim().is_empty() {
            return Err(ConfigError::invalid_value("client.label", "must not be empty"));
        }

        if let LevelSetting::Custom(level) = self.compression.level {
            let max = self.compression.codec.max_level();
            if level > max {
                return Err(ConfigError::invalid_value(
                    "compression.level",
                    format!("must be at most {max} for the configured codec, got {level}"),
                ));
            }
        }

        self.logging
            .to_log_config()
            .validate()
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors and span events
    /// - Debug log level
    ///
    /// # Example
    ///
    /// ```
    /// use courier_config::CourierConfig;
    ///
    /// let config = CourierConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormatName::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;
        config.logging.span_events = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Gzip request compression for bodies of 1 KiB and more
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormatName::Json;
        config.logging.ansi_enabled = false;

        config.compression.enabled = true;
        config.compression.min_size = 1024;

        config
    }
}
