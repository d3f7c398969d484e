//! Configuration loader with layered approach.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, CourierConfig, LogFormatName};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file or string (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use courier_config::ConfigLoader;
///
/// # fn main() -> Result<(), courier_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("courier.toml")?
///     .with_env_prefix("COURIER")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: CourierConfig,
    env_prefix: Option<String>,
    env_vars: Vec<(String, String)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CourierConfig::default(),
            env_prefix: None,
            env_vars: Vec::new(),
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = CourierConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = CourierConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = CourierConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension (`.toml` or `.json`). The file
    /// replaces the current configuration; absent sections and fields take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// has an unsupported extension or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = Self::parse(&content, &extension)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content
    /// * `format` - `"toml"` or `"json"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_config::{CodecName, ConfigLoader};
    ///
    /// let toml = r#"
    ///     [compression]
    ///     enabled = true
    ///     codec = "br"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.compression.enabled);
    /// assert_eq!(config.compression.codec, CodecName::Brotli);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Read overrides from process environment variables named
    /// `PREFIX__SECTION__KEY` when [`load`](Self::load) runs.
    ///
    /// For example, with prefix `COURIER`:
    /// - `COURIER__COMPRESSION__ENABLED=true`
    /// - `COURIER__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Supplies override variables explicitly instead of reading them from
    /// the process environment. Names still carry the prefix.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment overrides (if a prefix was set) and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<CourierConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = if self.env_vars.is_empty() {
                env::vars().filter(|(k, _)| k.starts_with(&prefix)).collect()
            } else {
                std::mem::take(&mut self.env_vars)
            };
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> CourierConfig {
        self.config
    }

    fn parse(content: &str, format: &str) -> Result<CourierConfig, ConfigError> {
        match format {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix but not the separator, e.g. COURIER_HOME.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["CLIENT", "LABEL"] => {
                config.client.label = value.to_string();
            }
            ["CLIENT", "TRACING"] => {
                config.client.tracing = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["COMPRESSION", "ENABLED"] => {
                config.compression.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["COMPRESSION", "CODEC"] => {
                config.compression.codec = value
                    .parse()
                    .map_err(|reason: String| ConfigError::env_parse_error(key, reason))?;
            }
            ["COMPRESSION", "LEVEL"] => {
                config.compression.level = value
                    .parse()
                    .map_err(|reason: String| ConfigError::env_parse_error(key, reason))?;
            }
            ["COMPRESSION", "MIN_SIZE"] => {
                config.compression.min_size = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            ["LOGGING", "ENABLED"] => {
                config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormatName::Json,
                    "pretty" => LogFormatName::Pretty,
                    "compact" => LogFormatName::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                config.logging.span_events = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                config.logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => return Err(ConfigError::env_parse_error(key, "unknown configuration key")),
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodecName, LevelSetting, NamedLevel};
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_load() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, CourierConfig::default());
    }

    #[test]
    fn test_toml_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [client]
            label = "orders"

            [compression]
            enabled = true
            codec = "br"
            level = "best"
            min_size = 512
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

        assert_eq!(config.client.label, "orders");
        assert!(config.client.tracing);
        assert!(config.compression.enabled);
        assert_eq!(config.compression.codec, CodecName::Brotli);
        assert_eq!(config.compression.level, LevelSetting::Named(NamedLevel::Best));
        assert_eq!(config.compression.min_size, 512);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_json_file() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"compression": {{"enabled": true, "level": 4}},
                 "logging": {{"format": "compact"}}}}"#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

        assert_eq!(config.compression.codec, CodecName::Gzip);
        assert_eq!(config.compression.level, LevelSetting::Custom(4));
        assert_eq!(config.logging.format, LogFormatName::Compact);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new().with_file("/nonexistent/courier.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_optional_missing_file() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/courier.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, CourierConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[compression]\nratio = 3\n", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_prefix("COURIER")
            .with_env_vars([
                ("COURIER__CLIENT__LABEL", "inventory"),
                ("COURIER__COMPRESSION__ENABLED", "yes"),
                ("COURIER__COMPRESSION__CODEC", "brotli"),
                ("COURIER__COMPRESSION__LEVEL", "10"),
                ("COURIER__LOGGING__FORMAT", "pretty"),
                ("COURIER_HOME", "/opt/courier"),
            ])
            .load()
            .unwrap();

        assert_eq!(config.client.label, "inventory");
        assert!(config.compression.enabled);
        assert_eq!(config.compression.codec, CodecName::Brotli);
        assert_eq!(config.compression.level, LevelSetting::Custom(10));
        assert_eq!(config.logging.format, LogFormatName::Pretty);
    }

    #[test]
    fn test_env_overrides_layer_over_string() {
        let config = ConfigLoader::new()
            .with_string("[compression]\nenabled = true\nmin_size = 100\n", "toml")
            .unwrap()
            .with_env_prefix("COURIER")
            .with_env_vars([("COURIER__COMPRESSION__MIN_SIZE", "2048")])
            .load()
            .unwrap();

        assert!(config.compression.enabled);
        assert_eq!(config.compression.min_size, 2048);
    }

    #[test]
    fn test_process_env_overrides() {
        env::set_var("COURIER_LOADER_TEST__LOGGING__LEVEL", "warn");

        let config = ConfigLoader::new()
            .with_env_prefix("courier_loader_test")
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "warn");
        env::remove_var("COURIER_LOADER_TEST__LOGGING__LEVEL");
    }

    #[test]
    fn test_env_parse_errors() {
        let bad_bool = ConfigLoader::new()
            .with_env_prefix("COURIER")
            .with_env_vars([("COURIER__COMPRESSION__ENABLED", "maybe")])
            .load();
        assert!(matches!(bad_bool, Err(ConfigError::EnvParseError { .. })));

        let unknown = ConfigLoader::new()
            .with_env_prefix("COURIER")
            .with_env_vars([("COURIER__COMPRESSION__RATIO", "3")])
            .load();
        assert!(matches!(unknown, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let result = ConfigLoader::new()
            .with_env_prefix("COURIER")
            .with_env_vars([("COURIER__COMPRESSION__LEVEL", "11")])
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
