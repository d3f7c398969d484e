//! Structured logging for Courier.
//!
//! Installs a global `tracing-subscriber` registry with an [`EnvFilter`] and
//! one formatting layer. `RUST_LOG` is not consulted; the filter comes from
//! [`LogConfig::level`], which accepts full directive syntax such as
//! `"info,courier_middleware=debug"`.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use std::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line, human-readable output.
    Pretty,
    /// Single-line, human-readable output.
    Compact,
}

impl LogFormat {
    /// Parses a format name (`json`, `pretty` or `compact`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directives (e.g., "info", "courier_middleware=trace").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to log span creation and close (with timings).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Whether to emit ANSI colors (human-readable formats only).
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    ///
    /// Stage entry is logged at `trace`, so the development preset turns the
    /// pipeline crates up to that level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug,courier_middleware=trace".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            include_target: true,
            ansi: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            include_target: true,
            ansi: false,
        }
    }

    /// Checks that the filter directives parse.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidConfig` if `level` is empty or invalid.
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.level.trim().is_empty() {
            return Err(TelemetryError::InvalidConfig("log level must not be empty".to_string()));
        }
        EnvFilter::try_new(&self.level)
            .map(drop)
            .map_err(|e| {
                TelemetryError::InvalidConfig(format!("invalid log level '{}': {e}", self.level))
            })
    }
}

/// Initializes the global logging subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let layer = match config.format {
        LogFormat::Json => base.json().with_ansi(false).with_filter(filter).boxed(),
        LogFormat::Pretty => base.pretty().with_ansi(config.ansi).with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_ansi(config.ansi).with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

/// Field names used by Courier's log events and spans.
pub mod fields {
    /// Client label set on the tracing stage.
    pub const CLIENT: &str = "client";

    /// Stage name.
    pub const STAGE: &str = "stage";

    /// Number of stages in a composed pipeline.
    pub const STAGE_COUNT: &str = "stage_count";

    /// HTTP method field name.
    pub const HTTP_METHOD: &str = "http.method";

    /// Request URL field name.
    pub const HTTP_URL: &str = "http.url";

    /// HTTP status code field name.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Compression codec.
    pub const CODEC: &str = "codec";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Error field name.
    pub const ERROR: &str = "error";

    /// Error category field name.
    pub const CATEGORY: &str = "category";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_production() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert_eq!(config, LogConfig::production());
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::from_name("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_name(" pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::from_name("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::from_name("xml"), None);
        assert_eq!(LogFormat::Compact.to_string(), "compact");
    }

    #[test]
    fn test_validate_rejects_bad_level() {
        let empty = LogConfig {
            level: "  ".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(empty.validate(), Err(TelemetryError::InvalidConfig(_))));

        let garbage = LogConfig {
            level: "courier=notalevel".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(garbage.validate(), Err(TelemetryError::InvalidConfig(_))));
    }

    #[test]
    fn test_create_env_filter_valid() {
        assert!(create_env_filter("info,courier_middleware=trace").is_ok());
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };

        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(fields::HTTP_STATUS, "http.status_code");
        assert_eq!(fields::DURATION_MS, "duration_ms");
    }
}
