//! Configuration section types.

use courier_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client identification and per-request tracing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Label recorded on every request span.
    #[serde(default = "default_label")]
    pub label: String,

    /// Wrap the pipeline in a tracing stage.
    #[serde(default = "default_true")]
    pub tracing: bool,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            label: default_label(),
            tracing: true,
        }
    }
}

fn default_label() -> String {
    "courier".to_string()
}

fn default_true() -> bool {
    true
}

/// Compression codec name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CodecName {
    /// `gzip`
    #[default]
    #[serde(rename = "gzip")]
    Gzip,
    /// `br`
    #[serde(rename = "br", alias = "brotli")]
    Brotli,
}

impl CodecName {
    /// Highest custom level the codec accepts.
    #[must_use]
    pub fn max_level(self) -> u32 {
        match self {
            Self::Gzip => 9,
            Self::Brotli => 11,
        }
    }
}

impl FromStr for CodecName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gzip" => Ok(Self::Gzip),
            "br" | "brotli" => Ok(Self::Brotli),
            other => Err(format!("unknown codec '{other}', expected 'gzip' or 'br'")),
        }
    }
}

/// Named compression level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NamedLevel {
    /// Fastest compression.
    Fast,
    /// Balanced.
    Default,
    /// Best ratio.
    Best,
}

/// Compression level: a name or an explicit number.
///
/// Accepts `"fast"`, `"default"`, `"best"` or an integer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LevelSetting {
    /// One of the named presets.
    Named(NamedLevel),
    /// Codec-specific numeric level.
    Custom(u32),
}

impl Default for LevelSetting {
    fn default() -> Self {
        Self::Named(NamedLevel::Default)
    }
}

impl FromStr for LevelSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(Self::Named(NamedLevel::Fast)),
            "default" => Ok(Self::Named(NamedLevel::Default)),
            "best" => Ok(Self::Named(NamedLevel::Best)),
            other => other
                .parse()
                .map(Self::Custom)
                .map_err(|_| {
                    format!("expected 'fast', 'default', 'best' or an integer, got '{other}'")
                }),
        }
    }
}

impl fmt::Display for LevelSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(NamedLevel::Fast) => f.write_str("fast"),
            Self::Named(NamedLevel::Default) => f.write_str("default"),
            Self::Named(NamedLevel::Best) => f.write_str("best"),
            Self::Custom(n) => write!(f, "{n}"),
        }
    }
}

/// Request body compression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CompressionSection {
    /// Add a compression stage to the pipeline.
    #[serde(default)]
    pub enabled: bool,

    /// Codec to compress with.
    #[serde(default)]
    pub codec: CodecName,

    /// Compression level.
    #[serde(default)]
    pub level: LevelSetting,

    /// Bodies with a known length below this many bytes are sent as is.
    #[serde(default)]
    pub min_size: u64,
}

/// Log output format as written in configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatName {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
    /// Single-line human-readable format.
    Compact,
}

impl From<LogFormatName> for LogFormat {
    fn from(name: LogFormatName) -> Self {
        match name {
            LogFormatName::Json => Self::Json,
            LogFormatName::Pretty => Self::Pretty,
            LogFormatName::Compact => Self::Compact,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormatName,

    /// Log span open/close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormatName::default(),
            span_events: false,
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingSection {
    /// Converts to the telemetry crate's logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format.into(),
            span_events: self.span_events,
            file_line_info: self.include_location,
            include_target: true,
            ansi: self.ansi_enabled,
        }
    }
}
