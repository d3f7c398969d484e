//! Pipeline assembly from configuration.

use courier_config::{CodecName, CourierConfig, LevelSetting, NamedLevel};
use courier_middleware::stages::{Codec, CompressionLevel, CompressionStage, TracingStage};
use courier_middleware::BoxedHandler;
use std::sync::Arc;

/// Builds the stages described by `config`, outermost-first.
///
/// - `client.tracing` adds a [`TracingStage`] labelled `client.label`
/// - `compression.enabled` adds a [`CompressionStage`]
///
/// # Example
///
/// ```
/// use courier::config::CourierConfig;
/// use courier::middleware::Handler;
/// use courier::stages_from_config;
///
/// let stages = stages_from_config(&CourierConfig::production());
/// let names: Vec<_> = stages.iter().map(|s| s.name()).collect();
/// assert_eq!(names, ["tracing", "compression"]);
/// ```
#[must_use]
pub fn stages_from_config(config: &CourierConfig) -> Vec<BoxedHandler> {
    let mut stages: Vec<BoxedHandler> = Vec::new();

    if config.client.tracing {
        stages.push(Arc::new(TracingStage::new(config.client.label.clone())));
    }

    if config.compression.enabled {
        let section = &config.compression;
        stages.push(Arc::new(
            CompressionStage::new(codec(section.codec))
                .with_level(level(section.level))
                .with_min_size(section.min_size),
        ));
    }

    stages
}

/// Installs the global logging subscriber described by `config.logging`.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_logging(config: &CourierConfig) -> courier_telemetry::TelemetryResult<()> {
    courier_telemetry::init_logging(&config.logging.to_log_config())
}

fn codec(name: CodecName) -> Codec {
    match name {
        CodecName::Gzip => Codec::Gzip,
        CodecName::Brotli => Codec::Brotli,
    }
}

fn level(setting: LevelSetting) -> CompressionLevel {
    match setting {
        LevelSetting::Named(NamedLevel::Fast) => CompressionLevel::Fast,
        LevelSetting::Named(NamedLevel::Default) => CompressionLevel::Default,
        LevelSetting::Named(NamedLevel::Best) => CompressionLevel::Best,
        LevelSetting::Custom(n) => CompressionLevel::Custom(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_middleware::Handler;

    fn names(stages: &[BoxedHandler]) -> Vec<&'static str> {
        stages.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_default_config_only_traces() {
        let stages = stages_from_config(&CourierConfig::default());
        assert_eq!(names(&stages), ["tracing"]);
    }

    #[test]
    fn test_everything_disabled() {
        let mut config = CourierConfig::default();
        config.client.tracing = false;
        assert!(stages_from_config(&config).is_empty());
    }

    #[test]
    fn test_compression_enabled() {
        let mut config = CourierConfig::default();
        config.client.tracing = false;
        config.compression.enabled = true;
        config.compression.codec = CodecName::Brotli;

        assert_eq!(names(&stages_from_config(&config)), ["compression"]);
    }

    #[test]
    fn test_mappings() {
        assert_eq!(codec(CodecName::Brotli), Codec::Brotli);
        assert_eq!(level(LevelSetting::Named(NamedLevel::Best)), CompressionLevel::Best);
        assert_eq!(level(LevelSetting::Custom(3)), CompressionLevel::Custom(3));
    }
}
