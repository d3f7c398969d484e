//! # Courier Telemetry
//!
//! Logging setup for applications using Courier pipelines.
//!
//! The pipeline crates only emit `tracing` events and spans; this crate
//! installs a `tracing-subscriber` registry that turns them into JSON lines
//! (production) or human-readable output (development).
//!
//! ## Example
//!
//! ```no_run
//! use courier_telemetry::{init_logging, LogConfig};
//!
//! # fn main() -> courier_telemetry::TelemetryResult<()> {
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(client = "billing-api", "client ready");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/courier-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
