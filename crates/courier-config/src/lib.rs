//! Typed configuration for Courier clients.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [client]
//! label = "billing-api"
//! tracing = true
//!
//! [compression]
//! enabled = true
//! codec = "gzip"      # or "br"
//! level = "default"   # "fast", "default", "best" or a number
//! min_size = 1024
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"     # or "pretty", "compact"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every value can be overridden with `PREFIX__SECTION__KEY`, for example
//! `COURIER__COMPRESSION__CODEC=br` or `COURIER__LOGGING__LEVEL=debug`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::CourierConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
