//! Ready-made pipeline stages.
//!
//! - [`compression`] - Compress request bodies with gzip or brotli
//! - [`tracing`] - Open a span per outbound request and record its outcome

#[cfg(feature = "compression")]
pub mod compression;
pub mod tracing;

// Re-export main types
#[cfg(feature = "compression")]
pub use compression::{Codec, CompressedContent, CompressionLevel, CompressionStage};
pub use self::tracing::TracingStage;
