//! Error types for Courier.
//!
//! This module provides the [`CourierError`] type, the standard error type
//! used throughout the pipeline. Errors fall into two groups:
//!
//! | Group | Variants | Raised |
//! |---|---|---|
//! | Configuration | `InvalidArgument` | synchronously, at construction |
//! | Propagated faults | `Transport`, `Handler`, `Io`, `Cancelled` | while a request is in flight |
//!
//! The pipeline never retries or swallows a propagated fault. A stage that
//! wants graceful degradation must match on the error itself.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using [`CourierError`].
pub type CourierResult<T> = Result<T, CourierError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid pipeline or handler configuration.
    Configuration,
    /// The terminal sender failed to transmit or receive.
    Transport,
    /// A pipeline stage raised a fault of its own.
    Handler,
    /// Reading or writing request content failed.
    Io,
    /// The caller cancelled the request.
    Cancelled,
}

impl ErrorCategory {
    /// Returns the category name as used in structured logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::Handler => "handler",
            Self::Io => "io",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Standard error type for Courier.
///
/// # Example
///
/// ```
/// use courier_core::{CourierError, ErrorCategory};
///
/// let err = CourierError::invalid_argument("terminal", "a terminal sender is required");
/// assert_eq!(err.category(), ErrorCategory::Configuration);
/// assert!(err.is_configuration());
/// ```
#[derive(Error, Debug)]
pub enum CourierError {
    /// A required argument was absent or invalid at construction time.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// Why the argument was rejected.
        reason: String,
    },

    /// The terminal sender failed.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A pipeline stage failed.
    #[error("handler `{stage}` failed: {message}")]
    Handler {
        /// Name of the stage that raised the fault.
        stage: String,
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Reading or writing request content failed.
    #[error("content I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was cancelled before a response was produced.
    #[error("request cancelled")]
    Cancelled,
}

impl CourierError {
    /// Creates a configuration error for an absent or invalid argument.
    #[must_use]
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error with a source error.
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a handler error attributed to a stage.
    #[must_use]
    pub fn handler(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            stage: stage.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error with a source error.
    pub fn handler_with_source(
        stage: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            stage: stage.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::Configuration,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Handler { .. } => ErrorCategory::Handler,
            Self::Io(_) => ErrorCategory::Io,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Returns true for errors raised while assembling a pipeline.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
