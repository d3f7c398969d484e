//! # Courier Core
//!
//! Core types and traits for the Courier outbound HTTP pipeline.
//!
//! This crate provides the foundational types used throughout Courier:
//!
//! - [`Request`] / [`Response`] - The HTTP message types flowing through a pipeline
//! - [`Body`] / [`HttpContent`] - Request bodies with their own content headers
//! - [`HttpSender`] - The "send a request, get a response" contract every
//!   terminal sender and composed pipeline implements
//! - [`RequestStateExt`] - Per-request typed state slot
//! - [`CourierError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/courier-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod error;
mod sender;
pub mod state;
mod types;

pub use body::{Body, BytesContent, HttpContent};
pub use error::{CourierError, CourierResult, ErrorCategory};
pub use sender::{BoxFuture, BoxedSender, FnSender, HttpSender};
pub use state::RequestStateExt;
pub use tokio_util::sync::CancellationToken;
pub use types::{Request, Response, ResponseExt};
