//! # Courier Test
//!
//! Test utilities for Courier pipelines. Nothing here touches the network:
//! a [`MockSender`] stands in for the terminal sender and records every
//! request that reaches it, and a [`CallLog`] captures the order in which
//! stages run.
//!
//! ## Example
//!
//! ```
//! use courier_core::{CancellationToken, HttpSender, Request};
//! use courier_middleware::PipelineBuilder;
//! use courier_test::{recording_stage, CallLog, MockSender};
//! use http::StatusCode;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> courier_core::CourierResult<()> {
//! let log = CallLog::new();
//! let mock = MockSender::new()
//!     .with_status(StatusCode::CREATED)
//!     .with_call_log(&log);
//!
//! let pipeline = PipelineBuilder::new()
//!     .terminal(mock.clone())
//!     .stage_boxed(recording_stage("outer", &log))
//!     .stage_boxed(recording_stage("inner", &log))
//!     .build()?;
//!
//! let response = pipeline.send(Request::default(), CancellationToken::new()).await?;
//!
//! assert_eq!(response.status(), StatusCode::CREATED);
//! assert_eq!(mock.request_count(), 1);
//! assert_eq!(
//!     log.entries(),
//!     ["outer.pre", "inner.pre", "terminal", "inner.post", "outer.post"]
//! );
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/courier-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod log;
mod mock;

pub use log::{recording_stage, CallLog};
pub use mock::{MockReply, MockSender, RecordedRequest};
