//! # Courier Middleware
//!
//! Handler pipeline composition for the Courier outbound HTTP client.
//!
//! A pipeline is an ordered list of [`Handler`] stages wrapped around a
//! terminal [`HttpSender`](courier_core::HttpSender). Stages are given
//! outermost-first; each one receives the request, a [`Next`] handle on
//! everything downstream, and the caller's cancellation token.
//!
//! ```text
//! caller → A.pre → B.pre → C.pre → terminal
//!                                      ↓
//! caller ← A.post ← B.post ← C.post ←──┘
//! ```
//!
//! ## Stage Kinds
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`TransformHandler`] | Optional pre-send / post-receive callbacks around `next` |
//! | [`MiddlewareHandler`] | Full control: short-circuit, retry, fan out |
//! | [`stages::CompressionStage`] | Compresses request bodies (gzip, brotli) |
//! | [`stages::TracingStage`] | One tracing span per outbound request |
//!
//! ## Example
//!
//! ```
//! use courier_core::{CancellationToken, FnSender, HttpSender, Request, Response};
//! use courier_middleware::{PipelineBuilder, TransformHandler};
//! use http::HeaderValue;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> courier_core::CourierResult<()> {
//! let terminal = FnSender::new(|req: Request, _cancel| async move {
//!     assert_eq!(req.headers()["x-client"], "courier");
//!     Ok(Response::default())
//! });
//!
//! let pipeline = PipelineBuilder::new()
//!     .terminal(terminal)
//!     .stage(TransformHandler::before_send(|mut req: Request, _cancel| async move {
//!         req.headers_mut().insert("x-client", HeaderValue::from_static("courier"));
//!         Ok(req)
//!     }))
//!     .build()?;
//!
//! pipeline.send(Request::default(), CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/courier-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod transform;

// Re-export main types at crate root
pub use handler::{BoxedHandler, Handler, Next};
pub use middleware::{MiddlewareFn, MiddlewareHandler};
pub use pipeline::{compose, Pipeline, PipelineBuilder};
pub use transform::{TransformHandler, TransformHandlerBuilder};
