//! # Courier
//!
//! **Composable pipelines for outbound HTTP requests**
//!
//! Courier wraps whatever actually sends your requests (the *terminal
//! sender*) in an ordered list of stages. Each stage sees the request on
//! the way out and the response on the way back, and may rewrite either,
//! answer on its own, or call the rest of the chain more than once.
//!
//! ```text
//! send → Tracing → Transform → Compression → terminal sender
//!                                                  ↓
//! response ← Tracing ← Transform ← Compression ←───┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use courier::prelude::*;
//! use http::HeaderValue;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Default)]
//! struct Caller {
//!     token: Option<String>,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> CourierResult<()> {
//! let terminal = FnSender::new(|req: Request, _cancel| async move {
//!     let status = if req.headers().contains_key(http::header::AUTHORIZATION) {
//!         http::StatusCode::OK
//!     } else {
//!         http::StatusCode::UNAUTHORIZED
//!     };
//!     Ok(Response::with_status(status))
//! });
//!
//! let client = Client::new(
//!     terminal,
//!     [Arc::new(TransformHandler::before_send(|mut req: Request, _cancel| async move {
//!         if let Some(token) = req.state::<Caller>().token {
//!             let value = HeaderValue::from_str(&format!("Bearer {token}"))
//!                 .map_err(|e| CourierError::handler("auth", e.to_string()))?;
//!             req.headers_mut().insert(http::header::AUTHORIZATION, value);
//!         }
//!         Ok(req)
//!     })) as BoxedHandler],
//! );
//!
//! let mut request = Request::default();
//! request.set_state(Caller { token: Some("abc".into()) });
//!
//! let response = client.send(request).await?;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/courier/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assembly;
mod client;

pub use client::{Client, ClientBuilder};
pub use assembly::{init_logging, stages_from_config};

// Re-export core types
pub use courier_core as core;

// Re-export middleware types
pub use courier_middleware as middleware;

// Re-export configuration types
pub use courier_config as config;

// Re-export telemetry types
pub use courier_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Client, ClientBuilder};

    pub use courier_core::{
        Body, BoxFuture, BoxedSender, BytesContent, CancellationToken, CourierError,
        CourierResult, FnSender, HttpContent, HttpSender, Request, RequestStateExt, Response,
        ResponseExt,
    };

    pub use courier_middleware::stages::{CompressionLevel, CompressionStage, TracingStage};
    pub use courier_middleware::{
        compose, BoxedHandler, Handler, MiddlewareHandler, Next, Pipeline, PipelineBuilder,
        TransformHandler,
    };
}
