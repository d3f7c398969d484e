//! The handler contract.
//!
//! Every pipeline stage implements [`Handler`]. A handler receives the
//! outgoing request, a [`Next`] handle on the rest of the chain, and the
//! caller's cancellation token.
//!
//! A handler may:
//!
//! - inspect or rewrite the request before calling `next`
//! - skip `next` entirely and return a response of its own (short-circuit)
//! - call `next` more than once (retry with a modified request, fan out)
//! - inspect or rewrite the response before returning it
//! - propagate or translate a fault returned by `next`
//!
//! No error handling is imposed: a fault from `next` travels up through every
//! stage unless one of them matches on it.
//!
//! # Example
//!
//! ```
//! use courier_core::{BoxFuture, CancellationToken, CourierResult, Request, Response};
//! use courier_middleware::{Handler, Next};
//!
//! struct RetryOnce;
//!
//! impl Handler for RetryOnce {
//!     fn name(&self) -> &'static str {
//!         "retry_once"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         request: Request,
//!         next: Next,
//!         cancel: CancellationToken,
//!     ) -> BoxFuture<'a, CourierResult<Response>> {
//!         Box::pin(async move {
//!             // Keep the parts needed to rebuild the request.
//!             let (method, uri) = (request.method().clone(), request.uri().clone());
//!             match next.run(request, cancel.clone()).await {
//!                 Ok(response) => Ok(response),
//!                 Err(_) => {
//!                     let mut retry = Request::default();
//!                     *retry.method_mut() = method;
//!                     *retry.uri_mut() = uri;
//!                     next.run(retry, cancel).await
//!                 }
//!             }
//!         })
//!     }
//! }
//! ```

use courier_core::{
    BoxFuture, BoxedSender, CancellationToken, CourierResult, HttpSender, Request, Response,
};
use std::sync::Arc;

/// A type-erased handler that can be stored in a stage list.
pub type BoxedHandler = Arc<dyn Handler>;

/// The core pipeline stage trait.
///
/// Handlers are shared across concurrent requests, so they must not keep
/// per-request mutable state. Anything a handler closes over that it mutates
/// must be synchronised by the handler itself.
pub trait Handler: Send + Sync + 'static {
    /// Returns the name of this stage.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    ///
    /// # Arguments
    ///
    /// * `request` - The outgoing request
    /// * `next` - Handle on the downstream stages and terminal sender
    /// * `cancel` - The caller's cancellation token, to be passed on unchanged
    fn handle<'a>(
        &'a self,
        request: Request,
        next: Next,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, CourierResult<Response>>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn handle<'a>(
        &'a self,
        request: Request,
        next: Next,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, CourierResult<Response>> {
        (**self).handle(request, next, cancel)
    }
}

/// Handle on everything downstream of a stage.
///
/// `Next` is cheap to clone and may be run any number of times. Running it
/// enters the next stage, or the terminal sender at the end of the chain.
#[derive(Clone)]
pub struct Next {
    inner: BoxedSender,
}

impl Next {
    /// Creates a `Next` that forwards to `inner`.
    pub fn new(inner: BoxedSender) -> Self {
        Self { inner }
    }

    /// Sends the request through the rest of the chain.
    pub async fn run(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> CourierResult<Response> {
        self.inner.send(request, cancel).await
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// A handler bound to the sender it delegates to.
///
/// This is one link of a composed pipeline. Links are created once when
/// the pipeline is assembled and never rebound.
pub(crate) struct Link {
    handler: BoxedHandler,
    inner: BoxedSender,
}

impl Link {
    pub(crate) fn new(handler: BoxedHandler, inner: BoxedSender) -> Self {
        Self { handler, inner }
    }
}

impl HttpSender for Link {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, CourierResult<Response>> {
        tracing::trace!(stage = self.handler.name(), "entering stage");
        self.handler
            .handle(request, Next::new(Arc::clone(&self.inner)), cancel)
    }
}
