//! The sender contract.
//!
//! [`HttpSender`] is the shape shared by every component that turns a
//! request into a response: the terminal sender performing real I/O, and the
//! composed pipeline wrapping it.

use crate::error::CourierResult;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shareable, type-erased sender.
pub type BoxedSender = Arc<dyn HttpSender>;

/// Sends a request and produces a response.
///
/// The cancellation token is threaded through unchanged; implementations
/// performing I/O should observe it and return
/// [`CourierError::Cancelled`](crate::CourierError::Cancelled) when it fires.
pub trait HttpSender: Send + Sync + 'static {
    /// Sends `request`, resolving to the response or a fault.
    fn send(&self, request: Request, cancel: CancellationToken)
        -> BoxFuture<'_, CourierResult<Response>>;
}

impl<S: HttpSender + ?Sized> HttpSender for Arc<S> {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, CourierResult<Response>> {
        (**self).send(request, cancel)
    }
}

/// A sender built from an async function.
///
/// Handy for adapting an existing transport, or for fabricating responses
/// in tests.
///
/// # Example
///
/// ```
/// use courier_core::{FnSender, HttpSender, Request, Response, CancellationToken};
/// use http::StatusCode;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> courier_core::CourierResult<()> {
/// let sender = FnSender::new(|_req: Request, _cancel| async {
///     let mut response = Response::default();
///     *response.status_mut() = StatusCode::NO_CONTENT;
///     Ok(response)
/// });
///
/// let response = sender.send(Request::default(), CancellationToken::new()).await?;
/// assert_eq!(response.status(), StatusCode::NO_CONTENT);
/// # Ok(())
/// # }
/// ```
pub struct FnSender<F> {
    func: F,
}

impl<F> FnSender<F> {
    /// Creates a new function-based sender.
    pub fn new<Fut>(func: F) -> Self
    where
        F: Fn(Request, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CourierResult<Response>> + Send + 'static,
    {
        Self { func }
    }
}

impl<F> std::fmt::Debug for FnSender<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSender").finish_non_exhaustive()
    }
}

impl<F, Fut> HttpSender for FnSender<F>
where
    F: Fn(Request, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CourierResult<Response>> + Send + 'static,
{
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, CourierResult<Response>> {
        Box::pin((self.func)(request, cancel))
    }
}
