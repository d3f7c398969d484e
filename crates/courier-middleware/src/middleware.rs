//! Function-based middleware stages.
//!
//! [`MiddlewareHandler`] wraps a single async callback with the full
//! `(request, next, cancel) -> response` shape. No logic is added around
//! it: the callback alone decides whether to call `next`, how often, and
//! what to do with the result. It is the building block for stages that
//! short-circuit, retry or fan out.

use crate::handler::{Handler, Next};
use courier_core::{BoxFuture, CancellationToken, CourierError, CourierResult, Request, Response};
use std::future::Future;

/// A type-erased middleware callback.
pub type MiddlewareFn = Box<
    dyn Fn(Request, Next, CancellationToken) -> BoxFuture<'static, CourierResult<Response>>
        + Send
        + Sync,
>;

/// A stage created from an async function.
///
/// # Example
///
/// ```
/// use courier_core::{CancellationToken, Request, Response, ResponseExt};
/// use courier_middleware::{MiddlewareHandler, Next};
/// use http::{Method, StatusCode};
///
/// // Answers OPTIONS requests locally and forwards everything else.
/// let preflight =
///     MiddlewareHandler::new(|req: Request, next: Next, cancel| async move {
///         if req.method() == Method::OPTIONS {
///             return Ok(Response::with_status(StatusCode::NO_CONTENT));
///         }
///         next.run(req, cancel).await
///     })
///     .with_name("preflight");
/// ```
pub struct MiddlewareHandler<F> {
    name: &'static str,
    func: F,
}

impl<F> MiddlewareHandler<F> {
    /// Default stage name.
    pub const DEFAULT_NAME: &'static str = "middleware";

    /// Creates a new function-based stage.
    pub fn new<Fut>(func: F) -> Self
    where
        F: Fn(Request, Next, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CourierResult<Response>> + Send + 'static,
    {
        Self {
            name: Self::DEFAULT_NAME,
            func,
        }
    }

    /// Renames the stage.
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl MiddlewareHandler<MiddlewareFn> {
    /// Creates a stage from an optional, already boxed callback.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::InvalidArgument`] if `func` is `None`.
    pub fn from_delegate(func: Option<MiddlewareFn>) -> CourierResult<Self> {
        let func = func.ok_or_else(|| {
            CourierError::invalid_argument("handler", "a middleware callback is required")
        })?;
        Ok(Self {
            name: Self::DEFAULT_NAME,
            func,
        })
    }
}

impl<F> std::fmt::Debug for MiddlewareHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> Handler for MiddlewareHandler<F>
where
    F: Fn(Request, Next, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CourierResult<Response>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        request: Request,
        next: Next,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, CourierResult<Response>> {
        Box::pin((self.func)(request, next, cancel))
    }
}
