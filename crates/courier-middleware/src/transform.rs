//! Transform stages.
//!
//! A [`TransformHandler`] runs an optional pre-send callback, then the rest
//! of the chain, then an optional post-receive callback. It never decides
//! whether to short-circuit; use a [`MiddlewareHandler`](crate::MiddlewareHandler)
//! for that.
//!
//! Callbacks take ownership of the request (or response) and hand it back,
//! which lets them rewrite anything without borrowing across an await point.
//!
//! ```text
//! before_send(request) → next(request) → on_response(response) → caller
//! ```
//!
//! If `next` fails, the post-receive callback is skipped and the fault is
//! returned as is.

use crate::handler::{Handler, Next};
use courier_core::{BoxFuture, CancellationToken, CourierError, CourierResult, Request, Response};
use std::future::Future;
use std::sync::Arc;

/// Pre-send callback.
pub type BeforeSendFn = Arc<
    dyn Fn(Request, CancellationToken) -> BoxFuture<'static, CourierResult<Request>>
        + Send
        + Sync,
>;

/// Post-receive callback.
pub type ResponseReceivedFn = Arc<
    dyn Fn(Response, CancellationToken) -> BoxFuture<'static, CourierResult<Response>>
        + Send
        + Sync,
>;

/// Stage running callbacks around the rest of the chain.
///
/// # Example
///
/// ```
/// use courier_core::{Request, Response};
/// use courier_middleware::TransformHandler;
/// use http::HeaderValue;
///
/// let stamp = TransformHandler::builder()
///     .name("stamp")
///     .before_send(|mut req: Request, _cancel| async move {
///         req.headers_mut().insert("x-sent-by", HeaderValue::from_static("courier"));
///         Ok(req)
///     })
///     .on_response(|res: Response, _cancel| async move {
///         tracing::debug!(status = %res.status(), "response received");
///         Ok(res)
///     })
///     .build()
///     .expect("at least one callback");
/// ```
#[derive(Clone)]
pub struct TransformHandler {
    name: &'static str,
    before_send: Option<BeforeSendFn>,
    on_response: Option<ResponseReceivedFn>,
}

impl TransformHandler {
    /// Default stage name.
    pub const DEFAULT_NAME: &'static str = "transform";

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> TransformHandlerBuilder {
        TransformHandlerBuilder::new()
    }

    /// Creates a stage with both callbacks.
    pub fn new<B, BFut, R, RFut>(before_send: B, on_response: R) -> Self
    where
        B: Fn(Request, CancellationToken) -> BFut + Send + Sync + 'static,
        BFut: Future<Output = CourierResult<Request>> + Send + 'static,
        R: Fn(Response, CancellationToken) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = CourierResult<Response>> + Send + 'static,
    {
        Self {
            name: Self::DEFAULT_NAME,
            before_send: Some(box_before_send(before_send)),
            on_response: Some(box_on_response(on_response)),
        }
    }

    /// Creates a stage that only rewrites outgoing requests.
    pub fn before_send<B, BFut>(before_send: B) -> Self
    where
        B: Fn(Request, CancellationToken) -> BFut + Send + Sync + 'static,
        BFut: Future<Output = CourierResult<Request>> + Send + 'static,
    {
        Self {
            name: Self::DEFAULT_NAME,
            before_send: Some(box_before_send(before_send)),
            on_response: None,
        }
    }

    /// Creates a stage that only inspects incoming responses.
    pub fn on_response<R, RFut>(on_response: R) -> Self
    where
        R: Fn(Response, CancellationToken) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = CourierResult<Response>> + Send + 'static,
    {
        Self {
            name: Self::DEFAULT_NAME,
            before_send: None,
            on_response: Some(box_on_response(on_response)),
        }
    }

    /// Creates a stage from optional, already boxed callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::InvalidArgument`] if both callbacks are absent.
    pub fn from_callbacks(
        before_send: Option<BeforeSendFn>,
        on_response: Option<ResponseReceivedFn>,
    ) -> CourierResult<Self> {
        if before_send.is_none() && on_response.is_none() {
            return Err(CourierError::invalid_argument(
                "callbacks",
                "a transform stage needs a before-send or an on-response callback",
            ));
        }
        Ok(Self {
            name: Self::DEFAULT_NAME,
            before_send,
            on_response,
        })
    }

    /// Renames the stage.
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Returns true if a pre-send callback is set.
    #[must_use]
    pub fn has_before_send(&self) -> bool {
        self.before_send.is_some()
    }

    /// Returns true if a post-receive callback is set.
    #[must_use]
    pub fn has_on_response(&self) -> bool {
        self.on_response.is_some()
    }
}

impl std::fmt::Debug for TransformHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformHandler")
            .field("name", &self.name)
            .field("before_send", &self.before_send.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

impl Handler for TransformHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        request: Request,
        next: Next,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, CourierResult<Response>> {
        Box::pin(async move {
            let request = match &self.before_send {
                Some(before_send) => match before_send(request, cancel.clone()).await {
                    Ok(request) => request,
                    Err(err) => {
                        tracing::warn!(
                            stage = self.name,
                            error = %err,
                            "before-send callback failed"
                        );
                        return Err(err);
                    }
                },
                None => request,
            };

            let response = next.run(request, cancel.clone()).await?;

            let Some(on_response) = &self.on_response else {
                return Ok(response);
            };
            let result = on_response(response, cancel).await;
            if let Err(err) = &result {
                tracing::warn!(stage = self.name, error = %err, "on-response callback failed");
            }
            result
        })
    }
}

/// Builder for [`TransformHandler`].
#[derive(Default)]
pub struct TransformHandlerBuilder {
    name: Option<&'static str>,
    before_send: Option<BeforeSendFn>,
    on_response: Option<ResponseReceivedFn>,
}

impl TransformHandlerBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stage name.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets the pre-send callback.
    #[must_use]
    pub fn before_send<B, BFut>(mut self, before_send: B) -> Self
    where
        B: Fn(Request, CancellationToken) -> BFut + Send + Sync + 'static,
        BFut: Future<Output = CourierResult<Request>> + Send + 'static,
    {
        self.before_send = Some(box_before_send(before_send));
        self
    }

    /// Sets the post-receive callback.
    #[must_use]
    pub fn on_response<R, RFut>(mut self, on_response: R) -> Self
    where
        R: Fn(Response, CancellationToken) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = CourierResult<Response>> + Send + 'static,
    {
        self.on_response = Some(box_on_response(on_response));
        self
    }

    /// Builds the stage.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::InvalidArgument`] if neither callback was set.
    pub fn build(self) -> CourierResult<TransformHandler> {
        let handler = TransformHandler::from_callbacks(self.before_send, self.on_response)?;
        Ok(match self.name {
            Some(name) => handler.with_name(name),
            None => handler,
        })
    }
}

fn box_before_send<B, BFut>(before_send: B) -> BeforeSendFn
where
    B: Fn(Request, CancellationToken) -> BFut + Send + Sync + 'static,
    BFut: Future<Output = CourierResult<Request>> + Send + 'static,
{
    Arc::new(
        move |request: Request,
              cancel: CancellationToken|
              -> BoxFuture<'static, CourierResult<Request>> {
            Box::pin(before_send(request, cancel))
        },
    )
}

fn box_on_response<R, RFut>(on_response: R) -> ResponseReceivedFn
where
    R: Fn(Response, CancellationToken) -> RFut + Send + Sync + 'static,
    RFut: Future<Output = CourierResult<Response>> + Send + 'static,
{
    Arc::new(
        move |response: Response,
              cancel: CancellationToken|
              -> BoxFuture<'static, CourierResult<Response>> {
            Box::pin(on_response(response, cancel))
        },
    )
}
