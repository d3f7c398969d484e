//! The client facade.

use crate::assembly::stages_from_config;
use courier_config::CourierConfig;
use courier_core::{
    BoxFuture, BoxedSender, CancellationToken, CourierError, CourierResult, HttpSender, Request,
    Response,
};
use courier_middleware::{BoxedHandler, Handler, Pipeline, PipelineBuilder};
use std::sync::Arc;

/// A composed pipeline ready to send requests.
///
/// `Client` is cheap to clone; clones share the same composed sender.
///
/// # Example
///
/// ```
/// use courier::prelude::*;
/// use http::HeaderValue;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> CourierResult<()> {
/// let terminal = FnSender::new(|req: Request, _cancel| async move {
///     let agent = req.headers()["user-agent"].to_str().unwrap_or_default().to_string();
///     Ok(Response::text(http::StatusCode::OK, agent))
/// });
///
/// let client = Client::builder()
///     .terminal(terminal)
///     .stage(TransformHandler::before_send(|mut req: Request, _cancel| async move {
///         req.headers_mut().insert("user-agent", HeaderValue::from_static("courier/0.1"));
///         Ok(req)
///     }))
///     .build()?;
///
/// let response = client.send(Request::default()).await?;
/// assert_eq!(&response.body()[..], b"courier/0.1");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    pipeline: Pipeline,
}

impl Client {
    /// Composes `stages` (outermost-first, `None` entries skipped) around
    /// `terminal`.
    pub fn new<S, I>(terminal: S, stages: I) -> Self
    where
        S: HttpSender,
        I: IntoIterator,
        I::Item: Into<Option<BoxedHandler>>,
    {
        Self::from_pipeline(Pipeline::new(Arc::new(terminal), stages))
    }

    /// Creates a client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Creates a client whose stages come from `config`.
    pub fn from_config<S: HttpSender>(terminal: S, config: &CourierConfig) -> Self {
        Self::new(terminal, stages_from_config(config))
    }

    /// Wraps an already assembled pipeline.
    #[must_use]
    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Sends a request with no way to cancel it.
    ///
    /// This inherent method takes precedence over [`HttpSender::send`] in
    /// method-call syntax, even with the prelude imported. Call
    /// `HttpSender::send(&client, request, token)` or
    /// [`send_with_cancel`](Self::send_with_cancel) to pass a token.
    ///
    /// # Errors
    ///
    /// Returns whatever fault a stage or the terminal sender produced.
    pub async fn send(&self, request: Request) -> CourierResult<Response> {
        self.send_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Sends a request, giving up as soon as `cancel` fires.
    ///
    /// The token is also passed down the pipeline so stages and the
    /// terminal sender can observe it.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Cancelled`] if `cancel` fires first, otherwise
    /// whatever fault a stage or the terminal sender produced.
    pub async fn send_with_cancel(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> CourierResult<Response> {
        if cancel.is_cancelled() {
            return Err(CourierError::Cancelled);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("request cancelled by caller");
                Err(CourierError::Cancelled)
            }
            result = self.pipeline.send(request, cancel.clone()) => result,
        }
    }

    /// Returns the composed sender.
    #[must_use]
    pub fn sender(&self) -> &BoxedSender {
        self.pipeline.sender()
    }

    /// Returns the stage names, outermost-first.
    #[must_use]
    pub fn stage_names(&self) -> &[&'static str] {
        self.pipeline.stage_names()
    }
}

/// Lets a client act as the terminal sender of another pipeline.
impl HttpSender for Client {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, CourierResult<Response>> {
        self.pipeline.send(request, cancel)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("stages", &self.pipeline.stage_names())
            .finish()
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    pipeline: PipelineBuilder,
}

impl ClientBuilder {
    /// Sets the terminal sender.
    #[must_use]
    pub fn terminal<S: HttpSender>(mut self, sender: S) -> Self {
        self.pipeline = self.pipeline.terminal(sender);
        self
    }

    /// Sets an already shared terminal sender.
    #[must_use]
    pub fn terminal_boxed(mut self, sender: BoxedSender) -> Self {
        self.pipeline = self.pipeline.terminal_boxed(sender);
        self
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage<H: Handler>(mut self, handler: H) -> Self {
        self.pipeline = self.pipeline.stage(handler);
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn stage_boxed(mut self, handler: BoxedHandler) -> Self {
        self.pipeline = self.pipeline.stage_boxed(handler);
        self
    }

    /// Appends every present stage, skipping `None` entries.
    #[must_use]
    pub fn stages<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<BoxedHandler>>,
    {
        self.pipeline = self.pipeline.stages(stages);
        self
    }

    /// Appends the stages described by `config`.
    #[must_use]
    pub fn config(self, config: &CourierConfig) -> Self {
        self.stages(stages_from_config(config))
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::InvalidArgument`] if no terminal sender was set.
    pub fn build(self) -> CourierResult<Client> {
        self.pipeline.build().map(Client::from_pipeline)
    }
}
