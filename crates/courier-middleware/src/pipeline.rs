//! Pipeline assembly.
//!
//! A pipeline is assembled once, from a terminal sender and an ordered list
//! of stages, into a single composed sender. Stages are listed
//! outermost-first: the first stage sees the request first and the response
//! last.
//!
//! Assembly walks the stage list backwards. Starting with the terminal as
//! the current "next", each stage is bound to the current "next" and then
//! becomes it. The outermost stage is what callers invoke. Absent (`None`)
//! entries are skipped. With no stages at all the terminal sender itself is
//! returned.
//!
//! The links never change after assembly, so a composed sender can be shared
//! across any number of concurrent requests.

use crate::handler::{BoxedHandler, Handler, Link};
use courier_core::{
    BoxFuture, BoxedSender, CancellationToken, CourierError, CourierResult, HttpSender, Request,
    Response,
};
use std::sync::Arc;

/// Composes a terminal sender and an ordered list of stages.
///
/// Entries may be given as `BoxedHandler` or `Option<BoxedHandler>`; `None`
/// entries are skipped. Returns the terminal sender itself when no stage is
/// present.
///
/// # Example
///
/// ```
/// use courier_core::{BoxedSender, FnSender, Response, Request};
/// use courier_middleware::{compose, BoxedHandler};
/// use std::sync::Arc;
///
/// let terminal: BoxedSender = Arc::new(FnSender::new(|_req: Request, _cancel| async {
///     Ok(Response::default())
/// }));
///
/// let composed = compose(Arc::clone(&terminal), Vec::<Option<BoxedHandler>>::new());
/// assert!(Arc::ptr_eq(&composed, &terminal));
/// ```
pub fn compose<I>(terminal: BoxedSender, stages: I) -> BoxedSender
where
    I: IntoIterator,
    I::Item: Into<Option<BoxedHandler>>,
{
    let stages: Vec<BoxedHandler> = stages.into_iter().filter_map(Into::into).collect();
    if stages.is_empty() {
        tracing::debug!("composed pipeline without stages; using terminal sender directly");
        return terminal;
    }

    tracing::debug!(
        stage_count = stages.len(),
        stages = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
        "composing pipeline"
    );

    // Wire from the terminal end back to the outermost stage.
    let mut next = terminal;
    for handler in stages.into_iter().rev() {
        next = Arc::new(Link::new(handler, next));
    }
    next
}

/// An assembled pipeline.
///
/// `Pipeline` is itself an [`HttpSender`]: sending through it enters the
/// outermost stage.
#[derive(Clone)]
pub struct Pipeline {
    /// Outermost stage, or the terminal sender when there are no stages.
    entry: BoxedSender,

    /// Stage names, outermost-first.
    stage_names: Vec<&'static str>,
}

impl Pipeline {
    /// Assembles a pipeline from a terminal sender and stages given
    /// outermost-first. `None` entries are skipped.
    pub fn new<I>(terminal: BoxedSender, stages: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<BoxedHandler>>,
    {
        let stages: Vec<BoxedHandler> = stages.into_iter().filter_map(Into::into).collect();
        let stage_names = stages.iter().map(|s| s.name()).collect();
        Self {
            entry: compose(terminal, stages),
            stage_names,
        }
    }

    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Returns the names of all stages in order, outermost-first.
    #[must_use]
    pub fn stage_names(&self) -> &[&'static str] {
        &self.stage_names
    }

    /// Returns the number of stages (excluding the terminal sender).
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stage_names.len()
    }

    /// Returns the composed sender.
    #[must_use]
    pub fn sender(&self) -> &BoxedSender {
        &self.entry
    }

    /// Consumes the pipeline, returning the composed sender.
    #[must_use]
    pub fn into_sender(self) -> BoxedSender {
        self.entry
    }
}

impl HttpSender for Pipeline {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, CourierResult<Response>> {
        self.entry.send(request, cancel)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stage_names", &self.stage_names)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Pipeline`].
///
/// A terminal sender is required; building without one is a configuration
/// error.
#[derive(Default)]
pub struct PipelineBuilder {
    /// The innermost sender performing transmission.
    terminal: Option<BoxedSender>,

    /// Stages, outermost-first.
    stages: Vec<BoxedHandler>,
}

impl PipelineBuilder {
    /// Creates an empty pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the terminal sender.
    #[must_use]
    pub fn terminal<S: HttpSender>(mut self, sender: S) -> Self {
        self.terminal = Some(Arc::new(sender));
        self
    }

    /// Sets an already shared terminal sender.
    #[must_use]
    pub fn terminal_boxed(mut self, sender: BoxedSender) -> Self {
        self.terminal = Some(sender);
        self
    }

    /// Appends a stage. Stages added first run first on the way out.
    #[must_use]
    pub fn stage<H: Handler>(mut self, handler: H) -> Self {
        self.stages.push(Arc::new(handler));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn stage_boxed(mut self, handler: BoxedHandler) -> Self {
        self.stages.push(handler);
        self
    }

    /// Appends every present stage from `stages`, skipping `None` entries.
    #[must_use]
    pub fn stages<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<BoxedHandler>>,
    {
        self.stages
            .extend(stages.into_iter().filter_map(Into::into));
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::InvalidArgument`] if no terminal sender was set.
    pub fn build(self) -> CourierResult<Pipeline> {
        let terminal = self.terminal.ok_or_else(|| {
            CourierError::invalid_argument("terminal", "a terminal sender is required")
        })?;

        Ok(Pipeline::new(terminal, self.stages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Next;
    use courier_core::{FnSender, ResponseExt};
    use http::StatusCode;
    use parking_lot::Mutex;

    /// A test handler that records when it runs, before and after `next`.
    struct OrderTrackingHandler {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    impl Handler for OrderTrackingHandler {
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
                self.order.lock().push(format!("{}.pre", self.name));
                let response = next.run(request, cancel).await;
                self.order.lock().push(format!("{}.post", self.name));
                response
            })
        }
    }

    fn tracked(name: &'static str, order: &Arc<Mutex<Vec<String>>>) -> BoxedHandler {
        Arc::new(OrderTrackingHandler {
            name,
            order: Arc::clone(order),
        })
    }

    fn terminal(order: &Arc<Mutex<Vec<String>>>) -> BoxedSender {
        let order = Arc::clone(order);
        Arc::new(FnSender::new(move |_req: Request, _cancel| {
            let order = Arc::clone(&order);
            async move {
                order.lock().push("terminal".to_string());
                Ok(Response::with_status(StatusCode::OK))
            }
        }))
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_onion_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::builder()
            .terminal_boxed(terminal(&order))
            .stage_boxed(tracked("a", &order))
            .stage_boxed(tracked("b", &order))
            .stage_boxed(tracked("c", &order))
            .build()
            .unwrap();

        let response = pipeline
            .send(Request::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *order.lock(),
            vec!["a.pre", "b.pre", "c.pre", "terminal", "c.post", "b.post", "a.post"]
        );
    }

    #[tokio::test]
    async fn test_compose_skips_absent_stages() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let composed = compose(
            terminal(&order),
            vec![None, Some(tracked("a", &order)), None, Some(tracked("b", &order)), None],
        );
        composed
            .send(Request::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*order.lock(), vec!["a.pre", "b.pre", "terminal", "b.post", "a.post"]);
    }

    #[test]
    fn test_compose_without_stages_returns_terminal() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let terminal = terminal(&order);

        let composed = compose(Arc::clone(&terminal), Vec::<BoxedHandler>::new());
        assert!(Arc::ptr_eq(&composed, &terminal));

        let only_absent = compose(Arc::clone(&terminal), vec![None::<BoxedHandler>, None]);
        assert!(Arc::ptr_eq(&only_absent, &terminal));
    }

    #[test]
    fn test_build_without_terminal_fails() {
        let result = Pipeline::builder().build();
        match result {
            Err(err) => assert!(err.is_configuration()),
            Ok(_) => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_stage_names() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .terminal_boxed(terminal(&order))
            .stages(vec![Some(tracked("first", &order)), None, Some(tracked("second", &order))])
            .build()
            .unwrap();

        assert_eq!(pipeline.stage_names(), &["first", "second"]);
        assert_eq!(pipeline.stage_count(), 2);
    }

    #[test]
    fn test_empty_pipeline_has_no_stages() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let terminal = terminal(&order);
        let pipeline = Pipeline::builder()
            .terminal_boxed(Arc::clone(&terminal))
            .build()
            .unwrap();

        assert_eq!(pipeline.stage_count(), 0);
        assert!(Arc::ptr_eq(pipeline.sender(), &terminal));
    }

    #[tokio::test]
    async fn test_composed_sender_is_reusable_concurrently() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let composed = compose(terminal(&order), vec![tracked("a", &order)]);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let composed = Arc::clone(&composed);
            tasks.push(tokio::spawn(async move {
                composed.send(Request::default(), CancellationToken::new()).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        assert_eq!(order.lock().iter().filter(|e| *e == "terminal").count(), 8);
    }
}
