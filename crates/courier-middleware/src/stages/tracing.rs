//! Tracing stage.
//!
//! Opens one `tracing` span per outbound request and records the outcome on
//! completion.
//!
//! ## Span Fields
//!
//! - `client` - Label given to the stage
//! - `http.method` - HTTP method
//! - `http.url` - Request URL
//! - `http.status_code` - Response status (added on completion)
//! - `duration_ms` - Time spent downstream of this stage (added on completion)

use crate::handler::{Handler, Next};
use courier_core::{BoxFuture, CancellationToken, CourierResult, Request, Response};
use std::time::Instant;
use tracing::{field, Instrument};

/// Stage wrapping everything downstream in a span.
///
/// Place it outermost to time the whole pipeline, or just before the
/// terminal sender to time only the transmission.
///
/// # Example
///
/// ```
/// use courier_middleware::stages::TracingStage;
///
/// let stage = TracingStage::new("billing-api");
/// assert_eq!(stage.label(), "billing-api");
/// ```
#[derive(Debug, Clone)]
pub struct TracingStage {
    label: String,
}

impl TracingStage {
    /// Creates a tracing stage.
    ///
    /// # Arguments
    ///
    /// * `label` - Name of the client or downstream service, recorded on every span
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns the label recorded on spans.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for TracingStage {
    fn default() -> Self {
        Self::new("courier")
    }
}

impl Handler for TracingStage {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn handle<'a>(
        &'a self,
        request: Request,
        next: Next,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, CourierResult<Response>> {
        let span = tracing::info_span!(
            "outbound_request",
            client = %self.label,
            http.method = %request.method(),
            http.url = %request.uri(),
            http.status_code = field::Empty,
            duration_ms = field::Empty,
        );

        Box::pin(
            async move {
                let start = Instant::now();
                let result = next.run(request, cancel).await;
                let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let current = tracing::Span::current();
                current.record("duration_ms", duration_ms);
                match &result {
                    Ok(response) => {
                        current.record("http.status_code", response.status().as_u16());
                        tracing::debug!(
                            status = response.status().as_u16(),
                            duration_ms,
                            "request completed"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            category = ?err.category(),
                            duration_ms,
                            "request failed"
                        );
                    }
                }
                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{BoxedSender, CourierError, FnSender, ResponseExt};
    use http::StatusCode;
    use std::sync::Arc;

    #[test]
    fn test_default_label() {
        assert_eq!(TracingStage::default().label(), "courier");
        assert_eq!(TracingStage::default().name(), "tracing");
    }

    #[tokio::test]
    async fn test_passes_response_through() {
        let terminal: BoxedSender = Arc::new(FnSender::new(|_req: Request, _cancel| async {
            Ok(Response::text(StatusCode::ACCEPTED, "queued"))
        }));

        let response = TracingStage::new("jobs")
            .handle(Request::default(), Next::new(terminal), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(&response.body()[..], b"queued");
    }

    #[tokio::test]
    async fn test_passes_fault_through() {
        let terminal: BoxedSender = Arc::new(FnSender::new(|_req: Request, _cancel| async {
            Err(CourierError::transport("connection reset"))
        }));

        let result = TracingStage::new("jobs")
            .handle(Request::default(), Next::new(terminal), CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CourierError::Transport { .. })));
    }
}
