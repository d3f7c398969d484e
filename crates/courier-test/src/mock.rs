//! Recording terminal sender.

use crate::log::CallLog;
use bytes::Bytes;
use courier_core::{
    BoxFuture, CancellationToken, CourierError, CourierResult, HttpSender, Request,
    RequestStateExt, Response,
};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// What a [`MockSender`] answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A response built fresh for every request.
    Respond {
        /// Status code
        status: StatusCode,
        /// Response headers
        headers: HeaderMap,
        /// Response body
        body: Bytes,
    },
    /// A transport fault with the given message.
    Fail(String),
}

impl MockReply {
    /// A response with the given status and no headers or body.
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        Self::Respond {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn to_result(&self) -> CourierResult<Response> {
        match self {
            Self::Respond {
                status,
                headers,
                body,
            } => {
                let mut response = http::Response::new(body.clone());
                *response.status_mut() = *status;
                *response.headers_mut() = headers.clone();
                Ok(response)
            }
            Self::Fail(message) => Err(CourierError::transport(message.clone())),
        }
    }
}

impl Default for MockReply {
    fn default() -> Self {
        Self::status(StatusCode::OK)
    }
}

/// A request as seen by the terminal sender.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Content headers, if the request had a body
    pub content_headers: Option<HeaderMap>,
    /// Serialized body bytes, if the request had a body
    pub body: Option<Bytes>,
    /// Whether a state value was attached to the request
    pub had_state: bool,
}

impl RecordedRequest {
    /// Gets a request header as a string.
    #[must_use]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Gets a content header as a string.
    #[must_use]
    pub fn content_header_str(&self, name: &str) -> Option<&str> {
        self.content_headers
            .as_ref()
            .and_then(|h| h.get(name))
            .and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
struct Inner {
    default_reply: Mutex<MockReply>,
    scripted: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    call_log: Mutex<Option<CallLog>>,
    delay: Mutex<Option<Duration>>,
}

/// Terminal sender for tests.
///
/// Every request is recorded (headers, content headers and serialized body)
/// before a reply is produced. Scripted replies are used first, in order;
/// afterwards the default reply answers every request.
///
/// Clones share recordings and replies, so a test can keep one handle while
/// the pipeline owns another.
#[derive(Clone, Default)]
pub struct MockSender {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MockSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSender")
            .field("request_count", &self.request_count())
            .finish_non_exhaustive()
    }
}

impl MockSender {
    /// Creates a sender answering `200 OK` with an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default status code.
    #[must_use]
    pub fn with_status(self, status: StatusCode) -> Self {
        self.update_default(|reply| {
            if let MockReply::Respond { status: current, .. } = reply {
                *current = status;
            } else {
                *reply = MockReply::status(status);
            }
        });
        self
    }

    /// Adds a header to the default reply.
    #[must_use]
    pub fn with_header(self, name: &'static str, value: &'static str) -> Self {
        self.update_default(|reply| {
            if let MockReply::Respond { headers, .. } = reply {
                headers.append(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                );
            }
        });
        self
    }

    /// Sets the default body.
    #[must_use]
    pub fn with_body(self, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        self.update_default(|reply| {
            if let MockReply::Respond { body, .. } = reply {
                *body = bytes;
            }
        });
        self
    }

    /// Makes every unscripted request fail with a transport fault.
    #[must_use]
    pub fn failing(self, message: impl Into<String>) -> Self {
        *self.inner.default_reply.lock() = MockReply::Fail(message.into());
        self
    }

    /// Queues a reply used before the default one.
    #[must_use]
    pub fn then(self, reply: MockReply) -> Self {
        self.inner.scripted.lock().push_back(reply);
        self
    }

    /// Records `terminal` into `log` for every request.
    #[must_use]
    pub fn with_call_log(self, log: &CallLog) -> Self {
        *self.inner.call_log.lock() = Some(log.clone());
        self
    }

    /// Waits `delay` before replying. Cancellation during the wait yields
    /// [`CourierError::Cancelled`].
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock() = Some(delay);
        self
    }

    /// Returns every recorded request in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.requests.lock().clone()
    }

    /// Returns the most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.inner.requests.lock().last().cloned()
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.inner.requests.lock().len()
    }

    fn update_default(&self, f: impl FnOnce(&mut MockReply)) {
        f(&mut self.inner.default_reply.lock());
    }

    fn next_reply(&self) -> MockReply {
        self.inner
            .scripted
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.inner.default_reply.lock().clone())
    }

    async fn record(&self, request: &Request) -> CourierResult<()> {
        let body = if request.body().is_empty() {
            None
        } else {
            Some(request.body().to_bytes().await?)
        };

        self.inner.requests.lock().push(RecordedRequest {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            content_headers: request.body().headers().cloned(),
            body,
            had_state: request.has_state(),
        });
        Ok(())
    }
}

impl HttpSender for MockSender {
    fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, CourierResult<Response>> {
        Box::pin(async move {
            let log = self.inner.call_log.lock().clone();
            if let Some(log) = log {
                log.push("terminal");
            }
            self.record(&request).await?;

            let delay = *self.inner.delay.lock();
            if let Some(delay) = delay {
                tokio::select! {
                    () = cancel.cancelled() => return Err(CourierError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(CourierError::Cancelled);
            }

            self.next_reply().to_result()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::Body;

    #[tokio::test]
    async fn test_default_reply() {
        let mock = MockSender::new()
            .with_status(StatusCode::ACCEPTED)
            .with_header("x-mock", "yes")
            .with_body("done");

        let response = mock
            .send(Request::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-mock"], "yes");
        assert_eq!(&response.body()[..], b"done");
    }

    #[tokio::test]
    async fn test_records_request() {
        let mock = MockSender::new();
        let mut request = http::Request::builder()
            .method(Method::PUT)
            .uri("https://api.example.com/items/7")
            .header("x-trace", "abc")
            .body(Body::from("payload"))
            .unwrap();
        request.set_state(42_u32);

        mock.send(request, CancellationToken::new()).await.unwrap();

        let recorded = mock.last_request().unwrap();
        assert_eq!(recorded.method, Method::PUT);
        assert_eq!(recorded.uri.path(), "/items/7");
        assert_eq!(recorded.header_str("x-trace"), Some("abc"));
        assert_eq!(recorded.body.as_deref(), Some(&b"payload"[..]));
        assert!(recorded.had_state);
    }

    #[tokio::test]
    async fn test_scripted_replies_come_first() {
        let mock = MockSender::new()
            .then(MockReply::Fail("refused".into()))
            .then(MockReply::status(StatusCode::SERVICE_UNAVAILABLE));

        let first = mock.send(Request::default(), CancellationToken::new()).await;
        let second = mock.send(Request::default(), CancellationToken::new()).await.unwrap();
        let third = mock.send(Request::default(), CancellationToken::new()).await.unwrap();

        assert!(matches!(first, Err(CourierError::Transport { .. })));
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(third.status(), StatusCode::OK);
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_default() {
        let mock = MockSender::new().failing("down");
        let result = mock.send(Request::default(), CancellationToken::new()).await;
        assert!(matches!(result, Err(CourierError::Transport { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_observes_cancellation() {
        let mock = MockSender::new().with_delay(Duration::from_secs(30));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let result = mock.send(Request::default(), token).await;
        assert!(matches!(result, Err(CourierError::Cancelled)));
    }
}
