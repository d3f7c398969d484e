//! Common HTTP message types used throughout the pipeline.

use crate::body::Body;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;

/// The outbound request type flowing through a pipeline.
///
/// This is a standard `http::Request` with a [`Body`]. Its extensions hold
/// the per-request state slot (see [`crate::state`]).
pub type Request = http::Request<Body>;

/// The response type produced by a terminal sender.
///
/// This is a standard `http::Response` with a fully buffered body.
pub type Response = http::Response<Bytes>;

/// Extension trait for fabricating responses.
///
/// Stages that short-circuit the pipeline (caches, stubs, test doubles)
/// use these instead of going through the terminal sender.
pub trait ResponseExt {
    /// Creates an empty response with the given status code.
    fn with_status(status: StatusCode) -> Response;

    /// Creates a plain-text response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;
}

impl ResponseExt for Response {
    fn with_status(status: StatusCode) -> Response {
        let mut response = http::Response::new(Bytes::new());
        *response.status_mut() = status;
        response
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        let mut response = http::Response::new(Bytes::from(body.into()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}
