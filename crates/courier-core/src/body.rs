//! Request bodies.
//!
//! A [`Body`] is either empty or holds a boxed [`HttpContent`]. Content
//! carries its own header map (`Content-Type`, `Content-Encoding`, ...) so
//! that decorators such as a compressing wrapper can rewrite content headers
//! without touching the request's own headers.

use crate::sender::BoxFuture;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;
use std::fmt;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Serializable request content.
///
/// Implementations write their bytes to an async destination on demand, so
/// content may be produced lazily (for example by streaming it through a
/// compressor).
pub trait HttpContent: fmt::Debug + Send + Sync + 'static {
    /// Content headers describing this payload.
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the content headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// The exact length in bytes, or `None` when it cannot be known without
    /// producing the content.
    fn content_length(&self) -> Option<u64>;

    /// Writes the content to `dest`.
    ///
    /// Implementations must not shut down `dest`; the caller owns it.
    fn write_to<'a>(
        &'a self,
        dest: &'a mut (dyn AsyncWrite + Send + Unpin),
    ) -> BoxFuture<'a, io::Result<()>>;
}

/// In-memory content backed by [`Bytes`].
#[derive(Debug, Clone, Default)]
pub struct BytesContent {
    headers: HeaderMap,
    bytes: Bytes,
}

impl BytesContent {
    /// Creates content from raw bytes with no content headers.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            headers: HeaderMap::new(),
            bytes: bytes.into(),
        }
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.headers.insert(CONTENT_TYPE, content_type);
        self
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl HttpContent for BytesContent {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn content_length(&self) -> Option<u64> {
        u64::try_from(self.bytes.len()).ok()
    }

    fn write_to<'a>(
        &'a self,
        dest: &'a mut (dyn AsyncWrite + Send + Unpin),
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move { dest.write_all(&self.bytes).await })
    }
}

/// The body of an outbound [`Request`](crate::Request).
///
/// # Example
///
/// ```
/// use courier_core::Body;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> std::io::Result<()> {
/// let body = Body::from("hello");
/// assert!(!body.is_empty());
/// assert_eq!(body.content_length(), Some(5));
/// assert_eq!(&body.to_bytes().await?[..], b"hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Body {
    content: Option<Box<dyn HttpContent>>,
}

impl Body {
    /// Creates a body without content.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a body from any content implementation.
    pub fn new(content: impl HttpContent) -> Self {
        Self {
            content: Some(Box::new(content)),
        }
    }

    /// Creates a body from already boxed content.
    #[must_use]
    pub fn from_content(content: Box<dyn HttpContent>) -> Self {
        Self {
            content: Some(content),
        }
    }

    /// Returns true if the body carries no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    /// Returns the content, if any.
    #[must_use]
    pub fn content(&self) -> Option<&dyn HttpContent> {
        self.content.as_deref()
    }

    /// Returns mutable access to the content, if any.
    pub fn content_mut(&mut self) -> Option<&mut (dyn HttpContent + 'static)> {
        self.content.as_deref_mut()
    }

    /// Removes and returns the content, leaving the body empty.
    pub fn take(&mut self) -> Option<Box<dyn HttpContent>> {
        self.content.take()
    }

    /// Replaces the content, returning the previous one.
    pub fn replace(&mut self, content: Box<dyn HttpContent>) -> Option<Box<dyn HttpContent>> {
        self.content.replace(content)
    }

    /// Content headers, if the body has content.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.content().map(HttpContent::headers)
    }

    /// Known content length, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content().and_then(HttpContent::content_length)
    }

    /// Serializes the content into memory.
    ///
    /// An empty body yields empty bytes.
    pub async fn to_bytes(&self) -> io::Result<Bytes> {
        let mut buf: Vec<u8> = Vec::new();
        if let Some(content) = self.content() {
            content.write_to(&mut buf).await?;
        }
        Ok(Bytes::from(buf))
    }

    /// Returns the content headers merged with a `Content-Length` header when
    /// the length is known. Intended for terminal senders building the wire
    /// message.
    #[must_use]
    pub fn wire_headers(&self) -> HeaderMap {
        let mut headers = self.headers().cloned().unwrap_or_default();
        if let Some(len) = self.content_length() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
        headers
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::new(BytesContent::new(bytes))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(BytesContent::new(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::new(BytesContent::new(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::new(BytesContent::new(text))
    }
}

impl From<BytesContent> for Body {
    fn from(content: BytesContent) -> Self {
        Self::new(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body() {
        let body = Body::empty();
        assert!(body.is_empty());
        assert!(body.headers().is_none());
        assert_eq!(body.content_length(), None);
    }

    #[tokio::test]
    async fn test_empty_body_serializes_to_nothing() {
        let bytes = Body::empty().to_bytes().await.unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_content_type_header() {
        let content = BytesContent::new("{}")
            .with_content_type(HeaderValue::from_static("application/json"));
        let body = Body::from(content);
        assert_eq!(
            body.headers().unwrap().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_wire_headers_include_length() {
        let body = Body::from("abcd");
        let headers = body.wire_headers();
        assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "4");
    }

    #[test]
    fn test_take_and_replace() {
        let mut body = Body::from("first");
        let taken = body.take().unwrap();
        assert!(body.is_empty());

        assert!(body.replace(taken).is_none());
        assert_eq!(body.content_length(), Some(5));
    }

    #[tokio::test]
    async fn test_to_bytes_roundtrip() {
        let body = Body::from(vec![1u8, 2, 3]);
        assert_eq!(&body.to_bytes().await.unwrap()[..], &[1, 2, 3]);
    }
}
