//! Request body compression.
//!
//! [`CompressedContent`] decorates existing content: it reuses the original
//! content headers, appends a `Content-Encoding` token and streams the
//! original bytes through a gzip or brotli encoder while writing. The
//! compressed length is unknown up front, so no `Content-Length` is carried.
//!
//! [`CompressionStage`] swaps the body of every outbound request it accepts
//! for such a wrapper. Requests without a body pass through untouched, and
//! responses are never altered.
//!
//! ## Example
//!
//! ```
//! use courier_middleware::stages::{CompressionLevel, CompressionStage};
//! use http::Method;
//!
//! // Compress only uploads, favouring ratio over speed.
//! let stage = CompressionStage::brotli()
//!     .with_level(CompressionLevel::Best)
//!     .with_predicate(|req| req.method() == Method::POST || req.method() == Method::PUT);
//! ```

use crate::handler::{Handler, Next};
use courier_core::{
    BoxFuture, Body, CancellationToken, CourierResult, HttpContent, Request, Response,
};
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;
use http::header::{HeaderValue, CONTENT_ENCODING, CONTENT_LENGTH};
use http::HeaderMap;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Brotli encoder buffer size.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Brotli window size (log2).
const BROTLI_LG_WINDOW: u32 = 22;

/// Compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Gzip compression (RFC 1952).
    Gzip,
    /// Brotli compression (RFC 7932).
    Brotli,
}

impl Codec {
    /// Returns the `Content-Encoding` token for this codec.
    #[must_use]
    pub fn encoding_name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Brotli => "br",
        }
    }

    /// Parses a codec from its encoding token.
    #[must_use]
    pub fn from_encoding(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gzip" => Some(Self::Gzip),
            "br" | "brotli" => Some(Self::Brotli),
            _ => None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encoding_name())
    }
}

/// Compression level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Fastest compression (lowest ratio).
    Fast,
    /// Default balance of speed and ratio.
    #[default]
    Default,
    /// Best compression ratio (slowest).
    Best,
    /// Custom level (0-9 for gzip, 0-11 for brotli).
    Custom(u32),
}

impl CompressionLevel {
    /// Convert to gzip compression level.
    fn to_gzip_level(self) -> GzCompression {
        match self {
            Self::Fast => GzCompression::fast(),
            Self::Default => GzCompression::default(),
            Self::Best => GzCompression::best(),
            Self::Custom(level) => GzCompression::new(level.min(9)),
        }
    }

    /// Convert to brotli compression level.
    fn to_brotli_level(self) -> u32 {
        match self {
            Self::Fast => 1,
            Self::Default => 6,
            Self::Best => 11,
            Self::Custom(level) => level.min(11),
        }
    }
}

/// In-memory sink shared between a synchronous encoder and the async writer
/// draining it.
#[derive(Clone, Default)]
struct Spool(Arc<Mutex<Vec<u8>>>);

impl Spool {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock())
    }
}

impl Write for Spool {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Encoder {
    Gzip(GzEncoder<Spool>),
    Brotli(Box<brotli::CompressorWriter<Spool>>),
}

impl Encoder {
    fn new(codec: Codec, level: CompressionLevel, spool: Spool) -> Self {
        match codec {
            Codec::Gzip => Self::Gzip(GzEncoder::new(spool, level.to_gzip_level())),
            Codec::Brotli => Self::Brotli(Box::new(brotli::CompressorWriter::new(
                spool,
                BROTLI_BUFFER_SIZE,
                level.to_brotli_level(),
                BROTLI_LG_WINDOW,
            ))),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Gzip(enc) => enc.write_all(buf),
            Self::Brotli(enc) => enc.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(enc) => enc.flush(),
            Self::Brotli(enc) => enc.flush(),
        }
    }

    /// Writes the stream trailer into the spool.
    fn finish(self) -> io::Result<()> {
        match self {
            Self::Gzip(enc) => enc.finish().map(drop),
            Self::Brotli(enc) => {
                drop(enc.into_inner());
                Ok(())
            }
        }
    }
}

/// Async writer compressing everything written to it into `dest`.
///
/// Shutting the writer down finishes the compressed stream and flushes
/// `dest`, but never shuts `dest` down. Dropping the writer early releases
/// the encoder without touching `dest`.
struct CompressingWriter<'a> {
    dest: &'a mut (dyn AsyncWrite + Send + Unpin + 'a),
    encoder: Option<Encoder>,
    spool: Spool,
    /// Compressed bytes not yet accepted by `dest`.
    pending: Vec<u8>,
    written: usize,
    encoder_flushed: bool,
}

impl<'a> CompressingWriter<'a> {
    fn new(
        dest: &'a mut (dyn AsyncWrite + Send + Unpin + 'a),
        codec: Codec,
        level: CompressionLevel,
    ) -> Self {
        let spool = Spool::default();
        Self {
            dest,
            encoder: Some(Encoder::new(codec, level, spool.clone())),
            spool,
            pending: Vec::new(),
            written: 0,
            encoder_flushed: true,
        }
    }

    fn encoder(&mut self) -> io::Result<&mut Encoder> {
        self.encoder
            .as_mut()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::BrokenPipe, "compressed stream already finished")
            })
    }

    /// Moves whatever the encoder produced into the pending buffer.
    fn collect(&mut self) {
        let produced = self.spool.take();
        if self.pending.is_empty() {
            self.pending = produced;
            self.written = 0;
        } else {
            self.pending.extend_from_slice(&produced);
        }
    }

    /// Writes the pending buffer to `dest`.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.written < self.pending.len() {
            let remaining = &self.pending[self.written..];
            let n = ready!(Pin::new(&mut *self.dest).poll_write(cx, remaining))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.written += n;
        }
        self.pending.clear();
        self.written = 0;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for CompressingWriter<'_> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;

        this.encoder()?.write_all(buf)?;
        this.encoder_flushed = false;
        this.collect();
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.encoder_flushed {
            if let Some(encoder) = this.encoder.as_mut() {
                encoder.flush()?;
            }
            this.encoder_flushed = true;
            this.collect();
        }
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut *this.dest).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(encoder) = this.encoder.take() {
            encoder.finish()?;
            this.encoder_flushed = true;
            this.collect();
        }
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut *this.dest).poll_flush(cx)
    }
}

/// Content that compresses another content while it is written.
///
/// # Headers
///
/// - Copies: every content header of the original
/// - Appends: the codec token to `Content-Encoding`
/// - Drops: `Content-Length` (the compressed length is unknown)
pub struct CompressedContent {
    inner: Box<dyn HttpContent>,
    headers: HeaderMap,
    codec: Codec,
    level: CompressionLevel,
}

impl CompressedContent {
    /// Wraps `inner`, compressing it with `codec` at the default level.
    pub fn new(inner: Box<dyn HttpContent>, codec: Codec) -> Self {
        Self::with_level(inner, codec, CompressionLevel::Default)
    }

    /// Wraps `inner`, compressing it with `codec` at `level`.
    pub fn with_level(inner: Box<dyn HttpContent>, codec: Codec, level: CompressionLevel) -> Self {
        let mut headers = inner.headers().clone();
        headers.remove(CONTENT_LENGTH);
        headers.append(
            CONTENT_ENCODING,
            HeaderValue::from_static(codec.encoding_name()),
        );
        Self {
            inner,
            headers,
            codec,
            level,
        }
    }

    /// Returns the codec.
    #[must_use]
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Returns the wrapped content.
    #[must_use]
    pub fn inner(&self) -> &dyn HttpContent {
        self.inner.as_ref()
    }
}

impl fmt::Debug for CompressedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedContent")
            .field("codec", &self.codec)
            .field("level", &self.level)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl HttpContent for CompressedContent {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn content_length(&self) -> Option<u64> {
        None
    }

    fn write_to<'a>(
        &'a self,
        dest: &'a mut (dyn AsyncWrite + Send + Unpin),
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let mut writer = CompressingWriter::new(dest, self.codec, self.level);
            self.inner.write_to(&mut writer).await?;
            writer.flush().await?;
            writer.shutdown().await
        })
    }
}

/// Decides per request whether its body is compressed.
pub type CompressionPredicate = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Stage compressing outbound request bodies.
///
/// Without a predicate every request carrying a body is compressed.
#[derive(Clone)]
pub struct CompressionStage {
    codec: Codec,
    level: CompressionLevel,
    /// Bodies with a known length below this are sent as is.
    min_size: u64,
    predicate: Option<CompressionPredicate>,
}

impl fmt::Debug for CompressionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionStage")
            .field("codec", &self.codec)
            .field("level", &self.level)
            .field("min_size", &self.min_size)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl CompressionStage {
    /// Creates a stage compressing with `codec`.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            level: CompressionLevel::Default,
            min_size: 0,
            predicate: None,
        }
    }

    /// Creates a gzip stage.
    #[must_use]
    pub fn gzip() -> Self {
        Self::new(Codec::Gzip)
    }

    /// Creates a brotli stage.
    #[must_use]
    pub fn brotli() -> Self {
        Self::new(Codec::Brotli)
    }

    /// Sets the compression level.
    #[must_use]
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the minimum known body length to compress.
    ///
    /// Bodies of unknown length are always compressed.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Restricts compression to requests matching `predicate`.
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Returns the codec.
    #[must_use]
    pub fn codec(&self) -> Codec {
        self.codec
    }

    fn should_compress(&self, request: &Request) -> bool {
        let body = request.body();
        if body.is_empty() {
            return false;
        }
        if body.content_length().is_some_and(|len| len < self.min_size) {
            return false;
        }
        self.predicate.as_ref().map_or(true, |p| p(request))
    }
}

impl Handler for CompressionStage {
    fn name(&self) -> &'static str {
        "compression"
    }

    fn handle<'a>(
        &'a self,
        mut request: Request,
        next: Next,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, CourierResult<Response>> {
        Box::pin(async move {
            if self.should_compress(&request) {
                if let Some(content) = request.body_mut().take() {
                    tracing::debug!(
                        codec = %self.codec,
                        original_length = ?content.content_length(),
                        "compressing request body"
                    );
                    let compressed = CompressedContent::with_level(content, self.codec, self.level);
                    *request.body_mut() = Body::new(compressed);
                }
            } else {
                tracing::debug!(codec = %self.codec, "request body left uncompressed");
            }

            next.run(request, cancel).await
        })
    }
}
