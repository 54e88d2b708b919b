//! Port interfaces for the HTTP transport
//!
//! The transport is the only boundary between request orchestration and the
//! network. Infrastructure provides the real implementation.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use digirest_domain::{FormValue, Pairs, Result, Verb};
use parking_lot::Mutex;

/// Request body after content-type encoding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncodedBody {
    #[default]
    Empty,
    /// JSON or form-urlencoded text
    Text(String),
    /// Multipart fields; `FormValue::File` entries are uploaded from disk
    Multipart(Vec<(String, FormValue)>),
}

impl EncodedBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Destination for response bytes in immediate-output mode
#[derive(Clone)]
pub struct OutputSink(Arc<Mutex<Box<dyn Write + Send>>>);

impl OutputSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    /// Sink writing to the process standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write one chunk as it arrives
    ///
    /// # Errors
    /// Propagates the writer's IO error
    pub fn write_chunk(&self, chunk: &[u8]) -> io::Result<()> {
        self.0.lock().write_all(chunk)
    }

    /// # Errors
    /// Propagates the writer's IO error
    pub fn flush(&self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutputSink")
    }
}

/// Fully assembled HTTP request handed to the transport
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub verb: Verb,
    pub headers: Pairs,
    pub body: EncodedBody,
    /// Bounds this transport call only
    pub timeout: Option<Duration>,
    /// When set, the response is streamed into the sink instead of buffered
    pub output: Option<OutputSink>,
}

impl TransportRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Diagnostic information about a transport call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportDiagnostics {
    pub elapsed: Duration,
    /// URL after redirects
    pub final_url: String,
    pub bytes_received: u64,
}

/// Raw outcome of a transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Buffered body bytes; empty in immediate-output mode
    pub body: Bytes,
    pub content_type: Option<String>,
    pub diagnostics: TransportDiagnostics,
}

/// Trait for issuing HTTP requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and capture status code and body.
    ///
    /// Non-2xx statuses are responses, not errors.
    ///
    /// # Errors
    /// Returns `Transport`/`Timeout` on network-level failure
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Receives the single-slot "last call" updates emitted while dispatching
pub trait CallObserver: Send + Sync {
    /// Called before each attempt with the final URI
    fn request_sent(&self, uri: &str, verb: Verb);

    /// Called after each attempt that produced a response
    fn response_received(&self, status: u16, diagnostics: &TransportDiagnostics);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {
    fn request_sent(&self, _uri: &str, _verb: Verb) {}

    fn response_received(&self, _status: u16, _diagnostics: &TransportDiagnostics) {}
}
