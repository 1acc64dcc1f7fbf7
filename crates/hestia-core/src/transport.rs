//! The boundary between a [`Response`](crate::Response) and the host that
//! writes bytes to the client.
//!
//! Accepting sockets and serializing HTTP is the host's job. Hestia only
//! needs to know whether headers already left, and where to hand headers,
//! the status line and the body.

use http::StatusCode;

/// Sink for an outgoing response.
pub trait Transport {
    /// Returns `true` once the host has committed the header block.
    fn headers_sent(&self) -> bool;

    /// Emits one `name: value` header line.
    fn send_header(&mut self, name: &str, value: &str);

    /// Emits the status code.
    fn send_status(&mut self, status: StatusCode);

    /// Emits body bytes verbatim.
    fn send_body(&mut self, body: &[u8]);
}

/// An in-memory [`Transport`] that records everything it receives.
///
/// Headers count as sent as soon as the first body bytes are written,
/// mirroring a host that flushes the header block before any output.
///
/// # Example
///
/// ```
/// use hestia_core::{BufferedTransport, Response};
///
/// let mut transport = BufferedTransport::new();
/// Response::ok("hello").with_header("X-Trace", "1").send(&mut transport);
///
/// assert_eq!(transport.status().map(|s| s.as_u16()), Some(200));
/// assert_eq!(transport.header("x-trace"), Some("1"));
/// assert_eq!(transport.body(), b"hello");
/// ```
#[derive(Debug, Default, Clone)]
pub struct BufferedTransport {
    headers: Vec<(String, String)>,
    status: Option<StatusCode>,
    body: Vec<u8>,
    committed: bool,
}

impl BufferedTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport whose header block is already committed.
    #[must_use]
    pub fn committed() -> Self {
        Self {
            committed: true,
            ..Self::default()
        }
    }

    /// Returns the recorded header lines in emission order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the last recorded value of a header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every recorded value of a header, case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the recorded status.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the recorded body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Transport for BufferedTransport {
    fn headers_sent(&self) -> bool {
        self.committed
    }

    fn send_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn send_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn send_body(&mut self, body: &[u8]) {
        self.committed = true;
        self.body.extend_from_slice(body);
    }
}
