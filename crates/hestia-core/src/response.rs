//! Outbound HTTP response.

use crate::transport::Transport;
use bytes::Bytes;
use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;

/// An HTTP response: content, status code and headers.
///
/// Headers hold a single value per name; the last write wins and names
/// compare case-insensitively. `Set-Cookie` directives are kept apart
/// because one response may carry several.
///
/// # Example
///
/// ```
/// use hestia_core::Response;
/// use http::StatusCode;
///
/// let mut response = Response::new("created", StatusCode::CREATED);
/// response.add_header("Content-Type", "text/plain");
/// response.add_header("content-type", "text/html");
///
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.header("Content-Type"), Some("text/html"));
/// assert_eq!(response.headers().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    content: Bytes,
    status: StatusCode,
    headers: IndexMap<String, String>,
    set_cookies: Vec<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(Bytes::new(), StatusCode::OK)
    }
}

impl Response {
    /// Creates a response with the given content and status.
    pub fn new(content: impl Into<Bytes>, status: StatusCode) -> Self {
        Self {
            content: content.into(),
            status,
            headers: IndexMap::new(),
            set_cookies: Vec::new(),
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok(content: impl Into<Bytes>) -> Self {
        Self::new(content, StatusCode::OK)
    }

    /// Creates a JSON response with `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(value: &T, status: StatusCode) -> serde_json::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(body, status).with_header("Content-Type", "application/json"))
    }

    /// Returns the response with an added header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    /// Returns the response with a different status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Replaces the content.
    pub fn set_content(&mut self, content: impl Into<Bytes>) -> &mut Self {
        self.content = content.into();
        self
    }

    /// Appends bytes to the content.
    pub fn append_content(&mut self, more: impl AsRef<[u8]>) -> &mut Self {
        let mut buf = Vec::with_capacity(self.content.len() + more.as_ref().len());
        buf.extend_from_slice(&self.content);
        buf.extend_from_slice(more.as_ref());
        self.content = Bytes::from(buf);
        self
    }

    /// Returns the content.
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Returns the content as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets a header, replacing any value stored under the same name.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    /// Removes a header.
    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns every header in insertion order.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Queues a rendered `Set-Cookie` directive.
    pub fn append_set_cookie(&mut self, directive: impl Into<String>) -> &mut Self {
        self.set_cookies.push(directive.into());
        self
    }

    /// Returns the queued `Set-Cookie` directives.
    #[must_use]
    pub fn set_cookies(&self) -> &[String] {
        &self.set_cookies
    }

    /// Emits headers, cookie directives and the status.
    ///
    /// Does nothing when the transport reports the header block as already
    /// sent.
    pub fn send_headers(&self, transport: &mut dyn Transport) -> &Self {
        if transport.headers_sent() {
            tracing::debug!(status = %self.status, "headers already sent, skipping");
            return self;
        }

        for (name, value) in &self.headers {
            transport.send_header(name, value);
        }
        for directive in &self.set_cookies {
            transport.send_header("Set-Cookie", directive);
        }
        transport.send_status(self.status);
        self
    }

    /// Emits the body verbatim.
    pub fn send_content(&self, transport: &mut dyn Transport) -> &Self {
        transport.send_body(&self.content);
        self
    }

    /// Emits the full response: headers first, then the body.
    pub fn send(&self, transport: &mut dyn Transport) -> &Self {
        self.send_headers(transport).send_content(transport)
    }

    /// Converts into an [`http::Response`].
    pub fn into_http(self) -> Result<http::Response<Bytes>, http::Error> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for directive in &self.set_cookies {
            builder = builder.header(http::header::SET_COOKIE, directive.as_str());
        }
        builder.body(self.content)
    }
}
