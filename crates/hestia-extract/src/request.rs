//! The inbound request and its builder.

use crate::cookie::{CookieJar, CookieOptions};
use crate::file::{FileBag, UploadPolicy, UploadedFile};
use crate::input::{InputBag, InputSource};
use crate::server::{env_key, ServerBag, ServerValue};
use crate::session::Session;
use hestia_core::{ParameterBag, Value};
use indexmap::IndexMap;
use std::net::IpAddr;

/// An inbound HTTP request.
///
/// Owns one of each typed view for its whole lifetime. The views can be
/// mutated through the `_mut` accessors but never replaced.
#[derive(Debug, Clone, Default)]
pub struct Request {
    query: InputBag,
    body: InputBag,
    cookies: CookieJar,
    files: FileBag,
    server: ServerBag,
    session: Session,
}

impl Request {
    /// Creates a request from the five host mappings.
    ///
    /// Construction never fails: values are stored as given and validated
    /// when read through the views.
    #[must_use]
    pub fn new(
        query: ParameterBag<Value>,
        body: ParameterBag<Value>,
        cookies: ParameterBag<String>,
        files: ParameterBag<UploadedFile>,
        server: ParameterBag<ServerValue>,
    ) -> Self {
        Self {
            query: InputBag::new(InputSource::Query, query),
            body: InputBag::new(InputSource::Body, body),
            cookies: CookieJar::new(cookies.into_inner()),
            files: FileBag::new(files.into_inner()),
            server: ServerBag::new(server.into_inner()),
            session: Session::not_started(),
        }
    }

    /// Starts building a request.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Returns the query parameters.
    #[must_use]
    pub fn query(&self) -> &InputBag {
        &self.query
    }

    /// Returns the query parameters mutably.
    pub fn query_mut(&mut self) -> &mut InputBag {
        &mut self.query
    }

    /// Returns the body parameters.
    #[must_use]
    pub fn body(&self) -> &InputBag {
        &self.body
    }

    /// Returns the body parameters mutably.
    pub fn body_mut(&mut self) -> &mut InputBag {
        &mut self.body
    }

    /// Returns the cookie jar.
    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Returns the cookie jar mutably.
    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// Returns the uploaded files.
    #[must_use]
    pub fn files(&self) -> &FileBag {
        &self.files
    }

    /// Returns the server/environment view.
    #[must_use]
    pub fn server(&self) -> &ServerBag {
        &self.server
    }

    /// Returns the server/environment view mutably.
    pub fn server_mut(&mut self) -> &mut ServerBag {
        &mut self.server
    }

    /// Returns the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Returns every query parameter.
    #[must_use]
    pub fn query_all(&self) -> &IndexMap<String, Value> {
        self.query.all()
    }

    /// Returns every body parameter.
    #[must_use]
    pub fn body_all(&self) -> &IndexMap<String, Value> {
        self.body.all()
    }

    /// Returns every visible cookie.
    #[must_use]
    pub fn cookies_all(&self) -> &IndexMap<String, String> {
        self.cookies.all()
    }

    /// Returns every upload descriptor.
    #[must_use]
    pub fn files_all(&self) -> &IndexMap<String, UploadedFile> {
        self.files.all()
    }

    /// Returns every server/environment value.
    #[must_use]
    pub fn server_all(&self) -> &IndexMap<String, ServerValue> {
        self.server.all()
    }

    /// Returns the request target, `/` when absent.
    #[must_use]
    pub fn request_uri(&self) -> &str {
        self.server.request_uri()
    }

    /// Returns the request method, `GET` when absent.
    #[must_use]
    pub fn method(&self) -> &str {
        self.server.request_method()
    }
}

/// Builder for [`Request`].
///
/// # Example
///
/// ```
/// use hestia_core::Value;
/// use hestia_extract::Request;
///
/// let request = Request::builder()
///     .method("POST")
///     .uri("/orders?draft=1")
///     .header("X-Forwarded-For", "198.51.100.4")
///     .remote_addr("10.0.0.2")
///     .trusted_proxies(vec!["10.0.0.2".parse().unwrap()])
///     .query_param("draft", Value::from("1"))
///     .body_param("sku", Value::from("A-1"))
///     .cookie("cart", "c-9")
///     .build();
///
/// assert_eq!(request.method(), "POST");
/// assert_eq!(request.request_uri(), "/orders?draft=1");
/// assert_eq!(request.server().client_ip(), Some("198.51.100.4"));
/// assert_eq!(request.cookies().get("cart"), Some("c-9"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    query: ParameterBag<Value>,
    body: ParameterBag<Value>,
    cookies: ParameterBag<String>,
    files: ParameterBag<UploadedFile>,
    server: ParameterBag<ServerValue>,
    upload_policy: UploadPolicy,
    trusted_proxies: Vec<IpAddr>,
    cookie_defaults: CookieOptions,
    session: Session,
}

impl RequestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.set(key, value);
        self
    }

    /// Adds a body parameter.
    #[must_use]
    pub fn body_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.set(key, value);
        self
    }

    /// Adds an incoming cookie (already decoded).
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.set(name, value);
        self
    }

    /// Adds an upload descriptor.
    #[must_use]
    pub fn file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.set(field, file);
        self
    }

    /// Adds a raw server/environment value.
    #[must_use]
    pub fn server_var(mut self, key: impl Into<String>, value: impl Into<ServerValue>) -> Self {
        self.server.set(key, value);
        self
    }

    /// Sets `REQUEST_METHOD`.
    #[must_use]
    pub fn method(self, method: impl Into<String>) -> Self {
        self.server_var("REQUEST_METHOD", method.into())
    }

    /// Sets `REQUEST_URI`.
    #[must_use]
    pub fn uri(self, uri: impl Into<String>) -> Self {
        self.server_var("REQUEST_URI", uri.into())
    }

    /// Sets `REMOTE_ADDR`.
    #[must_use]
    pub fn remote_addr(self, addr: impl Into<String>) -> Self {
        self.server_var("REMOTE_ADDR", addr.into())
    }

    /// Adds a request header under its `HTTP_*` key.
    #[must_use]
    pub fn header(self, name: &str, value: impl Into<String>) -> Self {
        self.server_var(env_key(name), value.into())
    }

    /// Sets the upload policy.
    #[must_use]
    pub fn upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    /// Sets the trusted proxies.
    #[must_use]
    pub fn trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies;
        self
    }

    /// Sets the cookie defaults.
    #[must_use]
    pub fn cookie_defaults(mut self, options: CookieOptions) -> Self {
        self.cookie_defaults = options;
        self
    }

    /// Attaches a session.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            query: InputBag::new(InputSource::Query, self.query),
            body: InputBag::new(InputSource::Body, self.body),
            cookies: CookieJar::new(self.cookies.into_inner()).with_defaults(self.cookie_defaults),
            files: FileBag::new(self.files.into_inner()).with_policy(self.upload_policy),
            server: ServerBag::new(self.server.into_inner()).with_trusted_proxies(self.trusted_proxies),
            session: self.session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::SameSite;

    #[test]
    fn test_new_stores_mappings_verbatim() {
        let mut query = ParameterBag::<Value>::new();
        query.set("nested", Value::Map(IndexMap::new()));
        let mut server = ParameterBag::<ServerValue>::new();
        server.set("REQUEST_URI", "/a/b");

        let request = Request::new(query, ParameterBag::new(), ParameterBag::new(), ParameterBag::new(), server);

        assert_eq!(request.query_all().len(), 1);
        assert!(request.query().get("nested").is_err());
        assert_eq!(request.request_uri(), "/a/b");
        assert_eq!(request.method(), "GET");
    }

    #[test]
    fn test_default_request() {
        let request = Request::default();
        assert_eq!(request.request_uri(), "/");
        assert!(request.body_all().is_empty());
        assert!(request.files_all().is_empty());
        assert!(request.server_all().is_empty());
        assert!(!request.session().is_active());
    }

    #[test]
    fn test_builder_applies_settings_to_views() {
        let request = Request::builder()
            .cookie_defaults(CookieOptions::default().same_site(SameSite::Lax))
            .upload_policy(UploadPolicy {
                allowed_extensions: vec!["csv".to_string()],
                max_file_size: 10,
            })
            .file("report", UploadedFile::new("q1.csv", 5, "/tmp/u1"))
            .header("User-Agent", "test/1")
            .build();

        assert_eq!(request.cookies().defaults().same_site, SameSite::Lax);
        assert!(request.files().is_valid("report"));
        assert_eq!(request.server().user_agent(), Some("test/1"));
    }

    #[test]
    fn test_views_are_mutable_in_place() {
        let mut request = Request::builder().session(Session::new([("uid", Value::from(1))])).build();

        request.query_mut().set("page", 2).unwrap();
        request.body_mut().set("name", "x").unwrap();
        request.cookies_mut().set("seen", true).unwrap();
        request.session_mut().set("uid", 2).unwrap();

        assert_eq!(request.query().get_int("page", 0).unwrap(), 2);
        assert_eq!(request.body_all().len(), 1);
        assert_eq!(request.cookies_all()["seen"], "true");
        assert_eq!(request.session().get("uid"), Some(&Value::from(2)));
    }
}
