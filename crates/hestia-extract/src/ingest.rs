//! Building a [`Request`] from an [`http::Request`].
//!
//! Hosts that already speak the `http` crate can skip assembling the CGI
//! style mappings by hand. Ingestion is lenient: a query string, cookie
//! header or body that does not parse is logged and left out, never
//! turned into an error.
//!
//! Multipart bodies are not decoded here. Upload descriptors come from the
//! host's upload mechanism through [`RequestBuilder::file`].

use crate::cookie::CookieJar;
use crate::request::{Request, RequestBuilder};
use crate::server::{env_key, ServerValue};
use bytes::Bytes;
use hestia_core::Value;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE};
use indexmap::IndexMap;
use std::net::SocketAddr;

/// Suffix marking a form key that collects repeated values into a list.
const LIST_SUFFIX: &str = "[]";

impl Request {
    /// Builds a request from an [`http::Request`] with default settings.
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::Bytes;
    /// use hestia_extract::Request;
    ///
    /// let http = http::Request::post("https://example.com/search?q=rust&lang=en")
    ///     .header("content-type", "application/x-www-form-urlencoded")
    ///     .header("cookie", "sid=abc")
    ///     .body(Bytes::from("page=2"))
    ///     .unwrap();
    ///
    /// let request = Request::from_http(&http, Some("192.0.2.1:5000".parse().unwrap()));
    ///
    /// assert_eq!(request.method(), "POST");
    /// assert_eq!(request.request_uri(), "/search?q=rust&lang=en");
    /// assert_eq!(request.query().get_string("q", "").unwrap(), "rust");
    /// assert_eq!(request.body().get_int("page", 1).unwrap(), 2);
    /// assert_eq!(request.cookies().get("sid"), Some("abc"));
    /// assert_eq!(request.server().client_ip(), Some("192.0.2.1"));
    /// ```
    #[must_use]
    pub fn from_http(request: &http::Request<Bytes>, remote_addr: Option<SocketAddr>) -> Self {
        RequestBuilder::from_http(request, remote_addr).build()
    }
}

impl RequestBuilder {
    /// Starts a builder from an [`http::Request`], so policies and proxies
    /// can still be configured before [`build`](Self::build).
    #[must_use]
    pub fn from_http(request: &http::Request<Bytes>, remote_addr: Option<SocketAddr>) -> Self {
        let uri = request.uri();
        let target = uri.path_and_query().map_or("/", |pq| pq.as_str());

        let mut builder = Self::new()
            .method(request.method().as_str())
            .uri(target)
            .server_var("SERVER_PROTOCOL", format!("{:?}", request.version()))
            .server_var("QUERY_STRING", uri.query().unwrap_or_default());

        if let Some(addr) = remote_addr {
            builder = builder
                .remote_addr(addr.ip().to_string())
                .server_var("REMOTE_PORT", addr.port().to_string());
        }
        if uri.scheme() == Some(&http::uri::Scheme::HTTPS) {
            builder = builder.server_var("HTTPS", "on");
        }

        builder = builder.ingest_headers(request.headers());

        if let Some(query) = uri.query() {
            for (key, value) in parse_form(query) {
                builder = builder.query_param(key, value);
            }
        }

        let cookie_header = request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        for (name, value) in CookieJar::parse_header(&cookie_header).all() {
            builder = builder.cookie(name.clone(), value.clone());
        }

        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        for (key, value) in parse_body(content_type, request.body()) {
            builder = builder.body_param(key, value);
        }

        builder
    }

    fn ingest_headers(mut self, headers: &http::HeaderMap) -> Self {
        for name in headers.keys() {
            let values: Vec<String> = headers
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(ToString::to_string)
                .collect();

            let value = match values.len() {
                0 => continue,
                1 => ServerValue::Str(values.into_iter().next().unwrap_or_default()),
                _ => ServerValue::List(values),
            };

            if *name == CONTENT_TYPE || *name == CONTENT_LENGTH {
                let cgi_key = name.as_str().to_ascii_uppercase().replace('-', "_");
                self = self.server_var(cgi_key, value.clone());
            }
            self = self.server_var(env_key(name.as_str()), value);
        }
        self
    }
}

/// Parses `application/x-www-form-urlencoded` pairs.
///
/// Plain repeated keys keep the last value. Keys ending in `[]` collect
/// every value into a list stored under the bare key.
fn parse_form(input: &str) -> IndexMap<String, Value> {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(input) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed urlencoded input");
            return IndexMap::new();
        }
    };

    let mut params = IndexMap::new();
    for (key, value) in pairs {
        if let Some(base) = key.strip_suffix(LIST_SUFFIX) {
            let entry = params
                .entry(base.to_string())
                .or_insert_with(|| Value::List(Vec::new()));
            match entry {
                Value::List(items) => items.push(Value::from(value)),
                other => *other = Value::List(vec![Value::from(value)]),
            }
        } else {
            params.insert(key, Value::from(value));
        }
    }
    params
}

fn parse_body(content_type: &str, body: &Bytes) -> IndexMap<String, Value> {
    if body.is_empty() {
        return IndexMap::new();
    }

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/x-www-form-urlencoded" => match std::str::from_utf8(body) {
            Ok(text) => parse_form(text),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring non UTF-8 form body");
                IndexMap::new()
            }
        },
        "application/json" => match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(fields)) => {
                fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
            }
            Ok(_) => {
                tracing::debug!("ignoring JSON body that is not an object");
                IndexMap::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed JSON body");
                IndexMap::new()
            }
        },
        _ => IndexMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hestia_core::{InputValue, Scalar};

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::get(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_parse_form_lists_and_last_wins() {
        let params = parse_form("a=1&a=2&ids[]=3&ids[]=4&name=J%C3%B6rg+B");
        assert_eq!(params["a"], Value::from("2"));
        assert_eq!(params["ids"], Value::from(vec!["3", "4"]));
        assert_eq!(params["name"], Value::from("Jörg B"));
    }

    #[test]
    fn test_server_variables() {
        let request = Request::from_http(
            &http::Request::put("/items/7?x=1")
                .header("Host", "api.example.com")
                .header("Accept", "text/html")
                .header("Accept", "application/json")
                .body(Bytes::new())
                .unwrap(),
            Some("[2001:db8::2]:443".parse().unwrap()),
        );

        let server = request.server();
        assert_eq!(server.request_method(), "PUT");
        assert_eq!(server.request_uri(), "/items/7?x=1");
        assert_eq!(server.get_str("QUERY_STRING"), Some("x=1"));
        assert_eq!(server.get_str("SERVER_PROTOCOL"), Some("HTTP/1.1"));
        assert_eq!(server.remote_addr(), Some("2001:db8::2"));
        assert_eq!(server.get_str("REMOTE_PORT"), Some("443"));
        assert_eq!(server.host(), Some("api.example.com"));
        assert_eq!(server.header("accept").as_deref(), Some("text/html, application/json"));
    }

    #[test]
    fn test_https_scheme() {
        let request = Request::from_http(&get("https://example.com/"), None);
        assert_eq!(request.server().protocol(), http::uri::Scheme::HTTPS);
        assert_eq!(request.server().client_ip(), None);
    }

    #[test]
    fn test_json_body() {
        let http = http::Request::post("/users")
            .header("Content-Type", "application/json; charset=utf-8")
            .body(Bytes::from(r#"{"name":"ada","age":36,"tags":["x"],"profile":{"a":1}}"#))
            .unwrap();

        let request = Request::from_http(&http, None);
        let body = request.body();
        assert_eq!(body.get_string("name", "").unwrap(), "ada");
        assert_eq!(body.get_int("age", 0).unwrap(), 36);
        assert_eq!(body.get("tags").unwrap(), Some(InputValue::Sequence(vec![Scalar::from("x")])));
        assert!(body.get("profile").is_err());
        assert_eq!(request.server().get_str("CONTENT_TYPE"), Some("application/json; charset=utf-8"));
    }

    #[test]
    fn test_malformed_body_is_ignored() {
        let http = http::Request::post("/")
            .header("Content-Type", "application/json")
            .body(Bytes::from("{not json"))
            .unwrap();
        assert!(Request::from_http(&http, None).body_all().is_empty());
    }

    #[test]
    fn test_multiple_cookie_headers() {
        let http = http::Request::get("/")
            .header("Cookie", "a=1")
            .header("Cookie", "b=hello%20there")
            .body(Bytes::new())
            .unwrap();

        let request = Request::from_http(&http, None);
        assert_eq!(request.cookies().get("a"), Some("1"));
        assert_eq!(request.cookies().get("b"), Some("hello there"));
    }

    #[test]
    fn test_builder_keeps_configuration_hooks() {
        let request = RequestBuilder::from_http(
            &http::Request::get("/")
                .header("X-Forwarded-For", "203.0.113.9")
                .body(Bytes::new())
                .unwrap(),
            Some("10.1.1.1:80".parse().unwrap()),
        )
        .trusted_proxies(vec!["10.1.1.1".parse().unwrap()])
        .build();

        assert_eq!(request.server().client_ip(), Some("203.0.113.9"));
    }
}
