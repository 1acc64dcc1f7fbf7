//! Server and environment view.
//!
//! Keys follow the CGI convention (`REQUEST_METHOD`, `REMOTE_ADDR`,
//! `HTTP_USER_AGENT`, ...). Everything derived here (client IP, scheme,
//! header names) is computed on demand and never written back.

use hestia_core::ParameterBag;
use http::uri::Scheme;
use indexmap::IndexMap;
use std::net::IpAddr;

const HEADER_PREFIX: &str = "HTTP_";

/// One server/environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerValue {
    /// A single string.
    Str(String),
    /// Several strings, e.g. a repeated header.
    List(Vec<String>),
}

impl ServerValue {
    /// Returns the value if it is a single string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Renders the value as a header value, joining lists with `, `.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for ServerValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ServerValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<String>> for ServerValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for ServerValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(ToString::to_string).collect())
    }
}

/// The server/environment mapping with derived request facts.
///
/// # Example
///
/// ```
/// use hestia_extract::ServerBag;
///
/// let server = ServerBag::new([
///     ("REMOTE_ADDR", "10.0.0.1"),
///     ("HTTP_X_FORWARDED_FOR", "203.0.113.7, 10.0.0.1"),
///     ("HTTP_ACCEPT_LANGUAGE", "en"),
/// ])
/// .with_trusted_proxies(vec!["10.0.0.1".parse().unwrap()]);
///
/// assert_eq!(server.client_ip(), Some("203.0.113.7"));
/// assert_eq!(server.header("accept-language").as_deref(), Some("en"));
/// assert_eq!(server.headers()["Accept-Language"], "en");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerBag {
    params: ParameterBag<ServerValue>,
    trusted_proxies: Vec<IpAddr>,
}

impl ServerBag {
    /// Creates a view over `params` with no trusted proxies.
    pub fn new<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ServerValue>,
    {
        Self {
            params: params.into_iter().map(|(k, v)| (k, v.into())).collect(),
            trusted_proxies: Vec::new(),
        }
    }

    /// Sets the proxies allowed to supply `X-Forwarded-For`.
    #[must_use]
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies;
        self
    }

    /// Returns the trusted proxies.
    #[must_use]
    pub fn trusted_proxies(&self) -> &[IpAddr] {
        &self.trusted_proxies
    }

    /// Stores a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ServerValue>) -> &mut Self {
        self.params.set(key, value);
        self
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ServerValue> {
        self.params.get(key)
    }

    /// Returns the value under `key` if it is a single string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(ServerValue::as_str)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.params.has(key)
    }

    /// Returns every value.
    #[must_use]
    pub fn all(&self) -> &IndexMap<String, ServerValue> {
        self.params.all()
    }

    /// Returns the number of values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.params.count()
    }

    /// Returns the request method, `GET` when absent.
    #[must_use]
    pub fn request_method(&self) -> &str {
        self.get_str("REQUEST_METHOD").unwrap_or("GET")
    }

    /// Returns the request target, `/` when absent.
    #[must_use]
    pub fn request_uri(&self) -> &str {
        self.get_str("REQUEST_URI").unwrap_or("/")
    }

    /// Returns the peer address as reported by the host.
    #[must_use]
    pub fn remote_addr(&self) -> Option<&str> {
        self.get_str("REMOTE_ADDR")
    }

    /// Returns the client address.
    ///
    /// When the peer is a trusted proxy, the first `X-Forwarded-For` entry
    /// wins if it is a well-formed IP literal. Otherwise the peer address is
    /// returned unchanged.
    #[must_use]
    pub fn client_ip(&self) -> Option<&str> {
        let remote = self.remote_addr()?;
        let trusted = remote
            .parse::<IpAddr>()
            .is_ok_and(|ip| self.trusted_proxies.contains(&ip));
        if !trusted {
            return Some(remote);
        }

        let forwarded = self
            .get_str("HTTP_X_FORWARDED_FOR")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|candidate| candidate.parse::<IpAddr>().is_ok());

        match forwarded {
            Some(ip) => {
                tracing::trace!(proxy = remote, client = ip, "client ip taken from forwarded header");
                Some(ip)
            }
            None => Some(remote),
        }
    }

    /// Returns `https` if `HTTPS` is set to anything but empty or `off`.
    #[must_use]
    pub fn protocol(&self) -> Scheme {
        match self.get_str("HTTPS") {
            Some(flag) if !flag.is_empty() && !flag.eq_ignore_ascii_case("off") => Scheme::HTTPS,
            _ => Scheme::HTTP,
        }
    }

    /// Returns the `Host` header.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.get_str("HTTP_HOST")
    }

    /// Returns the server port.
    #[must_use]
    pub fn server_port(&self) -> Option<u16> {
        self.get_str("SERVER_PORT").and_then(|port| port.parse().ok())
    }

    /// Returns the `User-Agent` header.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.get_str("HTTP_USER_AGENT")
    }

    /// Returns the `Referer` header.
    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        self.get_str("HTTP_REFERER")
    }

    /// Returns the script path.
    #[must_use]
    pub fn script_name(&self) -> Option<&str> {
        self.get_str("SCRIPT_NAME")
    }

    /// Returns the local address the request arrived on.
    #[must_use]
    pub fn server_address(&self) -> Option<&str> {
        self.get_str("SERVER_ADDR")
    }

    /// Returns the headers every response view starts from.
    #[must_use]
    pub fn default_headers() -> IndexMap<String, String> {
        IndexMap::from([
            ("Content-Type".to_string(), "text/html".to_string()),
            (
                "Cache-Control".to_string(),
                "no-cache, no-store, must-revalidate".to_string(),
            ),
        ])
    }

    /// Returns the default headers overlaid with every `HTTP_*` entry.
    #[must_use]
    pub fn headers(&self) -> IndexMap<String, String> {
        let mut headers = Self::default_headers();
        for (key, value) in self.params.iter() {
            if let Some(rest) = key.strip_prefix(HEADER_PREFIX) {
                headers.insert(canonical_header_name(rest), value.to_header_value());
            }
        }
        headers
    }

    /// Looks up one request header by name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.params.get(&env_key(name)).map(ServerValue::to_header_value)
    }
}

/// Converts a header name such as `accept-language` into its
/// `HTTP_ACCEPT_LANGUAGE` environment key.
pub(crate) fn env_key(header_name: &str) -> String {
    format!("{HEADER_PREFIX}{}", header_name.to_ascii_uppercase().replace('-', "_"))
}

/// Converts `ACCEPT_LANGUAGE` into `Accept-Language`.
fn canonical_header_name(env_name: &str) -> String {
    env_name
        .split('_')
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join("-")
}
