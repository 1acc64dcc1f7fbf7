//! Cookie jar with secure defaults.
//!
//! The jar exposes the cookies a request arrived with and records every
//! cookie written or deleted while handling it. Each write or delete
//! queues exactly one [`SetCookie`] directive, which the host transmits
//! with the response (see [`CookieJar::apply_to`]).
//!
//! Defaults are secure: `Secure`, `HttpOnly` and `SameSite=Strict` unless
//! the caller opts out through [`CookieOptions`].
//!
//! # Example
//!
//! ```rust
//! use hestia_extract::cookie::{CookieJar, CookieOptions, SameSite};
//!
//! let mut jar = CookieJar::parse_header("theme=dark");
//! assert_eq!(jar.get("theme"), Some("dark"));
//!
//! jar.set_with(
//!     "greeting",
//!     "hello world",
//!     CookieOptions::default().expires_in_secs(3600).same_site(SameSite::Lax),
//! )
//! .unwrap();
//!
//! assert_eq!(jar.raw("greeting").unwrap().value, "hello%20world");
//! assert_eq!(jar.get("greeting"), Some("hello world"));
//!
//! let header = jar.directives()[0].to_header_value();
//! assert!(header.starts_with("greeting=hello%20world; Expires="));
//! assert!(header.ends_with("; Path=/; Secure; HttpOnly; SameSite=Lax"));
//! ```

use chrono::{DateTime, Utc};
use hestia_core::{HttpError, HttpResult, ParameterBag, Response, Value};
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Format of the `Expires` attribute (RFC 7231 IMF-fixdate).
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// How far in the past a deletion directive expires.
const DELETE_EXPIRY_SECS: i64 = 3600;

/// Characters that would end or split a cookie name.
const NAME_FORBIDDEN: &[char] = &['=', ',', ';', ' ', '\t', '\r', '\n', '\x0b', '\x0c'];

/// Characters that would end or split a `Path` or `Domain` attribute.
const ATTRIBUTE_FORBIDDEN: &[char] = &[',', ';', ' ', '\t', '\r', '\n', '\x0b', '\x0c'];

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Cookie is only sent with same-site requests.
    #[default]
    Strict,
    /// Cookie is sent with same-site and cross-site top-level navigations.
    Lax,
    /// Cookie is sent with cross-site requests.
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

impl FromStr for SameSite {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            _ => Err(HttpError::invalid_input(format!(
                "invalid SameSite policy \"{s}\", expected Strict, Lax or None"
            ))),
        }
    }
}

/// Attributes applied when writing a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Lifetime from now. Zero makes a session cookie.
    pub expires_in: Duration,
    /// `Path` attribute.
    pub path: String,
    /// `Domain` attribute. Empty omits it.
    pub domain: String,
    /// `Secure` attribute.
    pub secure: bool,
    /// `HttpOnly` attribute.
    pub http_only: bool,
    /// `SameSite` attribute.
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expires_in: Duration::ZERO,
            path: "/".to_string(),
            domain: String::new(),
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
        }
    }
}

impl CookieOptions {
    /// Set the lifetime.
    #[must_use]
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expires_in = duration;
        self
    }

    /// Set the lifetime in seconds.
    #[must_use]
    pub fn expires_in_secs(self, seconds: u64) -> Self {
        self.expires_in(Duration::from_secs(seconds))
    }

    /// Set the Path attribute.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the Domain attribute.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the Secure attribute.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `HttpOnly` attribute.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the `SameSite` attribute.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Checks that `path` and `domain` cannot break out of the directive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the offending attribute.
    pub fn validate(&self) -> HttpResult<()> {
        check_attribute("path", &self.path)?;
        check_attribute("domain", &self.domain)
    }
}

fn check_name(name: &str) -> HttpResult<()> {
    if name.is_empty() {
        return Err(HttpError::invalid_key(name, "Cookie names must not be empty."));
    }
    if name.contains(NAME_FORBIDDEN) {
        return Err(HttpError::invalid_key(
            name,
            format!("Cookie name \"{}\" contains a separator or whitespace.", name.escape_debug()),
        ));
    }
    Ok(())
}

fn check_attribute(attribute: &str, value: &str) -> HttpResult<()> {
    if value.contains(ATTRIBUTE_FORBIDDEN) {
        return Err(HttpError::invalid_key(
            attribute,
            format!("Cookie {attribute} \"{}\" contains a separator or whitespace.", value.escape_debug()),
        ));
    }
    Ok(())
}

/// What the jar remembers about a cookie written during this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieEntry {
    /// Percent-encoded value as transmitted.
    pub value: String,
    /// Absolute expiry. A zero lifetime records `None` rather than `now`,
    /// so the directive carries no `Expires` and the browser keeps the
    /// cookie for the session.
    pub expires: Option<DateTime<Utc>>,
    /// `Path` attribute.
    pub path: String,
    /// `Domain` attribute.
    pub domain: String,
    /// `Secure` attribute.
    pub secure: bool,
    /// `HttpOnly` attribute.
    pub http_only: bool,
    /// `SameSite` attribute.
    pub same_site: SameSite,
}

/// A `Set-Cookie` directive queued for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    expires: Option<DateTime<Utc>>,
    path: String,
    domain: String,
    secure: bool,
    http_only: bool,
    same_site: SameSite,
}

impl SetCookie {
    fn from_entry(name: &str, entry: &CookieEntry) -> Self {
        Self {
            name: name.to_string(),
            value: entry.value.clone(),
            expires: entry.expires,
            path: entry.path.clone(),
            domain: entry.domain.clone(),
            secure: entry.secure,
            http_only: entry.http_only,
            same_site: entry.same_site,
        }
    }

    /// Get the cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the encoded cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the absolute expiry.
    #[must_use]
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Get the Path attribute.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the Domain attribute.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Get the Secure attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Get the `HttpOnly` attribute.
    #[must_use]
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    /// Get the `SameSite` attribute.
    #[must_use]
    pub fn same_site(&self) -> SameSite {
        self.same_site
    }

    /// Convert to Set-Cookie header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];

        if let Some(expires) = self.expires {
            parts.push(format!("Expires={}", expires.format(EXPIRES_FORMAT)));
        }

        if !self.path.is_empty() {
            parts.push(format!("Path={}", self.path));
        }

        if !self.domain.is_empty() {
            parts.push(format!("Domain={}", self.domain));
        }

        if self.secure {
            parts.push("Secure".to_string());
        }

        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        parts.push(format!("SameSite={}", self.same_site));

        parts.join("; ")
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Request cookies plus the cookies written while handling the request.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    values: ParameterBag<String>,
    entries: IndexMap<String, CookieEntry>,
    directives: Vec<SetCookie>,
    defaults: CookieOptions,
}

impl CookieJar {
    /// Creates a jar from already-decoded request cookies.
    pub fn new<K: Into<String>, V: Into<String>>(values: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            values: values.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ..Self::default()
        }
    }

    /// Parses a `Cookie` request header, percent-decoding values.
    #[must_use]
    pub fn parse_header(header_value: &str) -> Self {
        let mut values = ParameterBag::<String>::new();

        for cookie in header_value.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                let value = value.trim().trim_matches('"');
                let decoded = urlencoding::decode(value)
                    .map_or_else(|_| value.to_string(), |v| v.into_owned());
                values.set(name.trim(), decoded);
            }
        }

        Self {
            values,
            ..Self::default()
        }
    }

    /// Replaces the attributes used by [`set`](Self::set) and for deleting
    /// cookies the jar has no record of.
    #[must_use]
    pub fn with_defaults(mut self, defaults: CookieOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Returns the default attributes.
    #[must_use]
    pub fn defaults(&self) -> &CookieOptions {
        &self.defaults
    }

    /// Returns the decoded value of a cookie.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns `true` if the cookie is present.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.values.has(name)
    }

    /// Returns every visible cookie, decoded.
    #[must_use]
    pub fn all(&self) -> &IndexMap<String, String> {
        self.values.all()
    }

    /// Returns the number of visible cookies.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.count()
    }

    /// Returns what was recorded when the cookie was written.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&CookieEntry> {
        self.entries.get(name)
    }

    /// Writes a cookie with the jar's default attributes.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> HttpResult<&mut Self> {
        let options = self.defaults.clone();
        self.set_with(name, value, options)
    }

    /// Writes a cookie.
    ///
    /// Fails with `InvalidInput` unless `value` is a scalar, or when the
    /// name, path or domain contains a separator or whitespace.
    pub fn set_with(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        options: CookieOptions,
    ) -> HttpResult<&mut Self> {
        let name = name.into();
        check_name(&name)?;
        options.validate()?;
        let value = value.into();
        let Some(scalar) = value.as_scalar() else {
            return Err(HttpError::invalid_key(
                name,
                format!("Cookie value must be a scalar value. Received type: \"{}\".", value.type_name()),
            ));
        };

        let plain = scalar.to_string();
        let expires = expiry_after(options.expires_in);
        let entry = CookieEntry {
            value: urlencoding::encode(&plain).into_owned(),
            expires,
            path: options.path,
            domain: options.domain,
            secure: options.secure,
            http_only: options.http_only,
            same_site: options.same_site,
        };

        tracing::debug!(cookie = %name, expires = ?expires, "cookie set");
        self.directives.push(SetCookie::from_entry(&name, &entry));
        self.values.set(name.clone(), plain);
        self.entries.insert(name, entry);
        Ok(self)
    }

    /// Deletes a cookie by queueing a directive that expired an hour ago.
    ///
    /// The directive reuses the attributes recorded when the cookie was
    /// written, or the jar defaults for cookies that only arrived with the
    /// request. Unknown names are a no-op, as are names or defaults that
    /// could not be written safely; returns whether a directive was queued.
    pub fn delete(&mut self, name: &str) -> bool {
        if !self.entries.contains_key(name) && !self.values.has(name) {
            return false;
        }
        // Written entries were checked by `set_with`; request-only cookies
        // fall back to the defaults, which may not have been.
        if !self.entries.contains_key(name) {
            if let Err(error) = check_name(name).and_then(|()| self.defaults.validate()) {
                tracing::warn!(cookie = %name.escape_debug(), error = %error, "cookie not deleted");
                return false;
            }
        }
        let entry = self.entries.swap_remove(name);

        let entry = entry.unwrap_or_else(|| CookieEntry {
            value: String::new(),
            expires: None,
            path: self.defaults.path.clone(),
            domain: self.defaults.domain.clone(),
            secure: self.defaults.secure,
            http_only: self.defaults.http_only,
            same_site: self.defaults.same_site,
        });
        let expired = CookieEntry {
            value: String::new(),
            expires: Some(Utc::now() - chrono::Duration::seconds(DELETE_EXPIRY_SECS)),
            ..entry
        };

        tracing::debug!(cookie = %name, "cookie deleted");
        self.directives.push(SetCookie::from_entry(name, &expired));
        self.values.remove(name);
        true
    }

    /// Returns the directives queued so far, in call order.
    #[must_use]
    pub fn directives(&self) -> &[SetCookie] {
        &self.directives
    }

    /// Removes and returns the queued directives.
    pub fn take_directives(&mut self) -> Vec<SetCookie> {
        std::mem::take(&mut self.directives)
    }

    /// Moves the queued directives onto `response` as `Set-Cookie` headers.
    pub fn apply_to(&mut self, response: &mut Response) {
        for directive in self.take_directives() {
            response.append_set_cookie(directive.to_header_value());
        }
    }
}

fn expiry_after(lifetime: Duration) -> Option<DateTime<Utc>> {
    if lifetime.is_zero() {
        return None;
    }
    let now = Utc::now();
    Some(
        chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}
