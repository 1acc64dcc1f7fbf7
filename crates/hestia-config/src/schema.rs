//! Configuration schema definitions.
//!
//! Every section has defaults for every field and rejects unknown keys, so
//! a typo in a configuration file is an error rather than a silent no-op.

use hestia_extract::cookie::SameSite;
use hestia_extract::file::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Server-side trust settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Reverse proxies whose `X-Forwarded-For` header is believed.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

/// Upload acceptance policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadsConfig {
    /// Accepted extensions, lowercase and without the leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS.iter().map(ToString::to_string).collect()
}

const fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

/// `SameSite` attribute as written in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieSameSite {
    /// `SameSite=Strict`
    #[default]
    Strict,
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => Self::Strict,
            CookieSameSite::Lax => Self::Lax,
            CookieSameSite::None => Self::None,
        }
    }
}

impl std::str::FromStr for CookieSameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            _ => Err(format!("expected strict, lax or none, got '{s}'")),
        }
    }
}

/// Defaults applied to every cookie written without explicit options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CookiesConfig {
    /// Lifetime in seconds. Zero writes session cookies.
    #[serde(default)]
    pub expires_in_secs: u64,

    /// `Path` attribute.
    #[serde(default = "default_cookie_path")]
    pub path: String,

    /// `Domain` attribute. Empty omits it.
    #[serde(default)]
    pub domain: String,

    /// `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure: bool,

    /// `HttpOnly` attribute.
    #[serde(default = "default_true")]
    pub http_only: bool,

    /// `SameSite` attribute.
    #[serde(default)]
    pub same_site: CookieSameSite,
}

impl Default for CookiesConfig {
    fn default() -> Self {
        Self {
            expires_in_secs: 0,
            path: default_cookie_path(),
            domain: String::new(),
            secure: true,
            http_only: true,
            same_site: CookieSameSite::Strict,
        }
    }
}

fn default_cookie_path() -> String {
    "/".to_string()
}

const fn default_true() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logs (production)
    #[default]
    Json,
    /// Human-readable pretty logs (development)
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether logging is installed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `hestia_middleware=debug,warn`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
