//! Root configuration type.

use crate::schema::{CookieSameSite, CookiesConfig, LogFormat, LoggingConfig, ServerConfig, UploadsConfig};
use crate::ConfigError;
use hestia_extract::cookie::CookieOptions;
use hestia_extract::file::UploadPolicy;
use hestia_extract::RequestBuilder;
use hestia_telemetry::LogConfig;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Complete Hestia configuration.
///
/// # Example
///
/// ```
/// use hestia_config::HestiaConfig;
///
/// let config = HestiaConfig::default();
/// assert!(config.validate().is_ok());
/// assert!(config.cookie_options().secure);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HestiaConfig {
    /// Proxy trust settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upload acceptance policy.
    #[serde(default)]
    pub uploads: UploadsConfig,

    /// Cookie defaults.
    #[serde(default)]
    pub cookies: CookiesConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HestiaConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.allowed_extensions.is_empty() {
            return Err(ConfigError::invalid_value(
                "uploads.allowed_extensions",
                "at least one extension must be allowed",
            ));
        }

        for ext in &self.uploads.allowed_extensions {
            if ext.is_empty() || ext.contains('.') || ext.chars().any(char::is_uppercase) {
                return Err(ConfigError::invalid_value(
                    "uploads.allowed_extensions",
                    format!("'{ext}' must be lowercase and without a leading dot"),
                ));
            }
        }

        if self.uploads.max_file_size == 0 {
            return Err(ConfigError::invalid_value(
                "uploads.max_file_size",
                "must be greater than zero",
            ));
        }

        // Browsers drop SameSite=None cookies that are not Secure
        if self.cookies.same_site == CookieSameSite::None && !self.cookies.secure {
            return Err(ConfigError::invalid_value(
                "cookies.same_site",
                "\"none\" requires cookies.secure = true",
            ));
        }

        self.cookie_options()
            .validate()
            .map_err(|e| ConfigError::invalid_value("cookies", e.message()))?;

        hestia_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Creates a configuration suited to local development.
    ///
    /// Logs are pretty-printed at debug level and cookies drop the `Secure`
    /// flag so they survive plain-HTTP localhost.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;

        config.cookies.secure = false;

        config
    }

    /// Creates a production configuration.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config
    }

    /// The upload policy handed to every request's file view.
    #[must_use]
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            allowed_extensions: self.uploads.allowed_extensions.clone(),
            max_file_size: self.uploads.max_file_size,
        }
    }

    /// Defaults for cookies written without explicit options.
    #[must_use]
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions::default()
            .expires_in_secs(self.cookies.expires_in_secs)
            .path(self.cookies.path.clone())
            .domain(self.cookies.domain.clone())
            .secure(self.cookies.secure)
            .http_only(self.cookies.http_only)
            .same_site(self.cookies.same_site.into())
    }

    /// Proxies whose forwarding headers are trusted.
    #[must_use]
    pub fn trusted_proxies(&self) -> Vec<IpAddr> {
        self.server.trusted_proxies.clone()
    }

    /// Logging setup for `hestia_telemetry::init_logging`.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let base = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };

        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            ..base
        }
    }

    /// Applies the request-level settings to `builder`.
    ///
    /// ```
    /// use hestia_config::HestiaConfig;
    /// use hestia_extract::RequestBuilder;
    ///
    /// let mut config = HestiaConfig::default();
    /// config.uploads.allowed_extensions = vec!["csv".to_string()];
    ///
    /// let request = config.configure(RequestBuilder::new()).build();
    /// assert_eq!(request.files().policy().allowed_extensions, vec!["csv"]);
    /// ```
    #[must_use]
    pub fn configure(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .upload_policy(self.upload_policy())
            .trusted_proxies(self.trusted_proxies())
            .cookie_defaults(self.cookie_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hestia_extract::cookie::SameSite;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HestiaConfig::default().validate().is_ok());
        assert!(HestiaConfig::development().validate().is_ok());
        assert!(HestiaConfig::production().validate().is_ok());
    }

    #[test]
    fn test_empty_extensions_rejected() {
        let mut config = HestiaConfig::default();
        config.uploads.allowed_extensions.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("uploads.allowed_extensions"));
    }

    #[test]
    fn test_extension_with_dot_rejected() {
        let mut config = HestiaConfig::default();
        config.uploads.allowed_extensions = vec![".png".to_string()];
        assert!(config.validate().is_err());

        config.uploads.allowed_extensions = vec!["PNG".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let mut config = HestiaConfig::default();
        config.uploads.max_file_size = 0;
        assert!(config.validate().unwrap_err().to_string().contains("uploads.max_file_size"));
    }

    #[test]
    fn test_same_site_none_requires_secure() {
        let mut config = HestiaConfig::default();
        config.cookies.same_site = CookieSameSite::None;
        assert!(config.validate().is_ok());

        config.cookies.secure = false;
        assert!(config.validate().unwrap_err().to_string().contains("cookies.same_site"));
    }

    #[test]
    fn test_cookie_attributes_with_separators_rejected() {
        let mut config = HestiaConfig::default();
        config.cookies.path = "/app; Domain=evil.example".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("cookies"));
        assert!(err.contains("path"));

        config.cookies.path = "/app".to_string();
        config.cookies.domain = "example.com\r\n".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("domain"));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = HestiaConfig::default();
        config.logging.level = "hestia=loud".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_development_relaxes_secure_flag() {
        let config = HestiaConfig::development();
        assert!(!config.cookie_options().secure);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_cookie_options_conversion() {
        let mut config = HestiaConfig::default();
        config.cookies.expires_in_secs = 600;
        config.cookies.domain = "example.com".to_string();
        config.cookies.same_site = CookieSameSite::Lax;

        let options = config.cookie_options();
        assert_eq!(options.expires_in, Duration::from_secs(600));
        assert_eq!(options.domain, "example.com");
        assert_eq!(options.same_site, SameSite::Lax);
        assert!(options.http_only);
    }

    #[test]
    fn test_log_config_follows_format() {
        let mut config = HestiaConfig::default();
        assert!(config.log_config().json_format);

        config.logging.format = LogFormat::Pretty;
        config.logging.level = "trace".to_string();
        let log = config.log_config();
        assert!(!log.json_format);
        assert_eq!(log.level, "trace");
    }

    #[test]
    fn test_configure_sets_trusted_proxies() {
        let mut config = HestiaConfig::default();
        config.server.trusted_proxies = vec!["10.0.0.1".parse().unwrap()];

        let request = config
            .configure(RequestBuilder::new())
            .remote_addr("10.0.0.1")
            .header("X-Forwarded-For", "203.0.113.9")
            .build();
        assert_eq!(request.server().client_ip(), Some("203.0.113.9"));
    }
}
