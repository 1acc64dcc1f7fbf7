//! Layered configuration loading.
//!
//! Layers apply in order, each overriding the previous one:
//! 1. Built-in defaults, or the development or production preset
//! 2. TOML or JSON files and in-memory strings, in call order
//! 3. `PREFIX__SECTION__KEY` environment variables
//!
//! A file only overrides the keys it sets. Lists are replaced, not
//! appended to.

use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::Path;

use crate::schema::LogFormat;
use crate::{ConfigError, HestiaConfig};

/// Builds a [`HestiaConfig`] from defaults, files and the environment.
///
/// # Example
///
/// ```no_run
/// use hestia_config::ConfigLoader;
///
/// # fn main() -> Result<(), hestia_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("hestia.toml")?
///     .with_env_prefix("hestia")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HestiaConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HestiaConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Resets to the built-in defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HestiaConfig::default();
        self
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HestiaConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HestiaConfig::production();
        self
    }

    /// Loads a configuration file. The format follows the extension
    /// (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unknown extension or fails to parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let format = Format::parse(extension, &path.display().to_string())?;
        let layer = format.parse_layer(&content)?;
        self.merge_layer(layer)?;
        self.file_loaded = true;

        Ok(self)
    }

    /// Loads a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown format or unparsable content.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer = Format::parse(format, "string")?.parse_layer(content)?;
        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Enables environment overrides of the form `PREFIX__SECTION__KEY`.
    ///
    /// The prefix is upper-cased, so `hestia` reads `HESTIA__COOKIES__SECURE`.
    /// List values are comma separated.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Returns `true` if a configuration file was loaded.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unparsable override or a failed
    /// validation.
    pub fn load(mut self) -> Result<HestiaConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HestiaConfig {
        self.config
    }

    // Only the keys present in the layer replace current values; omitted
    // sections and fields keep whatever the preset or earlier layers set.
    fn merge_layer(&mut self, layer: serde_json::Value) -> Result<(), ConfigError> {
        let mut merged = serde_json::to_value(&self.config).map_err(ConfigError::OverlayError)?;
        overlay(&mut merged, layer);
        self.config = serde_json::from_value(merged).map_err(ConfigError::OverlayError)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            // Server section
            ["SERVER", "TRUSTED_PROXIES"] => {
                self.config.server.trusted_proxies = split_list(value)
                    .map(|item| {
                        item.parse::<IpAddr>()
                            .map_err(|_| ConfigError::env_parse_error(key, format!("'{item}' is not an IP address")))
                    })
                    .collect::<Result<_, _>>()?;
            }

            // Uploads section
            ["UPLOADS", "ALLOWED_EXTENSIONS"] => {
                self.config.uploads.allowed_extensions = split_list(value).map(ToString::to_string).collect();
            }
            ["UPLOADS", "MAX_FILE_SIZE"] => {
                self.config.uploads.max_file_size = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            // Cookies section
            ["COOKIES", "EXPIRES_IN_SECS"] => {
                self.config.cookies.expires_in_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["COOKIES", "PATH"] => {
                self.config.cookies.path = value.to_string();
            }
            ["COOKIES", "DOMAIN"] => {
                self.config.cookies.domain = value.to_string();
            }
            ["COOKIES", "SECURE"] => {
                self.config.cookies.secure =
                    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["COOKIES", "HTTP_ONLY"] => {
                self.config.cookies.http_only =
                    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["COOKIES", "SAME_SITE"] => {
                self.config.cookies.same_site = value.parse().map_err(|e: String| ConfigError::env_parse_error(key, e))?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled =
                    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected json or pretty")),
                };
            }

            // Unknown keys are ignored so unrelated variables sharing the
            // prefix do not break startup
            _ => {}
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn parse(name: &str, origin: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::unsupported_format(name, origin)),
        }
    }

    /// Checks `content` against the schema, then returns it as an untyped
    /// tree holding only the keys it actually sets.
    fn parse_layer(self, content: &str) -> Result<serde_json::Value, ConfigError> {
        match self {
            Self::Toml => {
                toml::from_str::<HestiaConfig>(content)?;
                let raw: toml::Value = toml::from_str(content)?;
                serde_json::to_value(raw).map_err(ConfigError::OverlayError)
            }
            Self::Json => {
                serde_json::from_str::<HestiaConfig>(content)?;
                Ok(serde_json::from_str(content)?)
            }
        }
    }
}

fn overlay(base: &mut serde_json::Value, layer: serde_json::Value) {
    match (base, layer) {
        (serde_json::Value::Object(base), serde_json::Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
