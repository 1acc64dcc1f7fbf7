//! # Hestia Config
//!
//! Typed, layered configuration for request handling.
//!
//! ## Layers
//!
//! 1. **Defaults** - secure cookie attributes, the stock upload policy and
//!    JSON logging at `info`
//! 2. **File** - TOML or JSON, sections may be partial
//! 3. **Environment** - `HESTIA__SECTION__KEY` overrides
//!
//! ## Example
//!
//! ```
//! use hestia_config::{ConfigLoader, LogFormat};
//!
//! let config = ConfigLoader::new()
//!     .with_string(
//!         r#"
//!         [cookies]
//!         same_site = "lax"
//!
//!         [logging]
//!         format = "pretty"
//!         "#,
//!         "toml",
//!     )
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.logging.format, LogFormat::Pretty);
//! assert!(config.cookie_options().http_only);
//! ```
//!
//! ## File layout
//!
//! ```toml
//! [server]
//! trusted_proxies = ["10.0.0.1"]
//!
//! [uploads]
//! allowed_extensions = ["jpg", "png", "pdf"]
//! max_file_size = 5242880
//!
//! [cookies]
//! path = "/"
//! domain = ""
//! secure = true
//! http_only = true
//! same_site = "strict"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/hestia-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HestiaConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{CookieSameSite, CookiesConfig, LogFormat, LoggingConfig, ServerConfig, UploadsConfig};
