//! # Hestia Telemetry
//!
//! Structured logging for Hestia hosts.
//!
//! Every Hestia crate logs through `tracing` macros. Nothing is printed
//! until a subscriber is installed; [`init_logging`] installs one with an
//! `EnvFilter` and either JSON or human-readable output.
//!
//! ```rust,no_run
//! use hestia_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development()).expect("logging already initialized");
//! tracing::info!(uri = "/", "serving");
//! ```

#![doc(html_root_url = "https://docs.rs/hestia-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
