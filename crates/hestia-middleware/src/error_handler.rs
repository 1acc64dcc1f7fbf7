//! Translation of errors into JSON responses.
//!
//! The [`ErrorHandler`] is the single place where an [`HttpError`] becomes
//! something a client sees. Every translated error has the same shape:
//!
//! ```json
//! {
//!   "error": {
//!     "code": 400,
//!     "kind": "invalid_input",
//!     "message": "The value for the key \"age\" is not scalar, a sequence of scalars, or renderable."
//!   }
//! }
//! ```
//!
//! `code` is the HTTP status, derived from the error kind.

use hestia_core::{ErrorKind, HttpError, Response};

/// Converts errors into structured responses.
///
/// # Example
///
/// ```
/// use hestia_core::HttpError;
/// use hestia_middleware::ErrorHandler;
///
/// let handler = ErrorHandler::new().expose_internal_errors(false);
///
/// let response = handler.handle(&HttpError::unclassified("db pool exhausted"));
/// assert_eq!(response.status().as_u16(), 500);
/// assert!(response.content_str().unwrap().contains("An internal error occurred"));
/// ```
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    /// Whether unclassified error messages reach the client.
    expose_internal_errors: bool,
    /// Message substituted for unclassified errors when masking.
    internal_error_message: String,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHandler {
    /// Creates a handler that reports every message as raised.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expose_internal_errors: true,
            internal_error_message: "An internal error occurred".to_string(),
        }
    }

    /// Sets whether unclassified error messages are sent to clients.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Sets the message used when unclassified errors are masked.
    #[must_use]
    pub fn internal_error_message(mut self, message: &str) -> Self {
        self.internal_error_message = message.to_string();
        self
    }

    /// Translates `error` into a JSON response.
    ///
    /// # Panics
    ///
    /// Panics if the envelope cannot be serialized. There is no simpler
    /// representation left to fall back to.
    #[must_use]
    pub fn handle(&self, error: &HttpError) -> Response {
        let status = error.status_code();
        let mut envelope = error.to_envelope();

        if error.kind() == ErrorKind::Unclassified && !self.expose_internal_errors {
            envelope.error.message.clone_from(&self.internal_error_message);
        }

        if status.is_server_error() {
            tracing::error!(kind = error.kind().as_str(), status = status.as_u16(), error = %error, "request failed");
        } else {
            tracing::warn!(kind = error.kind().as_str(), status = status.as_u16(), error = %error, "request rejected");
        }

        Response::json(&envelope, status).expect("error envelope serialization must not fail")
    }
}
