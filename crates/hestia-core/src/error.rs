//! Error types for Hestia.
//!
//! Every failure raised by the request views, the middleware pipeline or a
//! user middleware is an [`HttpError`]. Errors are classified by
//! [`ErrorKind`], which decides the HTTP status the error handler responds
//! with:
//!
//! | `ErrorKind`    | Status | Raised by                                   |
//! |----------------|--------|---------------------------------------------|
//! | `InvalidInput` | 400    | query/body validation, cookie values        |
//! | `NotFound`     | 404    | callers signalling a missing resource       |
//! | `Storage`      | 500    | upload relocation                           |
//! | `Unclassified` | 500    | everything else, including programmer errors |
//!
//! Messages end up in client-visible JSON. `Storage` messages include the
//! offending path; no other variant may embed filesystem paths.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using [`HttpError`].
pub type HttpResult<T> = Result<T, HttpError>;

/// Classification of an [`HttpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or type-violating user-supplied value.
    InvalidInput,
    /// Logical absence of a resource.
    NotFound,
    /// Filesystem precondition or operation failure.
    Storage,
    /// Anything else.
    Unclassified,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage | Self::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable `snake_case` name used in error envelopes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Standard error type for Hestia.
///
/// # Example
///
/// ```
/// use hestia_core::{ErrorKind, HttpError};
///
/// fn require_name(name: &str) -> Result<(), HttpError> {
///     if name.is_empty() {
///         return Err(HttpError::invalid_input("name must not be empty"));
///     }
///     Ok(())
/// }
///
/// let err = require_name("").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::InvalidInput);
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Error, Debug)]
pub enum HttpError {
    /// A user-supplied value violated a view's constraints.
    #[error("{message}")]
    InvalidInput {
        /// Human-readable error message.
        message: String,
        /// The parameter key involved, if any.
        key: Option<String>,
    },

    /// A resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("{message}")]
    Storage {
        /// Human-readable error message, including the path.
        message: String,
        /// The path the operation failed on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Option<std::io::Error>,
    },

    /// Any other failure.
    #[error("{message}")]
    Unclassified {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HttpError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            key: None,
        }
    }

    /// Creates an invalid input error attributed to a parameter key.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a storage error for `path`.
    #[must_use]
    pub fn storage(message: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::Storage {
            message: message.into(),
            path: path.as_ref().to_path_buf(),
            source: None,
        }
    }

    /// Creates a storage error for `path` caused by an I/O error.
    #[must_use]
    pub fn storage_io(
        message: impl Into<String>,
        path: impl AsRef<Path>,
        source: std::io::Error,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            path: path.as_ref().to_path_buf(),
            source: Some(source),
        }
    }

    /// Creates an unclassified error.
    #[must_use]
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unclassified error with a source error.
    pub fn unclassified_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Unclassified {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Unclassified { .. } => ErrorKind::Unclassified,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Returns the client-visible message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput { message, .. }
            | Self::NotFound { message }
            | Self::Storage { message, .. }
            | Self::Unclassified { message, .. } => message,
        }
    }

    /// Converts this error to a serializable envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.status_code().as_u16(),
                kind: self.kind(),
                message: self.message().to_string(),
            },
        }
    }
}

/// Serializable error envelope for HTTP responses.
///
/// Serializes as `{"error": {"code": 400, "kind": "invalid_input", "message": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Numeric HTTP status code.
    pub code: u16,
    /// Error kind.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
}
