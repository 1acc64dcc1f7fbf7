//! # Hestia
//!
//! **Request views, responses and an onion-ordered middleware pipeline**
//!
//! - **Parameter bags** - ordered key/value stores behind every request view
//! - **Validated input** - query and body values are checked on read
//! - **Secure cookies** - `Secure`, `HttpOnly` and `SameSite=Strict` unless told otherwise
//! - **Safe uploads** - extension and size policy, basename-only relocation
//! - **Uniform errors** - every failure becomes the same JSON envelope
//!
//! ## Quick Start
//!
//! ```
//! use hestia::prelude::*;
//!
//! let pipeline = Pipeline::new()
//!     .with_middleware(FnMiddleware::new("greet", |request, _next| {
//!         let name = request.query().get_string("name", "stranger")?;
//!         Ok(Response::ok(format!("hello {name}")))
//!     }));
//!
//! let mut request = Request::builder().query_param("name", "ada").build();
//! let response = pipeline.dispatch(&mut request, &ErrorHandler::new());
//!
//! let mut transport = BufferedTransport::new();
//! response.send(&mut transport);
//! assert_eq!(transport.body(), b"hello ada");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! http::Request → Request (views) → A → B → C → (404 fallback)
//!                                                     ↓
//! Transport ← Response ← ErrorHandler ← A ← B ← C ←──┘
//! ```

#![doc(html_root_url = "https://docs.rs/hestia/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hestia_core as core;

// Re-export request views
pub use hestia_extract as extract;

// Re-export the pipeline
pub use hestia_middleware as middleware;

// Re-export configuration
pub use hestia_config as config;

// Re-export logging setup
pub use hestia_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use hestia::prelude::*;
/// ```
pub mod prelude {
    pub use hestia_core::{
        BufferedTransport, ErrorKind, HttpError, HttpResult, InputValue, ParameterBag, Response, Scalar, Transport,
        Value,
    };

    pub use hestia_extract::{
        CookieJar, CookieOptions, FileBag, InputBag, Request, RequestBuilder, SameSite, ServerBag, Session,
        UploadPolicy, UploadedFile,
    };

    pub use hestia_middleware::{ErrorHandler, FnMiddleware, Middleware, Next, Pipeline};

    pub use hestia_config::{ConfigLoader, HestiaConfig};

    pub use hestia_telemetry::{init_logging, LogConfig};
}
