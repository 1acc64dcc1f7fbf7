//! # Hestia Middleware
//!
//! The middleware pipeline and the error translator.
//!
//! - [`Middleware`] / [`Next`] - a processing unit and the rest of the chain
//! - [`FnMiddleware`] - a unit built from a closure
//! - [`Pipeline`] - onion-ordered composition with a fixed 404 fallback
//! - [`ErrorHandler`] - `HttpError` to JSON response translation
//!
//! Everything here is synchronous: `next.run()` is a direct call.

#![doc(html_root_url = "https://docs.rs/hestia-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error_handler;
pub mod middleware;
pub mod pipeline;

pub use error_handler::ErrorHandler;
pub use middleware::{FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, UNHANDLED_MESSAGE};
