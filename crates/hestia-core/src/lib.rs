//! # Hestia Core
//!
//! Core types shared by every Hestia crate.
//!
//! - [`ParameterBag`] - permissive string-keyed storage underlying every request view
//! - [`Value`], [`Scalar`], [`InputValue`] - the value model and its validated form
//! - [`Response`] - status, headers and body with ordered emission through a [`Transport`]
//! - [`HttpError`] - the error taxonomy (invalid input, not found, storage, unclassified)

#![doc(html_root_url = "https://docs.rs/hestia-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bag;
mod error;
mod response;
pub mod transport;
pub mod value;

pub use bag::ParameterBag;
pub use error::{ErrorDetail, ErrorEnvelope, ErrorKind, HttpError, HttpResult};
pub use response::Response;
pub use transport::{BufferedTransport, Transport};
pub use value::{InputValue, Renderable, Scalar, Value};
