//! # Hestia Extract
//!
//! Typed views over an inbound request and the [`Request`] that owns them.
//!
//! | View          | Holds                         | Guarantees                                   |
//! |---------------|-------------------------------|----------------------------------------------|
//! | [`InputBag`]  | query or body parameters      | reads/writes only scalars, scalar lists, text |
//! | [`CookieJar`] | request and response cookies  | percent-encoding, secure defaults            |
//! | [`FileBag`]   | upload descriptors            | derived validity, checked relocation         |
//! | [`ServerBag`] | CGI-style environment         | client IP via trusted proxies, header names  |
//! | [`Session`]   | session values                | explicit `NotStarted/Active/Destroyed` states |
//!
//! Requests are built from plain mappings with [`RequestBuilder`], or from
//! an [`http::Request`] with [`Request::from_http`].

#![doc(html_root_url = "https://docs.rs/hestia-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cookie;
pub mod file;
mod ingest;
mod input;
mod request;
pub mod server;
pub mod session;

pub use cookie::{CookieEntry, CookieJar, CookieOptions, SameSite, SetCookie};
pub use file::{FileBag, UploadPolicy, UploadStatus, UploadedFile};
pub use input::{InputBag, InputSource};
pub use request::{Request, RequestBuilder};
pub use server::{ServerBag, ServerValue};
pub use session::{Session, SessionState};
