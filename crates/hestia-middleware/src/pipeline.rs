//! Onion-ordered middleware pipeline.
//!
//! Units run in registration order on the way in and in reverse order on
//! the way out:
//!
//! ```text
//! request → A → B → C → (unhandled 404)
//!                         │
//! response ← A ← B ← C ←──┘
//! ```
//!
//! The first registered unit sees the request first and the final response
//! last. A unit that returns without calling `next` ends the chain there.
//!
//! Each [`Pipeline::handle`] call builds a fresh continuation chain over the
//! shared unit list, so one pipeline serves any number of requests,
//! including from several threads at once.

use crate::error_handler::ErrorHandler;
use crate::middleware::{Middleware, Next};
use hestia_core::{HttpResult, Response};
use hestia_extract::Request;
use http::StatusCode;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Body of the response produced when no unit answers the request.
pub const UNHANDLED_MESSAGE: &str = "No middleware processed the request";

/// An ordered list of middleware units.
///
/// # Example
///
/// ```
/// use hestia_core::Response;
/// use hestia_extract::Request;
/// use hestia_middleware::{FnMiddleware, Pipeline};
///
/// let mut pipeline = Pipeline::new();
/// pipeline
///     .add_middleware(FnMiddleware::new("tag", |request, next| {
///         Ok(next.run(request)?.with_header("X-Tag", "outer"))
///     }))
///     .add_middleware(FnMiddleware::new("hello", |_request, _next| {
///         Ok(Response::ok("hello"))
///     }));
///
/// let response = pipeline.handle(&mut Request::default()).unwrap();
/// assert_eq!(response.content_str(), Some("hello"));
/// assert_eq!(response.header("X-Tag"), Some("outer"));
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    middleware: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit. Units cannot be removed or reordered.
    pub fn add_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared unit.
    pub fn add_boxed(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Returns the pipeline with `middleware` appended.
    #[must_use]
    pub fn with_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.add_middleware(middleware);
        self
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` if no unit is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Returns the unit names in registration order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|mw| mw.name()).collect()
    }

    /// Runs `request` through every unit.
    ///
    /// Errors raised by a unit, or by a view it reads, propagate unchanged.
    pub fn handle(&self, request: &mut Request) -> HttpResult<Response> {
        let span = tracing::debug_span!(
            "pipeline",
            method = %request.method(),
            uri = %request.request_uri(),
        );
        let _guard = span.enter();

        let response = self.build_chain().run(request)?;
        tracing::debug!(status = %response.status(), "pipeline completed");
        Ok(response)
    }

    /// Runs `request` and always produces a response.
    ///
    /// A propagated error is translated by `errors`. Cookie directives the
    /// request queued are attached to the response either way.
    pub fn dispatch(&self, request: &mut Request, errors: &ErrorHandler) -> Response {
        let mut response = match self.handle(request) {
            Ok(response) => response,
            Err(error) => errors.handle(&error),
        };
        request.cookies_mut().apply_to(&mut response);
        response
    }

    /// Builds the middleware chain for a request.
    fn build_chain(&self) -> Next<'_> {
        // Start with the unhandled fallback as the terminal point
        let mut next = Next::handler(unhandled);

        for middleware in self.middleware.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        next
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("middleware", &self.middleware_names())
            .finish()
    }
}

#[allow(clippy::unnecessary_wraps)]
fn unhandled(_request: &mut Request) -> HttpResult<Response> {
    tracing::debug!("no middleware produced a response");
    Ok(Response::new(UNHANDLED_MESSAGE, StatusCode::NOT_FOUND))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMiddleware {
        name: &'static str,
        count: Arc<AtomicUsize>,
    }

    impl Middleware for CountingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&self, request: &mut Request, next: Next<'_>) -> HttpResult<Response> {
            self.count.fetch_add(1, Ordering::SeqCst);
            next.run(request)
        }
    }

    #[test]
    fn test_empty_pipeline_is_unhandled() {
        let pipeline = Pipeline::new();
        let response = pipeline.handle(&mut Request::default()).unwrap();

        assert!(pipeline.is_empty());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.content_str(), Some(UNHANDLED_MESSAGE));
    }

    #[test]
    fn test_pass_through_units_reach_fallback() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut pipeline = Pipeline::new();
        pipeline
            .add_middleware(CountingMiddleware { name: "a", count: count.clone() })
            .add_middleware(CountingMiddleware { name: "b", count: count.clone() });

        let response = pipeline.handle(&mut Request::default()).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_middleware_names_in_registration_order() {
        let pipeline = Pipeline::new()
            .with_middleware(FnMiddleware::new("first", |r, n| n.run(r)))
            .with_middleware(FnMiddleware::new("second", |r, n| n.run(r)));

        assert_eq!(pipeline.middleware_names(), vec!["first", "second"]);
        assert_eq!(pipeline.len(), 2);
        assert_eq!(format!("{pipeline:?}"), r#"Pipeline { middleware: ["first", "second"] }"#);
    }

    #[test]
    fn test_pipeline_is_reusable() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_middleware(CountingMiddleware { name: "c", count: count.clone() });

        for _ in 0..3 {
            pipeline.handle(&mut Request::default()).unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dispatch_attaches_cookies_after_error() {
        let pipeline = Pipeline::new().with_middleware(FnMiddleware::new("cookie_then_fail", |request, _next| {
            request.cookies_mut().set("flash", "saved")?;
            Err(hestia_core::HttpError::not_found("no such page"))
        }));

        let mut request = Request::default();
        let response = pipeline.dispatch(&mut request, &ErrorHandler::new());

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.set_cookies().len(), 1);
        assert!(response.set_cookies()[0].starts_with("flash=saved"));
    }
}
