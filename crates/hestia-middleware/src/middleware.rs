//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every processing unit
//! implements. A unit may inspect or modify the request, delegate to the
//! rest of the chain through [`Next`], and transform the response it gets
//! back. Not calling `next` short-circuits the chain.
//!
//! # Example
//!
//! ```
//! use hestia_core::{HttpResult, Response};
//! use hestia_extract::Request;
//! use hestia_middleware::{Middleware, Next};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &'static str {
//!         "powered_by"
//!     }
//!
//!     fn handle(&self, request: &mut Request, next: Next<'_>) -> HttpResult<Response> {
//!         let response = next.run(request)?;
//!         Ok(response.with_header("X-Powered-By", "hestia"))
//!     }
//! }
//! ```

use hestia_core::{HttpResult, Response};
use hestia_extract::Request;

/// The core middleware trait.
///
/// # Invariants
///
/// - A unit calls `next.run()` at most once; `Next` is consumed by the call
/// - Units keep no per-request state in `self`; pass it through the request
/// - Errors propagate with `?` unless the unit deliberately converts one
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this unit, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    ///
    /// # Arguments
    ///
    /// * `request` - The request, shared with every unit in the chain
    /// * `next` - The rest of the chain
    fn handle(&self, request: &mut Request, next: Next<'_>) -> HttpResult<Response>;
}

/// The rest of the chain, handed to each unit.
///
/// Consumed by [`run`](Self::run), so it can only be invoked once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to process
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain
    Handler(Box<dyn FnOnce(&mut Request) -> HttpResult<Response> + 'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next`.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut Request) -> HttpResult<Response> + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next unit, or the terminal handler.
    pub fn run(self, request: &mut Request) -> HttpResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                tracing::trace!(middleware = middleware.name(), "entering middleware");
                let result = middleware.handle(request, *next);
                tracing::trace!(middleware = middleware.name(), ok = result.is_ok(), "leaving middleware");
                result
            }
            NextInner::Handler(handler) => handler(request),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => {
                f.debug_struct("Next").field("middleware", &middleware.name()).finish()
            }
            NextInner::Handler(_) => f.debug_struct("Next").field("middleware", &"<terminal>").finish(),
        }
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use hestia_middleware::FnMiddleware;
///
/// let timing = FnMiddleware::new("timing", |request, next| {
///     let started = std::time::Instant::now();
///     let response = next.run(request)?;
///     tracing::debug!(elapsed = ?started.elapsed(), "request handled");
///     Ok(response)
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut Request, Next<'_>) -> HttpResult<Response> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Request, Next<'_>) -> HttpResult<Response> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&self, request: &mut Request, next: Next<'_>) -> HttpResult<Response> {
        (self.func)(request, next)
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware").field("name", &self.name).finish()
    }
}
