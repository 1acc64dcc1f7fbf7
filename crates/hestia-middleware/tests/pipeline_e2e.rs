//! End-to-end pipeline integration tests.
//!
//! These tests verify the pipeline's ordering guarantees together with the
//! request views and the error handler:
//!
//! 1. Fallback - an empty or pass-through pipeline answers 404
//! 2. Onion order - the first unit post-processes last
//! 3. Short-circuit - later units never run
//! 4. Error translation - failures become JSON envelopes
//! 5. Emission - the final response reaches a transport intact

use bytes::Bytes;
use hestia_core::{BufferedTransport, HttpError, HttpResult, Response, Value};
use hestia_extract::Request;
use hestia_middleware::{ErrorHandler, FnMiddleware, Middleware, Next, Pipeline, UNHANDLED_MESSAGE};
use http::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Appends a marker to whatever the inner chain returns.
struct Marker(&'static str);

impl Middleware for Marker {
    fn name(&self) -> &'static str {
        self.0
    }

    fn handle(&self, request: &mut Request, next: Next<'_>) -> HttpResult<Response> {
        let mut response = next.run(request)?;
        response.append_content(self.0);
        Ok(response)
    }
}

/// Answers with a fixed body without calling `next`.
struct Base(&'static str);

impl Middleware for Base {
    fn name(&self) -> &'static str {
        "base"
    }

    fn handle(&self, _request: &mut Request, _next: Next<'_>) -> HttpResult<Response> {
        Ok(Response::ok(self.0))
    }
}

/// Records that it ran, then delegates.
struct Flag(Arc<AtomicBool>);

impl Middleware for Flag {
    fn name(&self) -> &'static str {
        "flag"
    }

    fn handle(&self, request: &mut Request, next: Next<'_>) -> HttpResult<Response> {
        self.0.store(true, Ordering::SeqCst);
        next.run(request)
    }
}

fn error_json(response: &Response) -> serde_json::Value {
    serde_json::from_slice(response.content()).unwrap()
}

#[test]
fn test_zero_units_returns_unhandled() {
    let response = Pipeline::new().handle(&mut Request::default()).unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.content_str(), Some(UNHANDLED_MESSAGE));
}

#[test]
fn test_onion_order_inner_marker_first() {
    let pipeline = Pipeline::new()
        .with_middleware(Marker("1"))
        .with_middleware(Marker("2"))
        .with_middleware(Base("X"));

    let response = pipeline.handle(&mut Request::default()).unwrap();
    assert_eq!(response.content_str(), Some("X21"));
}

#[test]
fn test_short_circuit_skips_later_units() {
    let a_ran = Arc::new(AtomicBool::new(false));
    let b_ran = Arc::new(AtomicBool::new(false));

    let pipeline = Pipeline::new()
        .with_middleware(Flag(a_ran.clone()))
        .with_middleware(FnMiddleware::new("gate", |_request, _next| {
            Ok(Response::new("denied", StatusCode::FORBIDDEN))
        }))
        .with_middleware(Flag(b_ran.clone()))
        .with_middleware(Base("never"));

    let response = pipeline.handle(&mut Request::default()).unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.content_str(), Some("denied"));
    assert!(a_ran.load(Ordering::SeqCst));
    assert!(!b_ran.load(Ordering::SeqCst));
}

#[test]
fn test_request_modifications_flow_inward() {
    let pipeline = Pipeline::new()
        .with_middleware(FnMiddleware::new("annotate", |request, next| {
            request.query_mut().set("seen_by", "annotate")?;
            next.run(request)
        }))
        .with_middleware(FnMiddleware::new("echo", |request, _next| {
            Ok(Response::ok(request.query().get_string("seen_by", "nobody")?))
        }));

    let response = pipeline.handle(&mut Request::default()).unwrap();
    assert_eq!(response.content_str(), Some("annotate"));
}

#[test]
fn test_validation_failure_becomes_400() {
    let pipeline = Pipeline::new().with_middleware(FnMiddleware::new("reader", |request, _next| {
        let page = request.query().get_int("page", 1)?;
        Ok(Response::ok(page.to_string()))
    }));

    let mut request = Request::builder()
        .query_param("page", Value::List(vec![Value::List(Vec::new())]))
        .build();
    let response = pipeline.dispatch(&mut request, &ErrorHandler::new());

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = error_json(&response);
    assert_eq!(json["error"]["code"], 400);
    assert_eq!(json["error"]["kind"], "invalid_input");
    assert!(json["error"]["message"].as_str().unwrap().contains("\"page\""));
}

#[test]
fn test_error_kinds_map_to_statuses() {
    let cases = [
        (HttpError::invalid_input("bad"), 400, "invalid_input"),
        (HttpError::not_found("gone"), 404, "not_found"),
        (HttpError::unclassified("oops"), 500, "unclassified"),
    ];

    for (error, status, kind) in cases {
        let response = ErrorHandler::new().handle(&error);
        assert_eq!(response.status().as_u16(), status);

        let json = error_json(&response);
        assert_eq!(json["error"]["code"], status);
        assert_eq!(json["error"]["kind"], kind);
        assert_eq!(json["error"]["message"], error.message());
    }
}

#[test]
fn test_unit_may_convert_a_specific_failure() {
    let pipeline = Pipeline::new()
        .with_middleware(FnMiddleware::new("not_found_page", |request, next| {
            match next.run(request) {
                Err(HttpError::NotFound { message }) => Ok(Response::new(format!("<h1>{message}</h1>"), StatusCode::NOT_FOUND)),
                other => other,
            }
        }))
        .with_middleware(FnMiddleware::new("lookup", |_request, _next| {
            Err(HttpError::not_found("Article 9 does not exist"))
        }));

    let response = pipeline.dispatch(&mut Request::default(), &ErrorHandler::new());
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.content_str(), Some("<h1>Article 9 does not exist</h1>"));
}

#[test]
fn test_full_cycle_from_http_to_transport() {
    let pipeline = Pipeline::new()
        .with_middleware(FnMiddleware::new("session_cookie", |request, next| {
            let response = next.run(request)?;
            let uri = request.request_uri().to_string();
            request.cookies_mut().set("visited", uri)?;
            Ok(response)
        }))
        .with_middleware(FnMiddleware::new("greet", |request, _next| {
            let name = request.query().get_string("name", "stranger")?;
            Ok(Response::ok(format!("hello {name}")).with_header("Content-Type", "text/plain"))
        }));

    let http = http::Request::get("/greet?name=ada").body(Bytes::new()).unwrap();
    let mut request = Request::from_http(&http, None);
    let response = pipeline.dispatch(&mut request, &ErrorHandler::new());

    let mut transport = BufferedTransport::new();
    response.send(&mut transport);

    assert_eq!(transport.status(), Some(StatusCode::OK));
    assert_eq!(transport.header("content-type"), Some("text/plain"));
    assert!(transport.header("set-cookie").unwrap().starts_with("visited=%2Fgreet%3Fname%3Dada;"));
    assert_eq!(transport.body(), b"hello ada");
}

#[test]
fn test_pipeline_shared_across_threads() {
    let pipeline = Arc::new(
        Pipeline::new()
            .with_middleware(Marker("!"))
            .with_middleware(FnMiddleware::new("echo", |request, _next| {
                Ok(Response::ok(request.query().get_string("n", "")?))
            })),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            std::thread::spawn(move || {
                let mut request = Request::builder().query_param("n", i.to_string()).build();
                pipeline.handle(&mut request).unwrap().content_str().map(ToString::to_string)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(format!("{i}!")));
    }
}
