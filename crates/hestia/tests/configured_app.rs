//! A configured application handling requests end to end.

use bytes::Bytes;
use hestia::prelude::*;
use http::StatusCode;

const CONFIG: &str = r#"
[server]
trusted_proxies = ["10.0.0.1"]

[cookies]
same_site = "lax"
expires_in_secs = 3600

[logging]
enabled = false
"#;

fn load_config() -> HestiaConfig {
    ConfigLoader::new().with_string(CONFIG, "toml").unwrap().load().unwrap()
}

fn app() -> Pipeline {
    Pipeline::new()
        .with_middleware(FnMiddleware::new("remember_client", |request, next| {
            let client = request.server().client_ip().unwrap_or("unknown").to_string();
            request.cookies_mut().set("client", client)?;
            next.run(request)
        }))
        .with_middleware(FnMiddleware::new("orders", |request, _next| {
            if request.request_uri().starts_with("/orders") {
                let page = request.query().get_int("page", 1)?;
                Ok(Response::ok(format!("page {page}")))
            } else {
                Err(HttpError::not_found(format!("{} does not exist", request.request_uri())))
            }
        }))
}

fn ingest(config: &HestiaConfig, uri: &str) -> Request {
    let http = http::Request::get(uri)
        .header("X-Forwarded-For", "198.51.100.4")
        .body(Bytes::new())
        .unwrap();
    let peer = "10.0.0.1:52100".parse().ok();
    config.configure(RequestBuilder::from_http(&http, peer)).build()
}

#[test]
fn test_configured_request_succeeds() {
    let config = load_config();
    init_logging(&config.log_config()).unwrap();

    let mut request = ingest(&config, "/orders?page=3");
    let response = app().dispatch(&mut request, &ErrorHandler::new());

    let mut transport = BufferedTransport::new();
    response.send(&mut transport);

    assert_eq!(transport.status(), Some(StatusCode::OK));
    assert_eq!(transport.body(), b"page 3");

    let cookie = transport.header("set-cookie").unwrap();
    assert!(cookie.starts_with("client=198.51.100.4; Expires="));
    assert!(cookie.ends_with("; Path=/; Secure; HttpOnly; SameSite=Lax"));
}

#[test]
fn test_configured_request_not_found() {
    let config = load_config();
    let mut request = ingest(&config, "/invoices");
    let response = app().dispatch(&mut request, &ErrorHandler::new());

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert!(response.content_str().unwrap().contains("/invoices does not exist"));
    assert_eq!(response.set_cookies().len(), 1);
}

#[test]
fn test_invalid_query_is_rejected() {
    let config = load_config();
    let mut request = ingest(&config, "/orders?page=first");
    let response = app().dispatch(&mut request, &ErrorHandler::new());

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.content_str().unwrap().contains("\"kind\":\"invalid_input\""));
}
