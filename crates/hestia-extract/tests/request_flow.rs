//! Integration tests for request construction and the typed views.
//!
//! These tests walk a request through the lifecycle a host drives:
//!
//! 1. Ingestion - build the request from an `http::Request`
//! 2. Reads - validated access through each view
//! 3. Writes - cookies and uploads produce their side effects
//! 4. Emission - cookie directives reach the response

use bytes::Bytes;
use hestia_core::{BufferedTransport, ErrorKind, Response, Value};
use hestia_extract::{
    CookieOptions, Request, RequestBuilder, SameSite, UploadPolicy, UploadedFile,
};
use std::fs;

/// Creates a form POST with a cookie and forwarded header.
fn form_post(body: &'static str) -> http::Request<Bytes> {
    http::Request::post("/profile?tab=security")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("cookie", "sid=s-1; theme=dark")
        .header("x-forwarded-for", "198.51.100.20")
        .header("user-agent", "integration/1.0")
        .body(Bytes::from_static(body.as_bytes()))
        .unwrap()
}

#[test]
fn test_ingested_request_exposes_all_views() {
    let request = RequestBuilder::from_http(
        &form_post("display_name=Ada&roles[]=admin&roles[]=ops"),
        Some("10.0.0.5:40000".parse().unwrap()),
    )
    .trusted_proxies(vec!["10.0.0.5".parse().unwrap()])
    .build();

    assert_eq!(request.method(), "POST");
    assert_eq!(request.request_uri(), "/profile?tab=security");
    assert_eq!(request.query().get_string("tab", "").unwrap(), "security");
    assert_eq!(request.body().get_string("display_name", "").unwrap(), "Ada");
    assert_eq!(
        request.body().get("roles").unwrap().and_then(|v| v.as_sequence().map(<[_]>::len)),
        Some(2)
    );
    assert_eq!(request.cookies().get("theme"), Some("dark"));
    assert_eq!(request.server().client_ip(), Some("198.51.100.20"));
    assert_eq!(request.server().user_agent(), Some("integration/1.0"));
    assert_eq!(request.server().headers()["User-Agent"], "integration/1.0");
}

#[test]
fn test_untrusted_peer_cannot_spoof_client_ip() {
    let request = Request::from_http(&form_post(""), Some("192.0.2.50:1234".parse().unwrap()));
    assert_eq!(request.server().client_ip(), Some("192.0.2.50"));
}

#[test]
fn test_body_validation_surfaces_invalid_input() {
    let mut request = Request::default();
    let mut nested = indexmap_of("k", Value::from(1));
    nested.insert("j".to_string(), Value::from(2));

    let err = request.body_mut().set("obj", Value::Map(nested)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.status_code().as_u16(), 400);
}

#[test]
fn test_cookie_writes_reach_the_transport() {
    let mut request = Request::builder()
        .cookie("legacy", "1")
        .cookie_defaults(CookieOptions::default().domain("example.com"))
        .build();

    request
        .cookies_mut()
        .set_with("prefs", "a&b", CookieOptions::default().same_site(SameSite::Lax).expires_in_secs(60))
        .unwrap();
    request.cookies_mut().delete("legacy");

    let mut response = Response::ok("done");
    request.cookies_mut().apply_to(&mut response);

    let mut transport = BufferedTransport::new();
    response.send(&mut transport);

    let directives: Vec<&str> = transport.header_values("set-cookie").collect();
    assert_eq!(directives.len(), 2);
    assert!(directives[0].starts_with("prefs=a%26b; Expires="));
    assert!(directives[0].ends_with("SameSite=Lax"));
    assert!(directives[1].starts_with("legacy=; Expires="));
    assert!(directives[1].contains("Domain=example.com"));
    assert_eq!(transport.body(), b"done");
}

#[test]
fn test_upload_is_relocated_under_policy() {
    let workdir = tempfile::tempdir().unwrap();
    let tmp = workdir.path().join("upload-1");
    fs::write(&tmp, b"%PDF-1.7").unwrap();

    let request = Request::builder()
        .upload_policy(UploadPolicy {
            allowed_extensions: vec!["pdf".to_string()],
            max_file_size: 1024,
        })
        .file("invoice", UploadedFile::new("Invoice.PDF", 8, &tmp))
        .file("photo", UploadedFile::new("me.jpg", 8, &tmp))
        .build();

    assert!(!request.files().is_valid("photo"));
    assert!(!request.files().move_to("photo", workdir.path().join("out")).unwrap());
    assert!(request.files().move_to("invoice", workdir.path().join("out")).unwrap());
    assert_eq!(fs::read(workdir.path().join("out/Invoice.PDF")).unwrap(), b"%PDF-1.7");

    let err = request.files().move_to("invoice", workdir.path().join("out")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

fn indexmap_of(key: &str, value: Value) -> indexmap::IndexMap<String, Value> {
    let mut map = indexmap::IndexMap::new();
    map.insert(key.to_string(), value);
    map
}
