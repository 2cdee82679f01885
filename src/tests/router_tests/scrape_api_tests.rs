use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{body_string, make_db, request};

// These tests only exercise request validation: every rejection here must
// happen before any browser process is launched.

#[test]
fn home_page_renders() {
    let db = make_db("home");
    let resp = handle(request("GET", "/", ""), &db).unwrap();
    assert_eq!(resp.status(), 200);
}

#[test]
fn health_endpoint_is_json_ok() {
    let db = make_db("health");
    let mut resp = handle(request("GET", "/health", ""), &db).unwrap();
    assert_eq!(resp.status(), 200);
    assert!(body_string(&mut resp).contains("ok"));
}

#[test]
fn unknown_route_is_not_found() {
    let db = make_db("notfound");
    let err = handle(request("GET", "/nope", ""), &db).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
}

#[test]
fn non_json_body_is_a_400() {
    let db = make_db("badbody");
    let mut resp = handle(request("POST", "/api/scrape", "not json"), &db).unwrap();
    assert_eq!(resp.status(), 400);
    assert!(body_string(&mut resp).contains("error"));
}

#[test]
fn body_without_url_is_a_400() {
    let db = make_db("nourl");
    let mut resp = handle(
        request("POST", "/api/scrape", r#"{"region_code":"mx"}"#),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(body_string(&mut resp).contains("error"));
}

#[test]
fn url_without_listing_id_is_a_400() {
    let db = make_db("noid");
    let mut resp = handle(
        request(
            "POST",
            "/api/scrape",
            r#"{"url":"https://www.airbnb.com/rooms/cozy-loft"}"#,
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
    let body = body_string(&mut resp);
    assert!(body.contains("error"));
    assert!(body.contains("listing id"));
}

#[test]
fn get_on_the_scrape_route_is_not_found() {
    let db = make_db("method");
    let err = handle(request("GET", "/api/scrape", ""), &db).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
}
