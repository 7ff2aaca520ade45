//! `POST /pattern` over the full route table

use pretty_assertions::assert_eq;
use rhombus_test_utils::{test_config, StubIdentityProvider, StubImageComposer, TestApp};
use rhombus_web::{routes, PatternResponse, ServerConfig};
use warp::http::StatusCode;

async fn post_lines(app: &TestApp, cookie: Option<&str>, body: &str) -> warp::http::Response<warp::hyper::body::Bytes> {
    let mut req = warp::test::request()
        .method("POST")
        .path("/pattern")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body.to_string());
    if let Some(cookie) = cookie {
        req = req.header("cookie", cookie);
    }
    req.reply(&routes(app.state.clone())).await
}

fn text(resp: &warp::http::Response<warp::hyper::body::Bytes>) -> String {
    String::from_utf8(resp.body().to_vec()).unwrap()
}

#[tokio::test]
async fn renders_three_lines() {
    let app = TestApp::new();
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), "lines=3").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: PatternResponse = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(
        body,
        PatternResponse {
            pattern: " F \nORM\n R ".to_string(),
            lines: 3,
            rows: 3,
            width: 3,
        }
    );
}

#[tokio::test]
async fn even_request_echoes_original_count() {
    let app = TestApp::new();
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), "lines=4").await;
    let body: PatternResponse = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body.lines, 4);
    assert_eq!(body.rows, 5);
    assert_eq!(body.width, 5);
    assert_eq!(body.pattern.lines().nth(2), Some("RMULA"));
}

#[tokio::test]
async fn requires_login() {
    let app = TestApp::new();
    let resp = post_lines(&app, None, "lines=3").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(text(&resp).contains("unauthorized"));
}

#[tokio::test]
async fn login_checked_before_input() {
    let app = TestApp::new();
    let resp = post_lines(&app, None, "lines=abc").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

async fn post_raw(
    app: &TestApp,
    cookie: Option<&str>,
    content_type: &str,
    body: Vec<u8>,
) -> warp::http::Response<warp::hyper::body::Bytes> {
    let mut req = warp::test::request()
        .method("POST")
        .path("/pattern")
        .header("content-type", content_type)
        .body(body);
    if let Some(cookie) = cookie {
        req = req.header("cookie", cookie);
    }
    req.reply(&routes(app.state.clone())).await
}

#[tokio::test]
async fn login_checked_before_body_framing() {
    let app = TestApp::new();

    let oversize = format!("lines=3&pad={}", "x".repeat(20 * 1024)).into_bytes();
    let resp = post_raw(&app, None, "application/x-www-form-urlencoded", oversize).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = post_raw(&app, None, "text/plain", b"lines=3".to_vec()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_framing_is_bad_request() {
    let app = TestApp::new();
    let cookie = app.login();

    let oversize = format!("lines=3&pad={}", "x".repeat(20 * 1024)).into_bytes();
    let resp = post_raw(
        &app,
        Some(&cookie),
        "application/x-www-form-urlencoded",
        oversize,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(text(&resp).contains("too large"));

    let resp = post_raw(&app, Some(&cookie), "text/plain", b"lines=3".to_vec()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_session_is_unauthorized() {
    let app = TestApp::new();
    let resp = post_lines(
        &app,
        Some("rhombus_session=0123456789abcdef0123456789abcdef"),
        "lines=3",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejects_non_positive() {
    let app = TestApp::new();
    let cookie = app.login();

    for body in ["lines=0", "lines=-3"] {
        let resp = post_lines(&app, Some(&cookie), body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(text(&resp).contains("positive"), "{body}");
    }
}

#[tokio::test]
async fn rejects_non_numeric() {
    let app = TestApp::new();
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), "lines=seven").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(text(&resp).contains("not a whole number"));
}

#[tokio::test]
async fn rejects_missing_field() {
    let app = TestApp::new();
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), "rows=3").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(text(&resp).contains("missing form field 'lines'"));
}

#[tokio::test]
async fn enforces_configured_cap() {
    let app = TestApp::new();
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), "lines=1002").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(text(&resp).contains("at most 1001"));
}

#[tokio::test]
async fn default_config_caps_huge_requests() {
    let app = TestApp::with(
        ServerConfig::default(),
        StubIdentityProvider::failing(),
        StubImageComposer::empty(),
    );
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), &format!("lines={}", i64::MAX)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(text(&resp).contains("at most"));
}

#[tokio::test]
async fn uncapped_config_still_rejects_unrepresentable_grid() {
    let app = TestApp::with(
        test_config().with_max_lines(None),
        StubIdentityProvider::failing(),
        StubImageComposer::empty(),
    );
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), &format!("lines={}", i64::MAX)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(text(&resp).contains("positive integer"));
}

#[tokio::test]
async fn uses_configured_word() {
    let app = TestApp::with(
        test_config().with_word("AB"),
        StubIdentityProvider::failing(),
        StubImageComposer::empty(),
    );
    let cookie = app.login();

    let resp = post_lines(&app, Some(&cookie), "lines=3").await;
    let body: PatternResponse = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body.pattern, " A \nBAB\n A ");
}

#[tokio::test]
async fn get_is_not_allowed() {
    let app = TestApp::new();
    let resp = warp::test::request()
        .method("GET")
        .path("/pattern")
        .reply(&routes(app.state.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
