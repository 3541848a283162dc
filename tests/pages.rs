mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use tollgate::pages;
use tollgate::server::Server;
use warp::Filter;
use warp::hyper::body::Bytes;
use warp::http::{Response, StatusCode};
use warp::http::header::{LOCATION, SET_COOKIE};

async fn server() -> Arc<Server> {
    Arc::new(Server::try_new(&settings()).await.unwrap())
}

fn login_request(email: &str) -> warp::test::RequestBuilder {
    warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": email, "password": "123456" }))
}

/// The cookie header a browser sends after receiving `response`.
fn cookies_from(response: &Response<Bytes>) -> String {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/dashboard");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn landing_is_public() {
    let routes = pages::routes(server().await).recover(pages::recover_error);

    let response = warp::test::request().path("/").reply(&routes).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_page_without_cookies_redirects_to_landing() {
    let routes = pages::routes(server().await).recover(pages::recover_error);

    let response = warp::test::request().path("/dashboard").reply(&routes).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/");
}

#[tokio::test]
async fn administrator_sees_metrics() {
    let routes = pages::routes(server().await).recover(pages::recover_error);
    let cookie = cookies_from(&login_request(ADMIN).reply(&routes).await);
    assert!(cookie.contains("session.token="));
    assert!(cookie.contains("session.refreshToken="));

    let response = warp::test::request()
        .path("/metrics")
        .header("cookie", &cookie)
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(String::from_utf8_lossy(response.body()).contains("Metrics"));
}

#[tokio::test]
async fn editor_is_sent_back_to_the_dashboard() {
    let routes = pages::routes(server().await).recover(pages::recover_error);
    let cookie = cookies_from(&login_request(EDITOR).reply(&routes).await);

    let metrics = warp::test::request()
        .path("/metrics")
        .header("cookie", &cookie)
        .reply(&routes)
        .await;
    assert_eq!(metrics.status(), StatusCode::FOUND);
    assert_eq!(metrics.headers()[LOCATION], "/dashboard");

    let dashboard = warp::test::request()
        .path("/dashboard")
        .header("cookie", &cookie)
        .reply(&routes)
        .await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert!(String::from_utf8_lossy(dashboard.body()).contains(EDITOR));
}

#[tokio::test]
async fn rejected_session_is_cleared_from_the_browser() {
    let routes = pages::routes(server().await).recover(pages::recover_error);
    let cookie = "session.token=forged; session.refreshToken=forged";

    let response = warp::test::request()
        .path("/dashboard")
        .header("cookie", cookie)
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/");
    let cleared: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
    assert_eq!(cleared.len(), 2);
    assert!(
        cleared
            .iter()
            .all(|v| v.to_str().unwrap().contains("Max-Age=0"))
    );
}

#[tokio::test]
async fn failed_login_returns_to_landing() {
    let routes = pages::routes(server().await).recover(pages::recover_error);

    let response = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": ADMIN, "password": "nope" }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/");
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn malformed_login_is_a_bad_request() {
    let routes = pages::routes(server().await).recover(pages::recover_error);

    let response = warp::test::request()
        .method("POST")
        .path("/login")
        .body("not json")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
