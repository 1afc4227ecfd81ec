#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use beatinblink_gateway::{
    config::Config, routes, services::platform_client::PlatformClient, AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub fn test_config(platform_url: &str) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        platform_api_url: platform_url.into(),
        jwt_secret: "test_secret_key".into(),
        session_ttl_hours: 24,
        guest_code_ttl_hours: 24,
        allowed_origin: None,
        platform_timeout_secs: 5,
    }
}

pub fn app(platform_url: &str) -> Router {
    let config = test_config(platform_url);
    let platform = PlatformClient::new(platform_url, Duration::from_secs(5)).expect("client");
    routes::router(AppState::new(&config, Arc::new(platform)))
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("response")
}

pub async fn body_json(resp: Response<Body>) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: JsonValue) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

/// Mounts a platform login for `role` ("student" or "institute") and signs in.
pub async fn login(app: &Router, server: &MockServer, role: &str, remote_token: &str) -> String {
    Mock::given(method("POST"))
        .and(path(format!("/auth/{}/login", role)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": remote_token,
            "user": { "_id": format!("{}-1", role), "name": "Asha", "email": "asha@example.com" }
        })))
        .mount(server)
        .await;

    let resp = send(
        app,
        json_request(
            "POST",
            &format!("/api/auth/{}/login", role),
            None,
            json!({ "email": "asha@example.com", "password": "secret" }),
        ),
    )
    .await;
    assert_eq!(resp.status(), 200);
    body_json(resp).await["token"]
        .as_str()
        .expect("token")
        .to_string()
}

pub async fn guest_login(app: &Router, server: &MockServer) -> String {
    Mock::given(method("POST"))
        .and(path("/guest/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "guestCode": "G-123" })))
        .mount(server)
        .await;

    let resp = send(
        app,
        json_request(
            "POST",
            "/api/auth/guest",
            None,
            json!({ "name": "Visitor", "email": "visitor@example.com" }),
        ),
    )
    .await;
    assert_eq!(resp.status(), 200);
    body_json(resp).await["token"]
        .as_str()
        .expect("token")
        .to_string()
}
