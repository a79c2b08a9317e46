//! Shared helpers for HTTP-level integration tests.
//!
//! Every test app runs on an in-memory user store, a manual clock and a
//! cheap Argon2 cost, behind the same router and middleware as the binary.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use talent_api::auth::jwt::JwtConfig;
use talent_api::auth::password::PasswordConfig;
use talent_api::config::{AppEnv, ServerConfig};
use talent_api::router::build_app_router;
use talent_api::state::AppState;
use talent_core::clock::ManualClock;
use talent_db::MemoryUserStore;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "Sup3r-secret!";

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryUserStore>,
}

impl TestApp {
    /// A fresh handle to the router; `oneshot` consumes it.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        env: AppEnv::Test,
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".into()],
        request_timeout_secs: 30,
        database_url: None,
        jwt: JwtConfig::with_secret(TEST_SECRET),
        password: PasswordConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        },
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::new(config.clone(), store.clone(), clock.clone())
        .expect("test hashing parameters are valid");

    TestApp {
        router: build_app_router(state, &config),
        clock,
        store,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn get_with_header(app: Router, uri: &str, name: &str, value: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

pub fn registration(email: &str) -> Value {
    json!({
        "email": email,
        "password": TEST_PASSWORD,
        "first_name": "Ada",
        "last_name": "Lovelace",
    })
}

/// Register `email` and return the response body.
pub async fn register_user(app: Router, email: &str) -> Value {
    let response = post_json(app, "/api/v1/auth/register", registration(email)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Register `email` and return its token.
pub async fn register_token(app: Router, email: &str) -> String {
    let json = register_user(app, email).await;
    json["token"].as_str().unwrap().to_string()
}
