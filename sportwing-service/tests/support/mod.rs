#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use common_auth::{JwtConfig, TokenIssuer};
use serde_json::{json, Value};
use sportwing_service::gateway::StubProcessor;
use sportwing_service::memory_store::MemoryStore;
use sportwing_service::{router, AppState};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-access-secret";

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub payments: Arc<StubProcessor>,
    pub issuer: TokenIssuer,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let payments = Arc::new(StubProcessor::new());
        let state = AppState::new(
            Arc::new(store.clone()),
            JwtConfig::new(TEST_SECRET),
            payments.clone(),
            "usd",
        )
        .expect("app state");
        Self {
            router: router(state),
            store,
            payments,
            issuer: TokenIssuer::new(JwtConfig::new(TEST_SECRET)),
        }
    }

    pub fn token_for(&self, email: &str) -> String {
        let claims = json!({ "email": email });
        self.issuer
            .issue(claims.as_object().cloned().unwrap())
            .expect("sign token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send_with_headers(request).await;
        (status, body)
    }

    pub async fn send_with_headers(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = self.router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), 1024 * 64).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, headers, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("GET", uri, token, None)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("DELETE", uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request("POST", uri, token, Some(body))).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request("PATCH", uri, token, Some(body))).await
    }

    /// Creates a user through the API and returns its id.
    pub async fn create_user(&self, email: &str) -> String {
        let (status, body) = self
            .post("/users", None, json!({ "email": email, "name": "Test User" }))
            .await;
        assert_eq!(status, StatusCode::OK, "create user: {body}");
        body["insertedId"].as_str().expect("insertedId").to_string()
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
