//! In-process HTTP client over the router (no socket).

use agree_core::kernel::TestDependencies;
use agree_core::server::build_app;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct ApiClient {
    router: Router,
}

impl ApiClient {
    pub fn new(deps: &TestDependencies) -> Self {
        Self {
            router: build_app(deps.server_deps(), None, &[]),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Register and log in; returns the bearer token
    pub async fn sign_up(&self, username: &str, party: &str, interests: &[&str]) -> String {
        let email = format!("{username}@example.com");
        let (status, body) = self
            .post(
                "/register",
                None,
                json!({
                    "username": username,
                    "email": email,
                    "password": "hunter2",
                    "party": party,
                    "interests": interests,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");

        let (status, body) = self
            .post("/login", None, json!({ "email": email, "password": "hunter2" }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        body["token"].as_str().unwrap().to_string()
    }
}
