#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use openshelter::testing::{test_state, MemoryStore};

pub const STAFF_EMAIL: &str = "staff@openshelter.test";
pub const STAFF_PASSWORD: &str = "kennel-keys-42";

/// Router over an in-memory store seeded with one staff account.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new().with_user(STAFF_EMAIL, "Shelter Staff", STAFF_PASSWORD));
    let router = openshelter::app(test_state(store.clone()));
    TestApp { router, store }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("router is infallible")
    }

    /// Sign in through the form and return the `Cookie` header value.
    pub async fn sign_in(&self) -> String {
        let response = self.submit_sign_in(STAFF_EMAIL, STAFF_PASSWORD, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("sign-in sets the session cookie")
    }

    pub async fn submit_sign_in(&self, email: &str, password: &str, callback: Option<&str>) -> Response {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("email", email).append_pair("password", password);
        if let Some(callback) = callback {
            form.append_pair("callbackUrl", callback);
        }
        let request = Request::builder()
            .method(Method::POST)
            .uri("/signin")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let response = self.send(request).await;
        (response.status(), body_json(response).await)
    }

    pub async fn send_json(&self, method: Method, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.send(request).await;
        (response.status(), body_json(response).await)
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send_json(Method::POST, uri, cookie, body).await
    }

    pub async fn put(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send_json(Method::PUT, uri, cookie, body).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> StatusCode {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await.status()
    }

    /// Create an animal and return its id.
    pub async fn create_animal(&self, cookie: &str, body: Value) -> String {
        let (status, json) = self.post("/dashboard/animals", cookie, body).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["id"].as_str().unwrap().to_string()
    }
}

/// `name=value` of the session cookie set by a response, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = set_cookie.split(';').next()?.trim();
    pair.starts_with("openshelter_session=").then(|| pair.to_string())
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}
