// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, Response},
};
use notiq::config::Config;
use notiq::db::FirestoreDb;
use notiq::routes::create_router;
use notiq::services::MemoryAttachmentStore;
use notiq::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Everything a test needs to drive the API in-process.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub uploads: Arc<MemoryAttachmentStore>,
}

/// Create a test app on the in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> TestApp {
    let uploads = Arc::new(MemoryAttachmentStore::new());
    let state = Arc::new(AppState::new(
        config,
        FirestoreDb::new_in_memory(),
        uploads.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        uploads,
    }
}

/// Send one request through a fresh clone of the router.
#[allow(dead_code)]
pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign up and log in, returning `(user_id, token)`.
#[allow(dead_code)]
pub async fn signup_and_login(app: &TestApp, email: &str) -> (String, String) {
    let credentials = serde_json::json!({ "email": email, "password": "hunter22" });

    let response = send(app, json_request("POST", "/api/auth/signup", None, credentials.clone())).await;
    assert_eq!(response.status(), 201, "signup failed for {}", email);

    let response = send(app, json_request("POST", "/api/auth/login", None, credentials)).await;
    assert_eq!(response.status(), 200, "login failed for {}", email);
    let body = body_json(response).await;

    (
        body["userId"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Create a note through the API and return its JSON.
#[allow(dead_code)]
pub async fn create_note(app: &TestApp, token: &str, body: Value) -> Value {
    let response = send(app, json_request("POST", "/api/notes", Some(token), body)).await;
    assert_eq!(response.status(), 201);
    body_json(response).await
}
