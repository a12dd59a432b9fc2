// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

mod common;
use common::{body_json, create_note, create_test_app, json_request, send, signup_and_login};

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let app = create_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            json!({ "email": "not-an-email", "password": "secret1" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["email"], json!(["Invalid email format"]));
}

#[tokio::test]
async fn test_signup_rejects_short_password() {
    let app = create_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            json!({ "email": "short@example.com", "password": "12345" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_note_title_too_long() {
    let app = create_test_app();
    let (_, token) = signup_and_login(&app, "long@example.com").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/notes",
            Some(&token),
            json!({ "title": "a".repeat(201), "content": "Body" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["fields"]["title"].is_array());
}

#[tokio::test]
async fn test_note_invalid_difficulty() {
    let app = create_test_app();
    let (_, token) = signup_and_login(&app, "difficulty@example.com").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/notes",
            Some(&token),
            json!({ "title": "T", "content": "C", "difficulty": "Extreme" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["fields"]["difficulty"],
        json!(["Difficulty must be Easy, Medium, or Hard"])
    );
}

#[tokio::test]
async fn test_note_tag_limits() {
    let app = create_test_app();
    let (_, token) = signup_and_login(&app, "tags@example.com").await;

    let too_many: Vec<String> = (0..21).map(|i| format!("tag{}", i)).collect();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/notes",
            Some(&token),
            json!({ "title": "T", "content": "C", "tags": too_many }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/notes",
            Some(&token),
            json!({ "title": "T", "content": "C", "tags": ["x".repeat(31)] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_rejects_long_category() {
    let app = create_test_app();
    let (_, token) = signup_and_login(&app, "category@example.com").await;
    let note = create_note(&app, &token, json!({ "title": "T", "content": "C" })).await;

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/notes/{}", note["_id"].as_str().unwrap()),
            Some(&token),
            json!({ "category": "c".repeat(51) }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_note_fields_are_escaped() {
    let app = create_test_app();
    let (_, token) = signup_and_login(&app, "xss@example.com").await;

    let note = create_note(
        &app,
        &token,
        json!({
            "title": "<img src=x onerror=alert(1)>",
            "content": "Body",
            "tags": ["<b>"]
        }),
    )
    .await;

    assert_eq!(note["title"], "&lt;img src=x onerror=alert(1)&gt;");
    assert_eq!(note["tags"], json!(["&lt;b&gt;"]));
}

#[tokio::test]
async fn test_content_only_update_keeps_escaped_title() {
    let app = create_test_app();
    let (_, token) = signup_and_login(&app, "amp@example.com").await;

    let note = create_note(&app, &token, json!({ "title": "a&b", "content": "Body" })).await;
    assert_eq!(note["title"], "a&amp;b");

    let uri = format!("/api/notes/{}", note["_id"].as_str().unwrap());
    let response = send(
        &app,
        json_request("PUT", &uri, Some(&token), json!({ "content": "Edited" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["title"], "a&amp;b");
    assert_eq!(updated["content"], "Edited");
}

#[tokio::test]
async fn test_whitespace_is_trimmed() {
    let app = create_test_app();
    let (_, token) = signup_and_login(&app, "trim@example.com").await;

    let note = create_note(
        &app,
        &token,
        json!({
            "title": "  Padded  ",
            "content": "Body",
            "category": " Work ",
            "tags": [" a ", "  "]
        }),
    )
    .await;

    assert_eq!(note["title"], "Padded");
    assert_eq!(note["category"], "Work");
    assert_eq!(note["tags"], json!(["a"]));
}
