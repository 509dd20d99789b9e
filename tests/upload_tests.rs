// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload endpoint tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

mod common;
use common::send;

const BOUNDARY: &str = "trip-planner-test-boundary";

fn multipart_request(token: Option<&str>, field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_upload_requires_auth() {
    let (app, state, _) = common::create_test_app();

    let (status, _) = send(&app, multipart_request(None, "file", "cover.png", b"png")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!state.config.upload_dir.exists());
}

#[tokio::test]
async fn test_upload_stores_and_serves_file() {
    let (app, state, _) = common::create_test_app();
    let token = common::create_test_jwt("u1", "u1@example.com", &state.config.jwt_signing_key);

    let (status, body) = send(
        &app,
        multipart_request(Some(&token), "file", "cover.webp", b"not really an image"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let path = body["path"].as_str().unwrap();
    assert!(path.starts_with("/uploads/"));
    assert!(path.ends_with(".webp"));

    let response = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&served[..], b"not really an image");

    std::fs::remove_dir_all(&state.config.upload_dir).ok();
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let (app, state, _) = common::create_test_app();
    let token = common::create_test_jwt("u1", "u1@example.com", &state.config.jwt_signing_key);

    let (status, body) = send(&app, multipart_request(Some(&token), "other", "a.txt", b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "No file uploaded");
}
