//! Image upload pipeline over the full router, in both storage modes.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use imovia::config::{AppConfig, UploadMode};

use common::{delete, login, test_app, test_app_with_config};

const BOUNDARY: &str = "test-upload-boundary";

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 40, 40]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(
    app: &Router,
    cookie: Option<&str>,
    files: &[(&str, &[u8])],
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/upload/images")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::from(multipart_body(files))).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn upload_requires_a_session() {
    let app = test_app().await;
    let png = sample_png(8, 8);
    let (status, _) = upload(&app, None, &[("foto.png", &png)]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inline_mode_returns_jpeg_data_urls() {
    let app = test_app().await;
    let cookie = login(&app).await;

    let png = sample_png(16, 16);
    let (status, body) = upload(&app, Some(&cookie), &[("a.png", &png), ("b.png", &png)]).await;

    assert_eq!(status, StatusCode::CREATED);
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    for url in images {
        assert!(url.as_str().unwrap().starts_with("data:image/jpeg;base64,"));
    }
}

#[tokio::test]
async fn non_image_payloads_are_rejected() {
    let app = test_app().await;
    let cookie = login(&app).await;

    let (status, body) = upload(&app, Some(&cookie), &[("nota.txt", b"plain text")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn one_bad_file_fails_the_whole_batch() {
    let app = test_app().await;
    let cookie = login(&app).await;

    let png = sample_png(8, 8);
    let (status, _) = upload(
        &app,
        Some(&cookie),
        &[("a.png", png.as_slice()), ("b.txt", b"not an image")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn file_count_limit_is_enforced() {
    // The test preset allows 3 files
    let app = test_app().await;
    let cookie = login(&app).await;

    let png = sample_png(4, 4);
    let files: Vec<_> = (0..4).map(|_| ("x.png", png.as_slice())).collect();
    let (status, _) = upload(&app, Some(&cookie), &files).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn disk_mode_writes_serves_and_deletes_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::test();
    config.upload.mode = UploadMode::Disk;
    config.upload.dir = dir.path().to_str().unwrap().to_string();
    let app = test_app_with_config(config).await;
    let cookie = login(&app).await;

    let png = sample_png(8, 8);
    let (status, body) = upload(&app, Some(&cookie), &[("foto.png", &png)]).await;
    assert_eq!(status, StatusCode::CREATED);

    let url = body["images"][0].as_str().unwrap().to_string();
    let filename = url.strip_prefix("/uploads/").unwrap().to_string();
    assert!(filename.ends_with(".jpg"));
    let on_disk = dir.path().join(&filename);
    assert!(on_disk.exists());

    // Stored bytes are re-encoded JPEG, not the original PNG
    let stored = std::fs::read(&on_disk).unwrap();
    assert!(stored.starts_with(&[0xFF, 0xD8, 0xFF]));

    // Served back through the static route
    let response = app
        .clone()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _, _) = delete(
        &app,
        &format!("/api/upload/images/{}", filename),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!on_disk.exists());

    let (status, _, _) = delete(
        &app,
        &format!("/api/upload/images/{}", filename),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_disk_batch_leaves_no_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::test();
    config.upload.mode = UploadMode::Disk;
    config.upload.dir = dir.path().to_str().unwrap().to_string();
    let app = test_app_with_config(config).await;
    let cookie = login(&app).await;

    // The good file is written to disk before the bad one is rejected
    let png = sample_png(8, 8);
    let (status, body) = upload(
        &app,
        Some(&cookie),
        &[("boa.png", png.as_slice()), ("falsa.png", b"not an image")],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn delete_rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::test();
    config.upload.mode = UploadMode::Disk;
    config.upload.dir = dir.path().to_str().unwrap().to_string();
    let app = test_app_with_config(config).await;
    let cookie = login(&app).await;

    let (status, _, _) = delete(&app, "/api/upload/images/..%2F..%2Fetc", Some(&cookie)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
