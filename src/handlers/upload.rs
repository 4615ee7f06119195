//! Image upload pipeline.
//!
//! Every accepted file is sniffed by magic bytes, fully decoded, bounded in
//! dimensions, scaled down when oversized and re-encoded as JPEG, so nothing
//! a client sent is ever served byte-for-byte. Disk mode writes the result
//! under the upload directory; inline mode returns base64 data URLs for
//! deployments without a writable filesystem.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::UploadMode;
use crate::error::ApiError;
use crate::state::AppState;

const JPEG_QUALITY: u8 = 80;
/// Decoded dimension cap, independent of the resize target. A decompression
/// bomb is rejected here before any pixel work.
const MAX_SOURCE_DIMENSION: u32 = 10_000;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedFormat {
    Jpeg,
    Png,
    Webp,
}

/// Identify the container by magic bytes; declared content types are ignored.
pub fn sniff_format(bytes: &[u8]) -> Option<SniffedFormat> {
    if bytes.starts_with(JPEG_MAGIC) {
        return Some(SniffedFormat::Jpeg);
    }
    if bytes.starts_with(PNG_MAGIC) {
        return Some(SniffedFormat::Png);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(SniffedFormat::Webp);
    }
    None
}

/// Decode, bound, scale and re-encode an upload as JPEG.
pub fn process_image(bytes: &[u8], max_dimension: u32) -> Result<Vec<u8>, ApiError> {
    sniff_format(bytes)
        .ok_or_else(|| ApiError::bad_request("Unsupported image format (expected JPEG, PNG or WebP)"))?;

    let img = image::load_from_memory(bytes)
        .map_err(|_| ApiError::bad_request("File could not be decoded as an image"))?;

    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 || width > MAX_SOURCE_DIMENSION || height > MAX_SOURCE_DIMENSION {
        return Err(ApiError::bad_request("Image dimensions out of bounds"));
    }

    let img = if width > max_dimension || height > max_dimension {
        img.thumbnail(max_dimension, max_dimension)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode_image(&rgb).map_err(|e| {
        tracing::error!("jpeg encoding failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;
    Ok(out)
}

/// POST /api/upload/images (multipart, field name `images`, repeatable)
pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut written: Vec<PathBuf> = Vec::new();
    match ingest(&state, &mut multipart, &mut written).await {
        Ok(urls) => Ok((StatusCode::CREATED, Json(json!({"images": urls})))),
        Err(err) => {
            // One bad file fails the whole request; nothing stays on disk.
            for path in written {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("failed to clean up {}: {}", path.display(), e);
                }
            }
            Err(err)
        }
    }
}

async fn ingest(
    state: &AppState,
    multipart: &mut Multipart,
    written: &mut Vec<PathBuf>,
) -> Result<Vec<String>, ApiError> {
    let upload = &state.config.upload;
    let mut urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {}", e)))?
    {
        if field.name() != Some("images") {
            continue;
        }
        if urls.len() >= upload.max_files {
            return Err(ApiError::bad_request(format!(
                "Too many files (maximum {})",
                upload.max_files
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Empty file"));
        }
        if bytes.len() > upload.max_file_bytes {
            return Err(ApiError::bad_request(format!(
                "File too large (maximum {} bytes)",
                upload.max_file_bytes
            )));
        }

        let encoded = process_image(&bytes, upload.max_dimension)?;
        match upload.mode {
            UploadMode::Disk => {
                tokio::fs::create_dir_all(&upload.dir).await.map_err(|e| {
                    tracing::error!("failed to create upload dir: {}", e);
                    ApiError::internal_server_error("Failed to store uploaded file")
                })?;
                let filename = format!("{}.jpg", Uuid::new_v4());
                let path = FsPath::new(&upload.dir).join(&filename);
                tokio::fs::write(&path, &encoded).await.map_err(|e| {
                    tracing::error!("failed to write {}: {}", path.display(), e);
                    ApiError::internal_server_error("Failed to store uploaded file")
                })?;
                written.push(path);
                urls.push(format!("/uploads/{}", filename));
            }
            UploadMode::Inline => {
                urls.push(format!("data:image/jpeg;base64,{}", BASE64.encode(&encoded)));
            }
        }
    }

    if urls.is_empty() {
        return Err(ApiError::bad_request("No image files in request"));
    }
    Ok(urls)
}

/// DELETE /api/upload/images/:filename
pub async fn delete_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<StatusCode, ApiError> {
    // The path parameter must name a file directly inside the upload dir.
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
    {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let path = FsPath::new(&state.config.upload.dir).join(&filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found("File not found"))
        }
        Err(e) => {
            tracing::error!("failed to delete {}: {}", path.display(), e);
            Err(ApiError::internal_server_error(
                "An error occurred while processing your request",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 90, 60]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn sniffs_by_magic_bytes() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(SniffedFormat::Jpeg));
        assert_eq!(
            sniff_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Some(SniffedFormat::Png)
        );
        let mut webp = b"RIFF".to_vec();
        webp.extend_from_slice(&[0, 0, 0, 0]);
        webp.extend_from_slice(b"WEBP");
        assert_eq!(sniff_format(&webp), Some(SniffedFormat::Webp));
        assert_eq!(sniff_format(b"GIF89a"), None);
        assert_eq!(sniff_format(b"<html>"), None);
    }

    #[test]
    fn reencodes_png_as_jpeg() {
        let out = process_image(&sample_png(32, 16), 1600).unwrap();
        assert!(out.starts_with(JPEG_MAGIC));
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn scales_down_oversized_images() {
        let out = process_image(&sample_png(200, 100), 50).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(decoded.width() <= 50 && decoded.height() <= 50);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = process_image(b"just some text", 1600).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejects_mismatched_magic() {
        // PNG body with the magic bytes clobbered
        let mut bytes = sample_png(8, 8);
        bytes[0] = 0x00;
        assert!(process_image(&bytes, 1600).is_err());
    }
}
