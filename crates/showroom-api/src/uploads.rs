//! Image uploads for catalog items, kept on local disk.

use std::path::Path;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use showroom_types::api::UploadResponse;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 10 MB upload limit
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
];

/// Lower-cased extension of `name`, if any.
fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn content_type(name: &str) -> &'static str {
    extension(name)
        .and_then(|ext| IMAGE_TYPES.iter().find(|(e, _)| *e == ext).map(|(_, ct)| *ct))
        .unwrap_or("application/octet-stream")
}

/// Final path component only, so `../../etc/passwd` becomes `passwd`.
fn basename(name: &str) -> Option<&str> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name; only its extension is kept.
    pub name: Option<String>,
}

/// POST /api/uploads?name=photo.jpg — raw image bytes in the body.
pub async fn upload_image(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> ApiResult<impl IntoResponse> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(ApiError::PayloadTooLarge("File exceeds the 10 MB limit".to_string()));
    }

    let ext = query
        .name
        .as_deref()
        .and_then(extension)
        .filter(|ext| IMAGE_TYPES.iter().any(|(e, _)| *e == ext.as_str()))
        .ok_or_else(|| {
            warn!("Rejected upload with name {:?}", query.name);
            ApiError::bad_request("Only image files are allowed")
        })?;

    tokio::fs::create_dir_all(&state.uploads_dir).await.map_err(|e| {
        error!("Failed to create uploads directory: {}", e);
        ApiError::Internal("uploads directory unavailable".to_string())
    })?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    let file_path = state.uploads_dir.join(&file_name);
    let mut file = tokio::fs::File::create(&file_path).await.map_err(|e| {
        error!("Failed to create file {}: {}", file_path.display(), e);
        ApiError::Internal("could not store file".to_string())
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", file_path.display(), e);
        ApiError::Internal("could not store file".to_string())
    })?;

    info!("Stored upload {} ({} bytes)", file_name, bytes.len());
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            path: format!("/uploads/{file_name}"),
            size: bytes.len() as u64,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file: Option<String>,
}

/// GET /api/uploads?file=<name> (public)
pub async fn serve_upload(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<impl IntoResponse> {
    let name = query
        .file
        .as_deref()
        .and_then(basename)
        .ok_or_else(|| ApiError::bad_request("No file specified"))?
        .to_string();

    let file_path = state.uploads_dir.join(&name);
    let bytes = tokio::fs::read(&file_path).await.map_err(|e| {
        warn!("Upload {} not readable: {}", file_path.display(), e);
        ApiError::not_found("File")
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&name)),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.PNG"), "image/png");
        assert_eq!(content_type("photo.jpeg"), "image/jpeg");
        assert_eq!(content_type("logo.svg"), "image/svg+xml");
        assert_eq!(content_type("notes.txt"), "application/octet-stream");
        assert_eq!(content_type("noext"), "application/octet-stream");
    }

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("../../etc/passwd"), Some("passwd"));
        assert_eq!(basename("img.png"), Some("img.png"));
        assert_eq!(basename(".."), None);
    }
}
