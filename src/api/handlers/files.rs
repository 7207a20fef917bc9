use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use super::{blocking, bucket, object};
use crate::api::response::{ApiError, AppQuery, JSend};
use crate::check::ImageCheck;
use crate::content::check_hash;
use crate::error::{Locale, StoreError};
use crate::upload::Upload;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    /// Object to link the uploaded files to, `table|id[|field]`
    #[serde(default)]
    pub link_object: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Content hashes in upload order
    pub files: Vec<String>,
    pub object: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Store uploaded images and optionally link them to an object.
/// Route: POST /buckets/:bucket/images
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    Path(bucket_name): Path<String>,
    AppQuery(params): AppQuery<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<JSend<UploadResponse>>, ApiError> {
    let locale = params
        .lang
        .as_deref()
        .map(Locale::from_code)
        .unwrap_or_default();
    let bucket = bucket(&state, &bucket_name, locale)?;

    let link_object = match params.link_object.as_deref() {
        Some(raw) if !raw.is_empty() => Some(object(raw, locale)?.to_string()),
        _ => None,
    };

    let mut uploads = Vec::new();
    let mut total: u64 = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

        total += data.len() as u64;
        if total > state.config.max_upload_size {
            return Err(ApiError::payload_too_large(format!(
                "Upload exceeds maximum size of {} bytes",
                state.config.max_upload_size
            )));
        }

        let mut upload = Upload::from_bytes(data);
        upload.file_name = file_name;
        upload.content_type = content_type;
        uploads.push(upload);
    }

    if uploads.is_empty() {
        return Err(ApiError::from_store(StoreError::NoFiles, locale));
    }

    let object = link_object.clone().unwrap_or_default();
    let files = blocking(
        move || bucket.save(None, &ImageCheck::default(), &object, uploads),
        locale,
    )
    .await?;

    tracing::debug!(bucket = %bucket_name, files = files.len(), "Uploaded images");

    Ok(JSend::success(UploadResponse {
        files,
        object: link_object,
    }))
}

/// Stream the bytes of a stored file.
/// Route: GET /buckets/:bucket/files/:hash
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, hash)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let bucket = bucket(&state, &bucket_name, Locale::En)?;
    check_hash(&[&hash])?;

    let record = blocking(
        {
            let bucket = Arc::clone(&bucket);
            let hash = hash.clone();
            move || bucket.ledger().file_record(None, &hash)
        },
        Locale::En,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("File not found"))?;

    let file = match tokio::fs::File::open(bucket.content().path_for(&hash)).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("File content not found"));
        }
        Err(e) => return Err(ApiError::internal(format!("Failed to open file: {e}"))),
    };

    let mut response = (StatusCode::OK, Body::from_stream(ReaderStream::new(file))).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        record
            .content_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(record.byte_size));
    if let Ok(value) = format!("\"{hash}\"").parse() {
        headers.insert(header::ETAG, value);
    }

    // Content never changes under a hash
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    Ok(response)
}
