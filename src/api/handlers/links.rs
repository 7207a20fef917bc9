use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{blocking, bucket, object, LangParams};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesRequest {
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    pub object: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkedResponse {
    pub object: String,
    pub file: String,
    pub linked: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Route: GET /buckets/:bucket/objects/:object/files
pub async fn files_of(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, raw_object)): Path<(String, String)>,
    AppQuery(params): AppQuery<LangParams>,
) -> Result<Json<JSend<FilesResponse>>, ApiError> {
    let locale = params.locale();
    let bucket = bucket(&state, &bucket_name, locale)?;
    let object = object(&raw_object, locale)?.to_string();

    let files = blocking(
        {
            let object = object.clone();
            move || bucket.ledger().files_of(None, &object)
        },
        locale,
    )
    .await?;

    Ok(JSend::success(FilesResponse { object, files }))
}

/// Route: POST /buckets/:bucket/objects/:object/files
pub async fn link(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, raw_object)): Path<(String, String)>,
    AppQuery(params): AppQuery<LangParams>,
    AppJson(req): AppJson<FilesRequest>,
) -> Result<Json<JSend<FilesResponse>>, ApiError> {
    let locale = params.locale();
    let bucket = bucket(&state, &bucket_name, locale)?;
    let object = object(&raw_object, locale)?.to_string();

    let files = blocking(
        {
            let object = object.clone();
            move || {
                bucket.ledger().link(None, &object, &req.files)?;
                bucket.ledger().files_of(None, &object)
            }
        },
        locale,
    )
    .await?;

    Ok(JSend::success(FilesResponse { object, files }))
}

/// Route: PUT /buckets/:bucket/objects/:object/files
pub async fn link_only(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, raw_object)): Path<(String, String)>,
    AppQuery(params): AppQuery<LangParams>,
    AppJson(req): AppJson<FilesRequest>,
) -> Result<Json<JSend<FilesResponse>>, ApiError> {
    let locale = params.locale();
    let bucket = bucket(&state, &bucket_name, locale)?;
    let object = object(&raw_object, locale)?.to_string();

    let files = blocking(
        {
            let object = object.clone();
            move || {
                bucket.ledger().link_only(None, &object, &req.files)?;
                bucket.ledger().files_of(None, &object)
            }
        },
        locale,
    )
    .await?;

    Ok(JSend::success(FilesResponse { object, files }))
}

/// Route: DELETE /buckets/:bucket/objects/:object/files
pub async fn unlink_all(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, raw_object)): Path<(String, String)>,
    AppQuery(params): AppQuery<LangParams>,
) -> Result<Json<JSend<()>>, ApiError> {
    let locale = params.locale();
    let bucket = bucket(&state, &bucket_name, locale)?;
    let object = object(&raw_object, locale)?.to_string();

    blocking(move || bucket.ledger().unlink_all_of(None, &object), locale).await?;
    Ok(JSend::success(()))
}

/// Route: GET /buckets/:bucket/objects/:object/files/:hash
pub async fn linked(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, raw_object, file)): Path<(String, String, String)>,
    AppQuery(params): AppQuery<LangParams>,
) -> Result<Json<JSend<LinkedResponse>>, ApiError> {
    let locale = params.locale();
    let bucket = bucket(&state, &bucket_name, locale)?;
    let object = object(&raw_object, locale)?.to_string();

    let linked = blocking(
        {
            let object = object.clone();
            let file = file.clone();
            move || bucket.ledger().linked(None, &object, &file)
        },
        locale,
    )
    .await?;

    Ok(JSend::success(LinkedResponse {
        object,
        file,
        linked,
    }))
}

/// Route: DELETE /buckets/:bucket/objects/:object/files/:hash
pub async fn unlink(
    State(state): State<Arc<AppState>>,
    Path((bucket_name, raw_object, file)): Path<(String, String, String)>,
    AppQuery(params): AppQuery<LangParams>,
) -> Result<Json<JSend<()>>, ApiError> {
    let locale = params.locale();
    let bucket = bucket(&state, &bucket_name, locale)?;
    let object = object(&raw_object, locale)?.to_string();

    blocking(move || bucket.ledger().unlink(None, &object, &[file]), locale).await?;
    Ok(JSend::success(()))
}
