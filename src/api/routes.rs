use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    Router::new()
        // Uploads
        .route(
            "/buckets/:bucket/images",
            post(handlers::upload_images).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // File content
        .route("/buckets/:bucket/files/:hash", get(handlers::serve_file))
        // Links
        .route(
            "/buckets/:bucket/objects/:object/files",
            get(handlers::files_of)
                .post(handlers::link)
                .put(handlers::link_only)
                .delete(handlers::unlink_all),
        )
        .route(
            "/buckets/:bucket/objects/:object/files/:hash",
            get(handlers::linked).delete(handlers::unlink),
        )
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
