mod admin;
mod files;
mod links;

use std::sync::Arc;

use serde::Deserialize;

use crate::api::response::ApiError;
use crate::bucket::Bucket;
use crate::error::{Locale, StoreError};
use crate::object_ref::ObjectRef;
use crate::AppState;

pub use admin::health;
pub use files::{serve_file, upload_images};
pub use links::{files_of, link, link_only, linked, unlink, unlink_all};

#[derive(Debug, Default, Deserialize)]
pub struct LangParams {
    #[serde(default)]
    pub lang: Option<String>,
}

impl LangParams {
    pub fn locale(&self) -> Locale {
        self.lang.as_deref().map(Locale::from_code).unwrap_or_default()
    }
}

fn bucket(state: &AppState, name: &str, locale: Locale) -> Result<Arc<Bucket>, ApiError> {
    state
        .buckets
        .get(name)
        .map_err(|e| ApiError::from_store(e, locale))
}

/// Parse a link object, rejecting the empty object.
fn object(raw: &str, locale: Locale) -> Result<ObjectRef, ApiError> {
    let object: ObjectRef = raw.parse().map_err(|e| ApiError::from_store(e, locale))?;
    if object.is_zero() {
        return Err(ApiError::from_store(StoreError::EmptyObject, locale));
    }
    Ok(object)
}

/// Run a blocking store call off the async runtime.
async fn blocking<T, F>(work: F, locale: Locale) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Blocking task failed: {e}")))?
        .map_err(|e| ApiError::from_store(e, locale))
}
