//! file-store - Content-addressed file storage with object links
//!
//! This crate stores uploaded files once per distinct content and tracks which
//! application objects use them:
//! - Files are named by the SHA-256 of their bytes and written once
//! - Bytes are replicated to a fixed set of machines over scp
//! - File records and file-object links live in redb (ACID, crash-safe)
//! - Ledger operations compose inside a caller's write transaction
//! - REST API with multipart image upload

pub mod api;
pub mod bucket;
pub mod check;
pub mod config;
pub mod content;
pub mod error;
pub mod object_ref;
pub mod storage;
pub mod upload;

pub use bucket::{Bucket, Buckets};
pub use check::{AnyFile, FileCheck, ImageCheck};
pub use error::{ErrorClass, Locale, StoreError};
pub use object_ref::ObjectRef;
pub use upload::Upload;

use config::Config;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub buckets: Buckets,
}
