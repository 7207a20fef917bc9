use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per distinct file content, keyed by its hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub hash: String,
    pub content_type: String,
    pub byte_size: u64,
    pub created_at: DateTime<Utc>,
}

/// Association between a file hash and an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub file: String,
    pub object: String,
    pub created_at: DateTime<Utc>,
    /// Position in the order links were written to this table.
    pub seq: u64,
}
