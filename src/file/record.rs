//! Listing entry derived from a stored file.

use std::fs::Metadata;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored document as reported to clients.
///
/// Nothing here is persisted; every field comes from the file name and a
/// `stat` of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Identifier (the stored file name).
    pub id: String,
    /// Stored file name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    pub last_modified: i64,
    /// Full-precision modification time in nanoseconds, for cache keys.
    #[serde(skip)]
    pub modified_nanos: i64,
    /// Public URL of the file.
    pub url: String,
}

impl DocumentRecord {
    /// Build a record from file metadata.
    pub fn from_metadata(name: &str, metadata: &Metadata, url: String) -> Self {
        let modified =
            DateTime::<Utc>::from(metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH));
        let last_modified = modified.timestamp_millis();
        Self {
            id: name.to_string(),
            name: name.to_string(),
            size: metadata.len(),
            last_modified,
            modified_nanos: modified
                .timestamp_nanos_opt()
                .unwrap_or_else(|| last_modified.saturating_mul(1_000_000)),
            url,
        }
    }
}
