//! Object summary as listed within a bucket.

use serde::{Deserialize, Serialize};

/// One object in a list-objects response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ObjectSummary {
    /// Object key within its bucket.
    pub name: String,

    /// Size in bytes.
    pub size: i64,

    /// Timestamp of the last write, if the store reported one.
    #[serde(rename = "lastModified")]
    pub last_modified: Option<String>,

    /// Checksum the store computed for the stored bytes.
    pub etag: Option<String>,
}
