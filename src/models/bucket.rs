//! Bucket summary as listed by the object store.

use serde::{Deserialize, Serialize};

/// One bucket in a list-buckets response.
///
/// The JSON key casing is pinned by the browser console, which reads
/// `bucket.creationDate` directly.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BucketSummary {
    /// Normalized bucket name (lowercase, 3-63 chars, restricted alphabet).
    pub name: String,

    /// Creation timestamp reported by the store, if available.
    #[serde(rename = "creationDate")]
    pub creation_date: Option<String>,
}
