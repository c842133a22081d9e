//! Type definitions for S3 operations

use std::time::SystemTime;

/// An entry from a bucket listing
#[derive(Debug, Clone, PartialEq)]
pub struct S3Object {
    /// Object key (path within bucket)
    pub key: String,

    /// Object size in bytes
    pub size: u64,

    /// Last modified timestamp
    pub last_modified: Option<SystemTime>,

    /// ETag (entity tag)
    pub etag: Option<String>,
}

impl S3Object {
    /// Object known only by its key (no listing was done)
    pub fn from_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: 0,
            last_modified: None,
            etag: None,
        }
    }
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct S3ListResult {
    /// List of objects
    pub objects: Vec<S3Object>,

    /// Continuation token for the next page
    pub continuation_token: Option<String>,

    /// Whether more pages follow
    pub is_truncated: bool,
}

/// Outcome of a completed upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Where the object can be reached
    pub location: String,

    /// Bytes sent
    pub bytes: u64,

    /// Number of parts (1 for a single PUT)
    pub parts: usize,
}
