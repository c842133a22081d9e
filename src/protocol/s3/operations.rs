//! S3 operations trait and implementations

use super::client::S3Client;
use super::error::{S3Error, S3Result};
use super::types::{S3ListResult, S3Object, UploadOutcome};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

/// Object store operations used by the transfer orchestrator
#[async_trait]
pub trait S3Operations: Send + Sync {
    /// Bucket the operations act on
    fn bucket(&self) -> &str;

    /// List objects with pagination support
    async fn list_objects_paginated(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
        max_keys: Option<i32>,
    ) -> S3Result<S3ListResult>;

    /// Upload a file, in parts when it is larger than `part_size`
    async fn upload_file(
        &self,
        local_path: &Path,
        key: &str,
        metadata: &HashMap<String, String>,
        part_size: u64,
    ) -> S3Result<UploadOutcome>;

    /// Download an object with range requests of `chunk_size`, returning bytes written
    async fn download_file(&self, key: &str, local_path: &Path, chunk_size: u64)
        -> S3Result<u64>;

    /// Delete an object
    async fn delete_object(&self, key: &str) -> S3Result<()>;
}

#[async_trait]
impl S3Operations for S3Client {
    fn bucket(&self) -> &str {
        S3Client::bucket(self)
    }

    async fn list_objects_paginated(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
        max_keys: Option<i32>,
    ) -> S3Result<S3ListResult> {
        let mut request = self
            .aws_client()
            .list_objects_v2()
            .bucket(S3Client::bucket(self));

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        if let Some(max) = max_keys {
            request = request.max_keys(max);
        }

        let response = request.send().await.map_err(S3Error::from)?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let size = obj.size().unwrap_or(0).max(0) as u64;
                let last_modified = obj
                    .last_modified()
                    .and_then(|dt| SystemTime::try_from(*dt).ok());
                let etag = obj.e_tag().map(|s| s.to_string());

                Some(S3Object {
                    key,
                    size,
                    last_modified,
                    etag,
                })
            })
            .collect();

        let is_truncated = response.is_truncated().unwrap_or(false);
        let continuation_token = response.next_continuation_token().map(|s| s.to_string());

        Ok(S3ListResult {
            objects,
            continuation_token,
            is_truncated,
        })
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        key: &str,
        metadata: &HashMap<String, String>,
        part_size: u64,
    ) -> S3Result<UploadOutcome> {
        let file_size = fs::metadata(local_path).await?.len();

        if file_size > part_size {
            return self
                .upload_file_multipart(local_path, key, metadata, part_size, file_size)
                .await;
        }

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| S3Error::Io(format!("{}: {}", local_path.display(), e)))?;

        let mut request = self
            .aws_client()
            .put_object()
            .bucket(S3Client::bucket(self))
            .key(key)
            .body(body);

        if !metadata.is_empty() {
            request = request.set_metadata(Some(metadata.clone()));
        }

        request.send().await.map_err(S3Error::from)?;

        Ok(UploadOutcome {
            location: self.object_url(key),
            bytes: file_size,
            parts: 1,
        })
    }

    async fn download_file(
        &self,
        key: &str,
        local_path: &Path,
        chunk_size: u64,
    ) -> S3Result<u64> {
        self.download_file_ranged(key, local_path, chunk_size).await
    }

    async fn delete_object(&self, key: &str) -> S3Result<()> {
        self.delete(key).await
    }
}
