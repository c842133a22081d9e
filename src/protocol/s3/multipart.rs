//! Multipart upload and ranged download for large objects
//!
//! Parts and ranges are transferred one at a time, in order.

use super::client::S3Client;
use super::error::{S3Error, S3Result};
use super::types::UploadOutcome;
use crate::core::chunking::MAX_PARTS;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};


/// A byte span of a file or object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub index: u64,
    pub offset: u64,
    pub len: u64,
}

impl Span {
    /// Inclusive HTTP range header value
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.offset, self.offset + self.len - 1)
    }
}

/// Split `total` bytes into consecutive spans of at most `chunk` bytes
pub fn plan_spans(total: u64, chunk: u64) -> Vec<Span> {
    if total == 0 || chunk == 0 {
        return Vec::new();
    }
    let count = total.div_ceil(chunk);
    (0..count)
        .map(|i| {
            let offset = i * chunk;
            Span {
                index: i + 1,
                offset,
                len: chunk.min(total - offset),
            }
        })
        .collect()
}

impl S3Client {
    /// Upload `local_path` in parts of `part_size`, aborting the upload on any failure
    pub async fn upload_file_multipart(
        &self,
        local_path: &Path,
        key: &str,
        metadata: &HashMap<String, String>,
        part_size: u64,
        file_size: u64,
    ) -> S3Result<UploadOutcome> {
        let spans = plan_spans(file_size, part_size);
        if spans.len() as u64 > MAX_PARTS {
            return Err(S3Error::MultipartUpload(format!(
                "{} bytes at {} bytes per part needs {} parts (limit {})",
                file_size,
                part_size,
                spans.len(),
                MAX_PARTS
            )));
        }

        let upload_id = self.initiate_multipart_upload(key, metadata).await?;
        debug!(key, upload_id = %upload_id, parts = spans.len(), "multipart upload started");

        match self.send_parts(local_path, key, &upload_id, &spans).await {
            Ok(parts) => {
                let location = self.complete_multipart_upload(key, &upload_id, parts).await;
                match location {
                    Ok(location) => Ok(UploadOutcome {
                        location,
                        bytes: file_size,
                        parts: spans.len(),
                    }),
                    Err(e) => {
                        self.abort_quietly(key, &upload_id).await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                self.abort_quietly(key, &upload_id).await;
                Err(e)
            }
        }
    }

    async fn send_parts(
        &self,
        local_path: &Path,
        key: &str,
        upload_id: &str,
        spans: &[Span],
    ) -> S3Result<Vec<CompletedPart>> {
        let mut file = File::open(local_path).await?;
        let mut completed = Vec::with_capacity(spans.len());

        for span in spans {
            let mut buffer = vec![0u8; span.len as usize];
            file.read_exact(&mut buffer).await?;

            let part_number = span.index as i32;
            let etag = self
                .upload_part(key, upload_id, part_number, Bytes::from(buffer))
                .await
                .map_err(|e| e.context(format!("part {}", part_number)))?;

            completed.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(etag)
                    .build(),
            );
        }

        Ok(completed)
    }

    /// Initiate a multipart upload
    async fn initiate_multipart_upload(
        &self,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> S3Result<String> {
        let mut request = self
            .aws_client()
            .create_multipart_upload()
            .bucket(self.bucket())
            .key(key);

        if !metadata.is_empty() {
            request = request.set_metadata(Some(metadata.clone()));
        }

        let response = request.send().await.map_err(S3Error::from)?;

        response
            .upload_id()
            .ok_or_else(|| S3Error::MultipartUpload("No upload ID returned".to_string()))
            .map(|s| s.to_string())
    }

    /// Upload a single part, returning its ETag
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> S3Result<String> {
        let response = self
            .aws_client()
            .upload_part()
            .bucket(self.bucket())
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(S3Error::from)?;

        response
            .e_tag()
            .map(|s| s.to_string())
            .ok_or_else(|| S3Error::MultipartUpload("No ETag returned for part".to_string()))
    }

    /// Complete a multipart upload, returning the object location
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> S3Result<String> {
        let multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        let response = self
            .aws_client()
            .complete_multipart_upload()
            .bucket(self.bucket())
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(multipart_upload)
            .send()
            .await
            .map_err(S3Error::from)?;

        Ok(response
            .location()
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.object_url(key)))
    }

    /// Abort a multipart upload
    pub async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> S3Result<()> {
        self.aws_client()
            .abort_multipart_upload()
            .bucket(self.bucket())
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(S3Error::from)?;

        Ok(())
    }

    async fn abort_quietly(&self, key: &str, upload_id: &str) {
        if let Err(e) = self.abort_multipart_upload(key, upload_id).await {
            warn!(key, upload_id, error = %e, "failed to abort multipart upload");
        }
    }

    /// Download `key` into `local_path` with sequential range requests of `chunk_size`
    pub async fn download_file_ranged(
        &self,
        key: &str,
        local_path: &Path,
        chunk_size: u64,
    ) -> S3Result<u64> {
        let total_size = self.object_size(key).await?;
        let mut file = File::create(local_path).await?;

        let mut written = 0u64;
        for span in plan_spans(total_size, chunk_size) {
            written += self.download_range(key, &span, &mut file).await?;
        }

        file.flush().await?;

        if written != total_size {
            return Err(S3Error::Network(format!(
                "short read for {}: got {} of {} bytes",
                key, written, total_size
            )));
        }
        Ok(written)
    }

    /// Stream one byte range of `key` into `file`
    async fn download_range(&self, key: &str, span: &Span, file: &mut File) -> S3Result<u64> {
        let response = self
            .aws_client()
            .get_object()
            .bucket(self.bucket())
            .key(key)
            .range(span.range_header())
            .send()
            .await
            .map_err(|e| S3Error::from(e).for_key(self.bucket(), key))?;

        let mut body = response.body;
        let mut written = 0u64;
        while let Some(bytes) = body
            .try_next()
            .await
            .map_err(|e| S3Error::Network(format!("Failed to read response body: {}", e)))?
        {
            file.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_plan_spans_even_split() {
        let spans = plan_spans(128 * MIB, 64 * MIB);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], Span { index: 1, offset: 0, len: 64 * MIB });
        assert_eq!(spans[1], Span { index: 2, offset: 64 * MIB, len: 64 * MIB });
    }

    #[test]
    fn test_plan_spans_short_tail() {
        let spans = plan_spans(10 * MIB + 1, 5 * MIB);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].len, 1);
        assert_eq!(spans.iter().map(|s| s.len).sum::<u64>(), 10 * MIB + 1);
    }

    #[test]
    fn test_plan_spans_empty() {
        assert!(plan_spans(0, 64 * MIB).is_empty());
        assert!(plan_spans(100, 0).is_empty());
    }

    #[test]
    fn test_range_header_is_inclusive() {
        let spans = plan_spans(100, 64);
        assert_eq!(spans[0].range_header(), "bytes=0-63");
        assert_eq!(spans[1].range_header(), "bytes=64-99");
    }
}
