/*!
 * Batch transfer orchestration between a local folder and a bucket
 *
 * One invocation walks `enumerate -> select -> transfer -> remove` for a
 * single direction. Files move one at a time; the first failed transfer
 * ends the batch and leaves the remaining candidates untouched. Removal
 * failures and empty selections are only logged unless the caller asks for
 * an empty selection to be an error.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::chunking::{select_part_size, DOWNLOAD_CHUNK_SIZE};
use crate::core::template::{effective_mask, render};
use crate::core::wildcard::{has_wildcard, WildcardPattern};
use crate::credential::Credential;
use crate::error::{BridgeError, Result};
use crate::protocol::s3::{S3Client, S3ConfigBuilder, S3Operations, LIST_PAGE_SIZE};
use crate::stats::{BatchReport, TransferDirection, TransferResult};
use crate::vault;

/// Settings for one `get` or `put` run
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Wildcard (`*`) or literal name selecting the files
    pub filter: String,
    /// Key prefix inside the bucket, already normalised with [`normalize_prefix`]
    pub prefix: String,
    /// Local folder read on upload and written on download
    pub folder: PathBuf,
    /// Rename mask; empty keeps the original name
    pub mask: String,
    /// Delete the source after a successful transfer
    pub remove: bool,
    /// Treat an empty selection as an error
    pub error_on_no_files: bool,
    /// Configured multipart part size (0 = pick by file size)
    pub part_size: u64,
    /// User metadata attached to uploads
    pub metadata: HashMap<String, String>,
}

impl TransferOptions {
    pub fn validate(&self) -> Result<()> {
        if self.filter.is_empty() {
            return Err(BridgeError::Config(
                "file name filter not provided".to_string(),
            ));
        }
        Ok(())
    }

    fn destination_name(&self, source: &str) -> String {
        render(source, effective_mask(&self.mask))
    }
}

/// Strip a leading `/` and make sure a non-empty prefix ends with `/`
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_start_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Keys selected from a bucket listing
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub keys: Vec<String>,
    /// Every key returned by the listing, matched or not
    pub scanned: u64,
    /// Listing requests made
    pub pages: usize,
}

/// Page through everything under `prefix` and keep the keys `pattern` matches
pub async fn enumerate_keys<S>(ops: &S, prefix: &str, pattern: &WildcardPattern) -> Result<Enumeration>
where
    S: S3Operations + ?Sized,
{
    let mut found = Enumeration::default();
    let mut token: Option<String> = None;

    loop {
        let page = ops
            .list_objects_paginated(prefix, token.take(), Some(LIST_PAGE_SIZE))
            .await
            .map_err(|e| BridgeError::Enumeration(format!("unable to list bucket, {}", e)))?;
        found.pages += 1;
        found.scanned += page.objects.len() as u64;
        debug!(page = found.pages, keys = page.objects.len(), "listing page received");

        found.keys.extend(
            page.objects
                .into_iter()
                .map(|o| o.key)
                .filter(|key| pattern.is_match(key)),
        );

        match page.continuation_token {
            Some(next) if page.is_truncated => token = Some(next),
            _ => break,
        }
    }

    Ok(found)
}

/// Files under `folder` matching the glob `filter`, in glob order
pub fn local_matches(folder: &Path, filter: &str) -> Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&folder.to_string_lossy());
    let pattern = Path::new(&base).join(filter);
    let pattern = pattern.to_string_lossy();

    let entries = glob::glob(&pattern).map_err(|e| {
        BridgeError::Enumeration(format!("unable to list files with filter {{{}}}, {}", filter, e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            BridgeError::Enumeration(format!("unable to list files with filter {{{}}}, {}", filter, e))
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn no_files(location: String, options: &TransferOptions) -> Result<()> {
    info!(location = %location, filter = %options.filter, "no files found");
    if options.error_on_no_files {
        return Err(BridgeError::NoFilesMatched {
            location,
            filter: options.filter.clone(),
        });
    }
    Ok(())
}

fn log_target<S: S3Operations + ?Sized>(ops: &S, endpoint: Option<&str>) {
    match endpoint {
        Some(ep) => info!(endpoint = %ep, bucket = %ops.bucket(), "using custom endpoint"),
        None => info!(bucket = %ops.bucket(), "using default AWS endpoint"),
    }
}

/// Download every object selected by `options.filter` into `options.folder`.
///
/// A filter without `*` names exactly one key (`prefix + filter`) and is
/// attempted without listing the bucket first.
pub async fn receive_files<S>(ops: &S, options: &TransferOptions) -> Result<BatchReport>
where
    S: S3Operations + ?Sized,
{
    options.validate()?;
    let mut report = BatchReport::new(TransferDirection::Download);

    let keys = if has_wildcard(&options.filter) {
        let pattern = WildcardPattern::compile_with_prefix(&options.filter, &options.prefix)
            .map_err(|e| BridgeError::Enumeration(e.to_string()))?;
        debug!(expression = %pattern.expression(), "wildcard compiled");

        let found = enumerate_keys(ops, &options.prefix, &pattern).await?;
        info!(bucket = %ops.bucket(), scanned = found.scanned, pages = found.pages, "keys verified in bucket");
        report.scanned = Some(found.scanned);
        report.list_calls = found.pages;

        if found.keys.is_empty() {
            no_files(format!("bucket {{{}}}", ops.bucket()), options)?;
            return Ok(report);
        }
        found.keys
    } else {
        vec![format!("{}{}", options.prefix, options.filter)]
    };

    for (index, key) in keys.iter().enumerate() {
        info!("[{}] selected to download: {}", index, key);
    }
    report.selected = keys.clone();

    for (index, key) in keys.into_iter().enumerate() {
        let path = options.folder.join(options.destination_name(&key));
        info!("[{}] starting download of {}", index, key);

        let start = Instant::now();
        let bytes = ops
            .download_file(&key, &path, DOWNLOAD_CHUNK_SIZE)
            .await
            .map_err(|e| BridgeError::Transfer {
                index,
                source: key.clone(),
                reason: e.to_string(),
            })?;
        let elapsed = start.elapsed();

        let result = TransferResult {
            index,
            source: key.clone(),
            destination: path.display().to_string(),
            bytes,
            elapsed,
            location: None,
        };
        info!(
            "[{}] download completed, size: {} elapsed: {:.2}s rate: {} path: {}",
            index,
            bytes,
            elapsed.as_secs_f64(),
            result.throughput(),
            result.destination
        );
        report.results.push(result);

        if options.remove {
            match ops.delete_object(&key).await {
                Ok(()) => {
                    info!("[{}] {} removed", index, key);
                    report.removed += 1;
                }
                Err(e) => {
                    warn!("[{}] unable to remove {}, {}", index, key, e);
                    report.removal_failures.push(key);
                }
            }
        }
    }

    Ok(report)
}

/// Upload every file under `options.folder` matching the glob `options.filter`
pub async fn send_files<S>(ops: &S, options: &TransferOptions) -> Result<BatchReport>
where
    S: S3Operations + ?Sized,
{
    options.validate()?;
    let mut report = BatchReport::new(TransferDirection::Upload);

    let files = local_matches(&options.folder, &options.filter)?;
    if files.is_empty() {
        no_files(format!("folder {{{}}}", options.folder.display()), options)?;
        return Ok(report);
    }

    for (index, file) in files.iter().enumerate() {
        info!("[{}] selected to upload: {}", index, file.display());
    }
    report.selected = files.iter().map(|f| f.display().to_string()).collect();

    for (index, file) in files.into_iter().enumerate() {
        let source = file.display().to_string();
        let key = format!("{}{}", options.prefix, options.destination_name(&source));
        let transfer_error = |reason: String| BridgeError::Transfer {
            index,
            source: source.clone(),
            reason,
        };

        let size = tokio::fs::metadata(&file)
            .await
            .map_err(|e| transfer_error(format!("unable to read properties of file, {}", e)))?
            .len();
        let part_size = select_part_size(options.part_size, size);
        debug!(file = %source, size, part_size, "part size selected");
        info!("[{}] starting upload of {}", index, source);

        let start = Instant::now();
        let outcome = ops
            .upload_file(&file, &key, &options.metadata, part_size)
            .await
            .map_err(|e| transfer_error(e.to_string()))?;
        let elapsed = start.elapsed();

        let result = TransferResult {
            index,
            source: source.clone(),
            destination: key,
            bytes: outcome.bytes,
            elapsed,
            location: Some(outcome.location),
        };
        info!(
            "[{}] upload completed, size: {} elapsed: {:.2}s rate: {} url: {}",
            index,
            result.bytes,
            elapsed.as_secs_f64(),
            result.throughput(),
            result.location.as_deref().unwrap_or_default()
        );
        report.results.push(result);

        if options.remove {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => {
                    info!("[{}] {} removed", index, source);
                    report.removed += 1;
                }
                Err(e) => {
                    warn!("[{}] unable to remove {}, {}", index, source, e);
                    report.removal_failures.push(source);
                }
            }
        }
    }

    Ok(report)
}

/// Static credentials when configured, otherwise a vault exchange for `role`
pub async fn resolve_credential(config: &AppConfig, role: &str) -> Result<Credential> {
    if let Some(credential) = config.static_credential() {
        debug!("using static credentials");
        return Ok(credential);
    }
    let credential = vault::load_credentials(&config.vault_settings(), role).await?;
    Ok(credential)
}

/// Resolve credentials and build the storage client for `config.bucket`
pub async fn connect(config: &AppConfig, role: &str) -> Result<S3Client> {
    if config.bucket.is_empty() {
        return Err(BridgeError::Config("bucket name not provided".to_string()));
    }
    let credential = resolve_credential(config, role).await?;

    let mut builder = S3ConfigBuilder::new(config.bucket.clone())
        .region(config.region.clone())
        .credential(credential);
    if !config.endpoint.is_empty() {
        builder = builder.endpoint(config.endpoint.clone());
    }
    let s3_config = builder.build()?;

    let client = S3Client::new(s3_config).await?;
    let endpoint = client.config().endpoint.clone();
    log_target(&client, endpoint.as_deref());
    Ok(client)
}
