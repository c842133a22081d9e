//! S3 protocol implementation for s3bridge
//!
//! Thin layer over `aws-sdk-s3` covering what the transfer commands need:
//! paginated listing, single and multipart uploads with user metadata,
//! ranged downloads and deletes. Works against AWS and S3-compatible
//! services (MinIO, Ceph) through a custom endpoint with path-style
//! addressing.
//!
//! # Example
//!
//! ```ignore
//! use s3bridge::protocol::s3::{S3Client, S3ConfigBuilder, S3Operations};
//!
//! let config = S3ConfigBuilder::new("my-bucket".to_string())
//!     .endpoint("http://localhost:9000".to_string())
//!     .region("us-east-1".to_string())
//!     .build()?;
//!
//! let client = S3Client::new(config).await?;
//! let page = client.list_objects_paginated("in/", None, Some(1000)).await?;
//! ```

mod client;
mod config;
mod error;
mod multipart;
mod operations;
mod types;

pub use client::S3Client;
pub use config::{S3Config, S3ConfigBuilder};
pub use error::{S3Error, S3Result};
pub use multipart::{plan_spans, Span};
pub use operations::S3Operations;
pub use types::{S3ListResult, S3Object, UploadOutcome};

/// Keys requested per listing page
pub const LIST_PAGE_SIZE: i32 = 1000;
