//! Storage errors and their mapping from SDK failures

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::io;
use thiserror::Error;

pub type S3Result<T> = Result<T, S3Error>;

/// Service codes that mean the credential was refused
const CREDENTIAL_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

#[derive(Error, Debug, Clone)]
pub enum S3Error {
    /// Service reply with a code not handled more specifically
    #[error("S3 service error ({code}): {message}")]
    Service { code: String, message: String },

    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The credential was rejected or has expired
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("Multipart upload error: {0}")]
    MultipartUpload(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// The request never produced a service reply
    #[error("Network error: {0}")]
    Network(String),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<S3Error>,
    },
}

impl S3Error {
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        S3Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify a service reply by its error code
    pub fn from_service_code(code: Option<&str>, message: Option<&str>) -> Self {
        let code = code.unwrap_or("Unknown");
        let message = message.unwrap_or_default();
        match code {
            "NoSuchBucket" => S3Error::InvalidConfig(format!("bucket does not exist ({})", message)),
            c if CREDENTIAL_CODES.contains(&c) => {
                S3Error::AccessDenied(format!("{}: {}", code, message))
            }
            _ => S3Error::Service {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// Name the missing object when the service reported `NoSuchKey` or a bare 404
    pub fn for_key(self, bucket: &str, key: &str) -> Self {
        match self {
            S3Error::Service { ref code, .. } if code == "NoSuchKey" || code == "NotFound" => {
                S3Error::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            }
            other => other,
        }
    }
}

impl From<io::Error> for S3Error {
    fn from(err: io::Error) -> Self {
        S3Error::Io(err.to_string())
    }
}

impl<E> From<SdkError<E>> for S3Error
where
    E: std::error::Error + ProvideErrorMetadata + 'static,
{
    fn from(error: SdkError<E>) -> Self {
        match &error {
            SdkError::ServiceError(context) => {
                S3Error::from_service_code(context.err().code(), context.err().message())
            }
            SdkError::ConstructionFailure(_) => {
                S3Error::InvalidConfig(DisplayErrorContext(&error).to_string())
            }
            _ => S3Error::Network(DisplayErrorContext(&error).to_string()),
        }
    }
}
