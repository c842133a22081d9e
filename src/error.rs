/*!
 * Error types for s3bridge
 */

use std::fmt;
use std::io;

use crate::protocol::s3::S3Error;
use crate::vault::VaultError;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug)]
pub enum BridgeError {
    /// Missing or invalid setting (vault address, role, certificates, engine version, ...)
    Config(String),

    /// Vault rejected the login or returned something we could not decode
    Authentication(String),

    /// Open/stat/upload/download failure for a single candidate
    Transfer {
        index: usize,
        source: String,
        reason: String,
    },

    /// Listing or pattern compilation failed before any transfer started
    Enumeration(String),

    /// Nothing matched the filter and the caller asked for that to be fatal
    NoFilesMatched { location: String, filter: String },

    /// I/O error
    Io(io::Error),

    /// Generic error with message
    Other(String),
}

impl BridgeError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            BridgeError::Config(_) => ErrorCategory::Configuration,
            BridgeError::Authentication(_) => ErrorCategory::Authentication,
            BridgeError::Transfer { .. } => ErrorCategory::Transfer,
            BridgeError::Enumeration(_) | BridgeError::NoFilesMatched { .. } => {
                ErrorCategory::Enumeration
            }
            BridgeError::Io(_) => ErrorCategory::IoError,
            BridgeError::Other(_) => ErrorCategory::Unknown,
        }
    }

    /// True for errors that abort before any network call is made
    pub fn is_configuration(&self) -> bool {
        matches!(self, BridgeError::Config(_))
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Transfer,
    Enumeration,
    IoError,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Authentication => write!(f, "authentication"),
            ErrorCategory::Transfer => write!(f, "transfer"),
            ErrorCategory::Enumeration => write!(f, "enumeration"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            BridgeError::Authentication(msg) => {
                write!(f, "Authentication error: {}", msg)
            }
            BridgeError::Transfer {
                index,
                source,
                reason,
            } => {
                write!(f, "[{}] failed to transfer {}: {}", index, source, reason)
            }
            BridgeError::Enumeration(msg) => {
                write!(f, "Enumeration error: {}", msg)
            }
            BridgeError::NoFilesMatched { location, filter } => {
                write!(f, "no files found in {} with filter {}", location, filter)
            }
            BridgeError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            BridgeError::Other(msg) => {
                write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for BridgeError {
    fn from(err: io::Error) -> Self {
        BridgeError::Io(err)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Config(format!("JSON parse error: {}", err))
    }
}

impl From<VaultError> for BridgeError {
    fn from(err: VaultError) -> Self {
        if err.is_configuration() {
            BridgeError::Config(err.to_string())
        } else {
            BridgeError::Authentication(err.to_string())
        }
    }
}

impl From<S3Error> for BridgeError {
    fn from(err: S3Error) -> Self {
        match err {
            S3Error::InvalidConfig(msg) | S3Error::InvalidBucketName(msg) => BridgeError::Config(msg),
            other => BridgeError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            BridgeError::Config("x".to_string()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            BridgeError::Authentication("x".to_string()).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            BridgeError::NoFilesMatched {
                location: "bucket {b}".to_string(),
                filter: "*.txt".to_string(),
            }
            .category(),
            ErrorCategory::Enumeration
        );
        assert_eq!(
            BridgeError::Io(io::Error::other("disk")).category(),
            ErrorCategory::IoError
        );
    }

    #[test]
    fn test_every_error_exits_non_zero() {
        let errors = vec![
            BridgeError::Config("x".to_string()),
            BridgeError::Authentication("x".to_string()),
            BridgeError::Enumeration("x".to_string()),
            BridgeError::Other("x".to_string()),
        ];
        for err in errors {
            assert_ne!(err.exit_code(), EXIT_SUCCESS);
        }
    }

    #[test]
    fn test_transfer_display() {
        let err = BridgeError::Transfer {
            index: 3,
            source: "/data/a.txt".to_string(),
            reason: "connection reset".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "[3] failed to transfer /data/a.txt: connection reset"
        );
    }

    #[test]
    fn test_vault_config_errors_stay_configuration() {
        let err: BridgeError = VaultError::UnsupportedEngineVersion("3".to_string()).into();
        assert!(err.is_configuration());

        let err: BridgeError = VaultError::MalformedResponse {
            url: "http://vault/v1/auth/approle/login".to_string(),
            reason: "missing auth".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Authentication);
    }

    #[test]
    fn test_s3_invalid_config_maps_to_config() {
        let err: BridgeError = S3Error::InvalidConfig("bucket missing".to_string()).into();
        assert!(err.is_configuration());
    }
}
