/*!
 * s3bridge - move files between a local folder and S3-compatible storage
 *
 * - Wildcard selection over paginated bucket listings
 * - Rename masks with date, time and random tokens
 * - Single or multipart uploads with adaptive part size
 * - Short-lived credentials brokered through Vault (token, AppRole, certificate)
 *
 * Transfers run one file at a time and stop at the first failure.
 */

pub mod cli_style;
pub mod config;
pub mod context;
pub mod core;
pub mod credential;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod stats;
pub mod vault;

// Re-export commonly used types
pub use config::AppConfig;
pub use context::AppContext;
pub use core::{receive_files, send_files, TransferOptions};
pub use credential::Credential;
pub use error::{BridgeError, Result};
pub use stats::{BatchReport, TransferResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
