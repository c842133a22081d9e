//! Configuration types for the S3 client

use super::error::{S3Error, S3Result};
use crate::credential::Credential;

/// S3 client configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,

    /// AWS region (e.g., "sa-east-1")
    pub region: Option<String>,

    /// Custom endpoint URL (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,

    /// Static or brokered credentials (uses the SDK credential chain if absent)
    pub credential: Option<Credential>,

    /// Path-style addressing (required for most S3-compatible services)
    pub force_path_style: bool,

    /// Connect timeout in seconds
    pub connect_timeout_seconds: u64,

    /// Read timeout in seconds
    pub read_timeout_seconds: u64,
}

impl S3Config {
    /// Create a new S3 config with required parameters
    pub fn new(bucket: String) -> Self {
        Self {
            bucket,
            region: None,
            endpoint: None,
            credential: None,
            force_path_style: false,
            connect_timeout_seconds: 30,
            read_timeout_seconds: 300,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> S3Result<()> {
        if self.bucket.is_empty() {
            return Err(S3Error::InvalidBucketName(
                "Bucket name cannot be empty".to_string(),
            ));
        }

        // S3-compatible services have their own naming rules.
        if !self.is_custom_endpoint() && !is_valid_bucket_name(&self.bucket) {
            return Err(S3Error::InvalidBucketName(format!(
                "Invalid bucket name: {}. Bucket names must be 3-63 characters, \
                 lowercase letters, numbers, hyphens, and periods only",
                self.bucket
            )));
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(S3Error::InvalidConfig(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                )));
            }
        }

        if let Some(credential) = &self.credential {
            if credential.access_key.is_empty() || credential.secret_key().is_empty() {
                return Err(S3Error::InvalidConfig(
                    "Credentials need both an access key and a secret key".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Check if using custom endpoint (S3-compatible service)
    pub fn is_custom_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Check if using explicit credentials
    pub fn has_explicit_credentials(&self) -> bool {
        self.credential.is_some()
    }
}

/// Builder for S3Config
pub struct S3ConfigBuilder {
    config: S3Config,
}

impl S3ConfigBuilder {
    /// Create a new builder with bucket name
    pub fn new(bucket: String) -> Self {
        Self {
            config: S3Config::new(bucket),
        }
    }

    /// Set the AWS region; blank values are ignored
    pub fn region(mut self, region: String) -> Self {
        if !region.trim().is_empty() {
            self.config.region = Some(region);
        }
        self
    }

    /// Set custom endpoint; path-style addressing follows it
    pub fn endpoint(mut self, endpoint: String) -> Self {
        if !endpoint.trim().is_empty() {
            self.config.endpoint = Some(endpoint.trim_end_matches('/').to_string());
            self.config.force_path_style = true;
        }
        self
    }

    /// Set credentials explicitly
    pub fn credential(mut self, credential: Credential) -> Self {
        self.config.credential = Some(credential);
        self
    }

    /// Set connect and read timeouts
    pub fn timeouts(mut self, connect_seconds: u64, read_seconds: u64) -> Self {
        self.config.connect_timeout_seconds = connect_seconds;
        self.config.read_timeout_seconds = read_seconds;
        self
    }

    /// Build the configuration
    pub fn build(self) -> S3Result<S3Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Validate S3 bucket name according to AWS rules
fn is_valid_bucket_name(name: &str) -> bool {
    let len = name.len();

    if !(3..=63).contains(&len) {
        return false;
    }

    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[len - 1]) {
        return false;
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return false;
    }

    if name.contains("..") {
        return false;
    }

    // Cannot be formatted as IP address
    if name.split('.').count() == 4 && name.split('.').all(|s| s.parse::<u8>().is_ok()) {
        return false;
    }

    !name.starts_with("xn--") && !name.ends_with("-s3alias")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        assert!(is_valid_bucket_name("my-bucket"));
        assert!(is_valid_bucket_name("my.bucket"));
        assert!(is_valid_bucket_name("abc"));
        assert!(is_valid_bucket_name("a".repeat(63).as_str()));
    }

    #[test]
    fn test_invalid_bucket_names() {
        assert!(!is_valid_bucket_name("ab")); // Too short
        assert!(!is_valid_bucket_name(&"a".repeat(64))); // Too long
        assert!(!is_valid_bucket_name("My-Bucket")); // Uppercase
        assert!(!is_valid_bucket_name("my_bucket")); // Underscore
        assert!(!is_valid_bucket_name("my..bucket")); // Consecutive periods
        assert!(!is_valid_bucket_name("192.168.1.1")); // IP address format
        assert!(!is_valid_bucket_name("xn--bucket")); // Reserved prefix
        assert!(!is_valid_bucket_name("bucket-s3alias")); // Reserved suffix
        assert!(!is_valid_bucket_name("-bucket"));
    }

    #[test]
    fn test_config_validation() {
        assert!(S3Config::new("valid-bucket".to_string()).validate().is_ok());
        assert!(S3Config::new("".to_string()).validate().is_err());
        assert!(S3Config::new("Bad_Name".to_string()).validate().is_err());
    }

    #[test]
    fn test_custom_endpoint_relaxes_bucket_rules() {
        let config = S3ConfigBuilder::new("Bad_Name".to_string())
            .endpoint("http://localhost:9000/".to_string())
            .build()
            .unwrap();
        assert!(config.force_path_style);
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_endpoint_requires_scheme() {
        let result = S3ConfigBuilder::new("bucket".to_string())
            .endpoint("localhost:9000".to_string())
            .build();
        assert!(matches!(result, Err(S3Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_ignores_blank_values() {
        let config = S3ConfigBuilder::new("test-bucket".to_string())
            .region(" ".to_string())
            .endpoint(String::new())
            .build()
            .unwrap();
        assert_eq!(config.region, None);
        assert!(!config.is_custom_endpoint());
        assert!(!config.force_path_style);
    }

    #[test]
    fn test_builder_credentials() {
        let config = S3ConfigBuilder::new("test-bucket".to_string())
            .region("sa-east-1".to_string())
            .credential(Credential::new("ak".to_string(), "sk".to_string(), None))
            .timeouts(5, 60)
            .build()
            .unwrap();
        assert!(config.has_explicit_credentials());
        assert_eq!(config.region.as_deref(), Some("sa-east-1"));
        assert_eq!(config.read_timeout_seconds, 60);
    }

    #[test]
    fn test_incomplete_credentials_rejected() {
        let result = S3ConfigBuilder::new("test-bucket".to_string())
            .credential(Credential::new("ak".to_string(), String::new(), None))
            .build();
        assert!(matches!(result, Err(S3Error::InvalidConfig(_))));
    }
}
