//! S3 client implementation

use super::config::S3Config;
use super::error::{S3Error, S3Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as AwsS3Client;
use std::time::Duration;
use tracing::debug;

/// Region used for object URLs when none is configured
const FALLBACK_REGION: &str = "us-east-1";

/// S3 client for interacting with AWS S3 and S3-compatible storage
#[derive(Debug, Clone)]
pub struct S3Client {
    /// AWS S3 client
    client: AwsS3Client,

    /// Client configuration
    config: S3Config,
}

impl S3Client {
    /// Create a new S3 client with the given configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use s3bridge::protocol::s3::{S3Client, S3Config};
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = S3Config::new("my-bucket".to_string());
    ///     let client = S3Client::new(config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: S3Config) -> S3Result<Self> {
        config.validate()?;

        let client = Self::build_aws_client(&config).await?;

        debug!(
            bucket = %config.bucket,
            region = ?config.region,
            endpoint = ?config.endpoint,
            explicit_credentials = config.has_explicit_credentials(),
            "S3 client ready"
        );

        Ok(Self { client, config })
    }

    /// Build the AWS SDK S3 client from configuration
    async fn build_aws_client(config: &S3Config) -> S3Result<AwsS3Client> {
        let mut aws_config_loader = aws_config::defaults(BehaviorVersion::latest());

        let region_provider = if let Some(region_str) = &config.region {
            RegionProviderChain::first_try(Region::new(region_str.clone()))
        } else {
            RegionProviderChain::default_provider()
        };
        aws_config_loader = aws_config_loader.region(region_provider);

        if let Some(credential) = &config.credential {
            let credentials = Credentials::new(
                credential.access_key.clone(),
                credential.secret_key().to_owned(),
                credential.session_token().map(str::to_owned),
                None,
                "s3bridge-static",
            );
            aws_config_loader = aws_config_loader.credentials_provider(credentials);
        }

        let aws_config = aws_config_loader.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        // Required for MinIO and most other S3-compatible services
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .read_timeout(Duration::from_secs(config.read_timeout_seconds))
            .build();
        s3_config_builder = s3_config_builder.timeout_config(timeout_config);

        Ok(AwsS3Client::from_conf(s3_config_builder.build()))
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Get a reference to the underlying AWS S3 client
    pub fn aws_client(&self) -> &AwsS3Client {
        &self.client
    }

    /// URL of `key`, path style for custom endpoints and virtual hosted otherwise
    pub fn object_url(&self, key: &str) -> String {
        match &self.config.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, self.config.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket,
                self.config.region.as_deref().unwrap_or(FALLBACK_REGION),
                key
            ),
        }
    }

    /// Size of an object, from a HEAD request
    pub async fn object_size(&self, key: &str) -> S3Result<u64> {
        let response = self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| S3Error::from(e).for_key(&self.config.bucket, key))?;

        Ok(response.content_length().unwrap_or(0).max(0) as u64)
    }

    /// Delete an object from the bucket
    pub async fn delete(&self, key: &str) -> S3Result<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(S3Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use crate::protocol::s3::S3ConfigBuilder;

    fn static_config(bucket: &str) -> S3ConfigBuilder {
        S3ConfigBuilder::new(bucket.to_string())
            .region("sa-east-1".to_string())
            .credential(Credential::new("ak".to_string(), "sk".to_string(), None))
    }

    #[tokio::test]
    async fn test_client_creation() {
        let config = static_config("test-bucket").build().unwrap();
        let client = S3Client::new(config).await.unwrap();
        assert_eq!(client.bucket(), "test-bucket");
        assert_eq!(client.config().bucket, "test-bucket");
    }

    #[tokio::test]
    async fn test_client_with_invalid_bucket() {
        let config = S3Config::new("".to_string());
        let result = S3Client::new(config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_object_url_virtual_hosted() {
        let config = static_config("data-bucket").build().unwrap();
        let client = S3Client::new(config).await.unwrap();
        assert_eq!(
            client.object_url("in/file.txt"),
            "https://data-bucket.s3.sa-east-1.amazonaws.com/in/file.txt"
        );
    }

    #[tokio::test]
    async fn test_object_url_path_style() {
        let config = static_config("data")
            .endpoint("http://localhost:9000".to_string())
            .build()
            .unwrap();
        let client = S3Client::new(config).await.unwrap();
        assert_eq!(
            client.object_url("file.txt"),
            "http://localhost:9000/data/file.txt"
        );
    }
}
