/*!
 * Persisted configuration for s3bridge
 */

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::chunking::normalize_part_size;
use crate::credential::Credential;
use crate::error::{BridgeError, Result};
use crate::vault::VaultSettings;

/// File name looked up in the configuration directory
pub const CONFIG_FILE_NAME: &str = "s3bridge.json";

/// Environment variable naming the configuration directory
pub const CONFIG_DIR_ENV: &str = "S3BRIDGE_CONFIG";

pub const DEFAULT_REGION: &str = "sa-east-1";
pub const DEFAULT_AUTH_METHOD: &str = "token";

pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn secret_is_empty(v: &SecretString) -> bool {
    v.expose_secret().is_empty()
}

// Secrets are written to the file in clear; they stay wrapped everywhere else.
fn serialize_secret<S>(v: &SecretString, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(v.expose_secret())
}

/// Defaults stored in `s3bridge.json`; command-line flags override them per run
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// User metadata attached to every upload
    #[serde(rename = "bucket_metadata", skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    #[serde(rename = "bucket_name", skip_serializing_if = "String::is_empty")]
    pub bucket: String,

    #[serde(rename = "bucket_region", skip_serializing_if = "String::is_empty")]
    pub region: String,

    /// Multipart part size in bytes; 0 selects by file size
    #[serde(rename = "bucket_part_size", skip_serializing_if = "is_zero")]
    pub part_size: u64,

    #[serde(rename = "bucket_endpoint_address", skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_address: String,

    #[serde(rename = "vault_token_engine_path", skip_serializing_if = "String::is_empty")]
    pub vault_engine_path: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub local_folder: String,

    #[serde(rename = "bucket_access_key", skip_serializing_if = "String::is_empty")]
    pub access_key: String,

    #[serde(
        rename = "bucket_secret_key",
        skip_serializing_if = "secret_is_empty",
        serialize_with = "serialize_secret"
    )]
    pub secret_key: SecretString,

    #[serde(
        rename = "bucket_token_session",
        skip_serializing_if = "secret_is_empty",
        serialize_with = "serialize_secret"
    )]
    pub session_token: SecretString,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_method: String,

    #[serde(skip_serializing_if = "secret_is_empty", serialize_with = "serialize_secret")]
    pub vault_auth_token: SecretString,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_role_id: String,

    #[serde(skip_serializing_if = "secret_is_empty", serialize_with = "serialize_secret")]
    pub vault_auth_secret_id: SecretString,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_approle_path: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_certificate: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_certificate_key: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_certificate_ca: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_certificate_role: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_auth_certificate_path: String,

    /// Enterprise namespace sent with every vault request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_namespace: String,

    /// "1", "2" or "auto"; empty means "1"
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_engine_version: String,

    #[serde(skip_serializing_if = "is_false")]
    pub vault_tls_skip_verify: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metadata: BTreeMap::new(),
            bucket: String::new(),
            region: DEFAULT_REGION.to_string(),
            part_size: 0,
            endpoint: String::new(),
            vault_address: String::new(),
            vault_engine_path: String::new(),
            local_folder: executable_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ".".to_string()),
            access_key: String::new(),
            secret_key: SecretString::default(),
            session_token: SecretString::default(),
            vault_auth_method: String::new(),
            vault_auth_token: SecretString::default(),
            vault_auth_role_id: String::new(),
            vault_auth_secret_id: SecretString::default(),
            vault_auth_approle_path: String::new(),
            vault_auth_certificate: String::new(),
            vault_auth_certificate_key: String::new(),
            vault_auth_certificate_ca: String::new(),
            vault_auth_certificate_role: String::new(),
            vault_auth_certificate_path: String::new(),
            vault_namespace: String::new(),
            vault_engine_version: String::new(),
            vault_tls_skip_verify: false,
        }
    }
}

// Credentials and vault secrets stay out of logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("part_size", &self.part_size)
            .field("local_folder", &self.local_folder)
            .field("metadata", &self.metadata)
            .field("vault_address", &self.vault_address)
            .field("vault_auth_method", &self.vault_auth_method)
            .field("has_static_credentials", &self.has_static_credentials())
            .finish_non_exhaustive()
    }
}

/// Directory holding the running executable
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

/// Configuration directory: `$S3BRIDGE_CONFIG`, then the home directory, then the executable's
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().or_else(executable_dir),
    }
}

/// Full path of the configuration file
pub fn default_config_path() -> PathBuf {
    config_dir()
        .map(|d| d.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Parse `key1=value1;key2=value2` into a map. Blank segments are skipped.
pub fn parse_metadata(input: &str) -> Result<BTreeMap<String, String>> {
    let mut metadata = BTreeMap::new();
    for (index, pair) in input.split(';').enumerate() {
        if pair.trim().is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            BridgeError::Config(format!("[{}] metadata {{{}}} is invalid", index, pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(BridgeError::Config(format!(
                "[{}] metadata {{{}}} has an empty key",
                index, pair
            )));
        }
        metadata.insert(key.to_string(), value.trim().to_string());
    }
    Ok(metadata)
}

impl AppConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it cannot be read
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => {
                debug!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unable to load configuration file, using defaults");
                Self::default()
            }
        }
    }

    /// Save configuration as pretty printed JSON
    pub fn to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override stored credentials with non-empty values from `lookup`
    pub fn apply_credential_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(v) = non_empty(ENV_ACCESS_KEY) {
            self.access_key = v;
        }
        if let Some(v) = non_empty(ENV_SECRET_KEY) {
            self.secret_key = SecretString::from(v);
        }
        if let Some(v) = non_empty(ENV_SESSION_TOKEN) {
            self.session_token = SecretString::from(v);
        }
    }

    pub fn set_part_size(&mut self, size: u64) {
        self.part_size = normalize_part_size(size);
    }

    pub fn has_static_credentials(&self) -> bool {
        !self.access_key.is_empty() && !secret_is_empty(&self.secret_key)
    }

    /// Static credentials, when both keys are present
    pub fn static_credential(&self) -> Option<Credential> {
        self.has_static_credentials().then(|| {
            Credential::new(
                self.access_key.clone(),
                self.secret_key.expose_secret().to_string(),
                Some(self.session_token.expose_secret().to_string()),
            )
        })
    }

    /// Vault settings for the credential broker
    pub fn vault_settings(&self) -> VaultSettings {
        VaultSettings {
            address: self.vault_address.clone(),
            engine_path: self.vault_engine_path.clone(),
            engine_version: self.vault_engine_version.clone(),
            namespace: Some(self.vault_namespace.clone()).filter(|n| !n.is_empty()),
            tls_skip_verify: self.vault_tls_skip_verify,
            auth_method: self.vault_auth_method.clone(),
            token: self.vault_auth_token.clone(),
            role_id: self.vault_auth_role_id.clone(),
            secret_id: self.vault_auth_secret_id.clone(),
            approle_path: self.vault_auth_approle_path.clone(),
            certificate: self.vault_auth_certificate.clone(),
            certificate_key: self.vault_auth_certificate_key.clone(),
            certificate_ca: self.vault_auth_certificate_ca.clone(),
            certificate_role: self.vault_auth_certificate_role.clone(),
            certificate_path: self.vault_auth_certificate_path.clone(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chunking::MIN_PART_SIZE;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.region, "sa-east-1");
        assert!(!config.local_folder.is_empty());
        assert_eq!(config.part_size, 0);
        assert!(!config.has_static_credentials());
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"bucket_name": "data"}"#).unwrap();
        assert_eq!(config.bucket, "data");
        assert_eq!(config.region, DEFAULT_REGION);
    }

    #[test]
    fn test_json_keys_match_file_format() {
        let json = r#"{
            "bucket_metadata": {"owner": "etl"},
            "bucket_name": "data",
            "bucket_region": "us-east-1",
            "bucket_part_size": 10485760,
            "bucket_endpoint_address": "http://minio:9000",
            "vault_address": "https://vault:8200",
            "vault_token_engine_path": "aws-prod",
            "local_folder": "/srv/in",
            "bucket_access_key": "AK",
            "bucket_secret_key": "SK",
            "bucket_token_session": "ST",
            "vault_auth_method": "approle",
            "vault_auth_role_id": "rid",
            "vault_auth_secret_id": "sid",
            "vault_auth_certificate_role": "web"
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.metadata.get("owner").map(String::as_str), Some("etl"));
        assert_eq!(config.part_size, 10 * 1024 * 1024);
        assert_eq!(config.endpoint, "http://minio:9000");
        assert_eq!(config.vault_engine_path, "aws-prod");
        assert_eq!(config.session_token.expose_secret(), "ST");
        assert_eq!(config.vault_auth_secret_id.expose_secret(), "sid");
        assert_eq!(config.vault_auth_certificate_role, "web");
        assert!(config.has_static_credentials());
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let mut config = AppConfig::default();
        config.local_folder.clear();
        config.bucket = "data".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"bucket_name":"data","bucket_region":"sa-east-1"}"#);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.bucket = "archive".to_string();
        config.metadata = parse_metadata("a=1;b=2").unwrap();
        config.vault_tls_skip_verify = true;
        config.access_key = "AK".to_string();
        config.secret_key = SecretString::from("SK");
        config.vault_auth_token = SecretString::from("hvs.token");
        config.to_file(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.bucket, "archive");
        assert_eq!(loaded.metadata, config.metadata);
        assert!(loaded.vault_tls_skip_verify);
        assert_eq!(loaded.secret_key.expose_secret(), "SK");
        assert_eq!(loaded.vault_auth_token.expose_secret(), "hvs.token");
        assert!(loaded.session_token.expose_secret().is_empty());
        assert!(loaded.has_static_credentials());
    }

    #[test]
    fn test_unreadable_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(AppConfig::from_file(&path).is_err());
        let config = AppConfig::load_or_default(&path);
        assert_eq!(config.region, DEFAULT_REGION);
        assert!(config.bucket.is_empty());
    }

    #[test]
    fn test_env_overrides_only_when_set() {
        let mut config = AppConfig::default();
        config.access_key = "stored-ak".to_string();
        config.secret_key = SecretString::from("stored-sk");

        let env = HashMap::from([
            (ENV_ACCESS_KEY, "env-ak".to_string()),
            (ENV_SECRET_KEY, String::new()),
        ]);
        config.apply_credential_env(|name| env.get(name).cloned());

        assert_eq!(config.access_key, "env-ak");
        assert_eq!(config.secret_key.expose_secret(), "stored-sk");
        assert!(config.session_token.expose_secret().is_empty());
    }

    #[test]
    fn test_parse_metadata() {
        let map = parse_metadata(" owner = etl ;env=prod;").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["owner"], "etl");
        assert_eq!(map["env"], "prod");

        let map = parse_metadata("query=a=b").unwrap();
        assert_eq!(map["query"], "a=b");

        let err = parse_metadata("a=1;broken").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("[1] metadata {broken} is invalid"));

        assert!(parse_metadata("=x").is_err());
    }

    #[test]
    fn test_part_size_normalisation() {
        let mut config = AppConfig::default();
        config.set_part_size(1024);
        assert_eq!(config.part_size, 0);
        config.set_part_size(MIN_PART_SIZE);
        assert_eq!(config.part_size, MIN_PART_SIZE);
    }

    #[test]
    fn test_vault_settings_mapping() {
        let mut config = AppConfig::default();
        config.vault_address = "https://vault:8200".to_string();
        config.vault_auth_method = "cert".to_string();
        config.vault_auth_certificate_ca = "/etc/ca.pem".to_string();
        let settings = config.vault_settings();
        assert_eq!(settings.address, "https://vault:8200");
        assert_eq!(settings.certificate_ca, "/etc/ca.pem");
        assert_eq!(settings.namespace, None);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut config = AppConfig::default();
        config.secret_key = SecretString::from("top-secret");
        config.vault_auth_token = SecretString::from("hvs.token");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("top-secret"));
        assert!(!printed.contains("hvs.token"));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
