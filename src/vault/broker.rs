//! Role to storage credential exchange

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use super::client::{TransportOptions, VaultAuth, VaultAuthMethod, VaultSession};
use super::error::VaultError;
use crate::credential::Credential;

pub const DEFAULT_ENGINE_PATH: &str = "aws";
const STS_SUFFIX: &str = "sts";

/// Vault connection and login settings, as read from the configuration file
#[derive(Clone, Default)]
pub struct VaultSettings {
    pub address: String,
    pub engine_path: String,
    pub engine_version: String,
    pub namespace: Option<String>,
    pub tls_skip_verify: bool,
    pub auth_method: String,
    pub token: SecretString,
    pub role_id: String,
    pub secret_id: SecretString,
    pub approle_path: String,
    pub certificate: String,
    pub certificate_key: String,
    pub certificate_ca: String,
    pub certificate_role: String,
    pub certificate_path: String,
}

impl std::fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSettings")
            .field("address", &self.address)
            .field("engine_path", &self.engine_path)
            .field("engine_version", &self.engine_version)
            .field("namespace", &self.namespace)
            .field("auth_method", &self.auth_method)
            .finish_non_exhaustive()
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required(value: &str, what: &str) -> Result<String, VaultError> {
    optional(value).ok_or_else(|| VaultError::Config(format!("{} is not configured", what)))
}

impl VaultSettings {
    /// Build the login credentials for the configured method, checking the
    /// method's required settings
    pub fn auth(&self) -> Result<VaultAuth, VaultError> {
        match self.auth_method.parse::<VaultAuthMethod>()? {
            VaultAuthMethod::Token => Ok(VaultAuth::Token(SecretString::from(required(
                self.token.expose_secret(),
                "vault_auth_token",
            )?))),
            VaultAuthMethod::AppRole => Ok(VaultAuth::AppRole {
                role_id: required(&self.role_id, "vault_auth_role_id")?,
                secret_id: SecretString::from(required(
                    self.secret_id.expose_secret(),
                    "vault_auth_secret_id",
                )?),
                path: optional(&self.approle_path),
            }),
            VaultAuthMethod::Certificate => Ok(VaultAuth::Certificate {
                certificate: PathBuf::from(required(&self.certificate, "vault_auth_certificate")?),
                key: PathBuf::from(required(&self.certificate_key, "vault_auth_certificate_key")?),
                ca: PathBuf::from(required(&self.certificate_ca, "vault_auth_certificate_ca")?),
                role: self.certificate_role.trim().to_string(),
                path: optional(&self.certificate_path),
            }),
        }
    }

    pub fn transport(&self) -> TransportOptions {
        TransportOptions {
            namespace: self.namespace.as_deref().and_then(optional),
            tls_skip_verify: self.tls_skip_verify,
        }
    }
}

/// Strip surrounding slashes; an empty path means the default `aws` mount
pub fn normalize_engine_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_ENGINE_PATH.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Log in to the vault and exchange `role` for short-lived storage credentials.
///
/// Reads `<engine path>/sts/<role>` and maps `access_key`, `secret_key` and
/// `security_token`. The session is dropped as soon as the credential is built.
pub async fn load_credentials(settings: &VaultSettings, role: &str) -> Result<Credential, VaultError> {
    let address = required(&settings.address, "vault_address")?;
    let role = optional(role)
        .ok_or_else(|| VaultError::Config("a vault role is required (--role)".to_string()))?;
    let auth = settings.auth()?;
    let method = auth.method();

    let session = VaultSession::login(&address, auth, &settings.transport()).await?;

    let mount = format!("{}/{}", normalize_engine_path(&settings.engine_path), STS_SUFFIX);
    let bundle = session
        .secrets(&mount, &role, &settings.engine_version)
        .await?;

    let field = |name: &str| -> Result<String, VaultError> {
        bundle
            .get(name)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| VaultError::MissingField {
                path: format!("{}/{}", mount, role),
                field: name.to_string(),
            })
    };

    let access_key = field("access_key")?;
    let secret_key = field("secret_key")?;
    let session_token = bundle.get("security_token").map(str::to_string);

    info!(
        role = %role,
        mount = %mount,
        auth = ?method,
        temporary = session_token.as_deref().is_some_and(|t| !t.is_empty()),
        "obtained storage credentials from vault"
    );

    Ok(Credential::new(access_key, secret_key, session_token))
}

/// Log in with `settings` and GET an arbitrary API path, e.g. `sys/health`
pub async fn read_path(settings: &VaultSettings, path: &str) -> Result<Value, VaultError> {
    let address = required(&settings.address, "vault_address")?;
    let path = optional(path)
        .ok_or_else(|| VaultError::Config("a vault path is required".to_string()))?;
    let session = VaultSession::login(&address, settings.auth()?, &settings.transport()).await?;
    session.raw_get(&path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_settings(address: &str) -> VaultSettings {
        VaultSettings {
            address: address.to_string(),
            auth_method: "token".to_string(),
            token: SecretString::from("root-token"),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_engine_path() {
        assert_eq!(normalize_engine_path(""), "aws");
        assert_eq!(normalize_engine_path("/"), "aws");
        assert_eq!(normalize_engine_path("/aws-prod/"), "aws-prod");
        assert_eq!(normalize_engine_path("team/aws"), "team/aws");
    }

    #[test]
    fn test_auth_validation_happens_before_network() {
        let mut settings = token_settings("http://127.0.0.1:1");
        settings.token = SecretString::default();
        assert!(settings.auth().unwrap_err().is_configuration());

        settings.auth_method = "approle".to_string();
        settings.role_id = "rid".to_string();
        assert!(matches!(settings.auth(), Err(VaultError::Config(m)) if m.contains("secret_id")));

        settings.auth_method = "cert".to_string();
        settings.certificate = "/etc/client.pem".to_string();
        settings.certificate_key = "/etc/client-key.pem".to_string();
        assert!(matches!(settings.auth(), Err(VaultError::Config(m)) if m.contains("certificate_ca")));

        settings.auth_method = "kerberos".to_string();
        assert!(matches!(settings.auth(), Err(VaultError::UnknownAuthMethod(_))));
    }

    #[test]
    fn test_settings_debug_hides_secrets() {
        let mut settings = token_settings("http://vault:8200");
        settings.secret_id = SecretString::from("hidden-secret-id");
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("root-token"));
        assert!(!printed.contains("hidden-secret-id"));
    }

    #[tokio::test]
    async fn test_missing_address_and_role() {
        let err = load_credentials(&token_settings(""), "deploy").await.unwrap_err();
        assert!(err.is_configuration());

        let err = load_credentials(&token_settings("http://127.0.0.1:1"), " ")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Config(m) if m.contains("role")));
    }

    #[tokio::test]
    async fn test_load_credentials_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/aws/sts/deploy"))
            .and(header("x-vault-token", "root-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lease_duration": 3599,
                "data": {
                    "access_key": "ASIAEXAMPLE",
                    "secret_key": "wJalrXUtnFEMI",
                    "security_token": "FwoGZXIvYXdzE"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cred = load_credentials(&token_settings(&server.uri()), "deploy")
            .await
            .unwrap();
        assert_eq!(cred.access_key, "ASIAEXAMPLE");
        assert_eq!(cred.secret_key(), "wJalrXUtnFEMI");
        assert_eq!(cred.session_token(), Some("FwoGZXIvYXdzE"));
    }

    #[tokio::test]
    async fn test_custom_engine_path_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/aws-prod/sts/reader"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"access_key": "A", "secret_key": "S", "security_token": null}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = token_settings(&server.uri());
        settings.engine_path = "/aws-prod/".to_string();
        let cred = load_credentials(&settings, "reader").await.unwrap();
        assert_eq!(cred.session_token(), None);
    }

    #[tokio::test]
    async fn test_missing_secret_key_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/aws/sts/deploy"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"access_key": "A"}})),
            )
            .mount(&server)
            .await;

        let err = load_credentials(&token_settings(&server.uri()), "deploy")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::MissingField { ref field, .. } if field == "secret_key"));
        assert!(!err.is_configuration());
    }

    #[tokio::test]
    async fn test_approle_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"auth": {"client_token": "approle-token"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/aws/sts/deploy"))
            .and(header("x-vault-token", "approle-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"access_key": "A", "secret_key": "S"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = VaultSettings {
            address: server.uri(),
            auth_method: "AppRole".to_string(),
            role_id: "rid".to_string(),
            secret_id: SecretString::from("sid"),
            ..Default::default()
        };
        let cred = load_credentials(&settings, "deploy").await.unwrap();
        assert_eq!(cred.access_key, "A");
    }

    #[tokio::test]
    async fn test_read_path_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/sys/mounts/aws/tune"))
            .and(header("x-vault-token", "root-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"default_lease_ttl": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let value = read_path(&token_settings(&server.uri()), "/sys/mounts/aws/tune")
            .await
            .unwrap();
        assert_eq!(value["default_lease_ttl"], 3600);

        let err = read_path(&token_settings(&server.uri()), "").await.unwrap_err();
        assert!(err.is_configuration());
    }
}
