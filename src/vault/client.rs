//! Vault HTTP session: login, secret reads, mount tuning and raw GETs.

use reqwest::{Certificate, Identity, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::error::VaultError;
use super::types::{EngineVersion, LoginResponse, SecretBundle, SecretV1, SecretV2, TuneResponse};

pub const DEFAULT_APPROLE_PATH: &str = "auth/approle/login";
pub const DEFAULT_CERT_PATH: &str = "auth/cert/login";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// TTL requested for issued credentials
const SECRET_TTL: &str = "3600s";

/// Authentication scheme selected in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultAuthMethod {
    Token,
    AppRole,
    Certificate,
}

impl FromStr for VaultAuthMethod {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "token" => Ok(VaultAuthMethod::Token),
            "approle" => Ok(VaultAuthMethod::AppRole),
            "cert" => Ok(VaultAuthMethod::Certificate),
            _ => Err(VaultError::UnknownAuthMethod(s.to_string())),
        }
    }
}

/// Credentials for one of the supported login schemes
pub enum VaultAuth {
    Token(SecretString),
    AppRole {
        role_id: String,
        secret_id: SecretString,
        path: Option<String>,
    },
    Certificate {
        certificate: PathBuf,
        key: PathBuf,
        ca: PathBuf,
        role: String,
        path: Option<String>,
    },
}

impl std::fmt::Debug for VaultAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultAuth::Token(_) => f.write_str("Token([REDACTED])"),
            VaultAuth::AppRole { role_id, path, .. } => f
                .debug_struct("AppRole")
                .field("role_id", role_id)
                .field("path", path)
                .finish_non_exhaustive(),
            VaultAuth::Certificate {
                certificate,
                role,
                path,
                ..
            } => f
                .debug_struct("Certificate")
                .field("certificate", certificate)
                .field("role", role)
                .field("path", path)
                .finish_non_exhaustive(),
        }
    }
}

impl VaultAuth {
    pub fn method(&self) -> VaultAuthMethod {
        match self {
            VaultAuth::Token(_) => VaultAuthMethod::Token,
            VaultAuth::AppRole { .. } => VaultAuthMethod::AppRole,
            VaultAuth::Certificate { .. } => VaultAuthMethod::Certificate,
        }
    }
}

/// Transport settings shared by every request of a session
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Sent as `X-Vault-Namespace` when set
    pub namespace: Option<String>,
    /// Accept any server certificate
    pub tls_skip_verify: bool,
}

/// `<address>/v1/<path>` with stray slashes removed
pub fn api_url(address: &str, path: &str) -> String {
    format!(
        "{}/v1/{}",
        address.trim().trim_end_matches('/'),
        path.trim_matches('/')
    )
}

fn non_empty(path: &Option<String>, default: &str) -> String {
    match path {
        Some(p) if !p.trim().is_empty() => p.clone(),
        _ => default.to_string(),
    }
}

/// An authenticated vault session
pub struct VaultSession {
    http: reqwest::Client,
    address: String,
    token: SecretString,
    namespace: Option<String>,
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl VaultSession {
    fn user_agent() -> String {
        format!("s3bridge/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Authenticate with `auth` and return a session holding the bearer token.
    ///
    /// Token auth makes no network call. App-role and certificate auth POST to
    /// their login path and read `auth.client_token` from the reply.
    pub async fn login(
        address: &str,
        auth: VaultAuth,
        options: &TransportOptions,
    ) -> Result<Self, VaultError> {
        if address.trim().is_empty() {
            return Err(VaultError::Config("vault address is not configured".to_string()));
        }

        match auth {
            VaultAuth::Token(token) => {
                if token.expose_secret().trim().is_empty() {
                    return Err(VaultError::Config("vault token is not configured".to_string()));
                }
                let http = build_http(options, None)?;
                Ok(Self::with_token(http, address, token, options))
            }
            VaultAuth::AppRole {
                role_id,
                secret_id,
                path,
            } => {
                if role_id.trim().is_empty() || secret_id.expose_secret().trim().is_empty() {
                    return Err(VaultError::Config(
                        "approle auth needs both a role id and a secret id".to_string(),
                    ));
                }
                let http = build_http(options, None)?;
                let body = json!({
                    "role_id": role_id,
                    "secret_id": secret_id.expose_secret(),
                });
                let url = api_url(address, &non_empty(&path, DEFAULT_APPROLE_PATH));
                let token = login_request(&http, &url, &body, options).await?;
                Ok(Self::with_token(http, address, token, options))
            }
            VaultAuth::Certificate {
                certificate,
                key,
                ca,
                role,
                path,
            } => {
                let tls = load_client_tls(&certificate, &key, &ca).await?;
                let http = build_http(options, Some(tls))?;
                let body = json!({ "name": role });
                let url = api_url(address, &non_empty(&path, DEFAULT_CERT_PATH));
                let token = login_request(&http, &url, &body, options).await?;
                Ok(Self::with_token(http, address, token, options))
            }
        }
    }

    fn with_token(
        http: reqwest::Client,
        address: &str,
        token: SecretString,
        options: &TransportOptions,
    ) -> Self {
        Self {
            http,
            address: address.trim().trim_end_matches('/').to_string(),
            token,
            namespace: options.namespace.clone().filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn url(&self, path: &str) -> String {
        api_url(&self.address, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, url)
            .header("X-Vault-Token", self.token.expose_secret())
            .header("Accept", "application/json");
        if let Some(ns) = &self.namespace {
            request = request.header("X-Vault-Namespace", ns);
        }
        request
    }

    /// Read a secret from `mount/secret`, decoding it per engine `version`.
    ///
    /// `version` is "1" (or empty), "2" or "auto". Anything else fails before a
    /// request is sent.
    pub async fn secrets(
        &self,
        mount: &str,
        secret: &str,
        version: &str,
    ) -> Result<SecretBundle, VaultError> {
        let mut version: EngineVersion = version.parse()?;
        if version == EngineVersion::Auto {
            version = self.mount_version(mount).await?;
        }

        let mount = mount.trim_matches('/');
        let secret = secret.trim_matches('/');
        let path = match version {
            EngineVersion::V2 => format!("{}/data/{}", mount, secret),
            _ => format!("{}/{}", mount, secret),
        };
        let url = self.url(&path);
        debug!(url = %url, version = %version, "requesting secret");

        let text = self
            .send(self.request(Method::POST, &url).json(&json!({ "ttl": SECRET_TTL })), &url)
            .await?;

        let data = match version {
            EngineVersion::V2 => serde_json::from_str::<SecretV2>(&text)
                .map_err(|e| malformed(&url, e))?
                .data
                .and_then(|d| d.data),
            _ => serde_json::from_str::<SecretV1>(&text)
                .map_err(|e| malformed(&url, e))?
                .data,
        };

        let data = data.ok_or_else(|| VaultError::MalformedResponse {
            url: url.clone(),
            reason: "missing data object".to_string(),
        })?;
        Ok(SecretBundle::from_map(&data))
    }

    /// Discover the engine version of `mount` from `sys/mounts/<mount>/tune`
    pub async fn mount_version(&self, mount: &str) -> Result<EngineVersion, VaultError> {
        let url = self.url(&format!("sys/mounts/{}/tune", mount.trim_matches('/')));
        let text = self.send(self.request(Method::GET, &url), &url).await?;

        let tune: TuneResponse = serde_json::from_str(&text).map_err(|e| malformed(&url, e))?;
        let version = tune.version().ok_or_else(|| VaultError::MalformedResponse {
            url: url.clone(),
            reason: "missing options.version".to_string(),
        })?;

        debug!(mount, version = %version, "discovered engine version");
        match version.parse::<EngineVersion>()? {
            EngineVersion::Auto => Err(VaultError::UnsupportedEngineVersion(version)),
            found => Ok(found),
        }
    }

    /// Authenticated GET of an arbitrary API path
    pub async fn raw_get(&self, path: &str) -> Result<Value, VaultError> {
        let url = self.url(path);
        let text = self.send(self.request(Method::GET, &url), &url).await?;
        serde_json::from_str(&text).map_err(|e| malformed(&url, e))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<String, VaultError> {
        let response = request.send().await.map_err(|source| VaultError::Network {
            url: url.to_string(),
            source,
        })?;
        read_ok_body(response, url, false).await
    }
}

fn malformed(url: &str, err: serde_json::Error) -> VaultError {
    VaultError::MalformedResponse {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

async fn read_ok_body(
    response: reqwest::Response,
    url: &str,
    include_body: bool,
) -> Result<String, VaultError> {
    let status = response.status();
    let text = response.text().await.map_err(|source| VaultError::Network {
        url: url.to_string(),
        source,
    })?;

    if status != reqwest::StatusCode::OK {
        return Err(VaultError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: if include_body { text } else { String::new() },
        });
    }
    Ok(text)
}

async fn login_request(
    http: &reqwest::Client,
    url: &str,
    body: &Value,
    options: &TransportOptions,
) -> Result<SecretString, VaultError> {
    debug!(url, "vault login");
    let mut request = http.post(url).json(body);
    if let Some(ns) = options.namespace.as_deref().filter(|n| !n.trim().is_empty()) {
        request = request.header("X-Vault-Namespace", ns);
    }

    let response = request.send().await.map_err(|source| VaultError::Network {
        url: url.to_string(),
        source,
    })?;
    let text = read_ok_body(response, url, true).await?;

    let login: LoginResponse = serde_json::from_str(&text).map_err(|e| malformed(url, e))?;
    let auth = login.auth.ok_or_else(|| VaultError::MalformedResponse {
        url: url.to_string(),
        reason: "missing auth object".to_string(),
    })?;

    match auth.client_token {
        Some(token) if !token.is_empty() => {
            debug!(lease_seconds = auth.lease_duration, renewable = auth.renewable, "vault login ok");
            Ok(SecretString::from(token))
        }
        _ => Err(VaultError::MalformedResponse {
            url: url.to_string(),
            reason: "missing auth.client_token".to_string(),
        }),
    }
}

/// Client identity (certificate + key) and the CA that signs the server
pub struct ClientTls {
    identity: Identity,
    ca: Certificate,
}

async fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, VaultError> {
    if path.as_os_str().is_empty() {
        return Err(VaultError::Config(format!("{} path is not configured", what)));
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| VaultError::Certificate {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

pub async fn load_client_tls(
    certificate: &Path,
    key: &Path,
    ca: &Path,
) -> Result<ClientTls, VaultError> {
    let mut pem = read_pem(certificate, "client certificate").await?;
    let key_pem = read_pem(key, "client key").await?;
    let ca_pem = read_pem(ca, "CA certificate").await?;

    pem.push(b'\n');
    pem.extend_from_slice(&key_pem);

    let identity = Identity::from_pem(&pem).map_err(|e| VaultError::Certificate {
        path: certificate.display().to_string(),
        reason: e.to_string(),
    })?;
    let ca = Certificate::from_pem(&ca_pem).map_err(|e| VaultError::Certificate {
        path: ca.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(ClientTls { identity, ca })
}

fn build_http(
    options: &TransportOptions,
    tls: Option<ClientTls>,
) -> Result<reqwest::Client, VaultError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(VaultSession::user_agent())
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .danger_accept_invalid_certs(options.tls_skip_verify);

    if let Some(tls) = tls {
        builder = builder.identity(tls.identity).add_root_certificate(tls.ca);
    }

    builder
        .build()
        .map_err(|e| VaultError::Config(format!("failed to build HTTP client: {}", e)))
}
