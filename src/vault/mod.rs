//! Credential broker backed by a vault service
//!
//! Logs in with a static token, an app-role or a client certificate, then
//! reads short-lived storage credentials for a role from the STS endpoint of
//! an AWS secrets engine. Engine versions 1 and 2 are supported, or `auto`
//! to ask the mount.

mod broker;
mod client;
mod error;
mod types;

pub use broker::{
    load_credentials, normalize_engine_path, read_path, VaultSettings, DEFAULT_ENGINE_PATH,
};
pub use client::{
    api_url, TransportOptions, VaultAuth, VaultAuthMethod, VaultSession, DEFAULT_APPROLE_PATH,
    DEFAULT_CERT_PATH,
};
pub use error::VaultError;
pub use types::{EngineVersion, SecretBundle};
