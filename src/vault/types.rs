//! Typed shapes of the vault responses the broker reads

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::VaultError;

/// Body of `auth/approle/login` and `auth/cert/login`
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub auth: Option<AuthInfo>,
}

#[derive(Debug, Deserialize)]
pub struct AuthInfo {
    pub client_token: Option<String>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
}

/// Version 1 payload: fields directly under `data`
#[derive(Debug, Deserialize)]
pub struct SecretV1 {
    pub data: Option<Map<String, Value>>,
}

/// Version 2 payload: fields under `data.data`
#[derive(Debug, Deserialize)]
pub struct SecretV2 {
    pub data: Option<SecretV1>,
}

/// Body of `sys/mounts/<mount>/tune`
#[derive(Debug, Deserialize)]
pub struct TuneResponse {
    pub options: Option<HashMap<String, Value>>,
    pub data: Option<TuneData>,
}

#[derive(Debug, Deserialize)]
pub struct TuneData {
    pub options: Option<HashMap<String, Value>>,
}

impl TuneResponse {
    /// `options.version`, looking inside the `data` wrapper when needed
    pub fn version(&self) -> Option<String> {
        self.options
            .as_ref()
            .or_else(|| self.data.as_ref().and_then(|d| d.options.as_ref()))
            .and_then(|o| o.get("version"))
            .map(stringify)
    }
}

/// Secrets engine response convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineVersion {
    V1,
    V2,
    /// Ask the mount which version it runs
    Auto,
}

impl FromStr for EngineVersion {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "1" => Ok(EngineVersion::V1),
            "2" => Ok(EngineVersion::V2),
            "auto" => Ok(EngineVersion::Auto),
            _ => Err(VaultError::UnsupportedEngineVersion(s.to_string())),
        }
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineVersion::V1 => write!(f, "1"),
            EngineVersion::V2 => write!(f, "2"),
            EngineVersion::Auto => write!(f, "auto"),
        }
    }
}

/// Render any JSON value as the string stored in a bundle
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Field name to string value, decoded from a secret response
#[derive(Clone, Default, PartialEq)]
pub struct SecretBundle(HashMap<String, String>);

impl SecretBundle {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self(
            map.iter()
                .map(|(k, v)| (k.clone(), stringify(v)))
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

// Values are secrets; only the field names are printed.
impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.0.keys().collect();
        keys.sort();
        f.debug_struct("SecretBundle").field("fields", &keys).finish()
    }
}
