//! Vault broker errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// A required setting is missing or invalid
    #[error("{0}")]
    Config(String),

    #[error("unsupported vault auth method '{0}' (expected token, approle or cert)")]
    UnknownAuthMethod(String),

    #[error("unsupported secrets engine version '{0}' (expected 1, 2 or auto)")]
    UnsupportedEngineVersion(String),

    /// A PEM input for certificate auth could not be read or parsed
    #[error("certificate {path}: {reason}")]
    Certificate { path: String, reason: String },

    #[error("network error calling {url}: {}", cause_chain(.source))]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}{}", body_suffix(.body))]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// The secret bundle lacks a field the credential needs
    #[error("secret at {path} has no '{field}' field")]
    MissingField { path: String, field: String },
}

/// `source` followed by each underlying cause, separated by ": "
fn cause_chain(source: &reqwest::Error) -> String {
    let mut out = source.to_string();
    let mut next = std::error::Error::source(source);
    while let Some(cause) = next {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        next = cause.source();
    }
    out
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl VaultError {
    /// True when the failure happened before talking to the vault
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            VaultError::Config(_)
                | VaultError::UnknownAuthMethod(_)
                | VaultError::UnsupportedEngineVersion(_)
                | VaultError::Certificate { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_includes_body() {
        let err = VaultError::Status {
            url: "http://vault:8200/v1/auth/approle/login".to_string(),
            status: 400,
            body: "{\"errors\":[\"invalid role ID\"]}".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("status 400"));
        assert!(text.contains("invalid role ID"));

        let err = VaultError::Status {
            url: "http://vault:8200/v1/aws/sts/role".to_string(),
            status: 403,
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "http://vault:8200/v1/aws/sts/role returned status 403"
        );
    }

    #[test]
    fn test_configuration_classification() {
        assert!(VaultError::Config("no address".to_string()).is_configuration());
        assert!(VaultError::UnknownAuthMethod("ldap".to_string()).is_configuration());
        assert!(VaultError::Certificate {
            path: "/tmp/ca.pem".to_string(),
            reason: "not found".to_string()
        }
        .is_configuration());
        assert!(!VaultError::MissingField {
            path: "aws/sts/role".to_string(),
            field: "access_key".to_string()
        }
        .is_configuration());
    }
}
