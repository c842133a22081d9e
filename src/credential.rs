/*!
 * Short-lived storage credentials
 */

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Access key, secret key and optional session token used to sign storage requests.
///
/// Created once per process (statically or through the vault) and consumed when
/// the storage client is built. It is never refreshed.
pub struct Credential {
    pub access_key: String,
    secret_key: SecretString,
    session_token: Option<SecretString>,
}

impl Credential {
    pub fn new(access_key: String, secret_key: String, session_token: Option<String>) -> Self {
        Self {
            access_key,
            secret_key: SecretString::from(secret_key),
            session_token: session_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
        }
    }

    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|t| t.expose_secret())
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self::new(
            self.access_key.clone(),
            self.secret_key().to_owned(),
            self.session_token().map(str::to_owned),
        )
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
