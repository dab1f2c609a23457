//! Long-term credentials and secret lookup.
//!
//! [`Credentials`] is the key pair a caller signs with. The secret half lives in
//! a [`SecretString`] so it is zeroed on drop and never shows up in `Debug`
//! output. [`CredentialProvider`] is the verification-side lookup from a secret
//! id to its secret key.

use std::collections::HashMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::AuthError;

/// Environment variable holding the secret id.
pub const SECRET_ID_ENV: &str = "TENCENTCLOUD_SECRET_ID";

/// Environment variable holding the secret key.
pub const SECRET_KEY_ENV: &str = "TENCENTCLOUD_SECRET_KEY";

/// A secret id / secret key pair used to sign requests.
#[derive(Clone)]
pub struct Credentials {
    secret_id: String,
    secret_key: SecretString,
}

impl Credentials {
    /// Create credentials from explicit values.
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: SecretString::from(secret_key.into()),
        }
    }

    /// Load credentials from `TENCENTCLOUD_SECRET_ID` and `TENCENTCLOUD_SECRET_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingEnvVar`] if either variable is unset or empty.
    pub fn from_env() -> Result<Self, AuthError> {
        let secret_id = read_env(SECRET_ID_ENV)?;
        let secret_key = read_env(SECRET_KEY_ENV)?;
        Ok(Self::new(secret_id, secret_key))
    }

    /// The public secret id. Safe to log.
    #[must_use]
    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Expose the secret key for key derivation only.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

fn read_env(name: &str) -> Result<String, AuthError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::MissingEnvVar(name.to_owned()))
}

/// Trait for looking up secret keys by secret id.
///
/// Used on the verifying side, where the secret id arrives inside the
/// `Authorization` header and the key must come from a trusted store.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the secret key for the given secret id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SecretIdNotFound`] if the secret id is not recognized.
    fn get_secret_key(&self, secret_id: &str) -> Result<String, AuthError>;
}

/// An in-memory credential provider backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use tc3_auth::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(vec![
///     ("AKID123".to_owned(), "testkey".to_owned()),
/// ]);
///
/// assert_eq!(provider.get_secret_key("AKID123").unwrap(), "testkey");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, String>,
}

impl StaticCredentialProvider {
    /// Create a provider from (secret_id, secret_key) pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }
}

impl From<&Credentials> for StaticCredentialProvider {
    fn from(credentials: &Credentials) -> Self {
        Self::new([(
            credentials.secret_id().to_owned(),
            credentials.expose_secret().to_owned(),
        )])
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, secret_id: &str) -> Result<String, AuthError> {
        self.credentials
            .get(secret_id)
            .cloned()
            .ok_or_else(|| AuthError::SecretIdNotFound(secret_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_secret_id_and_key() {
        let creds = Credentials::new("AKID123", "testkey");
        assert_eq!(creds.secret_id(), "AKID123");
        assert_eq!(creds.expose_secret(), "testkey");
    }

    #[test]
    fn test_should_redact_secret_key_in_debug() {
        let creds = Credentials::new("AKID123", "super_secret_key");
        let debug_str = format!("{creds:?}");

        assert!(debug_str.contains("AKID123"));
        assert!(!debug_str.contains("super_secret_key"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_should_return_secret_key_for_known_secret_id() {
        let provider =
            StaticCredentialProvider::new(vec![("AKID".to_owned(), "secret".to_owned())]);

        assert_eq!(provider.get_secret_key("AKID").unwrap(), "secret");
    }

    #[test]
    fn test_should_return_error_for_unknown_secret_id() {
        let provider = StaticCredentialProvider::new(vec![]);

        let result = provider.get_secret_key("UNKNOWN");
        assert!(matches!(result, Err(AuthError::SecretIdNotFound(_))));
    }

    #[test]
    fn test_should_build_provider_from_credentials() {
        let creds = Credentials::new("AKID123", "testkey");
        let provider = StaticCredentialProvider::from(&creds);

        assert_eq!(provider.get_secret_key("AKID123").unwrap(), "testkey");
    }
}
