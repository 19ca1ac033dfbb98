//! Database credentials kept out of logs
//!
//! The PostgreSQL connection string embeds a password. It is held in a
//! `Secret` that zeroes memory on drop and redacts `Debug` output; callers
//! must go through `expose_secret()`, or use [`redacted_dsn`] for anything
//! printed.
//!
//! ```rust
//! use sri_edi::config::{redacted_dsn, secret_string};
//! use secrecy::ExposeSecret;
//!
//! let dsn = secret_string("postgresql://sri:pw@localhost/sri".to_string());
//! assert!(dsn.expose_secret().as_str().starts_with("postgresql://"));
//! assert!(!format!("{dsn:?}").contains("pw@"));
//! assert_eq!(redacted_dsn(&dsn), "postgresql://***@localhost/sri");
//! ```

use secrecy::{CloneableSecret, DebugSecret, ExposeSecret, Secret, SerializableSecret};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Connection string payload; zeroed on drop
#[derive(Clone, Debug, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl SecretValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// True for the two URL schemes tokio-postgres accepts
    pub fn is_postgres_url(&self) -> bool {
        self.0.starts_with("postgresql://") || self.0.starts_with("postgres://")
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        SecretValue(value)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Secret string used for credentials in the configuration
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Connection string with user and password replaced, safe to print
pub fn redacted_dsn(secret: &SecretString) -> String {
    match secret.expose_secret().as_str().rsplit_once('@') {
        Some((_, host)) => format!("postgresql://***@{host}"),
        None => "postgresql://***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_hides_password() {
        let secret = secret_string("postgresql://sri:hunter2@db/sri".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("hunter2"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_redacted_dsn() {
        let with_credentials = secret_string("postgresql://sri:hunter2@db:5432/sri".to_string());
        assert_eq!(redacted_dsn(&with_credentials), "postgresql://***@db:5432/sri");

        let without_host = secret_string("host=db user=sri".to_string());
        assert_eq!(redacted_dsn(&without_host), "postgresql://***");
    }

    #[test]
    fn test_scheme_check() {
        assert!(SecretValue::from("postgres://a@h/d".to_string()).is_postgres_url());
        assert!(!SecretValue::from("mysql://a@h/d".to_string()).is_postgres_url());
        assert!(SecretValue::from("   ".to_string()).is_empty());
    }

    #[test]
    fn test_connection_string_from_toml() {
        #[derive(Deserialize)]
        struct Section {
            connection_string: SecretString,
        }

        let parsed: Section =
            toml::from_str("connection_string = \"postgres://a:b@h/d\"").unwrap();
        assert_eq!(parsed.connection_string.expose_secret().as_str(), "postgres://a:b@h/d");
    }
}
