//! Domain error types
//!
//! This module defines the error hierarchy for the authorization engine.
//! Errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main error type
///
/// Every fallible operation in the crate returns this type. Remote-protocol
/// outcomes (pending, duplicate, returned) are not errors; they become state
/// transitions on the document instead.
#[derive(Debug, Error)]
pub enum EdiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Document XML failed schema or structural validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// The signer is unavailable or refused the document
    #[error("Signature error: {0}")]
    Signature(String),

    /// Transport failure talking to the tax authority
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Final rejection of a production document in an interactive call
    #[error("No se pudo autorizar, se detalla errores recibidos\n{}", .messages.join("\n"))]
    BusinessRejection {
        /// Access key of the rejected document
        access_key: String,
        /// Every error message received for the document
        messages: Vec<String>,
    },

    /// A cancellation or deletion request that the document state forbids
    #[error("Cancellation error: {0}")]
    Cancellation(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// Document store errors (uniqueness, consistency)
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// XML writing or parsing errors
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Transport errors raised by a validation gateway
///
/// Every variant is transient: the lifecycle turns them into a `waiting`
/// document and never into a rejection.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Failed to connect to the web service
    #[error("Failed to connect to web service: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server error (non-2xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Response body could not be understood
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl EdiError {
    /// Whether the error comes from the remote transport
    pub fn is_transient(&self) -> bool {
        matches!(self, EdiError::Gateway(_))
    }

    /// Wraps an XML writer or reader error
    pub fn xml(err: impl std::fmt::Display) -> Self {
        EdiError::Xml(err.to_string())
    }
}

impl From<std::io::Error> for EdiError {
    fn from(err: std::io::Error) -> Self {
        EdiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EdiError {
    fn from(err: serde_json::Error) -> Self {
        EdiError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for EdiError {
    fn from(err: toml::de::Error) -> Self {
        EdiError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<roxmltree::Error> for EdiError {
    fn from(err: roxmltree::Error) -> Self {
        EdiError::Xml(err.to_string())
    }
}
