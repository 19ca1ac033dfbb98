//! Validation gateway contract and reply models
//!
//! The authority exposes two operations: reception ("submit for
//! validation") and authorization query. Implementations only translate
//! transport; classification happens in [`crate::core::classify`].

use crate::domain::{AccessKey, GatewayError, RemoteMessage};
use async_trait::async_trait;

/// `estado` of the authorization entry that means approved
pub const STATUS_AUTHORIZED: &str = "AUTORIZADO";

/// `estado` of a reception reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// `RECIBIDA`
    Received,
    /// `DEVUELTA`
    Returned,
    /// Anything else the service may answer
    Other(String),
}

impl ReceiptStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "RECIBIDA" => ReceiptStatus::Received,
            "DEVUELTA" => ReceiptStatus::Returned,
            other => ReceiptStatus::Other(other.to_string()),
        }
    }
}

/// Reply of the reception service
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptReply {
    pub status: ReceiptStatus,
    pub messages: Vec<RemoteMessage>,
}

/// One `autorizacion` entry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorizationEntry {
    /// `estado`, e.g. `AUTORIZADO`, `NO AUTORIZADO`, `EN PROCESO`
    pub status: String,
    pub number: Option<String>,
    /// `fechaAutorizacion` as sent by the service
    pub date: Option<String>,
    pub environment: Option<String>,
    pub messages: Vec<RemoteMessage>,
}

impl AuthorizationEntry {
    pub fn is_authorized(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(STATUS_AUTHORIZED)
    }
}

/// Reply of the authorization service
///
/// The service may return several entries for the same key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorizationReply {
    pub access_key: Option<String>,
    pub entries: Vec<AuthorizationEntry>,
}

impl AuthorizationReply {
    /// First approved entry, if any
    pub fn authorized_entry(&self) -> Option<&AuthorizationEntry> {
        self.entries.iter().find(|entry| entry.is_authorized())
    }
}

/// Client of the authority's offline web services
#[async_trait]
pub trait ValidationGateway: Send + Sync {
    /// Submits the signed document bytes
    async fn submit_for_validation(&self, signed_xml: &[u8]) -> Result<ReceiptReply, GatewayError>;

    /// Queries the authorization status of a key; idempotent
    async fn query_authorization(
        &self,
        access_key: &AccessKey,
    ) -> Result<AuthorizationReply, GatewayError>;
}
