//! Remote messages, the error-code catalog and deduplicated message lines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message code: "pending authorization"
pub const CODE_PENDING: &str = "70";
/// Message code: "access key already registered"
pub const CODE_DUPLICATE: &str = "43";
/// Message code: informational, environment notice
pub const CODE_INFORMATIVE: &str = "60";
/// Message code synthesized for transport failures
pub const CODE_SERVER_ERROR: &str = "50";

/// `tipo` of a remote message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Error,
    ServerError,
    Warning,
    Informative,
    Other(String),
}

impl MessageType {
    /// Parses the authority's `tipo` text
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "ERROR" => MessageType::Error,
            "ERROR DE SERVIDOR" | "SERVER ERROR" => MessageType::ServerError,
            "ADVERTENCIA" | "WARNING" => MessageType::Warning,
            "INFORMATIVO" | "INFORMATIVE" => MessageType::Informative,
            other => MessageType::Other(other.to_string()),
        }
    }

    /// Whether the message counts as an error
    pub fn is_error(&self) -> bool {
        matches!(self, MessageType::Error | MessageType::ServerError)
    }

    pub fn label(&self) -> &str {
        match self {
            MessageType::Error => "ERROR",
            MessageType::ServerError => "ERROR DE SERVIDOR",
            MessageType::Warning => "ADVERTENCIA",
            MessageType::Informative => "INFORMATIVO",
            MessageType::Other(text) => text,
        }
    }
}

/// A message exactly as the authority returned it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    /// `identificador`
    pub identifier: String,
    /// `mensaje`
    pub message: String,
    /// `informacionAdicional`
    pub additional_info: Option<String>,
    /// `tipo`
    pub message_type: MessageType,
}

impl RemoteMessage {
    /// Message recorded when the web service could not be reached
    pub fn transport_failure() -> Self {
        Self {
            identifier: CODE_SERVER_ERROR.to_string(),
            message: "Error Interno General del servidor".to_string(),
            additional_info: Some(
                "Cuando ocurre un error inesperado en el servidor.".to_string(),
            ),
            message_type: MessageType::ServerError,
        }
    }

    /// `code: message` line used when aggregating errors
    pub fn summary(&self) -> String {
        match &self.additional_info {
            Some(info) if !info.is_empty() => {
                format!("{}: {} {}", self.identifier, self.message, info)
            }
            _ => format!("{}: {}", self.identifier, self.message),
        }
    }
}

/// Catalog entry for a remote message code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode {
    pub code: String,
    pub description: String,
}

impl ErrorCode {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Lookup of message codes
pub trait ErrorCatalog: Send + Sync {
    /// Returns the catalog entry for a code, if known
    fn lookup(&self, code: &str) -> Option<ErrorCode>;

    /// Returns the entry for a code, with a generic entry for unknown codes
    fn resolve(&self, code: &str) -> ErrorCode {
        self.lookup(code)
            .unwrap_or_else(|| ErrorCode::new(code, format!("Código {code} no catalogado")))
    }
}

/// Codes published in the authority's offline web service guide
pub struct BuiltinCatalog {
    entries: HashMap<&'static str, &'static str>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        let entries = [
            ("2", "RUC del emisor no se encuentra activo"),
            ("10", "Establecimiento del emisor se encuentra clausurado"),
            ("26", "Tamaño máximo superado"),
            ("27", "Clase no permitida"),
            ("28", "Acuerdo de medios electrónicos no aceptado"),
            ("35", "Documento inválido"),
            ("36", "Versión esquema descontinuada"),
            ("37", "RUC sin autorización de emisión"),
            ("39", "Firma inválida"),
            ("40", "Error en el certificado"),
            ("43", "Clave acceso registrada"),
            ("45", "Secuencial registrado"),
            ("46", "RUC no existe"),
            ("50", "Error interno general"),
            ("52", "Error en diferencias"),
            ("56", "Establecimiento cerrado"),
            ("57", "Autorización suspendida"),
            ("58", "Error en la estructura de clave acceso"),
            ("60", "Ambiente ejecución"),
            ("65", "Fecha de emisión extemporánea"),
            ("67", "Fecha inválida"),
            ("70", "Clave de acceso en procesamiento"),
            ("80", "Error en la estructura de clave acceso en autorización"),
        ]
        .into_iter()
        .collect();
        Self { entries }
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCatalog for BuiltinCatalog {
    fn lookup(&self, code: &str) -> Option<ErrorCode> {
        self.entries
            .get(code.trim())
            .map(|description| ErrorCode::new(code.trim(), *description))
    }
}

/// One distinct (code, text) message recorded on a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLine {
    pub error_code: ErrorCode,
    pub message: String,
    pub additional_info: Option<String>,
    pub message_type: MessageType,
    /// Times this exact message was received
    pub occurrences: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl MessageLine {
    pub(crate) fn from_remote(message: &RemoteMessage, description: &str, at: DateTime<Utc>) -> Self {
        Self {
            error_code: ErrorCode::new(message.identifier.clone(), description),
            message: message.message.clone(),
            additional_info: message.additional_info.clone(),
            message_type: message.message_type.clone(),
            occurrences: 1,
            first_seen: at,
            last_seen: at,
        }
    }

    /// Same code and same text
    pub fn matches(&self, code: &str, text: &str) -> bool {
        self.error_code.code == code && self.message == text
    }

    pub(crate) fn refresh(&mut self, message: &RemoteMessage, at: DateTime<Utc>) {
        self.additional_info = message.additional_info.clone();
        self.message_type = message.message_type.clone();
        self.occurrences += 1;
        self.last_seen = at;
    }
}
