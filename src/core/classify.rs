//! Classification of the authority's replies
//!
//! Turns reception and authorization replies into an [`Outcome`] and records
//! every remote message on the document, one [`MessageLine`] per distinct
//! (code, text) pair.
//!
//! [`MessageLine`]: crate::domain::MessageLine

use crate::adapters::sri::{AuthorizationReply, ReceiptReply, ReceiptStatus};
use crate::domain::message::{CODE_DUPLICATE, CODE_INFORMATIVE, CODE_PENDING};
use crate::domain::{
    ecuador_offset, AccessKey, DocumentState, ElectronicDocument, ErrorCatalog, RemoteMessage,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// `estado` of an authorization entry still being processed
const STATUS_IN_PROCESS: &str = "EN PROCESO";

/// Interpreted reply
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Reception accepted the document; poll for authorization next
    Received,
    /// Reception returned the document
    Returned { errors: Vec<String> },
    /// Authorization granted
    Authorized {
        number: String,
        date: DateTime<Utc>,
    },
    /// Code 70, or an entry still in process
    Pending,
    /// Code 43: the key is already registered, only polling may follow
    DuplicatePending,
    /// Every authorization entry was refused
    Rejected { errors: Vec<String> },
    /// The service answered without anything usable
    NoResponse,
}

impl Outcome {
    /// State the outcome leads to
    ///
    /// `Received` keeps the current state: the authorization query decides.
    pub fn target_state(&self, current: DocumentState) -> DocumentState {
        match self {
            Outcome::Received => current,
            Outcome::Returned { .. } => DocumentState::Returned,
            Outcome::Authorized { .. } => DocumentState::Authorized,
            Outcome::Pending | Outcome::DuplicatePending | Outcome::NoResponse => {
                DocumentState::Waiting
            }
            Outcome::Rejected { .. } => DocumentState::Rejected,
        }
    }

    /// Error lines collected for the outcome
    pub fn errors(&self) -> &[String] {
        match self {
            Outcome::Returned { errors } | Outcome::Rejected { errors } => errors,
            _ => &[],
        }
    }
}

/// Classifies a reception reply and records its messages
pub fn classify_receipt(
    document: &mut ElectronicDocument,
    reply: &ReceiptReply,
    catalog: &dyn ErrorCatalog,
) -> Outcome {
    let errors = record_messages(document, &reply.messages, catalog);

    match &reply.status {
        ReceiptStatus::Received => Outcome::Received,
        ReceiptStatus::Returned => {
            if has_code(&reply.messages, CODE_DUPLICATE) {
                Outcome::DuplicatePending
            } else if has_code(&reply.messages, CODE_PENDING) {
                Outcome::Pending
            } else {
                Outcome::Returned { errors }
            }
        }
        ReceiptStatus::Other(status) => {
            tracing::warn!(
                document_id = %document.id,
                status = %status,
                "Unexpected reception status"
            );
            Outcome::NoResponse
        }
    }
}

/// Classifies an authorization reply and records its messages
///
/// The first `AUTORIZADO` entry wins and the others are ignored. Without an
/// approved entry every entry contributes its messages.
pub fn classify_authorization(
    document: &mut ElectronicDocument,
    reply: &AuthorizationReply,
    catalog: &dyn ErrorCatalog,
) -> Outcome {
    if reply.entries.is_empty() {
        return Outcome::NoResponse;
    }

    if let Some(entry) = reply.authorized_entry() {
        record_messages(document, &entry.messages, catalog);
        let number = entry
            .number
            .clone()
            .filter(|number| !number.trim().is_empty())
            .or_else(|| document.access_key.as_ref().map(AccessKey::to_string))
            .unwrap_or_default();
        let date = parse_remote_date(entry.date.as_deref());
        return Outcome::Authorized { number, date };
    }

    let messages: Vec<RemoteMessage> = reply
        .entries
        .iter()
        .flat_map(|entry| entry.messages.iter().cloned())
        .collect();
    let errors = record_messages(document, &messages, catalog);

    if has_code(&messages, CODE_PENDING)
        || reply
            .entries
            .iter()
            .any(|entry| entry.status.trim().eq_ignore_ascii_case(STATUS_IN_PROCESS))
    {
        Outcome::Pending
    } else if has_code(&messages, CODE_DUPLICATE) {
        Outcome::DuplicatePending
    } else {
        Outcome::Rejected { errors }
    }
}

/// Records messages on the document and returns the error lines
///
/// Identical (code, text) pairs update the existing line. Codes 43, 60 and
/// 70 never count as errors; 60 is not even kept as the last error.
pub fn record_messages(
    document: &mut ElectronicDocument,
    messages: &[RemoteMessage],
    catalog: &dyn ErrorCatalog,
) -> Vec<String> {
    let mut errors = Vec::new();

    for message in messages {
        let code = message.identifier.trim();
        let entry = catalog.resolve(code);
        document.upsert_message(message, &entry.description);

        if !message.message_type.is_error() || code == CODE_INFORMATIVE {
            continue;
        }
        document.last_error_code = Some(code.to_string());
        if code != CODE_PENDING && code != CODE_DUPLICATE {
            errors.push(message.summary());
        }
    }

    errors
}

/// Records the synthesized server error used for transport failures
pub fn record_transport_failure(document: &mut ElectronicDocument, catalog: &dyn ErrorCatalog) {
    record_messages(document, &[transport_failure_message()], catalog);
}

/// Message stored when the web service could not be reached
pub fn transport_failure_message() -> RemoteMessage {
    RemoteMessage::transport_failure()
}

/// Applies an outcome's state to the document
///
/// With `allow_state_change` off a rejection leaves the state as it was.
/// Authorization always applies. Returns the resulting state.
pub fn apply_outcome(
    document: &mut ElectronicDocument,
    outcome: &Outcome,
    allow_state_change: bool,
) -> DocumentState {
    match outcome {
        Outcome::Authorized { number, date } => {
            document.mark_authorized(number.clone(), *date);
        }
        Outcome::Rejected { .. } if !allow_state_change => {}
        other => document.transition(other.target_state(document.state)),
    }
    document.state
}

/// Parses `fechaAutorizacion`, falling back to the current time
///
/// Accepts RFC 3339, `dd/mm/yyyy hh:mm:ss` and naive ISO timestamps. Naive
/// values are Ecuador local time.
pub fn parse_remote_date(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Utc::now();
    };

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return date.with_timezone(&Utc);
    }

    ["%d/%m/%Y %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| {
            ecuador_offset()
                .ok()?
                .from_local_datetime(&naive)
                .single()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| {
            tracing::warn!(value = raw, "Unparseable authorization date, using current time");
            Utc::now()
        })
}

fn has_code(messages: &[RemoteMessage], code: &str) -> bool {
    messages.iter().any(|message| message.identifier.trim() == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sri::AuthorizationEntry;
    use crate::domain::{
        BuiltinCatalog, CompanyId, ConnectionMode, DocumentKind, Environment, MessageType,
        SourceRef,
    };
    use chrono::{Datelike, NaiveDate, Timelike};

    fn document() -> ElectronicDocument {
        let mut doc = ElectronicDocument::new(
            CompanyId::new("acme").unwrap(),
            SourceRef::new(DocumentKind::Invoice, "INV-1"),
            "FV 001-001-000000123",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Environment::Test,
            ConnectionMode::Offline,
        );
        doc.access_key =
            Some(AccessKey::new("0101202401179001234500120010010000001231234567810").unwrap());
        doc.mark_signed("<factura/>".to_string());
        doc
    }

    fn message(code: &str, text: &str, message_type: MessageType) -> RemoteMessage {
        RemoteMessage {
            identifier: code.to_string(),
            message: text.to_string(),
            additional_info: None,
            message_type,
        }
    }

    fn entry(status: &str, messages: Vec<RemoteMessage>) -> AuthorizationEntry {
        AuthorizationEntry {
            status: status.to_string(),
            messages,
            ..Default::default()
        }
    }

    #[test]
    fn test_received() {
        let mut doc = document();
        let reply = ReceiptReply {
            status: ReceiptStatus::Received,
            messages: vec![],
        };
        let outcome = classify_receipt(&mut doc, &reply, &BuiltinCatalog::new());
        assert_eq!(outcome, Outcome::Received);
        assert_eq!(outcome.target_state(DocumentState::Signed), DocumentState::Signed);
    }

    #[test]
    fn test_returned_with_duplicate_key_waits() {
        let mut doc = document();
        let reply = ReceiptReply {
            status: ReceiptStatus::Returned,
            messages: vec![message("43", "CLAVE ACCESO REGISTRADA", MessageType::Error)],
        };
        let outcome = classify_receipt(&mut doc, &reply, &BuiltinCatalog::new());
        assert_eq!(outcome, Outcome::DuplicatePending);
        assert_eq!(doc.last_error_code.as_deref(), Some("43"));
        assert!(doc.awaits_authority());
        assert_eq!(apply_outcome(&mut doc, &outcome, true), DocumentState::Waiting);
    }

    #[test]
    fn test_returned_collects_errors() {
        let mut doc = document();
        let reply = ReceiptReply {
            status: ReceiptStatus::Returned,
            messages: vec![
                message("35", "ARCHIVO NO CUMPLE ESTRUCTURA XML", MessageType::Error),
                message("60", "AMBIENTE PRUEBAS", MessageType::Informative),
            ],
        };
        let outcome = classify_receipt(&mut doc, &reply, &BuiltinCatalog::new());
        assert_eq!(
            outcome.errors(),
            ["35: ARCHIVO NO CUMPLE ESTRUCTURA XML".to_string()]
        );
        assert_eq!(doc.messages.len(), 2);
        assert_eq!(doc.messages[0].error_code.description, "Documento inválido");
    }

    #[test]
    fn test_first_authorized_entry_wins() {
        let mut doc = document();
        let reply = AuthorizationReply {
            access_key: None,
            entries: vec![
                entry(
                    "NO AUTORIZADO",
                    vec![message("45", "SECUENCIAL REGISTRADO", MessageType::Error)],
                ),
                AuthorizationEntry {
                    status: "AUTORIZADO".to_string(),
                    number: Some("1234567890".to_string()),
                    date: Some("2024-01-01T10:20:30-05:00".to_string()),
                    ..Default::default()
                },
            ],
        };
        let outcome = classify_authorization(&mut doc, &reply, &BuiltinCatalog::new());
        let Outcome::Authorized { number, date } = &outcome else {
            panic!("expected authorization, got {outcome:?}");
        };
        assert_eq!(number, "1234567890");
        assert_eq!(date.hour(), 15);
        assert!(doc.messages.is_empty());

        apply_outcome(&mut doc, &outcome, false);
        assert!(doc.is_authorized());
        assert_eq!(doc.authorization_number.as_deref(), Some("1234567890"));
    }

    #[test]
    fn test_authorized_without_number_uses_access_key() {
        let mut doc = document();
        let reply = AuthorizationReply {
            access_key: None,
            entries: vec![entry("AUTORIZADO", vec![])],
        };
        let outcome = classify_authorization(&mut doc, &reply, &BuiltinCatalog::new());
        assert!(matches!(
            outcome,
            Outcome::Authorized { ref number, .. } if number == "0101202401179001234500120010010000001231234567810"
        ));
    }

    #[test]
    fn test_rejection_records_every_entry() {
        let mut doc = document();
        let reply = AuthorizationReply {
            access_key: None,
            entries: vec![
                entry("NO AUTORIZADO", vec![message("45", "SECUENCIAL REGISTRADO", MessageType::Error)]),
                entry("NO AUTORIZADO", vec![message("65", "FECHA EXTEMPORANEA", MessageType::Error)]),
            ],
        };
        let outcome = classify_authorization(&mut doc, &reply, &BuiltinCatalog::new());
        assert_eq!(outcome.errors().len(), 2);
        assert_eq!(doc.last_error_code.as_deref(), Some("65"));
        assert_eq!(apply_outcome(&mut doc, &outcome, true), DocumentState::Rejected);
    }

    #[test]
    fn test_rejection_suppressed() {
        let mut doc = document();
        doc.transition(DocumentState::Waiting);
        let outcome = Outcome::Rejected { errors: vec![] };
        assert_eq!(apply_outcome(&mut doc, &outcome, false), DocumentState::Waiting);
    }

    #[test]
    fn test_pending_code_never_rejects() {
        let mut doc = document();
        let reply = AuthorizationReply {
            access_key: None,
            entries: vec![entry(
                "NO AUTORIZADO",
                vec![
                    message("70", "CLAVE DE ACCESO EN PROCESAMIENTO", MessageType::Error),
                    message("45", "SECUENCIAL REGISTRADO", MessageType::Error),
                ],
            )],
        };
        let outcome = classify_authorization(&mut doc, &reply, &BuiltinCatalog::new());
        assert_eq!(outcome, Outcome::Pending);
        assert_eq!(apply_outcome(&mut doc, &outcome, true), DocumentState::Waiting);
    }

    #[test]
    fn test_in_process_entry_is_pending() {
        let mut doc = document();
        let reply = AuthorizationReply {
            access_key: None,
            entries: vec![entry("EN PROCESO", vec![])],
        };
        assert_eq!(
            classify_authorization(&mut doc, &reply, &BuiltinCatalog::new()),
            Outcome::Pending
        );
    }

    #[test]
    fn test_empty_reply() {
        let mut doc = document();
        assert_eq!(
            classify_authorization(&mut doc, &AuthorizationReply::default(), &BuiltinCatalog::new()),
            Outcome::NoResponse
        );
    }

    #[test]
    fn test_repeated_messages_are_deduplicated() {
        let mut doc = document();
        let catalog = BuiltinCatalog::new();
        let messages = vec![message("45", "SECUENCIAL REGISTRADO", MessageType::Error)];
        record_messages(&mut doc, &messages, &catalog);
        record_messages(&mut doc, &messages, &catalog);
        assert_eq!(doc.messages.len(), 1);
        assert_eq!(doc.messages[0].occurrences, 2);
    }

    #[test]
    fn test_transport_failure_is_recorded_once() {
        let mut doc = document();
        let catalog = BuiltinCatalog::new();
        record_transport_failure(&mut doc, &catalog);
        record_transport_failure(&mut doc, &catalog);
        assert_eq!(doc.messages.len(), 1);
        assert_eq!(doc.last_error_code.as_deref(), Some("50"));
    }

    #[test]
    fn test_parse_remote_date_formats() {
        let date = parse_remote_date(Some("01/02/2024 08:30:00"));
        assert_eq!((date.day(), date.month(), date.hour()), (1, 2, 13));

        let date = parse_remote_date(Some("2024-02-01T10:15:30-05:00"));
        assert_eq!(date.hour(), 15);

        let date = parse_remote_date(Some("2024-02-01T08:30:00.123"));
        assert_eq!((date.day(), date.minute()), (1, 30));

        let before = Utc::now();
        assert!(parse_remote_date(Some("yesterday")) >= before);
        assert!(parse_remote_date(None) >= before);
    }
}
