//! Electronic document record and its lifecycle state
//!
//! An [`ElectronicDocument`] tracks one tax document through the
//! authorization protocol: the access key, the prepared and signed XML,
//! every web service call ([`SendAttempt`]) and every distinct remote
//! message ([`MessageLine`]).

use super::ids::{AccessKey, CompanyId, DocumentId};
use super::message::{MessageLine, RemoteMessage};
use super::{EdiError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of tax document, with the authority's two-digit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Factura
    Invoice,
    /// Liquidación de compras
    Liquidation,
    /// Nota de crédito
    CreditNote,
    /// Nota de débito
    DebitNote,
    /// Comprobante de retención
    Withholding,
}

impl DocumentKind {
    /// All kinds, in authority code order
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Invoice,
        DocumentKind::Liquidation,
        DocumentKind::CreditNote,
        DocumentKind::DebitNote,
        DocumentKind::Withholding,
    ];

    /// Two-digit `codDoc` value
    pub fn code(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "01",
            DocumentKind::Liquidation => "03",
            DocumentKind::CreditNote => "04",
            DocumentKind::DebitNote => "05",
            DocumentKind::Withholding => "07",
        }
    }

    /// Short label used in document numbers and file names
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "FV",
            DocumentKind::Liquidation => "LIQ",
            DocumentKind::CreditNote => "NCC",
            DocumentKind::DebitNote => "NDC",
            DocumentKind::Withholding => "RET",
        }
    }

    /// Looks a kind up by its `codDoc` value
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Liquidation => "liquidation",
            DocumentKind::CreditNote => "credit_note",
            DocumentKind::DebitNote => "debit_note",
            DocumentKind::Withholding => "withholding",
        };
        f.write_str(name)
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(kind) = Self::from_code(s) {
            return Ok(kind);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| format!("Unknown document kind '{s}'"))
    }
}

/// Reference to the business document the record was declared for
///
/// A record points at exactly one source, so the variants are exclusive by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Kind of the source document
    pub kind: DocumentKind,
    /// Identifier of the source document in the issuing system
    pub source_id: String,
}

impl SourceRef {
    pub fn new(kind: DocumentKind, source_id: impl Into<String>) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.source_id)
    }
}

/// Lifecycle state of an electronic document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Created, not yet signed
    Draft,
    /// Signed, not yet accepted by the reception service
    Signed,
    /// Waiting for the authority (pending, duplicate or transport failure)
    Waiting,
    /// Authorized by the authority
    Authorized,
    /// Returned by the reception service with errors
    Returned,
    /// Rejected after the authorization query
    Rejected,
    /// Cancelled
    Cancel,
}

impl DocumentState {
    /// Database/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Draft => "draft",
            DocumentState::Signed => "signed",
            DocumentState::Waiting => "waiting",
            DocumentState::Authorized => "authorized",
            DocumentState::Returned => "returned",
            DocumentState::Rejected => "rejected",
            DocumentState::Cancel => "cancel",
        }
    }

    /// Whether a later scheduled pass may still move the document
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DocumentState::Authorized | DocumentState::Cancel)
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentState::Draft),
            "signed" => Ok(DocumentState::Signed),
            "waiting" => Ok(DocumentState::Waiting),
            "authorized" => Ok(DocumentState::Authorized),
            "returned" => Ok(DocumentState::Returned),
            "rejected" => Ok(DocumentState::Rejected),
            "cancel" => Ok(DocumentState::Cancel),
            other => Err(format!("Unknown document state '{other}'")),
        }
    }
}

/// Target environment of the tax authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Pruebas
    #[default]
    Test,
    /// Producción
    Production,
}

impl Environment {
    /// `ambiente` digit used in the header and the access key
    pub fn digit(&self) -> char {
        match self {
            Environment::Test => '1',
            Environment::Production => '2',
        }
    }

    /// Label written in the authorized envelope
    pub fn label(&self) -> &'static str {
        match self {
            Environment::Test => "PRUEBAS",
            Environment::Production => "PRODUCCION",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" | "1" | "pruebas" => Ok(Environment::Test),
            "production" | "2" | "produccion" => Ok(Environment::Production),
            other => Err(format!("Unknown environment '{other}'")),
        }
    }
}

/// Whether the lifecycle runs at declaration time or in scheduled passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    Online,
    #[default]
    Offline,
}

impl ConnectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::Online => "online",
            ConnectionMode::Offline => "offline",
        }
    }
}

impl FromStr for ConnectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "online" => Ok(ConnectionMode::Online),
            "offline" => Ok(ConnectionMode::Offline),
            other => Err(format!("Unknown connection mode '{other}'")),
        }
    }
}

/// Kind of web service call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptKind {
    /// Authorization query by access key
    Check,
    /// Submission of the signed document
    Send,
}

/// One web service call, appended before the request goes out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendAttempt {
    pub kind: AttemptKind,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// UTC offset of mainland Ecuador (America/Guayaquil, no daylight saving)
pub const ECUADOR_UTC_OFFSET_SECONDS: i32 = -5 * 3600;

/// Offset the authority uses for the timestamps it issues
pub fn ecuador_offset() -> Result<FixedOffset> {
    FixedOffset::east_opt(ECUADOR_UTC_OFFSET_SECONDS).ok_or_else(|| {
        EdiError::Configuration(format!(
            "Invalid UTC offset of {ECUADOR_UTC_OFFSET_SECONDS} seconds"
        ))
    })
}

fn default_notification_active() -> bool {
    true
}

/// The central record of the authorization lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectronicDocument {
    pub id: DocumentId,
    pub company_id: CompanyId,
    pub source: SourceRef,
    /// Formatted number, e.g. `FV 001-001-000000123`
    pub document_number: String,
    pub issue_date: NaiveDate,
    pub access_key: Option<AccessKey>,
    pub state: DocumentState,
    pub environment: Environment,
    pub connection_mode: ConnectionMode,
    pub authorization_number: Option<String>,
    pub authorization_date: Option<DateTime<Utc>>,
    pub notification_sent: bool,
    /// Include the document in the returned/rejected notice while it is
    /// returned or rejected
    #[serde(default = "default_notification_active")]
    pub notification_active: bool,
    pub cancellation_authorization: Option<String>,
    pub cancel_date: Option<DateTime<Utc>>,
    /// Unsigned XML as last built
    pub xml: Option<String>,
    pub signed_xml: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    /// Authorized envelope, the canonical artifact once authorized
    pub authorized_xml: Option<String>,
    pub send_attempts: Vec<SendAttempt>,
    pub messages: Vec<MessageLine>,
    pub last_error_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ElectronicDocument {
    /// Creates a new draft record
    pub fn new(
        company_id: CompanyId,
        source: SourceRef,
        document_number: impl Into<String>,
        issue_date: NaiveDate,
        environment: Environment,
        connection_mode: ConnectionMode,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::generate(),
            company_id,
            source,
            document_number: document_number.into(),
            issue_date,
            access_key: None,
            state: DocumentState::Draft,
            environment,
            connection_mode,
            authorization_number: None,
            authorization_date: None,
            notification_sent: false,
            notification_active: true,
            cancellation_authorization: None,
            cancel_date: None,
            xml: None,
            signed_xml: None,
            signed_at: None,
            authorized_xml: None,
            send_attempts: Vec::new(),
            messages: Vec::new(),
            last_error_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Assigns the access key; a key that is already set never changes
    pub fn assign_access_key(&mut self, key: AccessKey) -> Result<()> {
        match &self.access_key {
            Some(existing) if existing != &key => Err(EdiError::Validation(format!(
                "Document {} already has access key {existing}",
                self.id
            ))),
            Some(_) => Ok(()),
            None => {
                self.access_key = Some(key);
                self.touch();
                Ok(())
            }
        }
    }

    /// Whether the environment can still be switched
    pub fn environment_locked(&self) -> bool {
        self.signed_at.is_some()
    }

    /// Changes the environment of a document that was never signed
    pub fn set_environment(&mut self, environment: Environment) -> Result<()> {
        if self.environment == environment {
            return Ok(());
        }
        if self.environment_locked() {
            return Err(EdiError::Validation(format!(
                "Document {} was signed for {}; environment cannot change",
                self.id, self.environment
            )));
        }
        self.environment = environment;
        self.touch();
        Ok(())
    }

    pub fn mark_prepared(&mut self, xml: String) {
        self.xml = Some(xml);
        self.touch();
    }

    pub fn mark_signed(&mut self, signed_xml: String) {
        let now = Utc::now();
        self.signed_xml = Some(signed_xml);
        self.signed_at = Some(now);
        self.state = DocumentState::Signed;
        self.updated_at = now;
    }

    /// Sets authorization number and date together
    pub fn mark_authorized(&mut self, number: String, date: DateTime<Utc>) {
        self.authorization_number = Some(number);
        self.authorization_date = Some(date);
        self.state = DocumentState::Authorized;
        self.touch();
    }

    /// Moves to a non-authorized state
    ///
    /// Authorization fields only exist on authorized records, so they are
    /// never cleared here: leaving `authorized` happens only via `cancel`.
    pub fn transition(&mut self, state: DocumentState) {
        debug_assert!(state != DocumentState::Authorized);
        if self.state != state {
            self.state = state;
            self.touch();
        }
    }

    /// Turns the returned/rejected notice on or off for this document
    pub fn set_notification_active(&mut self, active: bool) {
        if self.notification_active != active {
            self.notification_active = active;
            self.touch();
        }
    }

    pub fn cancel(&mut self) {
        let now = Utc::now();
        self.state = DocumentState::Cancel;
        self.cancel_date = Some(now);
        self.updated_at = now;
    }

    /// Appends a call to the attempt log and returns its index
    pub fn begin_attempt(&mut self, kind: AttemptKind) -> usize {
        self.send_attempts.push(SendAttempt {
            kind,
            requested_at: Utc::now(),
            responded_at: None,
        });
        self.touch();
        self.send_attempts.len() - 1
    }

    /// Stamps the response time of an attempt
    pub fn finish_attempt(&mut self, index: usize) {
        if let Some(attempt) = self.send_attempts.get_mut(index) {
            attempt.responded_at = Some(Utc::now());
        }
    }

    pub fn has_send_attempt(&self) -> bool {
        self.send_attempts
            .iter()
            .any(|attempt| attempt.kind == AttemptKind::Send)
    }

    pub fn send_count(&self) -> usize {
        self.send_attempts
            .iter()
            .filter(|attempt| attempt.kind == AttemptKind::Send)
            .count()
    }

    /// Whether the message log holds a code that forbids resubmission
    pub fn awaits_authority(&self) -> bool {
        self.messages
            .iter()
            .any(|line| matches!(line.error_code.code.as_str(), "43" | "70"))
    }

    /// Records a remote message, updating an identical existing line
    ///
    /// Returns `true` when a new line was created.
    pub fn upsert_message(&mut self, message: &RemoteMessage, description: &str) -> bool {
        let now = Utc::now();
        if let Some(line) = self
            .messages
            .iter_mut()
            .find(|line| line.matches(&message.identifier, &message.message))
        {
            line.refresh(message, now);
            self.updated_at = now;
            return false;
        }
        self.messages
            .push(MessageLine::from_remote(message, description, now));
        self.updated_at = now;
        true
    }

    pub fn is_authorized(&self) -> bool {
        self.state == DocumentState::Authorized
    }

    /// File name of the authorized artifact, `{id}_{prefix}_{number}.xml`
    pub fn file_name(&self) -> String {
        let number = self
            .document_number
            .rsplit(' ')
            .next()
            .unwrap_or(&self.document_number);
        format!("{}_{}_{}.xml", self.id, self.source.kind.prefix(), number)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
