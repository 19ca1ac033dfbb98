//! Shared test doubles for the lifecycle integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use sri_edi::adapters::notify::Notifier;
use sri_edi::adapters::signing::{SignatureError, SignatureGateway};
use sri_edi::adapters::sources::DocumentSourceRepository;
use sri_edi::adapters::sri::{
    AuthorizationEntry, AuthorizationReply, GatewayFactory, ReceiptReply, ReceiptStatus,
    ValidationGateway,
};
use sri_edi::adapters::store::InMemoryDocumentStore;
use sri_edi::config::CompanySettings;
use sri_edi::core::lifecycle::{AuthorizedArtifact, LifecycleOrchestrator};
use sri_edi::domain::{
    AccessKey, DocumentKind, DocumentSource, EdiError, ElectronicDocument, Environment, GatewayError,
    MessageType, PreparedSource, RemoteMessage, Result, SourceRef,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Gateway replaying queued replies
///
/// An exhausted reception queue fails with a connection error; an
/// exhausted authorization queue answers with no entries, as the
/// authority does for keys it has never seen.
#[derive(Default)]
pub struct ScriptedGateway {
    receipts: Mutex<VecDeque<std::result::Result<ReceiptReply, GatewayError>>>,
    authorizations: Mutex<VecDeque<std::result::Result<AuthorizationReply, GatewayError>>>,
    submits: AtomicUsize,
    queries: AtomicUsize,
}

impl ScriptedGateway {
    pub fn push_receipt(&self, reply: ReceiptReply) {
        self.receipts.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_receipt_error(&self, error: GatewayError) {
        self.receipts.lock().unwrap().push_back(Err(error));
    }

    pub fn push_authorization(&self, reply: AuthorizationReply) {
        self.authorizations.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_authorization_error(&self, error: GatewayError) {
        self.authorizations.lock().unwrap().push_back(Err(error));
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValidationGateway for ScriptedGateway {
    async fn submit_for_validation(
        &self,
        _signed_xml: &[u8],
    ) -> std::result::Result<ReceiptReply, GatewayError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.receipts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::ConnectionFailed("no scripted reply".to_string())))
    }

    async fn query_authorization(
        &self,
        _access_key: &AccessKey,
    ) -> std::result::Result<AuthorizationReply, GatewayError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.authorizations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(AuthorizationReply::default()))
    }
}

/// Hands out the same scripted gateway for every company
pub struct ScriptedFactory {
    pub gateway: Arc<ScriptedGateway>,
    pub created: AtomicUsize,
}

impl GatewayFactory for ScriptedFactory {
    fn create(
        &self,
        _settings: &CompanySettings,
        _environment: Environment,
    ) -> Result<Arc<dyn ValidationGateway>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.gateway.clone())
    }
}

/// Appends a marker comment instead of a real signature
#[derive(Default)]
pub struct StubSigner {
    calls: AtomicUsize,
}

impl StubSigner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignatureGateway for StubSigner {
    async fn sign(&self, xml: &str) -> std::result::Result<String, SignatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{xml}<!-- signed -->"))
    }
}

/// Counts notifications per document
///
/// `fail_next` makes the following calls fail as an unreachable mail
/// relay would.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    notices: Mutex<Vec<(String, Vec<String>)>>,
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl RecordingNotifier {
    /// (document number, file name) pairs in delivery order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// (company, document numbers) of each unauthorized notice
    pub fn notices(&self) -> Vec<(String, Vec<String>)> {
        self.notices.lock().unwrap().clone()
    }

    /// Authorized-document calls, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    fn take_failure(&self) -> Result<()> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(EdiError::Gateway(GatewayError::ConnectionFailed(
                "mail relay unavailable".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_authorized(
        &self,
        document: &ElectronicDocument,
        artifact: &AuthorizedArtifact,
    ) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        self.sent
            .lock()
            .unwrap()
            .push((document.document_number.clone(), artifact.file_name.clone()));
        Ok(())
    }

    async fn notify_unauthorized(
        &self,
        company: &CompanySettings,
        documents: &[ElectronicDocument],
    ) -> Result<()> {
        self.take_failure()?;
        self.notices.lock().unwrap().push((
            company.id.clone(),
            documents
                .iter()
                .map(|document| document.document_number.clone())
                .collect(),
        ));
        Ok(())
    }
}

/// Sources kept in memory, keyed by reference
#[derive(Default)]
pub struct MemorySources {
    sources: Mutex<HashMap<SourceRef, PreparedSource>>,
}

impl MemorySources {
    pub fn add(&self, source: PreparedSource) {
        self.sources
            .lock()
            .unwrap()
            .insert(source.source_ref(), source);
    }
}

#[async_trait]
impl DocumentSourceRepository for MemorySources {
    async fn load(&self, source: &SourceRef) -> Result<Option<Arc<dyn DocumentSource>>> {
        Ok(self
            .sources
            .lock()
            .unwrap()
            .get(source)
            .cloned()
            .map(|prepared| Arc::new(prepared) as Arc<dyn DocumentSource>))
    }
}

/// Orchestrator wired to test doubles
pub struct Harness {
    pub store: Arc<InMemoryDocumentStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub factory: Arc<ScriptedFactory>,
    pub signer: Arc<StubSigner>,
    pub notifier: Arc<RecordingNotifier>,
    pub sources: Arc<MemorySources>,
    pub orchestrator: Arc<LifecycleOrchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn dry_run() -> Self {
        Self::build(true)
    }

    fn build(dry_run: bool) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let gateway = Arc::new(ScriptedGateway::default());
        let factory = Arc::new(ScriptedFactory {
            gateway: gateway.clone(),
            created: AtomicUsize::new(0),
        });
        let signer = Arc::new(StubSigner::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let sources = Arc::new(MemorySources::default());

        let orchestrator = LifecycleOrchestrator::new(
            store.clone(),
            sources.clone(),
            signer.clone(),
            factory.clone(),
        )
        .with_notifier(notifier.clone())
        .with_dry_run(dry_run);

        Self {
            store,
            gateway,
            factory,
            signer,
            notifier,
            sources,
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Company settings with both environments configured
pub fn company(id: &str, environment: &str, connection_mode: &str, max_attempts: u32) -> CompanySettings {
    toml::from_str(&format!(
        r#"
id = "{id}"
ruc = "1790012345001"
legal_name = "ACME S.A."
matrix_address = "Av. Amazonas N12-34"
environment = "{environment}"
connection_mode = "{connection_mode}"
max_attempts = {max_attempts}
batch_size = 10

[endpoints]
production_reception = "http://localhost/reception"
production_authorization = "http://localhost/authorization"
"#
    ))
    .unwrap()
}

pub fn invoice(source_id: &str, sequential: u64) -> PreparedSource {
    PreparedSource {
        kind: DocumentKind::Invoice,
        source_id: source_id.to_string(),
        document_number: format!("001-001-{sequential:09}"),
        issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        version: None,
        body_xml: "<infoFactura><fechaEmision>01/01/2024</fechaEmision></infoFactura>"
            .to_string(),
    }
}

pub fn message(code: &str, text: &str, message_type: MessageType) -> RemoteMessage {
    RemoteMessage {
        identifier: code.to_string(),
        message: text.to_string(),
        additional_info: None,
        message_type,
    }
}

pub fn received() -> ReceiptReply {
    ReceiptReply {
        status: ReceiptStatus::Received,
        messages: Vec::new(),
    }
}

pub fn returned(messages: Vec<RemoteMessage>) -> ReceiptReply {
    ReceiptReply {
        status: ReceiptStatus::Returned,
        messages,
    }
}

pub fn entry(status: &str, messages: Vec<RemoteMessage>) -> AuthorizationEntry {
    AuthorizationEntry {
        status: status.to_string(),
        messages,
        ..Default::default()
    }
}

pub fn authorized(number: &str) -> AuthorizationReply {
    AuthorizationReply {
        access_key: None,
        entries: vec![AuthorizationEntry {
            status: "AUTORIZADO".to_string(),
            number: Some(number.to_string()),
            date: Some("2024-01-01T10:15:30-05:00".to_string()),
            environment: Some("PRUEBAS".to_string()),
            messages: Vec::new(),
        }],
    }
}

pub fn reply(entries: Vec<AuthorizationEntry>) -> AuthorizationReply {
    AuthorizationReply {
        access_key: None,
        entries,
    }
}
