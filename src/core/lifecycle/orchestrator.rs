//! Lifecycle orchestrator - drives one document through the protocol
//!
//! The orchestrator owns the state machine:
//!
//! ```text
//! draft ──prepare──▶ draft (XML built, validated) ──sign──▶ signed
//! signed ──submit: RECIBIDA, poll: AUTORIZADO──▶ authorized
//! signed ──submit: DEVUELTA (attempts left)──▶ returned ──▶ resubmit
//! signed ──submit: DEVUELTA (attempts spent)──▶ waiting
//! signed/waiting ──70, 43, no response──▶ waiting
//! waiting ──poll: AUTORIZADO──▶ authorized
//! waiting ──poll: refused, no pending code──▶ rejected
//! authorized ──cancellation authorization registered──▶ cancel
//! ```
//!
//! Every change is saved before the next remote call, and every call is
//! appended to the attempt log before the request goes out.

use super::attachment::AuthorizedArtifact;
use super::context::CallContext;
use crate::adapters::notify::{LogNotifier, Notifier};
use crate::adapters::signing::SignatureGateway;
use crate::adapters::sources::DocumentSourceRepository;
use crate::adapters::sri::{GatewayFactory, ValidationGateway};
use crate::adapters::store::DocumentStore;
use crate::config::CompanySettings;
use crate::core::access_key::{self, AccessKeyInput};
use crate::core::classify::{
    apply_outcome, classify_authorization, classify_receipt, record_transport_failure, Outcome,
};
use crate::core::header::{HeaderBuilder, SchemaValidator, StructuralValidator};
use crate::domain::{
    AccessKey, AttemptKind, BuiltinCatalog, ConnectionMode, DocumentSource, DocumentState, EdiError,
    ElectronicDocument, ErrorCatalog, GatewayError, Result,
};
use std::sync::Arc;

/// Result of driving a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The document ended the call in this state
    Finished(DocumentState),
    /// The document was left as it was, with the reason
    Skipped(String),
}

impl ProcessOutcome {
    pub fn state(&self) -> Option<DocumentState> {
        match self {
            ProcessOutcome::Finished(state) => Some(*state),
            ProcessOutcome::Skipped(_) => None,
        }
    }
}

/// Drives electronic documents through preparation, signing, submission
/// and authorization
pub struct LifecycleOrchestrator {
    store: Arc<dyn DocumentStore>,
    sources: Arc<dyn DocumentSourceRepository>,
    signer: Arc<dyn SignatureGateway>,
    gateways: Arc<dyn GatewayFactory>,
    notifier: Arc<dyn Notifier>,
    catalog: Arc<dyn ErrorCatalog>,
    validator: Arc<dyn SchemaValidator>,
    dry_run: bool,
}

impl LifecycleOrchestrator {
    /// Creates an orchestrator with the log notifier, the built-in error
    /// catalog and structural validation
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sources: Arc<dyn DocumentSourceRepository>,
        signer: Arc<dyn SignatureGateway>,
        gateways: Arc<dyn GatewayFactory>,
    ) -> Self {
        Self {
            store,
            sources,
            signer,
            gateways,
            notifier: Arc::new(LogNotifier),
            catalog: Arc::new(BuiltinCatalog::new()),
            validator: Arc::new(StructuralValidator::new()),
            dry_run: false,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn ErrorCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Prepare and sign, but never call the web services
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Creates the electronic document for a source
    ///
    /// A source already declared for the company returns the existing
    /// record untouched. Companies in online mode run the whole pipeline
    /// right away.
    pub async fn declare(
        &self,
        settings: &CompanySettings,
        source: &dyn DocumentSource,
        ctx: &CallContext,
    ) -> Result<ElectronicDocument> {
        let company_id = settings.company_id()?;
        let source_ref = source.source_ref();

        if let Some(existing) = self.store.find_by_source(&company_id, &source_ref).await? {
            tracing::info!(
                document_id = %existing.id,
                source = %source_ref,
                state = %existing.state,
                "Source already declared"
            );
            return Ok(existing);
        }

        let mut document = ElectronicDocument::new(
            company_id,
            source_ref,
            source.display_number(),
            source.issue_date(),
            ctx.environment,
            settings.connection_mode,
        );
        self.store.insert(&document).await?;
        tracing::info!(
            document_id = %document.id,
            document_number = %document.document_number,
            company = %settings.id,
            environment = %document.environment,
            "Electronic document declared"
        );

        if settings.connection_mode == ConnectionMode::Online {
            self.run(&mut document, settings, Some(source), ctx).await?;
        }

        Ok(document)
    }

    /// Generates the access key if missing, builds and validates the XML
    ///
    /// The key is saved before anything else so that it never changes for
    /// the document.
    pub async fn prepare(
        &self,
        document: &mut ElectronicDocument,
        settings: &CompanySettings,
        source: &dyn DocumentSource,
        ctx: &CallContext,
    ) -> Result<()> {
        let issuer = settings.issuer_profile()?;

        if document.access_key.is_none() {
            document.set_environment(ctx.environment)?;
            let key = access_key::generate(&AccessKeyInput {
                issue_date: source.issue_date(),
                kind: source.kind(),
                tax_id: issuer.tax_id.clone(),
                environment: document.environment,
                emission_point: source.emission_point()?,
                sequential: source.sequential()?,
                random: access_key::random_fragment(),
            })?;
            document.assign_access_key(key)?;
            self.store.save(document).await?;
            tracing::debug!(document_id = %document.id, "Access key assigned");
        }

        let key = document.access_key.clone().ok_or_else(|| {
            EdiError::Validation(format!("Document {} has no access key", document.id))
        })?;
        let xml = HeaderBuilder::new(&issuer, settings).build_document(
            &key,
            document.environment,
            source,
        )?;
        self.validator.validate(&xml, &source.version())?;

        document.mark_prepared(xml);
        self.store.save(document).await
    }

    /// Signs the prepared XML
    ///
    /// On failure the document is left exactly as it was.
    pub async fn sign(&self, document: &mut ElectronicDocument) -> Result<()> {
        let xml = document.xml.as_deref().ok_or_else(|| {
            EdiError::Validation(format!("Document {} has not been prepared", document.id))
        })?;
        let signed = self.signer.sign(xml).await?;

        let from = document.state;
        document.mark_signed(signed);
        self.store.save(document).await?;
        crate::log_document_transition!(document.id, document.document_number, from, document.state);
        Ok(())
    }

    /// Submits the signed document, then polls for its authorization
    ///
    /// Resubmission after `DEVUELTA` is bounded by the company's
    /// `max_attempts`, read once when the loop starts.
    pub async fn submit(
        &self,
        document: &mut ElectronicDocument,
        settings: &CompanySettings,
        ctx: &CallContext,
    ) -> Result<ProcessOutcome> {
        if self.dry_run {
            return Ok(self.dry_run_skip(document));
        }
        let gateway = self.gateways.create(settings, document.environment)?;
        let outcome = self
            .submit_with(document, gateway.as_ref(), settings.max_attempts, ctx)
            .await?;
        self.conclude(document, &outcome, ctx).await
    }

    /// Queries the authorization without resubmitting
    pub async fn check_authorization(
        &self,
        document: &mut ElectronicDocument,
        settings: &CompanySettings,
        ctx: &CallContext,
    ) -> Result<ProcessOutcome> {
        if self.dry_run {
            return Ok(self.dry_run_skip(document));
        }
        let gateway = self.gateways.create(settings, document.environment)?;
        let outcome = self.poll(document, gateway.as_ref(), ctx).await?;
        self.conclude(document, &outcome, ctx).await
    }

    /// Drives a document from whatever recoverable state it is in
    pub async fn process(
        &self,
        document: &mut ElectronicDocument,
        settings: &CompanySettings,
        ctx: &CallContext,
    ) -> Result<ProcessOutcome> {
        self.run(document, settings, None, ctx).await
    }

    /// Cancels a document
    ///
    /// An authorized document needs its cancellation authorization number
    /// registered first.
    pub async fn cancel(&self, document: &mut ElectronicDocument) -> Result<()> {
        match document.state {
            DocumentState::Cancel => return Ok(()),
            DocumentState::Authorized if !has_cancellation_authorization(document) => {
                return Err(EdiError::Cancellation(format!(
                    "Document {} is authorized; register its cancellation authorization number before cancelling",
                    document.document_number
                )));
            }
            _ => {}
        }

        let from = document.state;
        document.cancel();
        self.store.save(document).await?;
        crate::log_document_transition!(document.id, document.document_number, from, document.state);
        Ok(())
    }

    /// Stores the number the authority issued for the cancellation request
    pub async fn register_cancellation_authorization(
        &self,
        document: &mut ElectronicDocument,
        number: &str,
    ) -> Result<()> {
        let number = number.trim();
        if number.is_empty() {
            return Err(EdiError::Cancellation(
                "Cancellation authorization number cannot be empty".to_string(),
            ));
        }
        if document.state != DocumentState::Authorized {
            return Err(EdiError::Cancellation(format!(
                "Document {} is {}; only authorized documents need a cancellation authorization",
                document.document_number, document.state
            )));
        }

        document.cancellation_authorization = Some(number.to_string());
        self.store.save(document).await?;
        tracing::info!(
            document_id = %document.id,
            cancellation_authorization = number,
            "Cancellation authorization registered"
        );
        Ok(())
    }

    /// Deletes a draft, or a cancelled document that was never authorized
    pub async fn delete(&self, document: &ElectronicDocument) -> Result<()> {
        let allowed = match document.state {
            DocumentState::Draft => true,
            DocumentState::Cancel => !has_cancellation_authorization(document),
            _ => false,
        };
        if !allowed {
            return Err(EdiError::Cancellation(format!(
                "Document {} is {} and cannot be deleted",
                document.document_number, document.state
            )));
        }

        if !self.store.delete(&document.id).await? {
            return Err(EdiError::NotFound(format!("Document {}", document.id)));
        }
        tracing::info!(document_id = %document.id, "Electronic document deleted");
        Ok(())
    }

    /// Includes or excludes a document from the returned/rejected notice
    pub async fn set_notification_active(
        &self,
        document: &mut ElectronicDocument,
        active: bool,
    ) -> Result<()> {
        if document.notification_active == active {
            return Ok(());
        }
        document.set_notification_active(active);
        self.store.save(document).await?;
        tracing::info!(
            document_id = %document.id,
            notification_active = active,
            "Unauthorized notice setting changed"
        );
        Ok(())
    }

    /// Sends the company's returned and rejected documents to the notifier
    ///
    /// Returns how many documents the notice listed. Nothing is sent in a
    /// dry run or when no document qualifies.
    pub async fn notify_unauthorized(&self, settings: &CompanySettings) -> Result<usize> {
        if self.dry_run {
            tracing::debug!(company = %settings.id, "Dry run: unauthorized notice not sent");
            return Ok(0);
        }

        let company = settings.company_id()?;
        let documents = self
            .store
            .unauthorized_for_company(&company, settings.batch_size)
            .await?;
        if documents.is_empty() {
            return Ok(0);
        }

        self.notifier
            .notify_unauthorized(settings, &documents)
            .await?;
        tracing::info!(
            company = %settings.id,
            count = documents.len(),
            "Unauthorized documents notice sent"
        );
        Ok(documents.len())
    }

    async fn run(
        &self,
        document: &mut ElectronicDocument,
        settings: &CompanySettings,
        source: Option<&dyn DocumentSource>,
        ctx: &CallContext,
    ) -> Result<ProcessOutcome> {
        match document.state {
            DocumentState::Authorized => {
                self.finalize_authorized(document).await?;
                return Ok(ProcessOutcome::Finished(DocumentState::Authorized));
            }
            DocumentState::Cancel => {
                return Ok(ProcessOutcome::Skipped("document is cancelled".to_string()));
            }
            _ => {}
        }

        if document.signed_xml.is_none() {
            let loaded;
            let source = match source {
                Some(source) => source,
                None => {
                    loaded = self.load_source(document).await?;
                    loaded.as_ref()
                }
            };

            let prepared = match self.prepare(document, settings, source, ctx).await {
                Ok(()) => self.sign(document).await,
                Err(e) => Err(e),
            };
            if let Err(e) = prepared {
                return self.local_failure(document, ctx, e);
            }
        }

        if self.dry_run {
            return Ok(self.dry_run_skip(document));
        }

        let gateway = self.gateways.create(settings, document.environment)?;
        let outcome = if document.awaits_authority() {
            tracing::debug!(document_id = %document.id, "Authority holds the key, polling only");
            self.poll(document, gateway.as_ref(), ctx).await?
        } else {
            self.submit_with(document, gateway.as_ref(), settings.max_attempts, ctx)
                .await?
        };
        self.conclude(document, &outcome, ctx).await
    }

    async fn submit_with(
        &self,
        document: &mut ElectronicDocument,
        gateway: &dyn ValidationGateway,
        max_attempts: u32,
        ctx: &CallContext,
    ) -> Result<Outcome> {
        let signed = document.signed_xml.clone().ok_or_else(|| {
            EdiError::Validation(format!("Document {} has not been signed", document.id))
        })?;
        let max_attempts = max_attempts.max(1);
        let mut returned = 0;

        loop {
            if document.has_send_attempt() {
                if let Some(outcome) = self.pre_check(document, gateway, ctx).await? {
                    return Ok(outcome);
                }
            }

            let index = document.begin_attempt(AttemptKind::Send);
            self.store.save(document).await?;
            let result = gateway.submit_for_validation(signed.as_bytes()).await;
            document.finish_attempt(index);

            let reply = match result {
                Ok(reply) => reply,
                Err(e) => return self.transport_failure(document, e).await,
            };

            let outcome = classify_receipt(document, &reply, self.catalog.as_ref());
            match outcome {
                Outcome::Received => {
                    self.store.save(document).await?;
                    tracing::debug!(document_id = %document.id, "Document received");
                    return self.poll(document, gateway, ctx).await;
                }
                Outcome::Returned { .. } => {
                    returned += 1;
                    self.apply(document, &outcome, ctx).await?;
                    if returned >= max_attempts {
                        tracing::warn!(
                            document_id = %document.id,
                            attempts = returned,
                            "Attempts exhausted, leaving document for the next pass"
                        );
                        self.transition(document, DocumentState::Waiting).await?;
                        return Ok(outcome);
                    }
                    crate::log_retry_attempt!(returned, max_attempts, 0u64, "document returned");
                }
                other => {
                    self.apply(document, &other, ctx).await?;
                    return Ok(other);
                }
            }
        }
    }

    /// Asks the authority about a key that was sent before
    ///
    /// `None` means the authority does not know the key and the document
    /// must be sent.
    async fn pre_check(
        &self,
        document: &mut ElectronicDocument,
        gateway: &dyn ValidationGateway,
        ctx: &CallContext,
    ) -> Result<Option<Outcome>> {
        let key = required_key(document)?;
        let index = document.begin_attempt(AttemptKind::Check);
        self.store.save(document).await?;
        let result = gateway.query_authorization(&key).await;
        document.finish_attempt(index);

        match result {
            Err(e) => Ok(Some(self.transport_failure(document, e).await?)),
            Ok(reply) if reply.entries.is_empty() => {
                self.store.save(document).await?;
                Ok(None)
            }
            Ok(reply) => {
                tracing::info!(
                    document_id = %document.id,
                    "Authority already holds the document, skipping resubmission"
                );
                let outcome = classify_authorization(document, &reply, self.catalog.as_ref());
                self.apply(document, &outcome, ctx).await?;
                Ok(Some(outcome))
            }
        }
    }

    async fn poll(
        &self,
        document: &mut ElectronicDocument,
        gateway: &dyn ValidationGateway,
        ctx: &CallContext,
    ) -> Result<Outcome> {
        let key = required_key(document)?;
        let index = document.begin_attempt(AttemptKind::Check);
        self.store.save(document).await?;
        let result = gateway.query_authorization(&key).await;
        document.finish_attempt(index);

        match result {
            Ok(reply) => {
                let outcome = classify_authorization(document, &reply, self.catalog.as_ref());
                self.apply(document, &outcome, ctx).await?;
                Ok(outcome)
            }
            Err(e) => self.transport_failure(document, e).await,
        }
    }

    async fn transport_failure(
        &self,
        document: &mut ElectronicDocument,
        error: GatewayError,
    ) -> Result<Outcome> {
        tracing::warn!(
            document_id = %document.id,
            error = %error,
            "Web service unavailable, document left waiting"
        );
        record_transport_failure(document, self.catalog.as_ref());
        self.transition(document, DocumentState::Waiting).await?;
        Ok(Outcome::NoResponse)
    }

    async fn apply(
        &self,
        document: &mut ElectronicDocument,
        outcome: &Outcome,
        ctx: &CallContext,
    ) -> Result<()> {
        let from = document.state;
        let to = apply_outcome(document, outcome, ctx.allow_state_change);
        self.store.save(document).await?;
        if from != to {
            crate::log_document_transition!(document.id, document.document_number, from, to);
        }
        Ok(())
    }

    async fn transition(&self, document: &mut ElectronicDocument, to: DocumentState) -> Result<()> {
        let from = document.state;
        document.transition(to);
        self.store.save(document).await?;
        if from != to {
            crate::log_document_transition!(document.id, document.document_number, from, to);
        }
        Ok(())
    }

    async fn conclude(
        &self,
        document: &mut ElectronicDocument,
        outcome: &Outcome,
        ctx: &CallContext,
    ) -> Result<ProcessOutcome> {
        match document.state {
            DocumentState::Authorized => self.finalize_authorized(document).await?,
            DocumentState::Rejected
                if ctx.escalates_rejection() && !outcome.errors().is_empty() =>
            {
                return Err(EdiError::BusinessRejection {
                    access_key: document
                        .access_key
                        .as_ref()
                        .map(|key| key.to_string())
                        .unwrap_or_default(),
                    messages: outcome.errors().to_vec(),
                });
            }
            _ => {}
        }
        Ok(ProcessOutcome::Finished(document.state))
    }

    /// Materializes the authorized artifact and notifies once
    async fn finalize_authorized(&self, document: &mut ElectronicDocument) -> Result<()> {
        let artifact = if let Some(content) = document.authorized_xml.clone() {
            AuthorizedArtifact {
                file_name: document.file_name(),
                content,
            }
        } else {
            let artifact = AuthorizedArtifact::build(document)?;
            document.authorized_xml = Some(artifact.content.clone());
            self.store.save(document).await?;
            artifact
        };

        if document.notification_sent {
            return Ok(());
        }
        match self.notifier.notify_authorized(document, &artifact).await {
            Ok(()) => {
                document.notification_sent = true;
                self.store.save(document).await?;
            }
            Err(e) => {
                tracing::warn!(
                    document_id = %document.id,
                    error = %e,
                    "Notification failed, will retry on the next pass"
                );
            }
        }
        Ok(())
    }

    async fn load_source(&self, document: &ElectronicDocument) -> Result<Arc<dyn DocumentSource>> {
        self.sources
            .load(&document.source)
            .await?
            .ok_or_else(|| EdiError::NotFound(format!("Source {}", document.source)))
    }

    fn local_failure(
        &self,
        document: &ElectronicDocument,
        ctx: &CallContext,
        error: EdiError,
    ) -> Result<ProcessOutcome> {
        let local = matches!(
            error,
            EdiError::Validation(_) | EdiError::Signature(_) | EdiError::Xml(_)
        );
        if ctx.interactive || !local {
            return Err(error);
        }
        tracing::warn!(
            document_id = %document.id,
            document_number = %document.document_number,
            error = %error,
            "Document left for manual follow-up"
        );
        Ok(ProcessOutcome::Skipped(error.to_string()))
    }

    fn dry_run_skip(&self, document: &ElectronicDocument) -> ProcessOutcome {
        tracing::warn!(
            document_id = %document.id,
            document_number = %document.document_number,
            "Dry run: web service calls disabled, document not sent"
        );
        ProcessOutcome::Skipped("dry run".to_string())
    }
}

fn required_key(document: &ElectronicDocument) -> Result<AccessKey> {
    document
        .access_key
        .clone()
        .ok_or_else(|| EdiError::Validation(format!("Document {} has no access key", document.id)))
}

fn has_cancellation_authorization(document: &ElectronicDocument) -> bool {
    document
        .cancellation_authorization
        .as_deref()
        .is_some_and(|number| !number.trim().is_empty())
}
