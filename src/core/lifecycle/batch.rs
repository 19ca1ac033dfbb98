//! Scheduled passes over pending documents
//!
//! A pass is scoped to one company: its settings are read fresh, its
//! pending documents are fetched in document-number order and each one is
//! driven by the [`LifecycleOrchestrator`]. Nothing that happens to one
//! document stops the pass. The pass ends with the notice of returned and
//! rejected documents.

use super::context::CallContext;
use super::orchestrator::{LifecycleOrchestrator, ProcessOutcome};
use super::summary::{PassError, PassSummary};
use crate::config::SettingsProvider;
use crate::domain::{DocumentState, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::Instrument;

/// Runs scheduled passes, one company at a time
pub struct BatchScheduler {
    orchestrator: Arc<LifecycleOrchestrator>,
    settings: Arc<dyn SettingsProvider>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl BatchScheduler {
    pub fn new(orchestrator: Arc<LifecycleOrchestrator>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            orchestrator,
            settings,
            shutdown: None,
        }
    }

    /// Stops picking up work once the channel carries `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    /// Runs one pass for a company
    ///
    /// # Errors
    ///
    /// Fails only when the pass cannot start: unknown company, unreadable
    /// settings or an unreachable store.
    pub async fn run_pass(&self, company_id: &str) -> Result<PassSummary> {
        self.pass(company_id)
            .instrument(crate::logging::pass_span(company_id))
            .await
    }

    async fn pass(&self, company_id: &str) -> Result<PassSummary> {
        let start_time = Instant::now();
        let settings = self.settings.company(company_id)?;
        let mut summary = PassSummary::new(settings.id.clone());

        if !settings.enabled {
            tracing::info!(company = %settings.id, "Company disabled, skipping pass");
            return Ok(summary);
        }

        let company = settings.company_id()?;
        let ctx = CallContext::scheduled(settings.environment);
        let documents = self
            .orchestrator
            .store()
            .pending_for_company(&company, settings.batch_size)
            .await?;

        tracing::info!(
            company = %settings.id,
            environment = %settings.environment,
            pending = documents.len(),
            max_attempts = settings.max_attempts,
            "Starting scheduled pass"
        );

        for mut document in documents {
            if self.shutdown_requested() {
                tracing::warn!(company = %settings.id, "Shutdown requested, ending pass early");
                break;
            }

            // Rejected documents are re-polled without being moved back to rejected
            let document_ctx = if document.state == DocumentState::Rejected {
                ctx.without_state_change()
            } else {
                ctx
            };

            match self
                .orchestrator
                .process(&mut document, &settings, &document_ctx)
                .await
            {
                Ok(ProcessOutcome::Finished(state)) => summary.record_state(state),
                Ok(ProcessOutcome::Skipped(reason)) => {
                    tracing::debug!(
                        document_id = %document.id,
                        reason = %reason,
                        "Document skipped"
                    );
                    summary.record_skipped();
                }
                Err(e) => {
                    tracing::error!(
                        document_id = %document.id,
                        document_number = %document.document_number,
                        error = %e,
                        "Failed to process document"
                    );
                    summary.record_failure(PassError::new(
                        document.document_number.clone(),
                        e.to_string(),
                    ));
                }
            }
        }

        if !self.shutdown_requested() {
            match self.orchestrator.notify_unauthorized(&settings).await {
                Ok(count) => summary.unauthorized_notified = count,
                Err(e) => {
                    tracing::warn!(
                        company = %settings.id,
                        error = %e,
                        "Unauthorized notice failed, will retry on the next pass"
                    );
                }
            }
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Runs a pass for every enabled company, sequentially
    ///
    /// A company whose pass cannot start gets a summary carrying the error;
    /// the remaining companies still run.
    pub async fn run_all(&self) -> Result<Vec<PassSummary>> {
        let companies = self.settings.companies()?;
        let mut summaries = Vec::with_capacity(companies.len());

        for company in companies {
            if self.shutdown_requested() {
                tracing::warn!("Shutdown requested, remaining companies skipped");
                break;
            }

            match self.run_pass(&company.id).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    tracing::error!(company = %company.id, error = %e, "Scheduled pass failed");
                    let mut summary = PassSummary::new(company.id.clone());
                    summary.add_error(PassError::new(company.id.clone(), e.to_string()));
                    summaries.push(summary);
                }
            }
        }

        Ok(summaries)
    }
}
