//! Pass summary and reporting
//!
//! Tracks what a scheduled pass did with each document it picked up.

use crate::domain::DocumentState;
use std::time::Duration;

/// Summary of one scheduled pass for one company
#[derive(Debug, Clone)]
pub struct PassSummary {
    /// Company the pass ran for
    pub company: String,

    /// Documents picked up
    pub processed: usize,

    pub authorized: usize,
    pub waiting: usize,
    pub rejected: usize,
    pub returned: usize,

    /// Documents left untouched (validation, signature, dry run)
    pub skipped: usize,

    /// Documents whose processing failed outside the protocol (store, source)
    pub failed: usize,

    /// Returned and rejected documents reported to the issuer
    pub unauthorized_notified: usize,

    pub errors: Vec<PassError>,

    pub duration: Duration,
}

impl PassSummary {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            processed: 0,
            authorized: 0,
            waiting: 0,
            rejected: 0,
            returned: 0,
            skipped: 0,
            failed: 0,
            unauthorized_notified: 0,
            errors: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Counts a document by the state it ended in
    pub fn record_state(&mut self, state: DocumentState) {
        self.processed += 1;
        match state {
            DocumentState::Authorized => self.authorized += 1,
            DocumentState::Waiting => self.waiting += 1,
            DocumentState::Rejected => self.rejected += 1,
            DocumentState::Returned => self.returned += 1,
            DocumentState::Draft | DocumentState::Signed | DocumentState::Cancel => {
                self.skipped += 1
            }
        }
    }

    pub fn record_skipped(&mut self) {
        self.processed += 1;
        self.skipped += 1;
    }

    /// Adds an error that is not tied to a processed document
    pub fn add_error(&mut self, error: PassError) {
        self.errors.push(error);
    }

    pub fn record_failure(&mut self, error: PassError) {
        self.processed += 1;
        self.failed += 1;
        self.errors.push(error);
    }

    /// Adds the counters of another pass
    pub fn merge(&mut self, other: &PassSummary) {
        self.processed += other.processed;
        self.authorized += other.authorized;
        self.waiting += other.waiting;
        self.rejected += other.rejected;
        self.returned += other.returned;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.unauthorized_notified += other.unauthorized_notified;
        self.errors.extend(other.errors.iter().cloned());
        self.duration += other.duration;
    }

    /// No document failed outside the protocol
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }

    pub fn log_summary(&self) {
        crate::log_pass_complete!(self.company, self);

        for error in &self.errors {
            tracing::warn!(
                company = %self.company,
                document = %error.document,
                message = %error.message,
                "Document failed during pass"
            );
        }
    }
}

/// Failure attached to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassError {
    /// Document id or number
    pub document: String,
    pub message: String,
}

impl PassError {
    pub fn new(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            message: message.into(),
        }
    }
}
