//! Document store abstraction
//!
//! Backends persist [`ElectronicDocument`] records together with their
//! attempt and message logs. Uniqueness of the source reference per company
//! is enforced by the store, not by callers.

use crate::domain::{
    AccessKey, CompanyId, DocumentId, DocumentState, ElectronicDocument, Result, SourceRef,
};
use async_trait::async_trait;

/// Filter used by [`DocumentStore::list`]
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub company_id: Option<CompanyId>,
    pub state: Option<DocumentState>,
}

impl DocumentFilter {
    pub fn matches(&self, document: &ElectronicDocument) -> bool {
        self.company_id
            .as_ref()
            .map_or(true, |company| &document.company_id == company)
            && self.state.map_or(true, |state| document.state == state)
    }
}

/// Persistence of electronic documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Test the backend connection
    async fn test_connection(&self) -> Result<()>;

    /// Inserts a new record
    ///
    /// # Errors
    ///
    /// Returns `EdiError::Store` if the company already has a record for the
    /// same source.
    async fn insert(&self, document: &ElectronicDocument) -> Result<()>;

    /// Overwrites an existing record
    ///
    /// # Errors
    ///
    /// Returns `EdiError::NotFound` if the record does not exist.
    async fn save(&self, document: &ElectronicDocument) -> Result<()>;

    async fn load(&self, id: &DocumentId) -> Result<Option<ElectronicDocument>>;

    async fn find_by_source(
        &self,
        company_id: &CompanyId,
        source: &SourceRef,
    ) -> Result<Option<ElectronicDocument>>;

    async fn find_by_access_key(&self, access_key: &AccessKey) -> Result<Option<ElectronicDocument>>;

    /// Removes a record with its attempts and messages
    ///
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: &DocumentId) -> Result<bool>;

    /// Documents a scheduled pass should pick up, ordered by document number
    ///
    /// See [`is_pending`] for the selection rule.
    async fn pending_for_company(
        &self,
        company_id: &CompanyId,
        limit: usize,
    ) -> Result<Vec<ElectronicDocument>>;

    /// Returned and rejected documents whose issuer still wants to hear
    /// about them, ordered by document number
    ///
    /// See [`is_unauthorized_notice`] for the selection rule.
    async fn unauthorized_for_company(
        &self,
        company_id: &CompanyId,
        limit: usize,
    ) -> Result<Vec<ElectronicDocument>>;

    /// Documents matching a filter, ordered by company and document number
    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<ElectronicDocument>>;
}

/// Whether a scheduled pass should process the document
///
/// Drafts and waiting documents always qualify. Signed, returned and
/// rejected documents qualify once they have been sent at least once, which
/// catches documents stuck mid-flight by a crash or a transport failure.
/// Authorized documents qualify until the issuer has been notified.
pub fn is_pending(document: &ElectronicDocument) -> bool {
    match document.state {
        DocumentState::Draft | DocumentState::Waiting => true,
        DocumentState::Signed | DocumentState::Returned | DocumentState::Rejected => {
            document.has_send_attempt()
        }
        DocumentState::Authorized => !document.notification_sent,
        DocumentState::Cancel => false,
    }
}

/// Whether the document belongs in the per-pass notice of documents the
/// authority did not accept
pub fn is_unauthorized_notice(document: &ElectronicDocument) -> bool {
    matches!(
        document.state,
        DocumentState::Returned | DocumentState::Rejected
    ) && document.notification_active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptKind, ConnectionMode, DocumentKind, Environment};
    use chrono::NaiveDate;

    fn document(state: DocumentState) -> ElectronicDocument {
        let mut document = ElectronicDocument::new(
            CompanyId::new("acme").unwrap(),
            SourceRef::new(DocumentKind::Invoice, "INV-1"),
            "FV 001-001-000000001",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Environment::Test,
            ConnectionMode::Offline,
        );
        document.state = state;
        document
    }

    #[test]
    fn test_pending_selection() {
        assert!(is_pending(&document(DocumentState::Draft)));
        assert!(is_pending(&document(DocumentState::Waiting)));
        assert!(!is_pending(&document(DocumentState::Signed)));
        assert!(!is_pending(&document(DocumentState::Returned)));
        assert!(!is_pending(&document(DocumentState::Cancel)));

        let mut authorized = document(DocumentState::Authorized);
        assert!(is_pending(&authorized));
        authorized.notification_sent = true;
        assert!(!is_pending(&authorized));

        let mut sent = document(DocumentState::Rejected);
        assert!(!is_pending(&sent));
        sent.begin_attempt(AttemptKind::Send);
        assert!(is_pending(&sent));

        let mut checked = document(DocumentState::Signed);
        checked.begin_attempt(AttemptKind::Check);
        assert!(!is_pending(&checked));
    }

    #[test]
    fn test_unauthorized_notice_selection() {
        assert!(is_unauthorized_notice(&document(DocumentState::Returned)));
        assert!(is_unauthorized_notice(&document(DocumentState::Rejected)));
        assert!(!is_unauthorized_notice(&document(DocumentState::Waiting)));
        assert!(!is_unauthorized_notice(&document(DocumentState::Authorized)));

        let mut muted = document(DocumentState::Rejected);
        muted.notification_active = false;
        assert!(!is_unauthorized_notice(&muted));
    }

    #[test]
    fn test_filter() {
        let doc = document(DocumentState::Waiting);
        assert!(DocumentFilter::default().matches(&doc));
        assert!(DocumentFilter {
            company_id: Some(CompanyId::new("acme").unwrap()),
            state: Some(DocumentState::Waiting),
        }
        .matches(&doc));
        assert!(!DocumentFilter {
            company_id: Some(CompanyId::new("other").unwrap()),
            state: None,
        }
        .matches(&doc));
    }
}
