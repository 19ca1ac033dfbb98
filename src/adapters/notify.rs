//! Notification of the issuer about document outcomes
//!
//! Delivery to the document holder (mail, portal) is outside the engine.
//! The lifecycle calls the [`Notifier`] once per authorized document, and
//! once per scheduled pass with the returned and rejected documents still
//! flagged for notice.

use crate::config::CompanySettings;
use crate::core::lifecycle::AuthorizedArtifact;
use crate::domain::{ElectronicDocument, Result};
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_authorized(
        &self,
        document: &ElectronicDocument,
        artifact: &AuthorizedArtifact,
    ) -> Result<()>;

    /// Reports the documents the authority did not accept
    ///
    /// Called with a non-empty list, ordered by document number.
    async fn notify_unauthorized(
        &self,
        company: &CompanySettings,
        documents: &[ElectronicDocument],
    ) -> Result<()>;
}

/// Records the notification in the log only
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_authorized(
        &self,
        document: &ElectronicDocument,
        artifact: &AuthorizedArtifact,
    ) -> Result<()> {
        tracing::info!(
            document_id = %document.id,
            document_number = %document.document_number,
            authorization_number = document.authorization_number.as_deref().unwrap_or_default(),
            file_name = %artifact.file_name,
            bytes = artifact.content.len(),
            "Authorized document ready for delivery"
        );
        Ok(())
    }

    async fn notify_unauthorized(
        &self,
        company: &CompanySettings,
        documents: &[ElectronicDocument],
    ) -> Result<()> {
        let numbers: Vec<&str> = documents
            .iter()
            .map(|document| document.document_number.as_str())
            .collect();
        tracing::warn!(
            company = %company.id,
            legal_name = %company.legal_name,
            count = documents.len(),
            documents = %numbers.join(", "),
            "Documents not authorized by the SRI"
        );
        Ok(())
    }
}
