//! In-process document store

use super::traits::{is_pending, is_unauthorized_notice, DocumentFilter, DocumentStore};
use crate::domain::{
    AccessKey, CompanyId, DocumentId, EdiError, ElectronicDocument, Result, SourceRef,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Store backed by a map, used for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<DocumentId, ElectronicDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn sort_by_number(documents: &mut [ElectronicDocument]) {
    documents.sort_by(|a, b| {
        a.company_id
            .cmp(&b.company_id)
            .then_with(|| a.document_number.cmp(&b.document_number))
    });
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, document: &ElectronicDocument) -> Result<()> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(EdiError::Store(format!(
                "Document {} already exists",
                document.id
            )));
        }
        if documents
            .values()
            .any(|existing| existing.company_id == document.company_id && existing.source == document.source)
        {
            return Err(EdiError::Store(format!(
                "Company {} already has an electronic document for {}",
                document.company_id, document.source
            )));
        }
        documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn save(&self, document: &ElectronicDocument) -> Result<()> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&document.id) {
            Some(existing) => {
                *existing = document.clone();
                Ok(())
            }
            None => Err(EdiError::NotFound(format!("Document {}", document.id))),
        }
    }

    async fn load(&self, id: &DocumentId) -> Result<Option<ElectronicDocument>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn find_by_source(
        &self,
        company_id: &CompanyId,
        source: &SourceRef,
    ) -> Result<Option<ElectronicDocument>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .find(|doc| &doc.company_id == company_id && &doc.source == source)
            .cloned())
    }

    async fn find_by_access_key(&self, access_key: &AccessKey) -> Result<Option<ElectronicDocument>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .find(|doc| doc.access_key.as_ref() == Some(access_key))
            .cloned())
    }

    async fn delete(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.documents.write().await.remove(id).is_some())
    }

    async fn pending_for_company(
        &self,
        company_id: &CompanyId,
        limit: usize,
    ) -> Result<Vec<ElectronicDocument>> {
        let mut pending: Vec<ElectronicDocument> = self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| &doc.company_id == company_id && is_pending(doc))
            .cloned()
            .collect();
        sort_by_number(&mut pending);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn unauthorized_for_company(
        &self,
        company_id: &CompanyId,
        limit: usize,
    ) -> Result<Vec<ElectronicDocument>> {
        let mut documents: Vec<ElectronicDocument> = self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| &doc.company_id == company_id && is_unauthorized_notice(doc))
            .cloned()
            .collect();
        sort_by_number(&mut documents);
        documents.truncate(limit);
        Ok(documents)
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<ElectronicDocument>> {
        let mut documents: Vec<ElectronicDocument> = self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        sort_by_number(&mut documents);
        Ok(documents)
    }
}
