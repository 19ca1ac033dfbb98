//! PostgreSQL implementation of [`DocumentStore`]

use super::client::PostgreSQLClient;
use super::models::{DocumentRow, COLUMNS};
use crate::adapters::store::{DocumentFilter, DocumentStore};
use crate::domain::{
    AccessKey, CompanyId, DocumentId, EdiError, ElectronicDocument, Result, SourceRef,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Document store on a single `electronic_documents` table
pub struct PostgresDocumentStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgresDocumentStore {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn select(
        &self,
        clause: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<ElectronicDocument>> {
        let query = format!("SELECT {COLUMNS} FROM electronic_documents {clause}");
        self.client
            .query(&query, params)
            .await?
            .iter()
            .map(|row| DocumentRow::from_row(row).to_domain())
            .collect()
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn insert(&self, document: &ElectronicDocument) -> Result<()> {
        let row = DocumentRow::from_domain(document)?;

        let insert_query = format!(
            "INSERT INTO electronic_documents ({COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
             $19, $20, $21, $22, $23, $24, $25) \
             ON CONFLICT DO NOTHING"
        );

        let inserted = self
            .client
            .execute(
                &insert_query,
                &[
                    &row.id,
                    &row.company_id,
                    &row.source_kind,
                    &row.source_id,
                    &row.document_number,
                    &row.issue_date,
                    &row.access_key,
                    &row.state,
                    &row.environment,
                    &row.connection_mode,
                    &row.authorization_number,
                    &row.authorization_date,
                    &row.notification_sent,
                    &row.notification_active,
                    &row.cancellation_authorization,
                    &row.cancel_date,
                    &row.xml,
                    &row.signed_xml,
                    &row.signed_at,
                    &row.authorized_xml,
                    &row.send_attempts,
                    &row.messages,
                    &row.last_error_code,
                    &row.created_at,
                    &row.updated_at,
                ],
            )
            .await?;

        if inserted == 0 {
            return Err(EdiError::Store(format!(
                "Company {} already has an electronic document for {}",
                document.company_id, document.source
            )));
        }

        tracing::debug!(document_id = %document.id, source = %document.source, "Document inserted");
        Ok(())
    }

    async fn save(&self, document: &ElectronicDocument) -> Result<()> {
        let row = DocumentRow::from_domain(document)?;

        let update_query = r#"
            UPDATE electronic_documents SET
                document_number = $2,
                access_key = $3,
                state = $4,
                environment = $5,
                authorization_number = $6,
                authorization_date = $7,
                notification_sent = $8,
                cancellation_authorization = $9,
                cancel_date = $10,
                xml = $11,
                signed_xml = $12,
                signed_at = $13,
                authorized_xml = $14,
                send_attempts = $15,
                messages = $16,
                last_error_code = $17,
                updated_at = $18,
                notification_active = $19
            WHERE id = $1
        "#;

        let updated = self
            .client
            .execute(
                update_query,
                &[
                    &row.id,
                    &row.document_number,
                    &row.access_key,
                    &row.state,
                    &row.environment,
                    &row.authorization_number,
                    &row.authorization_date,
                    &row.notification_sent,
                    &row.cancellation_authorization,
                    &row.cancel_date,
                    &row.xml,
                    &row.signed_xml,
                    &row.signed_at,
                    &row.authorized_xml,
                    &row.send_attempts,
                    &row.messages,
                    &row.last_error_code,
                    &row.updated_at,
                    &row.notification_active,
                ],
            )
            .await?;

        if updated == 0 {
            return Err(EdiError::NotFound(format!("Document {}", document.id)));
        }
        Ok(())
    }

    async fn load(&self, id: &DocumentId) -> Result<Option<ElectronicDocument>> {
        Ok(self
            .select("WHERE id = $1", &[id.as_uuid()])
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_source(
        &self,
        company_id: &CompanyId,
        source: &SourceRef,
    ) -> Result<Option<ElectronicDocument>> {
        let kind = source.kind.to_string();
        Ok(self
            .select(
                "WHERE company_id = $1 AND source_kind = $2 AND source_id = $3",
                &[&company_id.as_str(), &kind, &source.source_id],
            )
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_access_key(&self, access_key: &AccessKey) -> Result<Option<ElectronicDocument>> {
        Ok(self
            .select("WHERE access_key = $1", &[&access_key.as_str()])
            .await?
            .into_iter()
            .next())
    }

    async fn delete(&self, id: &DocumentId) -> Result<bool> {
        let deleted = self
            .client
            .execute("DELETE FROM electronic_documents WHERE id = $1", &[id.as_uuid()])
            .await?;
        Ok(deleted > 0)
    }

    async fn pending_for_company(
        &self,
        company_id: &CompanyId,
        limit: usize,
    ) -> Result<Vec<ElectronicDocument>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.select(
            r#"WHERE company_id = $1
                 AND (state IN ('draft', 'waiting')
                      OR (state IN ('signed', 'returned', 'rejected')
                          AND send_attempts @> '[{"kind": "send"}]'::jsonb)
                      OR (state = 'authorized' AND NOT notification_sent))
               ORDER BY document_number
               LIMIT $2"#,
            &[&company_id.as_str(), &limit],
        )
        .await
    }

    async fn unauthorized_for_company(
        &self,
        company_id: &CompanyId,
        limit: usize,
    ) -> Result<Vec<ElectronicDocument>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.select(
            "WHERE company_id = $1 \
               AND state IN ('returned', 'rejected') \
               AND notification_active \
             ORDER BY document_number \
             LIMIT $2",
            &[&company_id.as_str(), &limit],
        )
        .await
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<ElectronicDocument>> {
        let company = filter.company_id.as_ref().map(|id| id.as_str().to_string());
        let state = filter.state.map(|state| state.as_str().to_string());
        self.select(
            "WHERE ($1::TEXT IS NULL OR company_id = $1) \
               AND ($2::TEXT IS NULL OR state = $2) \
             ORDER BY company_id, document_number",
            &[&company, &state],
        )
        .await
    }
}
