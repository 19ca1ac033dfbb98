//! Document store factory
//!
//! Creates the store backend selected by `store.backend`.

use super::memory::InMemoryDocumentStore;
use super::traits::DocumentStore;
use crate::adapters::postgresql::{PostgresDocumentStore, PostgreSQLClient};
use crate::config::schema::{EdiConfig, StoreBackend};
use crate::domain::{EdiError, Result};
use std::sync::Arc;

/// Create a document store based on the configuration
///
/// For PostgreSQL the schema migration is applied before the store is
/// returned.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or initialized
pub async fn create_document_store(config: &EdiConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory document store");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
        StoreBackend::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                EdiError::Configuration(
                    "postgresql configuration is required when store.backend = 'postgresql'"
                        .to_string(),
                )
            })?;

            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            tracing::info!(database = %client.connection_string_safe(), "Creating PostgreSQL document store");
            client.ensure_schema().await?;

            Ok(Arc::new(PostgresDocumentStore::new(client)))
        }
    }
}
