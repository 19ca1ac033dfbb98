//! Wiring shared by the commands that drive documents
//!
//! Loads the configuration, opens the store and assembles the
//! orchestrator. Failures are reported on the console and mapped to the
//! process exit codes.

use crate::adapters::signing::{CommandSigner, MissingSigner, SignatureGateway};
use crate::adapters::sources::DirectorySourceRepository;
use crate::adapters::sri::SoapGatewayFactory;
use crate::adapters::store::{create_document_store, DocumentStore};
use crate::config::{load_config, CompanySettings, EdiConfig};
use crate::core::lifecycle::LifecycleOrchestrator;
use crate::domain::{AccessKey, DocumentId, EdiError, ElectronicDocument};
use std::sync::Arc;

pub const EXIT_OK: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_CONFIGURATION: i32 = 2;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Configuration plus a ready orchestrator
pub struct Engine {
    pub config: EdiConfig,
    pub orchestrator: Arc<LifecycleOrchestrator>,
}

impl Engine {
    /// Builds the engine, or the exit code to stop with
    pub async fn open(config_path: &str, dry_run: bool) -> Result<Self, i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Err(EXIT_CONFIGURATION);
            }
        };

        if dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        let store = match create_document_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open document store");
                println!("   Error: {e}");
                return Err(EXIT_CONNECTION);
            }
        };

        let signer: Arc<dyn SignatureGateway> = match CommandSigner::from_config(&config.signer) {
            Some(signer) => Arc::new(signer),
            None => {
                tracing::warn!("No signer command configured, documents cannot be signed");
                Arc::new(MissingSigner)
            }
        };

        let orchestrator = LifecycleOrchestrator::new(
            store,
            Arc::new(DirectorySourceRepository::new(&config.sources.directory)),
            signer,
            Arc::new(SoapGatewayFactory::new(config.retry.clone())),
        )
        .with_dry_run(config.application.dry_run);

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
        })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        self.orchestrator.store()
    }

    /// Settings of a configured company, or the exit code
    pub fn company(&self, id: &str) -> Result<&CompanySettings, i32> {
        self.config.company(id).ok_or_else(|| {
            println!("❌ Company '{id}' is not configured");
            EXIT_CONFIGURATION
        })
    }

    /// Finds a document by id or by access key, or the exit code
    pub async fn find_document(&self, reference: &str) -> Result<ElectronicDocument, i32> {
        let reference = reference.trim();
        let found = if let Ok(key) = AccessKey::new(reference) {
            self.store().find_by_access_key(&key).await
        } else {
            match reference.parse::<DocumentId>() {
                Ok(id) => self.store().load(&id).await,
                Err(e) => {
                    println!("❌ '{reference}' is neither a document id nor an access key");
                    println!("   Error: {e}");
                    return Err(EXIT_CONFIGURATION);
                }
            }
        };

        match found {
            Ok(Some(document)) => Ok(document),
            Ok(None) => {
                println!("❌ Document not found: {reference}");
                Err(EXIT_PARTIAL)
            }
            Err(e) => {
                println!("❌ Failed to read document store");
                println!("   Error: {e}");
                Err(EXIT_CONNECTION)
            }
        }
    }
}

/// Exit code for an error raised while driving a document
pub fn exit_code_for(error: &EdiError) -> i32 {
    match error {
        EdiError::Configuration(_) => EXIT_CONFIGURATION,
        EdiError::Database(_) | EdiError::Gateway(_) => EXIT_CONNECTION,
        EdiError::Validation(_)
        | EdiError::Signature(_)
        | EdiError::BusinessRejection { .. }
        | EdiError::Cancellation(_)
        | EdiError::NotFound(_) => EXIT_PARTIAL,
        _ => EXIT_FATAL,
    }
}

/// Prints one document's state and messages
pub fn print_document(document: &ElectronicDocument) {
    println!("  Document: {}", document.document_number);
    println!("  Id: {}", document.id);
    println!("  State: {}", document.state);
    println!("  Environment: {}", document.environment);
    if let Some(key) = &document.access_key {
        println!("  Access Key: {key}");
    }
    if let (Some(number), Some(date)) = (&document.authorization_number, &document.authorization_date) {
        println!("  Authorization: {number} ({})", date.format("%Y-%m-%d %H:%M:%S"));
    }
    if !document.messages.is_empty() {
        println!("  Messages:");
        for line in &document.messages {
            println!(
                "    - [{}] {} ({}x)",
                line.error_code.code, line.message, line.occurrences
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GatewayError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&EdiError::Configuration("x".to_string())),
            EXIT_CONFIGURATION
        );
        assert_eq!(
            exit_code_for(&GatewayError::Timeout("30s".to_string()).into()),
            EXIT_CONNECTION
        );
        assert_eq!(
            exit_code_for(&EdiError::BusinessRejection {
                access_key: String::new(),
                messages: vec![],
            }),
            EXIT_PARTIAL
        );
        assert_eq!(exit_code_for(&EdiError::Other("x".to_string())), EXIT_FATAL);
    }
}
