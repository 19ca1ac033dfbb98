//! Cancel command implementation
//!
//! Cancels a document, registering the authority's cancellation number
//! first when one is given. `--delete` removes a draft or a cancelled
//! document that was never authorized.

use super::engine::{exit_code_for, Engine, EXIT_OK};
use clap::Args;

/// Arguments for the cancel command
#[derive(Args, Debug)]
pub struct CancelArgs {
    /// Document id or 49-digit access key
    pub document: String,

    /// Cancellation authorization number issued by the tax authority
    #[arg(long)]
    pub authorization: Option<String>,

    /// Delete the record after cancelling it
    #[arg(long)]
    pub delete: bool,
}

impl CancelArgs {
    /// Execute the cancel command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(document = %self.document, delete = self.delete, "Cancelling document");

        let engine = match Engine::open(config_path, false).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };
        let mut document = match engine.find_document(&self.document).await {
            Ok(document) => document,
            Err(code) => return Ok(code),
        };

        if let Some(number) = &self.authorization {
            if let Err(e) = engine
                .orchestrator
                .register_cancellation_authorization(&mut document, number)
                .await
            {
                println!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
            println!("📝 Cancellation authorization {} registered", number.trim());
        }

        if let Err(e) = engine.orchestrator.cancel(&mut document).await {
            println!("❌ {e}");
            return Ok(exit_code_for(&e));
        }
        println!("✅ Document {} cancelled", document.document_number);

        if self.delete {
            if let Err(e) = engine.orchestrator.delete(&document).await {
                println!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
            println!("🗑️  Document {} deleted", document.document_number);
        }

        Ok(EXIT_OK)
    }
}
