//! Status command implementation
//!
//! This module implements the `status` command for listing electronic
//! documents with their lifecycle state.

use super::engine::{print_document, Engine, EXIT_CONFIGURATION, EXIT_FATAL, EXIT_OK};
use crate::adapters::store::DocumentFilter;
use crate::domain::{CompanyId, DocumentState};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Filter by company id
    #[arg(long)]
    pub company: Option<String>,

    /// Filter by state (draft, signed, waiting, authorized, returned, rejected, cancel)
    #[arg(long)]
    pub state: Option<DocumentState>,

    /// Show one document in detail, by id or access key
    #[arg(long, conflicts_with_all = ["company", "state"])]
    pub document: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking document status");

        println!("📊 Document Status");
        println!();

        let engine = match Engine::open(config_path, false).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };

        if let Some(reference) = &self.document {
            return match engine.find_document(reference).await {
                Ok(document) => {
                    print_document(&document);
                    Ok(EXIT_OK)
                }
                Err(code) => Ok(code),
            };
        }

        let company_id = match self.company.as_deref().map(CompanyId::new).transpose() {
            Ok(id) => id,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };
        let filter = DocumentFilter {
            company_id,
            state: self.state,
        };

        let documents = match engine.store().list(&filter).await {
            Ok(documents) => documents,
            Err(e) => {
                println!("❌ Failed to list documents");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if documents.is_empty() {
            println!("No documents match the specified filters.");
            return Ok(EXIT_OK);
        }

        println!("Found {} document(s):", documents.len());
        println!();
        println!(
            "{:<15} {:<25} {:<14} {:<12} {:<50}",
            "Company", "Number", "State", "Environment", "Access Key"
        );
        println!("{}", "-".repeat(120));

        for document in &documents {
            let state = match document.state {
                DocumentState::Authorized => "✅ authorized",
                DocumentState::Waiting => "⏳ waiting",
                DocumentState::Returned => "↩️  returned",
                DocumentState::Rejected => "❌ rejected",
                DocumentState::Cancel => "🚫 cancel",
                DocumentState::Signed => "🔏 signed",
                DocumentState::Draft => "📝 draft",
            };
            let access_key = document
                .access_key
                .as_ref()
                .map(|key| key.to_string())
                .unwrap_or_else(|| "-".to_string());

            println!(
                "{:<15} {:<25} {:<14} {:<12} {:<50}",
                document.company_id.as_str(),
                document.document_number,
                state,
                document.environment,
                access_key
            );
        }

        println!();
        Ok(EXIT_OK)
    }
}
