//! Declare command implementation
//!
//! Reads a source document file and creates its electronic document.
//! Companies in online mode get the document authorized in the same call.

use super::engine::{exit_code_for, print_document, Engine, EXIT_OK, EXIT_PARTIAL};
use crate::adapters::sources::DirectorySourceRepository;
use crate::core::lifecycle::CallContext;
use crate::domain::{ConnectionMode, DocumentState};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the declare command
#[derive(Args, Debug)]
pub struct DeclareArgs {
    /// Company id as configured in [[companies]]
    #[arg(long)]
    pub company: String,

    /// Source document JSON file
    #[arg(long)]
    pub source: PathBuf,

    /// Prepare and sign only, never call the web services
    #[arg(long)]
    pub dry_run: bool,
}

impl DeclareArgs {
    /// Execute the declare command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(company = %self.company, source = %self.source.display(), "Declaring document");

        println!("🧾 Declaring electronic document");
        println!();

        let engine = match Engine::open(config_path, self.dry_run).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };
        let settings = match engine.company(&self.company) {
            Ok(settings) => settings.clone(),
            Err(code) => return Ok(code),
        };

        let source = match DirectorySourceRepository::read(&self.source).await {
            Ok(source) => source,
            Err(e) => {
                println!("❌ Failed to read source document");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let ctx = CallContext::interactive(settings.environment);
        let document = match engine.orchestrator.declare(&settings, &source, &ctx).await {
            Ok(document) => document,
            Err(e) => {
                println!("❌ Declaration failed");
                println!("   {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_document(&document);
        println!();

        match (document.state, settings.connection_mode) {
            (DocumentState::Authorized, _) => {
                println!("✅ Document authorized");
                Ok(EXIT_OK)
            }
            (DocumentState::Draft, ConnectionMode::Offline) => {
                println!("✅ Document declared; run 'sri-edi process' to authorize it");
                Ok(EXIT_OK)
            }
            (DocumentState::Waiting, _) => {
                println!("⏳ Authorization pending; the next scheduled pass will retry");
                Ok(EXIT_PARTIAL)
            }
            (state, _) => {
                println!("⚠️  Document is {state}");
                Ok(EXIT_PARTIAL)
            }
        }
    }
}
