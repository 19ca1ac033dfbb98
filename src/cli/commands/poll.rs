//! Poll command implementation

use super::engine::{exit_code_for, print_document, Engine, EXIT_OK, EXIT_PARTIAL};
use crate::core::lifecycle::{CallContext, ProcessOutcome};
use crate::domain::DocumentState;
use clap::Args;

/// Arguments for the poll command
#[derive(Args, Debug)]
pub struct PollArgs {
    /// Document id or 49-digit access key
    pub document: String,
}

impl PollArgs {
    /// Execute the poll command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(document = %self.document, "Polling authorization");

        println!("🔎 Querying authorization");
        println!();

        let engine = match Engine::open(config_path, false).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };
        let mut document = match engine.find_document(&self.document).await {
            Ok(document) => document,
            Err(code) => return Ok(code),
        };
        let settings = match engine.company(document.company_id.as_str()) {
            Ok(settings) => settings.clone(),
            Err(code) => return Ok(code),
        };

        if document.access_key.is_none() {
            println!("❌ Document {} has no access key yet", document.document_number);
            return Ok(EXIT_PARTIAL);
        }

        let ctx = CallContext::interactive(document.environment);
        let result = engine
            .orchestrator
            .check_authorization(&mut document, &settings, &ctx)
            .await;

        print_document(&document);
        println!();

        match result {
            Ok(ProcessOutcome::Finished(DocumentState::Authorized)) => {
                println!("✅ Document authorized");
                Ok(EXIT_OK)
            }
            Ok(ProcessOutcome::Finished(state)) => {
                println!("⏳ Document is {state}");
                Ok(EXIT_PARTIAL)
            }
            Ok(ProcessOutcome::Skipped(reason)) => {
                println!("⚠️  Skipped: {reason}");
                Ok(EXIT_PARTIAL)
            }
            Err(e) => {
                println!("❌ {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
