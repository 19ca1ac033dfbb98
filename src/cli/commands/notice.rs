//! Notice command implementation
//!
//! Includes a returned or rejected document in the per-pass issuer notice,
//! or leaves it out with `--off`.

use super::engine::{exit_code_for, Engine, EXIT_OK};
use clap::Args;

/// Arguments for the notice command
#[derive(Args, Debug)]
pub struct NoticeArgs {
    /// Document id or 49-digit access key
    pub document: String,

    /// Stop listing the document in the returned/rejected notice
    #[arg(long)]
    pub off: bool,
}

impl NoticeArgs {
    /// Execute the notice command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let active = !self.off;
        tracing::info!(document = %self.document, active, "Changing unauthorized notice");

        let engine = match Engine::open(config_path, false).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };
        let mut document = match engine.find_document(&self.document).await {
            Ok(document) => document,
            Err(code) => return Ok(code),
        };

        if let Err(e) = engine
            .orchestrator
            .set_notification_active(&mut document, active)
            .await
        {
            println!("❌ {e}");
            return Ok(exit_code_for(&e));
        }

        if active {
            println!("🔔 Document {} included in the unauthorized notice", document.document_number);
        } else {
            println!("🔕 Document {} excluded from the unauthorized notice", document.document_number);
        }
        Ok(EXIT_OK)
    }
}
