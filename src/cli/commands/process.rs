//! Process command implementation
//!
//! Runs one scheduled pass per company over its pending documents.

use super::engine::{Engine, EXIT_CONFIGURATION, EXIT_FATAL, EXIT_OK, EXIT_PARTIAL};
use crate::config::{FileSettings, SettingsProvider, StaticSettings};
use crate::core::lifecycle::{BatchScheduler, PassSummary};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Only process this company
    #[arg(long)]
    pub company: Option<String>,

    /// Prepare and sign only, never call the web services
    #[arg(long)]
    pub dry_run: bool,
}

impl ProcessArgs {
    /// Execute the process command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(company = ?self.company, dry_run = self.dry_run, "Starting scheduled processing");

        println!("🚀 Processing pending documents");
        if self.dry_run {
            println!("   (dry run: nothing is sent to the tax authority)");
        }
        println!();

        let engine = match Engine::open(config_path, self.dry_run).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };

        let settings: Arc<dyn SettingsProvider> = match &self.company {
            Some(id) => match engine.company(id) {
                Ok(company) => Arc::new(StaticSettings::new(vec![company.clone()])),
                Err(code) => return Ok(code),
            },
            None => Arc::new(FileSettings::new(config_path)),
        };

        let scheduler = BatchScheduler::new(engine.orchestrator.clone(), settings)
            .with_shutdown(shutdown_signal.clone());

        let summaries = match scheduler.run_all().await {
            Ok(summaries) => summaries,
            Err(e) => {
                println!("❌ Scheduled processing failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        for summary in &summaries {
            print_summary(summary);
        }

        if *shutdown_signal.borrow() {
            println!("⚠️  Processing interrupted by shutdown signal");
            return Ok(EXIT_PARTIAL);
        }

        let all_ok = summaries.iter().all(PassSummary::is_successful);
        let any_processed = summaries.iter().any(|s| s.processed > 0);
        if all_ok {
            println!("✅ Processing completed");
            Ok(EXIT_OK)
        } else if any_processed {
            println!("⚠️  Processing completed with errors");
            Ok(EXIT_PARTIAL)
        } else {
            println!("❌ Processing failed");
            Ok(EXIT_FATAL)
        }
    }
}

fn print_summary(summary: &PassSummary) {
    println!("🏢 {}", summary.company);
    println!("   Processed:  {}", summary.processed);
    println!("   Authorized: {}", summary.authorized);
    println!("   Waiting:    {}", summary.waiting);
    println!("   Returned:   {}", summary.returned);
    println!("   Rejected:   {}", summary.rejected);
    println!("   Skipped:    {}", summary.skipped);
    println!("   Failed:     {}", summary.failed);
    println!("   Notified:   {} not authorized", summary.unauthorized_notified);
    println!("   Duration:   {:.2}s", summary.duration.as_secs_f64());
    for error in &summary.errors {
        println!("   ❌ {}: {}", error.document, error.message);
    }
    println!();
}
