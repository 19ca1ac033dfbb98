//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the configuration file.

use super::engine::{EXIT_CONFIGURATION, EXIT_OK};
use crate::config::{load_config, redacted_dsn, StoreBackend};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIGURATION);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);

        match config.store.backend {
            StoreBackend::Memory => println!("  Store: in-memory (records are lost on exit)"),
            StoreBackend::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Store: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        redacted_dsn(&pg_config.connection_string)
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }

        println!(
            "  Signer: {}",
            config.signer.command.as_deref().unwrap_or("not configured")
        );
        println!("  Sources Directory: {}", config.sources.directory);
        println!(
            "  Query Retries: {} (backoff x{})",
            config.retry.max_retries, config.retry.backoff_multiplier
        );
        println!("  Companies:");
        for company in &config.companies {
            println!(
                "    - {} ({}) environment={} mode={} max_attempts={} batch_size={}{}",
                company.id,
                company.ruc,
                company.environment,
                company.connection_mode.as_str(),
                company.max_attempts,
                company.batch_size,
                if company.enabled { "" } else { " [disabled]" }
            );
        }
        println!();
        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_reports_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[application]\nlog_level = \"loud\"\n").unwrap();
        file.flush().unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIGURATION);
    }
}
