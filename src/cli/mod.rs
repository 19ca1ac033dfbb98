//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the authorization
//! engine using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// SRI EDI - electronic document authorization for Ecuador's SRI
#[derive(Parser, Debug)]
#[command(name = "sri-edi")]
#[command(version, about, long_about = None)]
#[command(author = "SRI EDI Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sri-edi.toml", env = "SRI_EDI_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SRI_EDI_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Declare a source document and, for online companies, authorize it
    Declare(commands::declare::DeclareArgs),

    /// Run a scheduled pass over pending documents
    Process(commands::process::ProcessArgs),

    /// Query the authorization of one document without resubmitting it
    Poll(commands::poll::PollArgs),

    /// Cancel or delete a document
    Cancel(commands::cancel::CancelArgs),

    /// Include or exclude a document from the returned/rejected notice
    Notice(commands::notice::NoticeArgs),

    /// Generate or verify an access key
    AccessKey(commands::access_key::AccessKeyArgs),

    /// Show documents and their lifecycle state
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_process() {
        let cli = Cli::parse_from(["sri-edi", "process"]);
        assert_eq!(cli.config, "sri-edi.toml");
        assert!(matches!(cli.command, Commands::Process(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["sri-edi", "--config", "custom.toml", "process"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["sri-edi", "--log-level", "debug", "status"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_declare() {
        let cli = Cli::parse_from([
            "sri-edi",
            "declare",
            "--company",
            "acme",
            "--source",
            "sources/INV-1.json",
        ]);
        match cli.command {
            Commands::Declare(args) => {
                assert_eq!(args.company, "acme");
                assert_eq!(args.source, std::path::PathBuf::from("sources/INV-1.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_poll() {
        let cli = Cli::parse_from([
            "sri-edi",
            "poll",
            "0101202401179001234500120010010000001231234567810",
        ]);
        assert!(matches!(cli.command, Commands::Poll(_)));
    }

    #[test]
    fn test_cli_parse_notice_off() {
        let cli = Cli::parse_from(["sri-edi", "notice", "FV-1", "--off"]);
        match cli.command {
            Commands::Notice(args) => {
                assert_eq!(args.document, "FV-1");
                assert!(args.off);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_access_key_verify() {
        let cli = Cli::parse_from([
            "sri-edi",
            "access-key",
            "--verify",
            "0101202401179001234500120010010000001231234567810",
        ]);
        assert!(matches!(cli.command, Commands::AccessKey(_)));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["sri-edi", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["sri-edi", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
