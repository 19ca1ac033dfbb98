//! Configuration management
//!
//! TOML configuration with `${VAR}` substitution, `SRI_EDI_*` environment
//! overrides and per-section validation.
//!
//! ```rust,no_run
//! use sri_edi::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sri-edi.toml")?;
//! for company in &config.companies {
//!     println!("{} ({}) -> {}", company.id, company.ruc, company.environment);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! dry_run = false
//!
//! [store]
//! backend = "postgresql"
//!
//! [postgresql]
//! connection_string = "${SRI_EDI_DATABASE_URL}"
//!
//! [signer]
//! command = "/usr/local/bin/xades-sign"
//! args = ["--p12", "/etc/sri-edi/acme.p12"]
//!
//! [[companies]]
//! id = "acme"
//! ruc = "1790012345001"
//! legal_name = "ACME S.A."
//! matrix_address = "Av. Amazonas N12-34"
//! environment = "test"
//! max_attempts = 3
//! batch_size = 50
//! ```
//!
//! Company settings are consumed through a [`SettingsProvider`] so that a
//! scheduled pass always sees the current file.

pub mod loader;
pub mod provider;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use provider::{FileSettings, SettingsProvider, StaticSettings};
pub use schema::{
    ApplicationConfig, CompanySettings, EdiConfig, EndpointConfig, LoggingConfig,
    PostgreSQLConfig, RetryConfig, SignerConfig, SourcesConfig, StoreBackend, StoreConfig,
};
pub use secret::{redacted_dsn, secret_string, SecretString, SecretValue};
