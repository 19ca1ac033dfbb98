//! Core business logic of the authorization engine.
//!
//! # Modules
//!
//! - [`access_key`] - 49-digit access key with its modulus-11 check digit
//! - [`header`] - `infoTributaria` assembly and pre-signing validation
//! - [`classify`] - interpretation of the web service replies
//! - [`lifecycle`] - the document state machine and scheduled passes
//!
//! # Authorization Workflow
//!
//! 1. **Declare**: create the electronic document for a source, in `draft`
//! 2. **Prepare**: assign the access key, build and validate the XML
//! 3. **Sign**: hand the XML to the signer
//! 4. **Submit**: send the signed XML to the reception service
//! 5. **Authorize**: poll the authorization service by access key
//! 6. **Deliver**: build the authorized envelope and notify once
//!
//! # Example
//!
//! ```rust,no_run
//! use sri_edi::adapters::signing::MissingSigner;
//! use sri_edi::adapters::sources::DirectorySourceRepository;
//! use sri_edi::adapters::sri::SoapGatewayFactory;
//! use sri_edi::adapters::store::InMemoryDocumentStore;
//! use sri_edi::config::{load_config, StaticSettings};
//! use sri_edi::core::lifecycle::{BatchScheduler, LifecycleOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sri-edi.toml")?;
//!
//! let orchestrator = LifecycleOrchestrator::new(
//!     Arc::new(InMemoryDocumentStore::new()),
//!     Arc::new(DirectorySourceRepository::new(&config.sources.directory)),
//!     Arc::new(MissingSigner),
//!     Arc::new(SoapGatewayFactory::new(config.retry.clone())),
//! );
//! let scheduler = BatchScheduler::new(
//!     Arc::new(orchestrator),
//!     Arc::new(StaticSettings::from(&config)),
//! );
//!
//! for summary in scheduler.run_all().await? {
//!     println!("{}: {} authorized", summary.company, summary.authorized);
//! }
//! # Ok(())
//! # }
//! ```

pub mod access_key;
pub mod classify;
pub mod header;
pub mod lifecycle;
