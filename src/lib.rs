// SRI EDI - Electronic document authorization for Ecuador's SRI
// Copyright (c) 2025 SRI EDI Contributors
// Licensed under the MIT License

//! # SRI EDI - electronic tax document authorization
//!
//! SRI EDI drives invoices, credit and debit notes, withholdings and
//! purchase liquidations through the authorization process of Ecuador's
//! tax authority (SRI) offline web services.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Generating** the 49-digit access key with its modulus-11 check digit
//! - **Building** the `infoTributaria` header and the full document XML
//! - **Signing** through an external XAdES-BES signer
//! - **Submitting** to the reception service and **polling** the authorization service
//! - **Classifying** every reply into a lifecycle state and deduplicated messages
//! - **Scheduling** per-company passes over pending documents
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (access key, header, classification, lifecycle)
//! - [`adapters`] - External integrations (SOAP gateway, signer, stores, sources)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sri_edi::adapters::signing::MissingSigner;
//! use sri_edi::adapters::sources::DirectorySourceRepository;
//! use sri_edi::adapters::sri::SoapGatewayFactory;
//! use sri_edi::adapters::store::create_document_store;
//! use sri_edi::config::{load_config, FileSettings};
//! use sri_edi::core::lifecycle::{BatchScheduler, LifecycleOrchestrator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("sri-edi.toml")?;
//!     let store = create_document_store(&config).await?;
//!
//!     let orchestrator = LifecycleOrchestrator::new(
//!         store,
//!         Arc::new(DirectorySourceRepository::new(&config.sources.directory)),
//!         Arc::new(MissingSigner),
//!         Arc::new(SoapGatewayFactory::new(config.retry.clone())),
//!     );
//!
//!     let scheduler = BatchScheduler::new(
//!         Arc::new(orchestrator),
//!         Arc::new(FileSettings::new("sri-edi.toml")),
//!     );
//!     for summary in scheduler.run_all().await? {
//!         println!("{}: {} authorized", summary.company, summary.authorized);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::EdiError`]. Protocol
//! outcomes such as a pending or returned document are state transitions,
//! not errors.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
