//! External system integrations.
//!
//! This module provides adapters for the collaborators of the engine:
//!
//! - [`sri`] - the authority's reception and authorization web services
//! - [`signing`] - the external XML signer
//! - [`sources`] - business documents prepared by the issuing system
//! - [`store`] - persistence abstraction (trait-based)
//! - [`postgresql`] - PostgreSQL implementation of the store
//! - [`notify`] - delivery of authorized documents
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with scripted implementations. Every collaborator the
//! lifecycle talks to is a trait object, so tests swap the web services,
//! the signer and the store without touching the lifecycle.
//!
//! # Web Service Adapter
//!
//! ```rust,no_run
//! use sri_edi::adapters::sri::{SoapGateway, ValidationGateway};
//! use sri_edi::config::RetryConfig;
//! use sri_edi::domain::AccessKey;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = SoapGateway::new(
//!     "https://celcer.sri.gob.ec/comprobantes-electronicos-ws/RecepcionComprobantesOffline?wsdl",
//!     "https://celcer.sri.gob.ec/comprobantes-electronicos-ws/AutorizacionComprobantesOffline?wsdl",
//!     Duration::from_secs(30),
//!     RetryConfig::default(),
//! )?;
//!
//! let key = AccessKey::new("0101202401179001234500120010010000001231234567810")?;
//! let reply = gateway.query_authorization(&key).await?;
//! println!("{} authorization entries", reply.entries.len());
//! # Ok(())
//! # }
//! ```

pub mod notify;
pub mod postgresql;
pub mod signing;
pub mod sources;
pub mod sri;
pub mod store;
