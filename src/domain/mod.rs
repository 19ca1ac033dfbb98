//! Domain models and types
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`AccessKey`], [`TaxId`], [`DocumentId`], [`EmissionPoint`])
//! - **The lifecycle record** ([`ElectronicDocument`], [`SendAttempt`], [`MessageLine`])
//! - **The document source capability** ([`DocumentSource`])
//! - **Error types** ([`EdiError`], [`GatewayError`]) and the [`Result`] alias
//!
//! ```rust
//! use sri_edi::domain::{AccessKey, TaxId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ruc = TaxId::new("1790012345001")?;
//! let key = AccessKey::new("0101202401179001234500120010010000001231234567810")?;
//! assert_eq!(key.environment_digit(), '2');
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod errors;
pub mod ids;
pub mod message;
pub mod result;
pub mod source;

pub use document::{
    ecuador_offset, AttemptKind, ConnectionMode, DocumentKind, DocumentState, ElectronicDocument,
    Environment, SendAttempt, SourceRef, ECUADOR_UTC_OFFSET_SECONDS,
};
pub use errors::{EdiError, GatewayError};
pub use ids::{AccessKey, CompanyId, DocumentId, EmissionPoint, TaxId};
pub use message::{
    BuiltinCatalog, ErrorCatalog, ErrorCode, MessageLine, MessageType, RemoteMessage,
};
pub use result::Result;
pub use source::{DocumentSource, DocumentVersion, PreparedSource};
