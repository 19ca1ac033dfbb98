//! Document header assembly and pre-signing validation
//!
//! - [`builder`] - `infoTributaria` and full document XML
//! - [`schema`] - structural validation of the assembled document

pub mod builder;
pub mod schema;

pub use builder::{clean_text, AddressLookup, HeaderBuilder, IssuerProfile, TEST_ISSUER_NAME};
pub use schema::{SchemaValidator, StructuralValidator};
