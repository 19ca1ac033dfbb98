//! Document persistence
//!
//! [`DocumentStore`] is implemented in memory and on PostgreSQL; the
//! backend is chosen with [`create_document_store`].

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_document_store;
pub use memory::InMemoryDocumentStore;
pub use traits::{is_pending, DocumentFilter, DocumentStore};
