//! PostgreSQL persistence of electronic documents

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgresDocumentStore;
pub use client::PostgreSQLClient;
pub use models::DocumentRow;
