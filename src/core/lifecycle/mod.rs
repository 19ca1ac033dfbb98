//! Document lifecycle
//!
//! - [`orchestrator`] - the per-document state machine
//! - [`batch`] - scheduled passes per company
//! - [`context`] - per-call behaviour switches
//! - [`attachment`] - the authorized envelope
//! - [`summary`] - pass reporting

pub mod attachment;
pub mod batch;
pub mod context;
pub mod orchestrator;
pub mod summary;

pub use attachment::AuthorizedArtifact;
pub use batch::BatchScheduler;
pub use context::CallContext;
pub use orchestrator::{LifecycleOrchestrator, ProcessOutcome};
pub use summary::{PassError, PassSummary};
