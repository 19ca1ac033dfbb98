//! CLI command implementations
//!
//! Every command returns the process exit code:
//! 0 success, 1 partial success or business failure, 2 configuration
//! error, 4 store or web service connection error, 5 fatal error.

pub mod access_key;
pub mod cancel;
pub mod declare;
pub mod engine;
pub mod init;
pub mod notice;
pub mod poll;
pub mod process;
pub mod status;
pub mod validate;
