//! Logging and observability
//!
//! Structured logging with tracing: a console layer for operators and a
//! JSON file layer with rotation for later inspection.
//!
//! # Example
//!
//! ```no_run
//! use sri_edi::logging::init_logging;
//! use sri_edi::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(company = "acme", "Scheduled pass started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, pass_span, LoggingGuard, LOG_FILE_NAME};

/// Log a state change of an electronic document
///
/// # Example
///
/// ```no_run
/// use sri_edi::log_document_transition;
///
/// log_document_transition!("6f1c...", "FV 001-001-000000123", "signed", "waiting");
/// ```
#[macro_export]
macro_rules! log_document_transition {
    ($document_id:expr, $number:expr, $from:expr, $to:expr) => {
        tracing::info!(
            document_id = %$document_id,
            document_number = %$number,
            from = %$from,
            to = %$to,
            "Document state changed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use sri_edi::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 1000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log a pass summary line
#[macro_export]
macro_rules! log_pass_complete {
    ($company:expr, $summary:expr) => {
        tracing::info!(
            company = %$company,
            processed = $summary.processed,
            authorized = $summary.authorized,
            waiting = $summary.waiting,
            failed = $summary.failed,
            unauthorized_notified = $summary.unauthorized_notified,
            duration_ms = $summary.duration.as_millis() as u64,
            "Scheduled pass completed"
        );
    };
}
