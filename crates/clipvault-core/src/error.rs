//! Error metadata shared by the pipeline's error types.
//!
//! Each crate defines its own `thiserror` enum; they all implement [`ErrorMetadata`] so
//! callers (HTTP layer, CLI) can present a single terminal classification per failure
//! without matching on every variant.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like tool failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Coarse failure taxonomy of an ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad content type, bad identifiers. No side effects were performed.
    Validation,
    /// Probe or remux process failure. Local temp state was cleaned up.
    TransientTool,
    /// Object store failure (put or signing).
    Storage,
    /// Anything else: local I/O, metadata store.
    Internal,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ErrorClass::Validation => write!(f, "validation"),
            ErrorClass::TransientTool => write!(f, "transient_tool"),
            ErrorClass::Storage => write!(f, "storage"),
            ErrorClass::Internal => write!(f, "internal"),
        }
    }
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// Failure class this error belongs to
    fn error_class(&self) -> ErrorClass;

    /// Machine-readable error code (e.g., "PROBE_FAILED")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// HTTP status code to return
    fn http_status_code(&self) -> u16 {
        match self.error_class() {
            ErrorClass::Validation => 400,
            ErrorClass::TransientTool | ErrorClass::Storage | ErrorClass::Internal => 500,
        }
    }

    /// Whether a retry by the client could succeed
    fn is_recoverable(&self) -> bool {
        matches!(
            self.error_class(),
            ErrorClass::Storage | ErrorClass::Internal
        )
    }

    /// Log level for this error
    fn log_level(&self) -> LogLevel {
        match self.error_class() {
            ErrorClass::Validation => LogLevel::Debug,
            ErrorClass::TransientTool => LogLevel::Warn,
            ErrorClass::Storage | ErrorClass::Internal => LogLevel::Error,
        }
    }
}
