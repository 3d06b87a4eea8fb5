//! Core types and error definitions for the ARIA pipeline service.
//!
//! This crate provides the foundational types shared across all ARIA crates:
//! the unified error enum, the immutable error record, and the tracker that
//! accumulates records and answers time-windowed summary queries.
//!
//! # Main types
//!
//! - [`AriaError`] — Unified error enum for all ARIA subsystems.
//! - [`AriaResult`] — Convenience alias for `Result<T, AriaError>`.
//! - [`ErrorCategory`] / [`ErrorSeverity`] — Classification dimensions.
//! - [`ErrorRecord`] — An immutable, timestamped error occurrence.
//! - [`ErrorTracker`] — Accumulates records and produces windowed summaries.

/// Error classification and immutable error records.
pub mod record;
/// Accumulation of error records and windowed summaries.
pub mod tracker;

pub use record::{ErrorCategory, ErrorRecord, ErrorSeverity};
pub use tracker::{ErrorSummary, ErrorTracker};

/// Top-level error type for the ARIA service.
///
/// Each variant corresponds to a subsystem that can produce errors; variants
/// carry a human-readable description. Use [`AriaError::category`] and
/// [`AriaError::severity`] to lower any error into the classification space
/// used by the [`ErrorTracker`].
#[derive(Debug, thiserror::Error)]
pub enum AriaError {
    /// A failure during the startup sequence (validation, config load).
    #[error("Startup error: {0}")]
    Startup(String),

    /// A configuration parsing or shape error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound call to an external inference/search API.
    #[error("API error: {0}")]
    Api(String),

    /// A resource-level problem (disk, memory, sampling).
    #[error("Resource error: {0}")]
    Resource(String),

    /// A failure inside the report pipeline itself.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// A failed validation check.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An error from the HTTP gateway layer.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AriaError {
    /// The error category this variant belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AriaError::Startup(_) => ErrorCategory::Startup,
            AriaError::Config(_) | AriaError::Json(_) => ErrorCategory::Configuration,
            AriaError::Api(_) | AriaError::Gateway(_) => ErrorCategory::Api,
            AriaError::Resource(_) | AriaError::Io(_) => ErrorCategory::Resource,
            AriaError::Pipeline(_) => ErrorCategory::Pipeline,
            AriaError::Validation(_) => ErrorCategory::Validation,
        }
    }

    /// The default severity assigned when tracking this variant.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AriaError::Startup(_) => ErrorSeverity::Critical,
            AriaError::Config(_) | AriaError::Json(_) => ErrorSeverity::High,
            AriaError::Pipeline(_) => ErrorSeverity::High,
            AriaError::Api(_) | AriaError::Gateway(_) | AriaError::Validation(_) => {
                ErrorSeverity::Medium
            }
            AriaError::Resource(_) | AriaError::Io(_) => ErrorSeverity::Low,
        }
    }
}

/// A convenience `Result` alias using [`AriaError`].
pub type AriaResult<T> = Result<T, AriaError>;
