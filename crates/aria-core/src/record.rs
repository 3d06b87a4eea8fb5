use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::AriaError;

/// Category of an error occurrence, used for counting and alert routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Fatal to pipeline execution until resolved.
    Startup,
    /// Fatal to the affected check only.
    Configuration,
    /// Recoverable via retry / circuit breaker.
    Api,
    /// Advisory.
    Resource,
    /// A failure inside the report pipeline.
    Pipeline,
    /// A failed validation check.
    Validation,
}

impl ErrorCategory {
    /// Lowercase name used as the key in count maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Startup => "startup",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Api => "api",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Pipeline => "pipeline",
            ErrorCategory::Validation => "validation",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an error occurrence, orthogonal to its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational; no operator action expected.
    Low,
    /// Logged and tracked, does not halt anything.
    Medium,
    /// Logged and tracked, warrants attention.
    High,
    /// Halts startup when raised during the startup sequence.
    Critical,
}

impl ErrorSeverity {
    /// Lowercase name used as the key in count maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of a single error occurrence.
///
/// Records are stamped with the current time and a fresh id at construction
/// and never mutated afterwards; they are owned by the [`ErrorTracker`] that
/// recorded them.
///
/// [`ErrorTracker`]: crate::ErrorTracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Unique identifier for this occurrence.
    pub id: Uuid,
    /// Human-readable description.
    pub message: String,
    /// Classification category.
    pub category: ErrorCategory,
    /// Classification severity.
    pub severity: ErrorSeverity,
    /// Arbitrary key-value context captured at the failure site.
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
    /// UTC timestamp of when the record was created.
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    /// Creates a new record stamped with the current time and a fresh id.
    pub fn new(
        message: impl Into<String>,
        category: ErrorCategory,
        severity: ErrorSeverity,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            category,
            severity,
            context: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attaches a context entry, returning the record for chaining.
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// A STARTUP/CRITICAL record — fatal to pipeline execution until resolved.
    pub fn startup(message: impl Into<String>) -> Self {
        Self::new(message, ErrorCategory::Startup, ErrorSeverity::Critical)
    }

    /// A CONFIGURATION/HIGH record — fatal to the affected check only.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(message, ErrorCategory::Configuration, ErrorSeverity::High)
    }

    /// An API/MEDIUM record — recoverable via retry or circuit breaker.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(message, ErrorCategory::Api, ErrorSeverity::Medium)
    }

    /// Lowers an [`AriaError`] into a record using its default classification.
    pub fn from_error(err: &AriaError) -> Self {
        Self::new(err.to_string(), err.category(), err.severity())
    }
}
