use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::record::{ErrorRecord, ErrorSeverity};

/// Windowed view over tracked errors, derived by re-scanning the record
/// sequence rather than reading the running counters.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    /// Number of records inside the window.
    pub total_errors: usize,
    /// Per-category counts inside the window, plus a `total` key.
    pub error_counts: HashMap<String, u64>,
    /// Per-severity counts inside the window.
    pub severity_counts: HashMap<String, u64>,
}

struct TrackerInner {
    records: Vec<ErrorRecord>,
    counts: HashMap<String, u64>,
}

/// Accumulates [`ErrorRecord`]s and answers windowed summary queries.
///
/// The tracker grows monotonically within a run: records are never removed
/// and the running counters are never decremented. Share it across request
/// handlers behind an `Arc`; it is not a global.
pub struct ErrorTracker {
    inner: Mutex<TrackerInner>,
}

impl ErrorTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                records: Vec::new(),
                counts: HashMap::new(),
            }),
        }
    }

    /// Appends a record and increments the `total` and per-category counters.
    pub fn track(&self, record: ErrorRecord) {
        match record.severity {
            ErrorSeverity::Critical | ErrorSeverity::High => error!(
                error_id = %record.id,
                category = %record.category,
                severity = %record.severity,
                "{}",
                record.message
            ),
            ErrorSeverity::Medium => warn!(
                error_id = %record.id,
                category = %record.category,
                "{}",
                record.message
            ),
            ErrorSeverity::Low => info!(
                error_id = %record.id,
                category = %record.category,
                "{}",
                record.message
            ),
        }

        let mut inner = self.inner.lock();
        *inner.counts.entry("total".to_string()).or_insert(0) += 1;
        *inner
            .counts
            .entry(record.category.as_str().to_string())
            .or_insert(0) += 1;
        inner.records.push(record);
    }

    /// Total number of records tracked since construction.
    pub fn total(&self) -> u64 {
        let inner = self.inner.lock();
        inner.counts.get("total").copied().unwrap_or(0)
    }

    /// Snapshot of the running counters (`total` plus one key per category).
    pub fn counts(&self) -> HashMap<String, u64> {
        self.inner.lock().counts.clone()
    }

    /// The most recent `n` records, newest last.
    pub fn recent(&self, n: usize) -> Vec<ErrorRecord> {
        let inner = self.inner.lock();
        let skip = inner.records.len().saturating_sub(n);
        inner.records[skip..].to_vec()
    }

    /// Summarizes the records whose timestamp falls within the trailing
    /// `hours` window.
    ///
    /// The summary is computed over the filtered subset only; the running
    /// counters are not consulted, so the view stays correct even if they
    /// were to diverge from the record sequence.
    pub fn error_summary(&self, hours: i64) -> ErrorSummary {
        let cutoff = chrono::Utc::now() - chrono::Duration::hours(hours);
        let inner = self.inner.lock();

        let mut error_counts: HashMap<String, u64> = HashMap::new();
        let mut severity_counts: HashMap<String, u64> = HashMap::new();
        let mut total_errors = 0usize;

        for record in inner.records.iter().filter(|r| r.timestamp >= cutoff) {
            total_errors += 1;
            *error_counts
                .entry(record.category.as_str().to_string())
                .or_insert(0) += 1;
            *severity_counts
                .entry(record.severity.as_str().to_string())
                .or_insert(0) += 1;
        }

        error_counts.insert("total".to_string(), total_errors as u64);

        ErrorSummary {
            total_errors,
            error_counts,
            severity_counts,
        }
    }

    /// True when a record of the given severity was tracked within the
    /// trailing `hours` window.
    pub fn has_recent(&self, severity: ErrorSeverity, hours: i64) -> bool {
        let cutoff = chrono::Utc::now() - chrono::Duration::hours(hours);
        let inner = self.inner.lock();
        inner
            .records
            .iter()
            .any(|r| r.severity == severity && r.timestamp >= cutoff)
    }
}

impl Default for ErrorTracker {
    fn default() -> Self {
        Self::new()
    }
}
