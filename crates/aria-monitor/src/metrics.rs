use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of every counter, with derived averages.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsView {
    /// HTTP requests handled.
    pub requests_total: u64,
    /// Requests that completed successfully.
    pub requests_success: u64,
    /// Requests that failed.
    pub requests_error: u64,
    /// Mean request latency in milliseconds, 0 when no requests yet.
    pub avg_request_latency_ms: f64,
    /// Pipeline runs attempted.
    pub crew_executions_total: u64,
    /// Pipeline runs that completed.
    pub crew_executions_success: u64,
    /// Pipeline runs that failed.
    pub crew_executions_error: u64,
    /// Mean pipeline duration in seconds, 0 when no runs yet.
    pub avg_crew_duration_secs: f64,
    /// Connections currently open.
    pub active_connections: u64,
}

/// Lock-free application counters.
///
/// Counters only ever go up (the connection gauge aside); there is no
/// reset. Reads are unsynchronized point-in-time copies, which is fine for
/// an observability endpoint.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    request_latency_ms_total: AtomicU64,
    crew_executions_total: AtomicU64,
    crew_executions_success: AtomicU64,
    crew_executions_error: AtomicU64,
    crew_duration_ms_total: AtomicU64,
    active_connections: AtomicU64,
}

impl MetricsCollector {
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one handled request and its latency.
    pub fn record_request(&self, latency_ms: f64, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.request_latency_ms_total
            .fetch_add(latency_ms.max(0.0) as u64, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one pipeline run and its duration.
    pub fn record_crew_execution(&self, duration_secs: f64, success: bool) {
        self.crew_executions_total.fetch_add(1, Ordering::Relaxed);
        self.crew_duration_ms_total
            .fetch_add((duration_secs.max(0.0) * 1000.0) as u64, Ordering::Relaxed);
        if success {
            self.crew_executions_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.crew_executions_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A connection was opened.
    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection was closed. Saturates at zero.
    pub fn connection_closed(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            });
    }

    /// Copy out every counter.
    pub fn current_metrics(&self) -> MetricsView {
        let requests_total = self.requests_total.load(Ordering::Relaxed);
        let latency_total = self.request_latency_ms_total.load(Ordering::Relaxed);
        let crew_total = self.crew_executions_total.load(Ordering::Relaxed);
        let duration_total = self.crew_duration_ms_total.load(Ordering::Relaxed);

        MetricsView {
            requests_total,
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            avg_request_latency_ms: mean(latency_total, requests_total),
            crew_executions_total: crew_total,
            crew_executions_success: self.crew_executions_success.load(Ordering::Relaxed),
            crew_executions_error: self.crew_executions_error.load(Ordering::Relaxed),
            avg_crew_duration_secs: mean(duration_total, crew_total) / 1000.0,
            active_connections: self.active_connections.load(Ordering::Relaxed),
        }
    }

    /// Nested summary for the `/metrics` endpoint, keyed by subsystem.
    pub fn metrics_summary(&self) -> serde_json::Value {
        let view = self.current_metrics();
        serde_json::json!({
            "requests": {
                "total": view.requests_total,
                "success": view.requests_success,
                "error": view.requests_error,
                "avg_latency_ms": view.avg_request_latency_ms,
            },
            "crew_executions": {
                "total": view.crew_executions_total,
                "success": view.crew_executions_success,
                "error": view.crew_executions_error,
                "avg_duration_secs": view.avg_crew_duration_secs,
            },
            "connections": {
                "active": view.active_connections,
            },
        })
    }
}

fn mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
