use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A point-in-time reading of host CPU and memory utilization.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot {
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Global CPU utilization, 0.0 to 100.0.
    pub cpu_percent: f32,
    /// Memory utilization, 0.0 to 100.0.
    pub memory_percent: f32,
    /// Memory in use, in megabytes.
    pub memory_used_mb: u64,
    /// Total installed memory, in megabytes.
    pub memory_total_mb: u64,
}

/// Samples host resources on a background task and keeps a bounded history.
///
/// `start` spawns the sampling loop; `stop` aborts it. Snapshots older than
/// `history_hours` are dropped each time a new one is recorded, so the
/// history never grows past one window.
pub struct ResourceMonitor {
    collection_interval: Duration,
    history_hours: i64,
    system: Mutex<System>,
    history: Mutex<Vec<ResourceSnapshot>>,
    monitoring: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceMonitor {
    /// Creates a monitor sampling every `collection_interval`, retaining
    /// `history_hours` of snapshots.
    pub fn new(collection_interval: Duration, history_hours: i64) -> Self {
        Self {
            collection_interval,
            history_hours,
            system: Mutex::new(System::new_all()),
            history: Mutex::new(Vec::new()),
            monitoring: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// The configured sampling period.
    pub fn collection_interval(&self) -> Duration {
        self.collection_interval
    }

    /// The configured retention window, in hours.
    pub fn history_hours(&self) -> i64 {
        self.history_hours
    }

    /// Whether the background sampling task is running.
    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    /// Start the background sampling loop. A second call while running is a
    /// no-op.
    pub fn start(self: &Arc<Self>) {
        if self.monitoring.swap(true, Ordering::SeqCst) {
            return;
        }
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(monitor.collection_interval);
            loop {
                timer.tick().await;
                let snapshot = monitor.collect_snapshot();
                debug!(
                    cpu = %snapshot.cpu_percent,
                    memory = %snapshot.memory_percent,
                    "Resource snapshot collected"
                );
                monitor.record(snapshot);
            }
        });
        *self.task.lock() = Some(handle);
        info!(
            interval_ms = self.collection_interval.as_millis() as u64,
            "Resource monitoring started"
        );
    }

    /// Abort the sampling task. History is kept.
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        if self.monitoring.swap(false, Ordering::SeqCst) {
            info!("Resource monitoring stopped");
        }
    }

    /// Take one sample without touching the history. Also used by handlers
    /// that want a fresh reading while the loop is stopped.
    pub fn collect_snapshot(&self) -> ResourceSnapshot {
        let mut sys = self.system.lock();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let total = sys.total_memory();
        let used = sys.used_memory();
        let memory_percent = if total == 0 {
            0.0
        } else {
            (used as f32 / total as f32) * 100.0
        };

        ResourceSnapshot {
            timestamp: Utc::now(),
            cpu_percent: sys.global_cpu_usage(),
            memory_percent,
            memory_used_mb: used / (1024 * 1024),
            memory_total_mb: total / (1024 * 1024),
        }
    }

    /// The most recent retained snapshot.
    pub fn latest(&self) -> Option<ResourceSnapshot> {
        self.history.lock().last().cloned()
    }

    /// All retained snapshots, oldest first.
    pub fn history(&self) -> Vec<ResourceSnapshot> {
        self.history.lock().clone()
    }

    fn record(&self, snapshot: ResourceSnapshot) {
        let cutoff = Utc::now() - ChronoDuration::hours(self.history_hours);
        let mut history = self.history.lock();
        history.push(snapshot);
        history.retain(|s| s.timestamp >= cutoff);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn snapshot_at(timestamp: DateTime<Utc>) -> ResourceSnapshot {
        ResourceSnapshot {
            timestamp,
            cpu_percent: 10.0,
            memory_percent: 50.0,
            memory_used_mb: 512,
            memory_total_mb: 1024,
        }
    }

    #[test]
    fn initial_state_is_stopped() {
        let monitor = ResourceMonitor::new(Duration::from_secs(1), 1);
        assert_eq!(monitor.collection_interval(), Duration::from_secs(1));
        assert_eq!(monitor.history_hours(), 1);
        assert!(!monitor.is_monitoring());
        assert!(monitor.latest().is_none());
    }

    #[test]
    fn snapshot_reads_plausible_values() {
        let monitor = ResourceMonitor::new(Duration::from_secs(1), 1);
        let snapshot = monitor.collect_snapshot();
        assert!(snapshot.cpu_percent >= 0.0);
        assert!(snapshot.memory_percent >= 0.0);
        assert!(snapshot.memory_total_mb > 0);
        assert!(snapshot.memory_used_mb <= snapshot.memory_total_mb);
    }

    #[test]
    fn record_prunes_entries_outside_window() {
        let monitor = ResourceMonitor::new(Duration::from_secs(1), 1);

        monitor.record(snapshot_at(Utc::now() - ChronoDuration::hours(2)));
        assert!(monitor.history().is_empty());

        monitor.record(snapshot_at(Utc::now()));
        assert_eq!(monitor.history().len(), 1);
        assert!(monitor.latest().is_some());
    }

    #[test]
    fn record_keeps_entries_inside_window() {
        let monitor = ResourceMonitor::new(Duration::from_secs(1), 24);
        monitor.record(snapshot_at(Utc::now() - ChronoDuration::hours(2)));
        monitor.record(snapshot_at(Utc::now()));
        assert_eq!(monitor.history().len(), 2);
    }

    #[tokio::test]
    async fn start_and_stop_toggle_monitoring() {
        let monitor = Arc::new(ResourceMonitor::new(Duration::from_millis(10), 1));
        monitor.start();
        assert!(monitor.is_monitoring());

        // Second start while running is a no-op.
        monitor.start();
        assert!(monitor.is_monitoring());

        monitor.stop();
        assert!(!monitor.is_monitoring());
    }

    #[tokio::test]
    async fn sampling_loop_fills_history() {
        let monitor = Arc::new(ResourceMonitor::new(Duration::from_millis(10), 1));
        monitor.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        monitor.stop();
        assert!(!monitor.history().is_empty());
    }
}
