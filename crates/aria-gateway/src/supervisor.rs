//! Guarded startup and guarded pipeline entry.
//!
//! The [`Supervisor`] owns the system's health flag. It flips to healthy
//! only after a full validation pass and a successful configuration load,
//! and every pipeline run goes through [`Supervisor::safe_crew_kickoff`],
//! which refuses to start work while the flag is down.

use aria_core::{AriaError, AriaResult, ErrorRecord, ErrorTracker};
use aria_crew::{CrewConfig, CrewRunReport, CrewRuntime};
use aria_monitor::MetricsCollector;
use aria_validation::ComprehensiveValidator;
use axum::http::StatusCode;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Retries startup validation and gates pipeline runs on its outcome.
pub struct Supervisor {
    max_retries: u32,
    retry_delay: Duration,
    validator: ComprehensiveValidator,
    config_dir: PathBuf,
    tracker: Arc<ErrorTracker>,
    metrics: Arc<MetricsCollector>,
    healthy: AtomicBool,
}

impl Supervisor {
    /// Creates an unhealthy supervisor. Call [`Supervisor::initialize`] to
    /// bring it up.
    pub fn new(
        max_retries: u32,
        retry_delay: Duration,
        validator: ComprehensiveValidator,
        config_dir: impl Into<PathBuf>,
        tracker: Arc<ErrorTracker>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            max_retries,
            retry_delay,
            validator,
            config_dir: config_dir.into(),
            tracker,
            metrics,
            healthy: AtomicBool::new(false),
        }
    }

    /// True once a validation + configuration-load pass has succeeded.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Runs the startup sequence, retrying up to `max_retries` attempts
    /// with `retry_delay` between them.
    ///
    /// Each failed attempt is tracked as a startup record. On success the
    /// health flag flips and the loaded crew configuration is returned.
    pub async fn initialize(&self) -> AriaResult<CrewConfig> {
        for attempt in 1..=self.max_retries.max(1) {
            info!(attempt, "Initializing system");
            match self.try_initialize() {
                Ok(config) => {
                    self.healthy.store(true, Ordering::Release);
                    info!(attempt, "System initialized");
                    return Ok(config);
                }
                Err(e) => {
                    self.tracker.track(
                        ErrorRecord::startup(e.to_string())
                            .with_context("attempt", serde_json::json!(attempt)),
                    );
                    if attempt < self.max_retries {
                        warn!(attempt, error = %e, "Initialization attempt failed, retrying");
                        tokio::time::sleep(self.retry_delay).await;
                    } else {
                        error!(attempt, error = %e, "Initialization failed, giving up");
                    }
                }
            }
        }
        Err(AriaError::Startup(format!(
            "initialization failed after {} attempt(s)",
            self.max_retries.max(1)
        )))
    }

    fn try_initialize(&self) -> AriaResult<CrewConfig> {
        let report = self.validator.validate();
        if !report.is_usable() {
            return Err(AriaError::Startup(format!(
                "validation failed: {} of {} check(s) failed",
                report.summary.failed, report.summary.total
            )));
        }
        CrewConfig::load(&self.config_dir)
    }

    /// Runs the pipeline for `topic` unless the system is unhealthy.
    ///
    /// While unhealthy this rejects immediately with 503 semantics and
    /// never touches the runtime. When healthy, the run is timed and
    /// recorded as a crew execution; a failed run surfaces as 500.
    pub async fn safe_crew_kickoff(
        &self,
        runtime: &dyn CrewRuntime,
        topic: &str,
    ) -> (StatusCode, serde_json::Value) {
        if !self.is_healthy() {
            warn!(topic, "Pipeline run rejected, system not healthy");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({"error": "System not healthy"}),
            );
        }

        let start = Instant::now();
        match runtime.kickoff(topic).await {
            Ok(run) => {
                self.metrics
                    .record_crew_execution(start.elapsed().as_secs_f64(), true);
                (StatusCode::OK, success_body(topic, &run))
            }
            Err(e) => {
                self.metrics
                    .record_crew_execution(start.elapsed().as_secs_f64(), false);
                error!(topic, error = %e, "Pipeline run failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"error": e.to_string()}),
                )
            }
        }
    }
}

fn success_body(topic: &str, run: &CrewRunReport) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "message": format!("Research report on '{topic}' generated"),
        "run": run,
    })
}
