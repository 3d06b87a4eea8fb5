//! Sequential execution of the five-role pipeline.
//!
//! [`Crew::kickoff`] runs the roles in [`PIPELINE`](crate::config::PIPELINE)
//! order, handing each step's output to the next as its input. Every tool
//! call runs inside the shared timeout/retry handler, which in turn runs
//! inside the crew's circuit breaker, so a flapping provider fails fast
//! instead of stalling the whole run. Failed steps are recorded in the
//! error tracker before the error propagates.

use crate::config::{interpolate, AgentRole, CrewConfig, PIPELINE};
use crate::tools::{self, Tool};
use aria_core::{AriaError, AriaResult, ErrorRecord, ErrorTracker};
use aria_resilience::{CircuitBreaker, CircuitBreakerError, TimeoutError, TimeoutHandler};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TOOL_RETRIES: u32 = 2;
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of a single pipeline step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// The role that ran.
    pub role: AgentRole,
    /// The task name the role is bound to.
    pub task: String,
    /// Wall-clock duration of the guarded tool call.
    pub duration_ms: u64,
    /// Size of the step's output in characters.
    pub output_chars: usize,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct CrewRunReport {
    /// The interpolated research topic.
    pub topic: String,
    /// Per-step outcomes in execution order.
    pub steps: Vec<StepReport>,
    /// Where the writer's draft was saved.
    pub report_path: Option<PathBuf>,
    /// Where the reviewed report was saved.
    pub reviewed_path: Option<PathBuf>,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
    /// The reviewer's final output.
    pub final_output: String,
}

/// Seam between the gateway and the pipeline, so handlers and tests can
/// swap in a fake runtime.
#[async_trait]
pub trait CrewRuntime: Send + Sync {
    /// Runs the full pipeline for `topic`.
    async fn kickoff(&self, topic: &str) -> AriaResult<CrewRunReport>;
}

/// The production pipeline: five roles, five tools, shared fault isolation.
pub struct Crew {
    config: CrewConfig,
    tools: [Box<dyn Tool>; 5],
    breaker: Arc<CircuitBreaker>,
    handler: TimeoutHandler,
    tracker: Arc<ErrorTracker>,
    output_dir: PathBuf,
}

impl Crew {
    /// Builds a crew over the default toolset.
    pub fn new(
        config: CrewConfig,
        output_dir: impl Into<PathBuf>,
        tracker: Arc<ErrorTracker>,
    ) -> Self {
        Self::with_tools(config, output_dir, tracker, tools::default_toolset())
    }

    /// Builds a crew over an explicit toolset, one tool per pipeline role.
    pub fn with_tools(
        config: CrewConfig,
        output_dir: impl Into<PathBuf>,
        tracker: Arc<ErrorTracker>,
        tools: [Box<dyn Tool>; 5],
    ) -> Self {
        Self {
            config,
            tools,
            breaker: Arc::new(CircuitBreaker::new(
                "crew_tools",
                DEFAULT_FAILURE_THRESHOLD,
                DEFAULT_RECOVERY_TIMEOUT,
            )),
            handler: TimeoutHandler::new(DEFAULT_TOOL_TIMEOUT, DEFAULT_TOOL_RETRIES),
            tracker,
            output_dir: output_dir.into(),
        }
    }

    /// Replaces the circuit breaker, e.g. to share one with the gateway's
    /// health reporting.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    /// Replaces the timeout/retry handler.
    pub fn with_handler(mut self, handler: TimeoutHandler) -> Self {
        self.handler = handler;
        self
    }

    /// The breaker guarding this crew's tool calls.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    async fn run_guarded(&self, tool: &dyn Tool, input: &str) -> AriaResult<String> {
        let result = self
            .breaker
            .call(|| self.handler.run(move || tool.run(input)))
            .await;

        match result {
            Ok(output) => Ok(output),
            Err(CircuitBreakerError::CircuitOpen { name }) => Err(AriaError::Api(format!(
                "circuit '{name}' is open; call to '{}' rejected",
                tool.name()
            ))),
            Err(CircuitBreakerError::Operation(TimeoutError::TimedOut { timeout })) => {
                Err(AriaError::Api(format!(
                    "'{}' timed out after {}ms",
                    tool.name(),
                    timeout.as_millis()
                )))
            }
            Err(CircuitBreakerError::Operation(TimeoutError::Exhausted { attempts, source })) => {
                Err(AriaError::Api(format!(
                    "'{}' failed after {attempts} attempt(s): {source}",
                    tool.name()
                )))
            }
        }
    }

    async fn save_artifact(&self, file: &str, contents: &str) -> AriaResult<PathBuf> {
        let path = self.output_dir.join(file);
        tokio::fs::write(&path, contents).await?;
        info!(path = %path.display(), "Saved pipeline artifact");
        Ok(path)
    }
}

#[async_trait]
impl CrewRuntime for Crew {
    async fn kickoff(&self, topic: &str) -> AriaResult<CrewRunReport> {
        let run_start = Instant::now();
        tokio::fs::create_dir_all(&self.output_dir).await?;
        info!(topic, "Crew kickoff");

        let mut payload = topic.to_string();
        let mut steps = Vec::with_capacity(PIPELINE.len());
        let mut report_path = None;
        let mut reviewed_path = None;

        for (role, tool) in PIPELINE.iter().zip(self.tools.iter()) {
            let task = self.config.task(*role);
            let brief = interpolate(&task.description, topic);
            info!(role = %role, tool = tool.name(), "Starting pipeline step");
            debug!(role = %role, brief = %brief, "Task brief");

            let step_start = Instant::now();
            let output = match self.run_guarded(tool.as_ref(), &payload).await {
                Ok(output) => output,
                Err(e) => {
                    self.tracker.track(
                        ErrorRecord::from_error(&e)
                            .with_context("role", serde_json::json!(role.key()))
                            .with_context("topic", serde_json::json!(topic)),
                    );
                    return Err(e);
                }
            };
            let duration_ms = step_start.elapsed().as_millis() as u64;
            info!(role = %role, duration_ms, "Pipeline step finished");

            match role {
                AgentRole::Writer => {
                    report_path = Some(self.save_artifact("report.md", &output).await?);
                }
                AgentRole::Reviewer => {
                    reviewed_path = Some(self.save_artifact("report_reviewed.md", &output).await?);
                }
                _ => {}
            }

            steps.push(StepReport {
                role: *role,
                task: role.task_name().to_string(),
                duration_ms,
                output_chars: output.chars().count(),
            });
            payload = output;
        }

        let duration_ms = run_start.elapsed().as_millis() as u64;
        info!(topic, duration_ms, "Crew run complete");

        Ok(CrewRunReport {
            topic: topic.to_string(),
            steps,
            report_path,
            reviewed_path,
            duration_ms,
            final_output: payload,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::tests::write_config;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, input: &str) -> AriaResult<String> {
            Ok(format!("{}:{input}", self.name))
        }
    }

    struct FailingTool {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, _input: &str) -> AriaResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AriaError::Api("upstream down".to_string()))
        }
    }

    fn echo_toolset() -> [Box<dyn Tool>; 5] {
        [
            Box::new(EchoTool { name: "research" }),
            Box::new(EchoTool { name: "check" }),
            Box::new(EchoTool { name: "summarize" }),
            Box::new(EchoTool { name: "write" }),
            Box::new(EchoTool { name: "review" }),
        ]
    }

    fn test_crew(output_dir: &std::path::Path, tools: [Box<dyn Tool>; 5]) -> Crew {
        let config_dir = tempfile::tempdir().unwrap();
        write_config(config_dir.path());
        let config = CrewConfig::load(config_dir.path()).unwrap();
        Crew::with_tools(config, output_dir, Arc::new(ErrorTracker::new()), tools)
    }

    #[tokio::test]
    async fn kickoff_chains_outputs_through_all_five_steps() {
        let out = tempfile::tempdir().unwrap();
        let crew = test_crew(out.path(), echo_toolset());

        let report = crew.kickoff("rust async").await.unwrap();
        assert_eq!(report.steps.len(), 5);
        assert_eq!(
            report.final_output,
            "review:write:summarize:check:research:rust async"
        );
        assert_eq!(report.steps[0].role, AgentRole::Researcher);
        assert_eq!(report.steps[4].task, "review_report_task");
    }

    #[tokio::test]
    async fn kickoff_writes_report_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let crew = test_crew(out.path(), echo_toolset());

        let report = crew.kickoff("topic").await.unwrap();
        let draft = std::fs::read_to_string(report.report_path.unwrap()).unwrap();
        let reviewed = std::fs::read_to_string(report.reviewed_path.unwrap()).unwrap();
        assert_eq!(draft, "write:summarize:check:research:topic");
        assert_eq!(reviewed, format!("review:{draft}"));
    }

    #[tokio::test]
    async fn failed_step_is_tracked_and_aborts_the_run() {
        let out = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let tools: [Box<dyn Tool>; 5] = [
            Box::new(FailingTool {
                calls: Arc::clone(&calls),
            }),
            Box::new(EchoTool { name: "check" }),
            Box::new(EchoTool { name: "summarize" }),
            Box::new(EchoTool { name: "write" }),
            Box::new(EchoTool { name: "review" }),
        ];

        let config_dir = tempfile::tempdir().unwrap();
        write_config(config_dir.path());
        let config = CrewConfig::load(config_dir.path()).unwrap();
        let tracker = Arc::new(ErrorTracker::new());
        let crew = Crew::with_tools(config, out.path(), Arc::clone(&tracker), tools)
            .with_handler(TimeoutHandler::new(Duration::from_secs(5), 0));

        let err = crew.kickoff("topic").await.unwrap_err();
        assert!(matches!(err, AriaError::Api(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.total(), 1);
        let record = tracker.recent(1).pop().unwrap();
        assert_eq!(record.context["role"], serde_json::json!("researcher"));
    }

    #[tokio::test]
    async fn retries_are_spent_before_a_step_fails() {
        let out = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let tools: [Box<dyn Tool>; 5] = [
            Box::new(FailingTool {
                calls: Arc::clone(&calls),
            }),
            Box::new(EchoTool { name: "check" }),
            Box::new(EchoTool { name: "summarize" }),
            Box::new(EchoTool { name: "write" }),
            Box::new(EchoTool { name: "review" }),
        ];
        let crew = test_crew(out.path(), tools)
            .with_handler(TimeoutHandler::new(Duration::from_secs(5), 2));

        let err = crew.kickoff("topic").await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("after 3 attempt(s)"));
    }

    #[tokio::test]
    async fn open_breaker_rejects_the_run_without_calling_tools() {
        let out = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let tools: [Box<dyn Tool>; 5] = [
            Box::new(FailingTool {
                calls: Arc::clone(&calls),
            }),
            Box::new(EchoTool { name: "check" }),
            Box::new(EchoTool { name: "summarize" }),
            Box::new(EchoTool { name: "write" }),
            Box::new(EchoTool { name: "review" }),
        ];
        let breaker = Arc::new(CircuitBreaker::new(
            "crew_tools",
            1,
            Duration::from_secs(600),
        ));
        let crew = test_crew(out.path(), tools)
            .with_breaker(Arc::clone(&breaker))
            .with_handler(TimeoutHandler::new(Duration::from_secs(5), 0));

        crew.kickoff("topic").await.unwrap_err();
        assert_eq!(breaker.state(), aria_resilience::CircuitState::Open);

        let err = crew.kickoff("topic").await.unwrap_err();
        assert!(err.to_string().contains("is open"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
