use crate::timeout::{TimeoutError, TimeoutHandler};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// An endpoint the prober exercises.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    /// Short provider name, used as the key in reports.
    pub name: String,
    /// URL fetched with a plain GET.
    pub url: String,
}

impl ProbeTarget {
    /// Creates a target.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Outcome of probing a single endpoint.
///
/// An endpoint counts as reachable when any HTTP response arrives; an auth
/// challenge from a provider we hold no key for still proves connectivity.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// Provider name from the target.
    pub endpoint: String,
    /// Whether any HTTP response arrived.
    pub reachable: bool,
    /// HTTP status of the response, when one arrived.
    pub status: Option<u16>,
    /// Round-trip latency of the probe.
    pub latency_ms: u64,
    /// Transport-level failure description, when unreachable.
    pub error: Option<String>,
}

/// Aggregate totals over a probe run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeSummary {
    /// Number of endpoints probed.
    pub total: usize,
    /// Endpoints that answered.
    pub reachable: usize,
    /// Endpoints that did not.
    pub unreachable: usize,
}

/// Full report from [`ConnectivityProber::probe_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Aggregate totals.
    pub summary: ProbeSummary,
    /// Per-endpoint outcomes, in probe order.
    pub results: Vec<ProbeResult>,
}

impl ProbeReport {
    /// True when every probed endpoint answered.
    pub fn all_reachable(&self) -> bool {
        self.summary.unreachable == 0
    }
}

/// Probes the external inference/search providers the pipeline depends on.
///
/// Each probe is a GET bounded by the handler's timeout with its retry
/// count; connection failures are reported, never propagated.
pub struct ConnectivityProber {
    client: reqwest::Client,
    endpoints: Vec<ProbeTarget>,
    handler: TimeoutHandler,
}

impl ConnectivityProber {
    /// Creates a prober over the default provider battery.
    pub fn new(timeout: Duration, retry_attempts: u32) -> Self {
        Self::with_endpoints(timeout, retry_attempts, default_endpoints())
    }

    /// Creates a prober over a custom endpoint battery.
    pub fn with_endpoints(
        timeout: Duration,
        retry_attempts: u32,
        endpoints: Vec<ProbeTarget>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
            handler: TimeoutHandler::new(timeout, retry_attempts),
        }
    }

    /// The configured endpoint battery.
    pub fn endpoints(&self) -> &[ProbeTarget] {
        &self.endpoints
    }

    /// Probes every configured endpoint and aggregates the outcomes.
    pub async fn probe_all(&self) -> ProbeReport {
        let mut results = Vec::with_capacity(self.endpoints.len());
        for target in &self.endpoints {
            results.push(self.probe(target).await);
        }

        let reachable = results.iter().filter(|r| r.reachable).count();
        let report = ProbeReport {
            summary: ProbeSummary {
                total: results.len(),
                reachable,
                unreachable: results.len() - reachable,
            },
            results,
        };

        info!(
            total = report.summary.total,
            reachable = report.summary.reachable,
            "API connectivity probe complete"
        );
        report
    }

    async fn probe(&self, target: &ProbeTarget) -> ProbeResult {
        let start = Instant::now();
        let outcome = self
            .handler
            .run(|| {
                let request = self.client.get(&target.url);
                async move { request.send().await.map_err(|e| e.to_string()) }
            })
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(endpoint = %target.name, status, latency_ms, "Endpoint reachable");
                ProbeResult {
                    endpoint: target.name.clone(),
                    reachable: true,
                    status: Some(status),
                    latency_ms,
                    error: None,
                }
            }
            Err(e) => {
                let error = match e {
                    TimeoutError::TimedOut { timeout } => {
                        format!("timed out after {}ms", timeout.as_millis())
                    }
                    TimeoutError::Exhausted { source, .. } => source,
                };
                debug!(endpoint = %target.name, error = %error, "Endpoint unreachable");
                ProbeResult {
                    endpoint: target.name.clone(),
                    reachable: false,
                    status: None,
                    latency_ms,
                    error: Some(error),
                }
            }
        }
    }
}

/// The provider battery the pipeline talks to.
pub fn default_endpoints() -> Vec<ProbeTarget> {
    vec![
        ProbeTarget::new("openai", "https://api.openai.com/v1/models"),
        ProbeTarget::new("huggingface", "https://api-inference.huggingface.co"),
        ProbeTarget::new("rapidapi", "https://bing-news-search1.p.rapidapi.com"),
    ]
}
