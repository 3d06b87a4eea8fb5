use crate::supervisor::Supervisor;
use aria_core::ErrorTracker;
use aria_crew::CrewRuntime;
use aria_monitor::{MetricsCollector, ResourceMonitor};
use aria_resilience::{CircuitBreaker, ConnectivityProber};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware as axum_mw,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub supervisor: Arc<Supervisor>,
    pub runtime: Arc<dyn CrewRuntime>,
    pub metrics: Arc<MetricsCollector>,
    pub resources: Arc<ResourceMonitor>,
    pub tracker: Arc<ErrorTracker>,
    pub breaker: Arc<CircuitBreaker>,
    pub prober: Arc<ConnectivityProber>,
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Builds the HTTP router over the shared state.
    pub fn build(state: Arc<AppState>) -> Router {
        let metrics = Arc::clone(&state.metrics);
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/health/deep", get(deep_health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/run-crew", post(run_crew_handler))
            .with_state(state)
            .layer(axum_mw::from_fn_with_state(metrics, track_request))
    }
}

/// Records latency, outcome, and the in-flight connection gauge for every
/// request. A response status of 400 or above counts as an error.
async fn track_request(
    State(metrics): State<Arc<MetricsCollector>>,
    request: Request,
    next: Next,
) -> Response {
    metrics.connection_opened();
    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics.record_request(latency_ms, response.status().as_u16() < 400);
    metrics.connection_closed();
    response
}

async fn root_handler() -> impl IntoResponse {
    serde_json::json!({
        "service": "aria",
        "message": "ARIA research gateway. POST /run-crew with {\"topic\": \"...\"} to generate a report.",
    })
    .to_string()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = state.supervisor.is_healthy();
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, health_checks(&state, healthy).to_string())
}

/// Like `/health`, plus a live probe of every external provider. Probe
/// failures mark the status `degraded` but do not flip the status code;
/// only an unhealthy supervisor does that.
async fn deep_health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = state.prober.probe_all().await;
    let healthy = state.supervisor.is_healthy();
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut body = health_checks(&state, healthy);
    if healthy && !probe.all_reachable() {
        body["status"] = serde_json::json!("degraded");
    }
    body["api_connectivity"] = serde_json::json!(probe);
    (code, body.to_string())
}

fn health_checks(state: &AppState, healthy: bool) -> serde_json::Value {
    serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "service": "aria",
        "checks": {
            "initialized": healthy,
            "circuit_breaker": state.breaker.state().to_string(),
            "resource_monitoring": state.resources.is_monitoring(),
            "errors_last_hour": state.tracker.error_summary(1).total_errors,
        }
    })
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    serde_json::json!({
        "metrics": state.metrics.metrics_summary(),
        "resources": state.resources.latest(),
        "errors": state.tracker.counts(),
    })
    .to_string()
}

#[derive(Debug, Deserialize)]
struct RunCrewRequest {
    topic: String,
}

async fn run_crew_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunCrewRequest>,
) -> impl IntoResponse {
    let (code, body) = state
        .supervisor
        .safe_crew_kickoff(state.runtime.as_ref(), &req.topic)
        .await;
    (code, body.to_string())
}
