use aria_core::{AriaResult, ErrorTracker};
use aria_crew::{Crew, CrewRunReport, CrewRuntime};
use aria_gateway::{AppState, GatewayServer, Supervisor};
use aria_monitor::{MetricsCollector, ResourceMonitor};
use aria_resilience::{CircuitBreaker, ConnectivityProber, TimeoutHandler};
use aria_validation::ComprehensiveValidator;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_RETRIES: u32 = 1;

#[derive(Parser)]
#[command(name = "aria", about = "ARIA — automated research report pipeline")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "aria.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run environment and configuration validation
    Validate,
    /// Probe external API connectivity
    Probe,
    /// Run the research pipeline once
    Run {
        /// Research topic to report on
        #[arg(default_value = "AI LLMs")]
        topic: String,
    },
}

#[derive(Deserialize)]
struct AriaConfig {
    #[serde(default = "default_config_dir")]
    config_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    startup: StartupConfig,
    #[serde(default)]
    resilience: ResilienceConfig,
    #[serde(default)]
    monitoring: MonitoringConfig,
}

impl Default for AriaConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            output_dir: default_output_dir(),
            server: ServerConfig::default(),
            startup: StartupConfig::default(),
            resilience: ResilienceConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize)]
struct StartupConfig {
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    retry_delay_secs: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

#[derive(Deserialize)]
struct ResilienceConfig {
    #[serde(default = "default_api_timeout_secs")]
    api_timeout_secs: u64,
    #[serde(default = "default_api_retries")]
    api_retries: u32,
    #[serde(default = "default_failure_threshold")]
    failure_threshold: u32,
    #[serde(default = "default_recovery_timeout_secs")]
    recovery_timeout_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            api_timeout_secs: default_api_timeout_secs(),
            api_retries: default_api_retries(),
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
        }
    }
}

#[derive(Deserialize)]
struct MonitoringConfig {
    #[serde(default = "default_collection_interval_secs")]
    collection_interval_secs: u64,
    #[serde(default = "default_history_hours")]
    history_hours: i64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            collection_interval_secs: default_collection_interval_secs(),
            history_hours: default_history_hours(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_api_timeout_secs() -> u64 {
    60
}
fn default_api_retries() -> u32 {
    2
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_recovery_timeout_secs() -> u64 {
    60
}
fn default_collection_interval_secs() -> u64 {
    30
}
fn default_history_hours() -> i64 {
    24
}

/// Stand-in runtime for degraded serving. The supervisor rejects every run
/// while unhealthy, so this only answers if initialization somehow never
/// completed yet health reports otherwise.
struct OfflineRuntime;

#[async_trait::async_trait]
impl CrewRuntime for OfflineRuntime {
    async fn kickoff(&self, _topic: &str) -> AriaResult<CrewRunReport> {
        Err(aria_core::AriaError::Pipeline(
            "system is not initialized".to_string(),
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    if matches!(cli.command, Commands::Serve { .. }) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Validate => validate(&config),
        Commands::Probe => probe().await,
        Commands::Run { topic } => run_once(config, &topic).await,
    }
}

async fn load_config(path: &Path) -> anyhow::Result<AriaConfig> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", path.display(), e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No config file found, using defaults");
            Ok(AriaConfig::default())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        )),
    }
}

async fn serve(config: AriaConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);

    let tracker = Arc::new(ErrorTracker::new());
    let metrics = Arc::new(MetricsCollector::default());
    let validator = ComprehensiveValidator::new(&config.config_dir, &config.output_dir);
    let supervisor = Arc::new(Supervisor::new(
        config.startup.max_retries,
        Duration::from_secs(config.startup.retry_delay_secs),
        validator,
        &config.config_dir,
        Arc::clone(&tracker),
        Arc::clone(&metrics),
    ));

    let breaker = Arc::new(CircuitBreaker::new(
        "crew_tools",
        config.resilience.failure_threshold,
        Duration::from_secs(config.resilience.recovery_timeout_secs),
    ));
    let handler = TimeoutHandler::new(
        Duration::from_secs(config.resilience.api_timeout_secs),
        config.resilience.api_retries,
    );

    let runtime: Arc<dyn CrewRuntime> = match supervisor.initialize().await {
        Ok(crew_config) => Arc::new(
            Crew::new(crew_config, &config.output_dir, Arc::clone(&tracker))
                .with_breaker(Arc::clone(&breaker))
                .with_handler(handler),
        ),
        Err(e) => {
            error!(error = %e, "Initialization failed, serving in degraded mode");
            Arc::new(OfflineRuntime)
        }
    };

    let resources = Arc::new(ResourceMonitor::new(
        Duration::from_secs(config.monitoring.collection_interval_secs),
        config.monitoring.history_hours,
    ));
    resources.start();

    let state = Arc::new(AppState {
        supervisor,
        runtime,
        metrics,
        resources,
        tracker,
        breaker,
        prober: Arc::new(ConnectivityProber::new(PROBE_TIMEOUT, PROBE_RETRIES)),
    });
    let app = GatewayServer::build(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ARIA gateway listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn validate(config: &AriaConfig) -> anyhow::Result<()> {
    let validator = ComprehensiveValidator::new(&config.config_dir, &config.output_dir);
    let report = validator.validate();

    println!("Validation report ({} checks):", report.summary.total);
    for result in &report.results {
        println!(
            "  [{}] {} — {}",
            result.status.as_str(),
            result.check_name,
            result.detail
        );
    }
    println!(
        "\nOverall: {} ({} passed, {} warnings, {} failed)",
        report.overall_status.as_str(),
        report.summary.passed,
        report.summary.warnings,
        report.summary.failed
    );

    if !report.is_usable() {
        anyhow::bail!("validation failed");
    }
    Ok(())
}

async fn probe() -> anyhow::Result<()> {
    let prober = ConnectivityProber::new(PROBE_TIMEOUT, PROBE_RETRIES);
    let report = prober.probe_all().await;

    for result in &report.results {
        if result.reachable {
            println!(
                "  [ok] {} ({} ms, status {})",
                result.endpoint,
                result.latency_ms,
                result.status.map_or_else(|| "-".to_string(), |s| s.to_string())
            );
        } else {
            println!(
                "  [unreachable] {} — {}",
                result.endpoint,
                result.error.as_deref().unwrap_or("no detail")
            );
        }
    }
    println!(
        "\n{} of {} endpoints reachable",
        report.summary.reachable, report.summary.total
    );
    Ok(())
}

async fn run_once(config: AriaConfig, topic: &str) -> anyhow::Result<()> {
    let tracker = Arc::new(ErrorTracker::new());
    let metrics = Arc::new(MetricsCollector::default());
    let validator = ComprehensiveValidator::new(&config.config_dir, &config.output_dir);
    let supervisor = Supervisor::new(
        config.startup.max_retries,
        Duration::from_secs(config.startup.retry_delay_secs),
        validator,
        &config.config_dir,
        Arc::clone(&tracker),
        metrics,
    );

    let crew_config = supervisor
        .initialize()
        .await
        .map_err(|e| anyhow::anyhow!("Initialization failed: {}", e))?;

    let crew = Crew::new(crew_config, &config.output_dir, tracker).with_handler(
        TimeoutHandler::new(
            Duration::from_secs(config.resilience.api_timeout_secs),
            config.resilience.api_retries,
        ),
    );

    println!("Starting ARIA crew for topic '{topic}'...");
    let run = crew.kickoff(topic).await?;

    for step in &run.steps {
        println!(
            "  {} ({}) finished in {} ms",
            step.role, step.task, step.duration_ms
        );
    }
    if let Some(path) = &run.report_path {
        println!("Report written to {}", path.display());
    }
    if let Some(path) = &run.reviewed_path {
        println!("Reviewed report written to {}", path.display());
    }
    println!("Crew finished in {} ms.", run.duration_ms);
    Ok(())
}
