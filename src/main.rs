//! SitePulse analytics core
//!
//! Traffic telemetry service handling:
//! - non-blocking event intake buffered in front of the row store
//! - cached aggregate reads with bounded staleness
//! - scheduled and on-demand retention enforcement
//! - admission gating of the operator login entry point
//! - PII pseudonymization/hashing before anything is persisted

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use buffer::{BufferConfig, IngestBuffer};
use cache::QueryCache;
use clickhouse_store::{
    init_schema, ClickHouseReadSink, ClickHouseWriteSink, StoreClient, StoreConfig,
};
use pii::{EnvSecrets, Pii};
use pulse_core::{Dataset, Posture, RetentionPolicies, SystemClock, Toggles};
use telemetry::init_tracing_from_env;
use worker::{RetentionSweeper, WorkerConfig, WorkerScheduler};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Token authorizing operator endpoints
    #[serde(default)]
    operator_token: String,

    #[serde(default)]
    toggles: Toggles,

    #[serde(default)]
    store: StoreConfig,

    /// Per-dataset retention overrides in days
    #[serde(default)]
    retention: RetentionOverrides,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RetentionOverrides {
    pageviews_days: Option<u32>,
    sessions_days: Option<u32>,
    system_metrics_days: Option<u32>,
}

impl RetentionOverrides {
    fn apply(&self, mut policies: RetentionPolicies) -> RetentionPolicies {
        if let Some(days) = self.pageviews_days {
            policies = policies.with_max_age(Dataset::Pageviews, days);
        }
        if let Some(days) = self.sessions_days {
            policies = policies.with_max_age(Dataset::Sessions, days);
        }
        if let Some(days) = self.system_metrics_days {
            policies = policies.with_max_age(Dataset::SystemMetrics, days);
        }
        policies
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            operator_token: String::new(),
            toggles: Toggles::default(),
            store: StoreConfig::default(),
            retention: RetentionOverrides::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting SitePulse v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let posture = Posture::from_env();

    if config.operator_token.is_empty() && posture.secrets_required() {
        anyhow::bail!("operator token is required in production");
    }

    // PII transforms: fatal on missing secrets in production posture.
    let pii = Arc::new(
        Pii::new(&EnvSecrets, posture).context("Failed to initialize PII transforms")?,
    );

    // Row store behind the sink seams.
    let store_client =
        StoreClient::new(config.store.clone()).context("Failed to create store client")?;

    if let Err(e) = init_schema(&store_client).await {
        // The schema may already exist or the store may come up later;
        // ingestion buffers through either.
        error!("Failed to initialize store schema: {}", e);
    }

    let write_sink = Arc::new(ClickHouseWriteSink::new(
        store_client.clone(),
        config.toggles.batch_write_enabled,
    ));
    let read_sink = Arc::new(ClickHouseReadSink::new(
        store_client,
        config.toggles.optimized_reads_enabled,
    ));

    let clock = Arc::new(SystemClock);

    // Ingest buffer with its timer flush task.
    let buffer = IngestBuffer::new(BufferConfig::default(), write_sink);
    let _flush_handle = buffer.start_flush_task();

    // Query cache.
    let cache = Arc::new(QueryCache::new(clock.clone(), config.toggles.cache_enabled));

    // Retention sweeper plus background scheduler.
    let policies = config.retention.apply(RetentionPolicies::default());
    let sweeper = Arc::new(RetentionSweeper::new(
        read_sink.clone(),
        policies,
        clock.clone(),
    ));
    let scheduler = Arc::new(WorkerScheduler::new(WorkerConfig::default(), sweeper.clone()));
    let _worker_handles = scheduler.start();

    // Application state and router.
    let state = AppState::new(
        buffer.clone(),
        cache,
        read_sink,
        sweeper,
        pii,
        clock,
        &config.operator_token,
    );
    let _gate_cleanup = state.start_gate_cleanup();

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // A flush already in progress completes in its task; this drains
    // whatever accumulated since.
    info!("Shutting down...");
    buffer.flush_all().await;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("SITEPULSE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Nested overrides the config crate's env parsing handles unreliably.
    if let Ok(url) = std::env::var("SITEPULSE_STORE_URL") {
        config.store.url = url;
    }
    if let Ok(database) = std::env::var("SITEPULSE_STORE_DATABASE") {
        config.store.database = database;
    }
    if let Ok(username) = std::env::var("SITEPULSE_STORE_USERNAME") {
        config.store.username = Some(username);
    }
    if let Ok(password) = std::env::var("SITEPULSE_STORE_PASSWORD") {
        config.store.password = Some(password);
    }
    if let Ok(token) = std::env::var("SITEPULSE_OPERATOR_TOKEN") {
        config.operator_token = token;
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
