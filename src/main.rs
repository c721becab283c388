//! Aggregation purge service
//!
//! Runs the recurring retention purge for each configured incremental
//! aggregation, against in-memory tables or ClickHouse.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::signal;
use tracing::{info, warn};

use aggregation_core::{AggregationDefinition, Granularity};
use aggregation_table::{
    AppContext, AttributeType, MemoryTable, Table, TableDefinition, TableRegistry, AGG_TIMESTAMP,
};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ClickHouseTable};
use telemetry::{init_tracing_from_env, metrics};
use worker::{AggregationTables, PurgeScheduler, PurgeTask};

/// Storage holding the aggregation tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Backend {
    #[default]
    Memory,
    Clickhouse,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_app_name")]
    app_name: String,

    #[serde(default)]
    backend: Backend,

    #[serde(default)]
    clickhouse: ClickHouseConfig,

    #[serde(default)]
    aggregations: Vec<AggregationDefinition>,
}

fn default_app_name() -> String {
    "aggregation-purge".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            backend: Backend::default(),
            clickhouse: ClickHouseConfig::default(),
            aggregations: Vec::new(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting aggregation purge v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    if config.aggregations.is_empty() {
        warn!("No aggregations configured, nothing to purge");
    }

    let clickhouse = match config.backend {
        Backend::Clickhouse => Some(Arc::new(
            ClickHouseClient::new(config.clickhouse.clone())
                .context("Failed to create ClickHouse client")?,
        )),
        Backend::Memory => None,
    };

    let app = AppContext::new(config.app_name.as_str());
    let mut schedulers = Vec::with_capacity(config.aggregations.len());

    for definition in &config.aggregations {
        let (tables, registry) = build_tables(definition, clickhouse.as_ref());

        let task = PurgeTask::init(definition, tables, app.clone(), registry)
            .with_context(|| format!("Invalid purge settings for aggregation {}", definition.id))?;

        let scheduler = PurgeScheduler::new(Handle::current());
        scheduler.install(Arc::new(task)).await;
        schedulers.push(scheduler);
    }

    info!(
        aggregations = schedulers.len(),
        backend = ?config.backend,
        "Purge schedulers running"
    );

    shutdown_signal().await;

    info!("Shutting down...");

    for scheduler in &schedulers {
        scheduler.shutdown().await;
    }

    let snapshot = metrics().snapshot();
    info!(
        ticks = snapshot.purge_ticks,
        tables_purged = snapshot.tables_purged,
        failures = snapshot.purge_tick_failures,
        "Shutdown complete"
    );
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("PURGE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Table id for one granularity of an aggregation, e.g. `Trades_HOURS`.
fn table_id(aggregation: &str, granularity: Granularity) -> String {
    format!("{}_{}", aggregation, granularity.as_str().to_uppercase())
}

/// One table per computed granularity, on the configured backend.
fn build_tables(
    definition: &AggregationDefinition,
    clickhouse: Option<&Arc<ClickHouseClient>>,
) -> (AggregationTables, TableRegistry) {
    let mut tables = AggregationTables::new();
    let mut registry = TableRegistry::new();

    for granularity in &definition.granularities {
        let schema = TableDefinition::new(table_id(&definition.id, *granularity))
            .attribute(AGG_TIMESTAMP, AttributeType::Long);

        let table: Arc<dyn Table> = match clickhouse {
            Some(client) => Arc::new(ClickHouseTable::new(client.clone(), schema)),
            None => Arc::new(MemoryTable::new(schema)),
        };

        registry.insert(table.id().to_string(), table.clone());
        tables.insert(*granularity, table);
    }

    (tables, registry)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
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
