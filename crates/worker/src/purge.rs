//! Purge task for an incremental aggregation.
//!
//! Each tick computes a cutoff per granularity (`now - retention`) and
//! deletes rows of that granularity's table whose `AGG_TIMESTAMP` is older
//! than the cutoff. Granularities retained forever are skipped.

use aggregation_core::{
    AggregationDefinition, Error, Granularity, GranularityMap, PurgeConfig, PurgeSettings,
    Result, RetentionPolicy,
};
use aggregation_table::{
    AppContext, CompiledCondition, ParameterBatch, Table, TableError, TableRegistry,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::{debug, error, info};

use crate::error::PurgeError;
use crate::predicate::DeletionPredicateBuilder;

/// Table handle per granularity of an aggregation.
pub type AggregationTables = GranularityMap<Arc<dyn Table>>;

/// One table purged during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgedTable {
    pub granularity: Granularity,
    pub table: String,
    pub cutoff: i64,
}

/// Outcome of a successful tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub now_millis: i64,
    pub purged: Vec<PurgedTable>,
}

/// Purges expired rows from every table of one aggregation.
pub struct PurgeTask {
    aggregation: String,
    settings: PurgeSettings,
    tables: AggregationTables,
    app: AppContext,
    registry: TableRegistry,
    predicates: DeletionPredicateBuilder,
    /// Compiled delete conditions, filled on first successful compile.
    compiled: Mutex<GranularityMap<Arc<dyn CompiledCondition>>>,
}

impl PurgeTask {
    /// Resolves purge settings for `definition` and binds them to its tables.
    ///
    /// Fails if the purge block is invalid or a computed granularity has no
    /// table.
    pub fn init(
        definition: &AggregationDefinition,
        tables: AggregationTables,
        app: AppContext,
        registry: TableRegistry,
    ) -> Result<Self> {
        let settings = PurgeSettings::resolve(definition)?;

        if let Some(granularity) = settings.policy.granularities().find(|g| !tables.contains(*g)) {
            return Err(Error::MissingTable {
                aggregation: definition.id.clone(),
                granularity,
            });
        }

        info!(
            aggregation = %definition.id,
            enabled = settings.config.enabled,
            interval_ms = settings.config.interval_millis(),
            retention = ?settings.policy,
            "Resolved purge settings"
        );

        Ok(Self {
            aggregation: definition.id.clone(),
            settings,
            tables,
            app,
            registry,
            predicates: DeletionPredicateBuilder::new(),
            compiled: Mutex::new(GranularityMap::new()),
        })
    }

    pub fn aggregation_id(&self) -> &str {
        &self.aggregation
    }

    pub fn is_purging_enabled(&self) -> bool {
        self.settings.config.enabled
    }

    pub fn config(&self) -> &PurgeConfig {
        &self.settings.config
    }

    pub fn interval(&self) -> Duration {
        self.settings.config.interval
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.settings.policy
    }

    /// Runs one tick at the current wall-clock time.
    pub async fn run(&self) -> std::result::Result<TickReport, PurgeError> {
        self.run_at(Utc::now().timestamp_millis()).await
    }

    /// Runs one tick as if the current time were `now_millis`.
    ///
    /// Stops at the first table that fails; tables later in granularity
    /// order are left for the next tick.
    pub async fn run_at(&self, now_millis: i64) -> std::result::Result<TickReport, PurgeError> {
        let mut report = TickReport {
            now_millis,
            purged: Vec::new(),
        };

        if !self.is_purging_enabled() {
            debug!(aggregation = %self.aggregation, "Purging disabled, skipping tick");
            return Ok(report);
        }

        metrics().purge_ticks.inc();
        metrics().last_tick_millis.set(now_millis);

        for (granularity, retention) in self.settings.policy.iter() {
            let Some(cutoff) = retention.cutoff(now_millis) else {
                continue;
            };
            let Some(table) = self.tables.get(granularity) else {
                continue;
            };

            let condition = self
                .condition_for(granularity, table.as_ref())
                .map_err(|e| self.failure(granularity, table.as_ref(), cutoff, e))?;

            // Fresh per tick; never shared with another firing.
            let batch = ParameterBatch::single(DeletionPredicateBuilder::parameter_record(cutoff));

            debug!(
                aggregation = %self.aggregation,
                table = %table.id(),
                cutoff,
                "Purging aggregation table"
            );

            table
                .delete_events(&batch, condition.as_ref(), batch.len())
                .await
                .map_err(|e| self.failure(granularity, table.as_ref(), cutoff, e))?;

            info!(
                aggregation = %self.aggregation,
                table = %table.id(),
                granularity = %granularity,
                cutoff,
                "Purged data older than cutoff"
            );
            metrics().tables_purged.inc();

            report.purged.push(PurgedTable {
                granularity,
                table: table.id().to_string(),
                cutoff,
            });
        }

        Ok(report)
    }

    /// Cached compiled condition for a granularity, compiling on first use.
    ///
    /// Failed compilations are not cached and are retried on the next tick.
    fn condition_for(
        &self,
        granularity: Granularity,
        table: &dyn Table,
    ) -> std::result::Result<Arc<dyn CompiledCondition>, TableError> {
        if let Some(condition) = self.compiled.lock().get(granularity) {
            return Ok(condition.clone());
        }

        let predicate = self.predicates.build(table.definition());
        let condition = table.compile_condition(&predicate, &self.app, &self.registry)?;
        metrics().condition_compilations.inc();

        self.compiled.lock().insert(granularity, condition.clone());
        Ok(condition)
    }

    fn failure(
        &self,
        granularity: Granularity,
        table: &dyn Table,
        cutoff: i64,
        source: TableError,
    ) -> PurgeError {
        error!(
            aggregation = %self.aggregation,
            table = %table.id(),
            cutoff,
            error = %source,
            "Failed to delete expired rows"
        );
        metrics().purge_tick_failures.inc();

        PurgeError {
            table: table.id().to_string(),
            granularity,
            cutoff,
            source,
        }
    }
}
