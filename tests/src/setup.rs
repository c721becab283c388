//! Common test setup functions.

use aggregation_core::{AggregationDefinition, Granularity, PurgeAnnotation, Result};
use aggregation_table::{AppContext, Table, TableRegistry};
use std::sync::Arc;
use worker::{AggregationTables, PurgeTask};

use crate::fixtures::aggregation_table;
use crate::mocks::{CallLog, DeleteCall, MockTable};

/// An aggregation whose tables are all mocks sharing one call log.
pub struct TestAggregation {
    pub definition: AggregationDefinition,
    pub log: CallLog,
    tables: Vec<(Granularity, Arc<MockTable>)>,
}

impl TestAggregation {
    pub fn new(id: &str, granularities: &[Granularity]) -> Self {
        let definition = AggregationDefinition::new(id, granularities.iter().copied());
        let log = CallLog::default();
        let tables = definition
            .granularities
            .iter()
            .map(|g| {
                let table = MockTable::new(aggregation_table(id, *g), log.clone());
                (*g, Arc::new(table))
            })
            .collect();

        Self {
            definition,
            log,
            tables,
        }
    }

    pub fn with_purge(mut self, purge: PurgeAnnotation) -> Self {
        self.definition = self.definition.with_purge(purge);
        self
    }

    /// Mock table for a granularity.
    ///
    /// Panics if the aggregation does not compute that granularity.
    pub fn table(&self, granularity: Granularity) -> Arc<MockTable> {
        self.tables
            .iter()
            .find(|(g, _)| *g == granularity)
            .map(|(_, t)| t.clone())
            .unwrap_or_else(|| panic!("no {} table", granularity))
    }

    /// Builds the purge task over the mock tables.
    pub fn task(&self) -> Result<PurgeTask> {
        let mut tables = AggregationTables::new();
        let mut registry = TableRegistry::new();
        for (granularity, table) in &self.tables {
            let table: Arc<dyn Table> = table.clone();
            registry.insert(table.id().to_string(), table.clone());
            tables.insert(*granularity, table);
        }

        PurgeTask::init(
            &self.definition,
            tables,
            AppContext::new("purge-tests"),
            registry,
        )
    }

    /// Delete calls issued so far, in order.
    pub fn calls(&self) -> Vec<DeleteCall> {
        self.log.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().clear();
    }
}
