//! Mock implementations for testing.

use aggregation_table::{
    AppContext, CompiledCondition, ParameterBatch, Predicate, StoreComparison, Table,
    TableDefinition, TableError, TableRegistry,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::Notify;

/// A delete call as seen by a mock table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub table: String,
    pub cutoff: i64,
    pub record_count: usize,
}

/// Delete calls shared by every mock table of an aggregation, in call order.
pub type CallLog = Arc<Mutex<Vec<DeleteCall>>>;

/// Pauses delete calls until released.
#[derive(Clone, Default)]
pub struct DeleteGate {
    /// Notified when a delete call reaches the gate.
    pub entered: Arc<Notify>,
    /// Notify to let a waiting delete call continue.
    pub release: Arc<Notify>,
}

#[derive(Debug)]
struct MockCondition {
    table: String,
    parameter_position: usize,
}

impl CompiledCondition for MockCondition {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Table that records delete calls instead of storing rows.
///
/// Compilation and deletion can be made to fail, and deletes can be held at
/// a [`DeleteGate`] to simulate a slow storage call.
pub struct MockTable {
    definition: TableDefinition,
    log: CallLog,
    compilations: Mutex<usize>,
    fail_compile: Mutex<bool>,
    fail_delete: Mutex<bool>,
    gate: Mutex<Option<DeleteGate>>,
}

impl MockTable {
    pub fn new(definition: TableDefinition, log: CallLog) -> Self {
        Self {
            definition,
            log,
            compilations: Mutex::new(0),
            fail_compile: Mutex::new(false),
            fail_delete: Mutex::new(false),
            gate: Mutex::new(None),
        }
    }

    /// Number of conditions compiled by this table.
    pub fn compilations(&self) -> usize {
        *self.compilations.lock()
    }

    pub fn set_fail_compile(&self, fail: bool) {
        *self.fail_compile.lock() = fail;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        *self.fail_delete.lock() = fail;
    }

    /// Holds every subsequent delete call at the returned gate.
    pub fn hold_deletes(&self) -> DeleteGate {
        let gate = DeleteGate::default();
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Stops holding delete calls that have not reached the gate yet.
    pub fn pass_deletes(&self) {
        *self.gate.lock() = None;
    }
}

#[async_trait]
impl Table for MockTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    fn compile_condition(
        &self,
        predicate: &Predicate,
        _app: &AppContext,
        _registry: &TableRegistry,
    ) -> Result<Arc<dyn CompiledCondition>, TableError> {
        if *self.fail_compile.lock() {
            return Err(TableError::unsupported(
                predicate.query_name.as_str(),
                "mock compile failure",
            ));
        }

        let comparison = StoreComparison::analyze(predicate, &self.definition)?;
        *self.compilations.lock() += 1;

        Ok(Arc::new(MockCondition {
            table: self.definition.id.clone(),
            parameter_position: comparison.parameter_position,
        }))
    }

    async fn delete_events(
        &self,
        batch: &ParameterBatch,
        condition: &dyn CompiledCondition,
        record_count: usize,
    ) -> Result<(), TableError> {
        let condition = condition
            .as_any()
            .downcast_ref::<MockCondition>()
            .filter(|c| c.table == self.definition.id)
            .ok_or_else(|| TableError::ForeignCondition {
                table: self.definition.id.clone(),
            })?;

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        for record in batch.records() {
            let cutoff = record
                .get(condition.parameter_position)
                .and_then(|v| v.as_long())
                .ok_or(TableError::MissingParameter {
                    position: condition.parameter_position,
                })?;

            self.log.lock().push(DeleteCall {
                table: self.definition.id.clone(),
                cutoff,
                record_count,
            });
        }

        if *self.fail_delete.lock() {
            return Err(TableError::storage(
                self.definition.id.as_str(),
                "mock delete failure",
            ));
        }

        Ok(())
    }
}
