//! In-memory table.
//!
//! Keeps rows in a `Vec` behind a lock. Used by the demo binary and by tests
//! as the stand-in for real aggregation storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use crate::condition::{Predicate, StoreComparison};
use crate::error::TableError;
use crate::event::{ParameterBatch, Value};
use crate::schema::TableDefinition;
use crate::table::{AppContext, CompiledCondition, Table, TableRegistry};

pub struct MemoryTable {
    definition: TableDefinition,
    rows: RwLock<Vec<Vec<Value>>>,
}

#[derive(Debug)]
struct MemoryCondition {
    table: String,
    comparison: StoreComparison,
}

impl CompiledCondition for MemoryCondition {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MemoryTable {
    pub fn new(definition: TableDefinition) -> Self {
        Self {
            definition,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.definition.len() {
            return Err(TableError::ArityMismatch {
                table: self.definition.id.clone(),
                expected: self.definition.len(),
                actual: row.len(),
            });
        }
        self.rows.write().push(row);
        Ok(())
    }

    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.rows.read().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl Table for MemoryTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    fn compile_condition(
        &self,
        predicate: &Predicate,
        _app: &AppContext,
        _registry: &TableRegistry,
    ) -> Result<Arc<dyn CompiledCondition>, TableError> {
        let comparison = StoreComparison::analyze(predicate, &self.definition)?;
        Ok(Arc::new(MemoryCondition {
            table: self.definition.id.clone(),
            comparison,
        }))
    }

    async fn delete_events(
        &self,
        batch: &ParameterBatch,
        condition: &dyn CompiledCondition,
        _record_count: usize,
    ) -> Result<(), TableError> {
        let condition = condition
            .as_any()
            .downcast_ref::<MemoryCondition>()
            .filter(|c| c.table == self.definition.id)
            .ok_or_else(|| TableError::ForeignCondition {
                table: self.definition.id.clone(),
            })?;
        let cmp = &condition.comparison;

        let mut rows = self.rows.write();
        for record in batch.records() {
            let param = record
                .get(cmp.parameter_position)
                .ok_or(TableError::MissingParameter {
                    position: cmp.parameter_position,
                })?;

            let before = rows.len();
            rows.retain(|row| {
                !row.get(cmp.column_position)
                    .and_then(|value| value.compare(param))
                    .is_some_and(|ordering| cmp.op.holds(ordering))
            });
            debug!(
                table = %self.definition.id,
                deleted = before - rows.len(),
                "Deleted rows from memory table"
            );
        }

        Ok(())
    }
}
