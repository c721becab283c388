//! Aggregation table stored in ClickHouse.
//!
//! Delete conditions compile to a parameterized mutation with every
//! identifier quoted:
//!
//! ```text
//! ALTER TABLE `db`.`table` DELETE WHERE `column` <op> ?
//! ```
//!
//! The mutation runs once per parameter record with the record's value bound
//! to `?`.

use aggregation_table::{
    AppContext, CompiledCondition, ParameterBatch, Predicate, StoreComparison, Table,
    TableDefinition, TableError, TableRegistry, Value,
};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use crate::client::ClickHouseClient;

pub struct ClickHouseTable {
    client: Arc<ClickHouseClient>,
    definition: TableDefinition,
}

#[derive(Debug)]
struct MutationCondition {
    table: String,
    sql: String,
    parameter_position: usize,
}

impl CompiledCondition for MutationCondition {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ClickHouseTable {
    pub fn new(client: Arc<ClickHouseClient>, definition: TableDefinition) -> Self {
        Self { client, definition }
    }
}

/// Renders the delete mutation for a normalized comparison.
fn delete_sql(database: &str, table: &str, comparison: &StoreComparison) -> String {
    format!(
        "ALTER TABLE {}.{} DELETE WHERE {} {} ?",
        quote(database),
        quote(table),
        quote(&comparison.column),
        comparison.op.symbol()
    )
}

/// Backtick-quoted identifier.
fn quote(ident: &str) -> String {
    format!("`{}`", ident.replace('\\', "\\\\").replace('`', "\\`"))
}

#[async_trait]
impl Table for ClickHouseTable {
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
        let sql = delete_sql(
            &self.client.config().database,
            &self.definition.id,
            &comparison,
        );

        debug!(query = %predicate.query_name, sql = %sql, "Compiled delete mutation");

        Ok(Arc::new(MutationCondition {
            table: self.definition.id.clone(),
            sql,
            parameter_position: comparison.parameter_position,
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
            .downcast_ref::<MutationCondition>()
            .filter(|c| c.table == self.definition.id)
            .ok_or_else(|| TableError::ForeignCondition {
                table: self.definition.id.clone(),
            })?;

        for record in batch.records() {
            let value = record
                .get(condition.parameter_position)
                .ok_or(TableError::MissingParameter {
                    position: condition.parameter_position,
                })?;

            let query = self.client.inner().query(&condition.sql);
            let query = match value {
                Value::Long(v) => query.bind(*v),
                Value::Int(v) => query.bind(*v),
                Value::Double(v) => query.bind(*v),
                Value::Bool(v) => query.bind(*v),
                Value::String(v) => query.bind(v.as_str()),
                Value::Null => {
                    return Err(TableError::unsupported(
                        condition.sql.as_str(),
                        "cannot bind NULL in a delete condition",
                    ))
                }
            };

            query
                .execute()
                .await
                .map_err(|e| TableError::storage(self.definition.id.as_str(), e))?;
        }

        Ok(())
    }
}
