//! The table seam used by aggregation purging.

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::condition::Predicate;
use crate::error::TableError;
use crate::event::ParameterBatch;
use crate::schema::TableDefinition;

/// Application-level context handed to tables while compiling conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    pub name: String,
}

impl AppContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Every table known to the application, keyed by table id.
pub type TableRegistry = HashMap<String, Arc<dyn Table>>;

/// Executable, table-specific form of a predicate.
///
/// Opaque to callers; the compiling table downcasts it back when executing.
pub trait CompiledCondition: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// A stored table that can compile and run delete conditions.
#[async_trait]
pub trait Table: Send + Sync {
    fn definition(&self) -> &TableDefinition;

    /// Table id, as used in logs and errors.
    fn id(&self) -> &str {
        &self.definition().id
    }

    /// Compiles a predicate into a condition this table can execute.
    fn compile_condition(
        &self,
        predicate: &Predicate,
        app: &AppContext,
        registry: &TableRegistry,
    ) -> Result<Arc<dyn CompiledCondition>, TableError>;

    /// Deletes every row matching `condition` for each record in `batch`.
    ///
    /// `record_count` is the number of parameter records the caller
    /// expects to be applied.
    async fn delete_events(
        &self,
        batch: &ParameterBatch,
        condition: &dyn CompiledCondition,
        record_count: usize,
    ) -> Result<(), TableError>;
}
