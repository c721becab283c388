//! Delete predicate for aggregation tables.
//!
//! The predicate is `<table>.AGG_TIMESTAMP < AGG_TIMESTAMP`, where the right
//! operand is read from a one-attribute parameter record rather than a
//! literal. The compiled form can therefore be reused with a new cutoff on
//! every tick.

use aggregation_table::{
    Attribute, CompareOp, CorrelationContext, Expression, ParameterBinding, ParameterRecord,
    Predicate, StreamSlot, TableDefinition, Value, Variable, AGG_TIMESTAMP,
};

/// Builds "older than cutoff" predicates bound to a table's schema.
#[derive(Debug, Clone)]
pub struct DeletionPredicateBuilder {
    parameter: TableDefinition,
}

impl Default for DeletionPredicateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeletionPredicateBuilder {
    pub fn new() -> Self {
        let timestamp = Attribute::agg_timestamp();
        Self {
            parameter: TableDefinition::new("").attribute(timestamp.name, timestamp.attr_type),
        }
    }

    /// Predicate deleting rows of `table` older than the bound cutoff.
    ///
    /// Slot 0 of the correlation context is the parameter record, slot 1 the
    /// full table schema.
    pub fn build(&self, table: &TableDefinition) -> Predicate {
        let context = CorrelationContext::new(
            StreamSlot::of(self.parameter.clone()),
            StreamSlot::of(table.clone()),
        );

        let expression = Expression::compare(
            Variable::of(table.id.as_str(), AGG_TIMESTAMP).into(),
            CompareOp::LessThan,
            Variable::new(AGG_TIMESTAMP).into(),
        );

        let bindings = vec![ParameterBinding {
            attribute: Attribute::agg_timestamp(),
            slot: context.matching_slot(),
            position: 0,
        }];

        Predicate {
            expression,
            context,
            bindings,
            query_name: format!("{}DeleteQuery", table.id),
        }
    }

    /// Parameter record carrying a cutoff.
    pub fn parameter_record(cutoff: i64) -> ParameterRecord {
        ParameterRecord::new(vec![Value::Long(cutoff)])
    }
}
