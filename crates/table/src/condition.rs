//! Correlation context and predicates submitted for compilation.

use crate::error::TableError;
use crate::expression::{CompareOp, Expression, Variable};
use crate::schema::{Attribute, TableDefinition};

/// One logical stream visible to a condition: its definition and the
/// attributes it exposes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSlot {
    pub definition: TableDefinition,
    pub output: Vec<Attribute>,
}

impl StreamSlot {
    /// Slot exposing every attribute of the definition.
    pub fn of(definition: TableDefinition) -> Self {
        let output = definition.attributes.clone();
        Self { definition, output }
    }
}

/// Where an attribute reference resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAttribute {
    pub slot: usize,
    pub position: usize,
}

/// Schema binding for a condition that correlates a parameter record with
/// rows of a stored table.
///
/// The matching slot holds the incoming parameter record, the store slot
/// holds the table being matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    slots: Vec<StreamSlot>,
    matching_slot: usize,
    store_slot: usize,
    current_slot: usize,
}

impl CorrelationContext {
    /// Two-slot context: `matching` at slot 0, `store` at slot 1.
    pub fn new(matching: StreamSlot, store: StreamSlot) -> Self {
        Self {
            slots: vec![matching, store],
            matching_slot: 0,
            store_slot: 1,
            current_slot: 0,
        }
    }

    pub fn slots(&self) -> &[StreamSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&StreamSlot> {
        self.slots.get(index)
    }

    pub fn matching_slot(&self) -> usize {
        self.matching_slot
    }

    pub fn store_slot(&self) -> usize {
        self.store_slot
    }

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    pub fn matching_definition(&self) -> &TableDefinition {
        &self.slots[self.matching_slot].definition
    }

    pub fn store_definition(&self) -> &TableDefinition {
        &self.slots[self.store_slot].definition
    }

    /// Resolves a variable to a slot and output position.
    ///
    /// Qualified variables resolve against the slot whose definition id
    /// matches; unqualified ones resolve against the matching slot.
    pub fn resolve(&self, variable: &Variable) -> Option<ResolvedAttribute> {
        let slot = match &variable.stream_id {
            Some(id) => self.slots.iter().position(|s| &s.definition.id == id)?,
            None => self.matching_slot,
        };
        let position = self.slots[slot]
            .output
            .iter()
            .position(|a| a.name == variable.attribute)?;
        Some(ResolvedAttribute { slot, position })
    }
}

/// Binds an attribute of the parameter record to a slot position so the
/// same compiled condition can be re-run with fresh values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    pub attribute: Attribute,
    pub slot: usize,
    pub position: usize,
}

/// Everything a table needs to compile a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub expression: Expression,
    pub context: CorrelationContext,
    pub bindings: Vec<ParameterBinding>,
    /// Label used by the table for diagnostics, e.g. `Trades_HOURSDeleteQuery`.
    pub query_name: String,
}

/// A predicate reduced to `column <op> parameter`, with the stored column
/// always on the left.
///
/// Tables that only support single-column delete conditions compile from
/// this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreComparison {
    pub column: String,
    pub column_position: usize,
    pub op: CompareOp,
    pub parameter_position: usize,
}

impl StoreComparison {
    pub fn analyze(predicate: &Predicate, table: &TableDefinition) -> Result<Self, TableError> {
        let query = predicate.query_name.as_str();
        let context = &predicate.context;

        if context.store_definition().id != table.id {
            return Err(TableError::unsupported(
                query,
                format!(
                    "condition targets table {} but was compiled against {}",
                    context.store_definition().id,
                    table.id
                ),
            ));
        }

        let (left, op, right) = match &predicate.expression {
            Expression::Compare { left, op, right } => match (left.as_ref(), right.as_ref()) {
                (Expression::Variable(l), Expression::Variable(r)) => (l, *op, r),
                _ => {
                    return Err(TableError::unsupported(
                        query,
                        "both operands must be attribute references",
                    ))
                }
            },
            Expression::Variable(_) => {
                return Err(TableError::unsupported(query, "expected a comparison"))
            }
        };

        let resolve = |v: &Variable| {
            context.resolve(v).ok_or_else(|| TableError::UnknownAttribute {
                query: query.to_string(),
                attribute: v.to_string(),
            })
        };
        let (l, r) = (resolve(left)?, resolve(right)?);

        let store = context.store_slot();
        let matching = context.matching_slot();
        let (column, op, parameter, at) = if l.slot == store && r.slot == matching {
            (left, op, right, r)
        } else if l.slot == matching && r.slot == store {
            (right, op.flipped(), left, l)
        } else {
            return Err(TableError::unsupported(
                query,
                "comparison must relate a table column to a parameter",
            ));
        };

        // The parameter record is laid out by the bindings, not the context.
        let binding = predicate
            .bindings
            .iter()
            .find(|b| b.slot == at.slot && b.attribute.name == parameter.attribute)
            .ok_or_else(|| {
                TableError::unsupported(query, format!("parameter {} is not bound", parameter))
            })?;

        let unknown = || TableError::UnknownAttribute {
            query: query.to_string(),
            attribute: column.to_string(),
        };
        let column_position = table.position(&column.attribute).ok_or_else(unknown)?;
        let stored = table.get(&column.attribute).ok_or_else(unknown)?;

        if stored.attr_type != binding.attribute.attr_type {
            return Err(TableError::TypeMismatch {
                query: query.to_string(),
                column: column.attribute.clone(),
                expected: binding.attribute.attr_type,
                actual: stored.attr_type,
            });
        }

        Ok(Self {
            column: column.attribute.clone(),
            column_position,
            op,
            parameter_position: binding.position,
        })
    }
}
