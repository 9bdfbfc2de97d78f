//! Condition evaluation against in-memory rows.

use std::collections::HashSet;

use tracing::debug;

use super::ast::{Comparison, Condition};
use crate::column::Column;
use crate::error::{QueryError, QueryResult};
use crate::row::Row;

/// Evaluates a parsed [`Condition`] against rows of one table.
///
/// Each comparison selects rows in their original order. `AND` keeps the
/// left result's rows that also appear (by `_id`) in the right result. `OR`
/// yields the left result followed by right-result rows not already present,
/// so its order is not symmetric.
#[derive(Debug)]
pub struct ConditionEvaluator<'a> {
    condition: &'a Condition,
    columns: &'a [Column],
}

impl<'a> ConditionEvaluator<'a> {
    /// Creates a new evaluator.
    ///
    /// # Arguments
    ///
    /// * `condition` - The parsed condition
    /// * `columns` - Metadata of the table the rows belong to
    pub fn new(condition: &'a Condition, columns: &'a [Column]) -> Self {
        Self { condition, columns }
    }

    /// Returns the rows matching the condition, preserving row order.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::ColumnNotFound` for an unknown column and any
    /// coercion or comparison error raised by the column's value semantics.
    pub fn filter_rows<'r>(&self, rows: &'r [Row]) -> QueryResult<Vec<&'r Row>> {
        let matched = self.evaluate(self.condition, rows)?;
        debug!(total = rows.len(), matched = matched.len(), "condition evaluated");
        Ok(matched)
    }

    fn evaluate<'r>(&self, condition: &Condition, rows: &'r [Row]) -> QueryResult<Vec<&'r Row>> {
        match condition {
            Condition::Filter(comparison) => self.evaluate_comparison(comparison, rows),
            Condition::And(left, right) => {
                let mut left = self.evaluate(left, rows)?;
                let right = self.evaluate(right, rows)?;
                let right_ids: HashSet<&str> = right.iter().map(|r| r.id()).collect();
                left.retain(|row| right_ids.contains(row.id()));
                Ok(left)
            }
            Condition::Or(left, right) => {
                let mut merged = self.evaluate(left, rows)?;
                let right = self.evaluate(right, rows)?;
                let mut seen: HashSet<&str> = merged.iter().map(|r| r.id()).collect();
                for row in right {
                    if seen.insert(row.id()) {
                        merged.push(row);
                    }
                }
                Ok(merged)
            }
        }
    }

    fn evaluate_comparison<'r>(
        &self,
        comparison: &Comparison,
        rows: &'r [Row],
    ) -> QueryResult<Vec<&'r Row>> {
        let column = self
            .columns
            .iter()
            .find(|c| c.name == comparison.column)
            .ok_or_else(|| QueryError::column_not_found(&comparison.column))?;

        if !column.kind.value_family().supports(comparison.op) {
            return Err(QueryError::unsupported_comparison(
                column.kind,
                comparison.op.symbol(),
            ));
        }
        let input = column.parse_input(&comparison.value)?;

        let mut matched = Vec::new();
        for row in rows {
            if column.cell(row.get(&column.name)).compare(comparison.op, &input)? {
                matched.push(row);
            }
        }
        Ok(matched)
    }
}
