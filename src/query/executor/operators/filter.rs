// Filter Operator Implementation
//
// This module implements the filter operator for filtering rows based on predicates.

use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{Row, QueryResult, QueryError};
use crate::query::stage::Predicate;

/// Filter operator that filters rows based on a predicate
pub struct FilterOperator {
    /// The input operator
    input: BoxedOperator,
    /// Conjunction of conditions a row must satisfy
    predicate: Predicate,
    /// Whether the operator is initialized
    initialized: bool,
}

impl FilterOperator {
    /// Create a new filter operator
    pub fn new(input: BoxedOperator, predicate: Predicate) -> Self {
        FilterOperator {
            input,
            predicate,
            initialized: false,
        }
    }
}

impl Operator for FilterOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.initialized = true;
        Ok(())
    }

    /// Get the next row that satisfies the predicate
    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::ExecutionError("Operator not initialized".to_string()));
        }

        while let Some(row) = self.input.next()? {
            if self.predicate.evaluate(&row)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        self.input.close()
    }
}
