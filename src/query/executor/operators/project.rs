// Projection Operator Implementation
//
// This module implements the projection operator for selecting and renaming
// specific columns.

use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{Row, QueryResult, QueryError};
use crate::query::stage::ProjectField;

/// Projection operator that selects specific columns from input rows
pub struct ProjectionOperator {
    /// The input operator
    input: BoxedOperator,
    /// The columns to project, in output order
    fields: Vec<ProjectField>,
    /// Whether the operator is initialized
    initialized: bool,
}

impl ProjectionOperator {
    /// Create a new projection operator
    pub fn new(input: BoxedOperator, fields: Vec<ProjectField>) -> Self {
        ProjectionOperator {
            input,
            fields,
            initialized: false,
        }
    }

    /// Project a row to only include the specified columns
    fn project_row(&self, row: &Row) -> QueryResult<Row> {
        let mut projected_row = Row::new();
        for field in &self.fields {
            let value = row.require(&field.source)?;
            projected_row.set(field.alias.clone(), value.clone());
        }
        Ok(projected_row)
    }
}

impl Operator for ProjectionOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.initialized = true;
        Ok(())
    }

    /// Get the next row with projected columns
    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::ExecutionError("Operator not initialized".to_string()));
        }

        match self.input.next()? {
            Some(row) => Ok(Some(self.project_row(&row)?)),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        self.input.close()
    }
}
