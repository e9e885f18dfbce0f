// Table Scan Operator
//
// This module implements the full-scan source operator over a stored table.
// A scan owns a shared handle to the table rows and its own cursor, so any
// number of scans can run over the same table at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;

use crate::query::executor::operators::Operator;
use crate::query::executor::result::{Row, QueryResult, QueryError};

// Monotonic id for easier debugging of interleaved scans
static NEXT_OPERATOR_ID: AtomicUsize = AtomicUsize::new(0);

/// A table scan operator that yields every row of a table in stored order
pub struct TableScanOperator {
    /// Table name to scan
    table_name: String,
    /// Rows of the table, shared with the record store
    rows: Arc<Vec<Row>>,
    /// Index of the next row to return
    cursor: usize,
    /// Initialization status
    initialized: bool,
    /// Operator ID for easier debugging
    operator_id: usize,
}

impl TableScanOperator {
    /// Create a new table scan operator
    pub fn new(table_name: impl Into<String>, rows: Arc<Vec<Row>>) -> Self {
        TableScanOperator {
            table_name: table_name.into(),
            rows,
            cursor: 0,
            initialized: false,
            operator_id: NEXT_OPERATOR_ID.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Scan over rows that do not belong to a stored table
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new("<values>", Arc::new(rows))
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl Operator for TableScanOperator {
    /// Rewind to the first row
    fn init(&mut self) -> QueryResult<()> {
        self.cursor = 0;
        self.initialized = true;
        debug!("scan#{} of '{}' started ({} rows)", self.operator_id, self.table_name, self.rows.len());
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::ExecutionError("Operator not initialized".to_string()));
        }

        match self.rows.get(self.cursor) {
            Some(row) => {
                self.cursor += 1;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        Ok(())
    }
}
