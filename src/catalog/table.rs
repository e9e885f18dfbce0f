//! Table Schema Module
//!
//! This module defines the fixed shape of a stored table.

use std::collections::HashMap;
use super::column::Column;
use serde::{Serialize, Deserialize};

/// Name and ordered columns of a stored table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    name: String,
    /// Columns in the table
    columns: Vec<Column>,
    /// Column name to index lookup
    column_map: HashMap<String, usize>,
}

impl TableSchema {
    /// Create a new table schema with the given name and columns
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let column_map = columns
            .iter()
            .enumerate()
            .map(|(i, col)| (col.name().to_string(), i))
            .collect();

        TableSchema {
            name: name.into(),
            columns,
            column_map,
        }
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.column_map.get(name).map(|&idx| &self.columns[idx])
    }
}
