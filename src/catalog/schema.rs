// Schema Types Module
//
// This module defines the data types a table column can declare.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Data types supported by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    /// Nested rows; never declared by a stored table
    List,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
            DataType::List => "LIST",
        };
        write!(f, "{}", name)
    }
}
