// Query Result Implementation
//
// This module defines the value, row, error and result-set types shared by the
// record store, the pipeline operators and the query catalog.

use std::collections::HashMap;
use std::fmt;
use std::cmp::{Ordering, Eq};
use std::hash::{Hash, Hasher};
use serde::ser::{Serialize, Serializer, SerializeMap, SerializeSeq};
use thiserror::Error;

use crate::catalog::schema::DataType;
use crate::catalog::ValidationError;

/// Possible data types for values in a row
#[derive(Debug, Clone)]
pub enum DataValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    /// Nested rows, produced by `collect` aggregates and `TopWithinGroup`
    List(Vec<Row>),
}

// Numbers are equal when `compare` says so: `Integer(1) == Float(1.0)`,
// `0.0 == -0.0` and NaN equals NaN.
impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DataValue::List(a), DataValue::List(b)) => a == b,
            _ => self.partial_cmp(other) == Some(Ordering::Equal),
        }
    }
}

impl Eq for DataValue {}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DataValue::Null => 0.hash(state),
            DataValue::Integer(i) => { 1.hash(state); i.hash(state); }
            // Integral floats hash like the integer they equal
            DataValue::Float(f) => match float_as_integer(*f) {
                Some(i) => { 1.hash(state); i.hash(state); }
                None if f.is_nan() => { 2.hash(state); f64::NAN.to_bits().hash(state); }
                None => { 2.hash(state); f.to_bits().hash(state); }
            },
            DataValue::Text(s) => { 3.hash(state); s.hash(state); }
            DataValue::Boolean(b) => { 4.hash(state); b.hash(state); }
            DataValue::List(rows) => { 5.hash(state); rows.hash(state); }
        }
    }
}

/// 2^63, the first float above every `i64`
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn float_as_integer(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= -I64_BOUND && f < I64_BOUND {
        Some(f as i64)
    } else {
        None
    }
}

/// Total order on floats: NaN sorts after every number and equals itself
fn cmp_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Exact integer/float comparison, without rounding the integer
fn cmp_integer_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => cmp_floats(0.0, f - whole),
        ord => ord,
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "NULL"),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Text(s) => write!(f, "{}", s),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::List(rows) => {
                write!(f, "[")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", row)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl PartialOrd for DataValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => Some(Ordering::Equal),
            (DataValue::Null, _) => Some(Ordering::Less),
            (_, DataValue::Null) => Some(Ordering::Greater),

            (DataValue::Integer(a), DataValue::Integer(b)) => Some(a.cmp(b)),
            (DataValue::Float(a), DataValue::Float(b)) => Some(cmp_floats(*a, *b)),
            (DataValue::Integer(a), DataValue::Float(b)) => Some(cmp_integer_float(*a, *b)),
            (DataValue::Float(a), DataValue::Integer(b)) => Some(cmp_integer_float(*b, *a).reverse()),
            (DataValue::Text(a), DataValue::Text(b)) => Some(a.cmp(b)),
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a.partial_cmp(b),
            // Lists are only compared for equality
            (DataValue::List(_), DataValue::List(_)) => None,

            _ => None,
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataValue::Null => serializer.serialize_unit(),
            DataValue::Integer(i) => serializer.serialize_i64(*i),
            DataValue::Float(f) => serializer.serialize_f64(*f),
            DataValue::Text(s) => serializer.serialize_str(s),
            DataValue::Boolean(b) => serializer.serialize_bool(*b),
            DataValue::List(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
        }
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Integer(value as i64)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl DataValue {
    /// Column type of the value; `None` for `Null`, which fits any nullable column
    pub fn get_type(&self) -> Option<DataType> {
        match self {
            DataValue::Null => None,
            DataValue::Integer(_) => Some(DataType::Integer),
            DataValue::Float(_) => Some(DataType::Float),
            DataValue::Text(_) => Some(DataType::Text),
            DataValue::Boolean(_) => Some(DataType::Boolean),
            DataValue::List(_) => Some(DataType::List),
        }
    }

    /// Type name for error messages
    pub fn type_name(&self) -> String {
        match self.get_type() {
            Some(data_type) => data_type.to_string(),
            None => "NULL".to_string(),
        }
    }

    /// Compare two DataValues for sorting purposes.
    /// Handles NULLs (NULLs are considered less than any non-NULL value).
    /// Returns Ordering or QueryError for incompatible types.
    pub fn compare(&self, other: &Self) -> QueryResult<Ordering> {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => Ok(Ordering::Equal),
            (DataValue::Null, _) => Ok(Ordering::Less),
            (_, DataValue::Null) => Ok(Ordering::Greater),
            (a, b) => a.partial_cmp(b).ok_or_else(||
                QueryError::TypeError(format!("Cannot compare incompatible types: {} and {}", a.type_name(), b.type_name()))
            ),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DataValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Row]> {
        match self {
            DataValue::List(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Represents a row in query results
#[derive(Debug, Clone)]
pub struct Row {
    /// Values indexed by column name
    values: HashMap<String, DataValue>,
    /// Column order for consistent display
    column_order: Vec<String>,
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        // Two rows are equal if they have the same columns and values
        if self.column_order.len() != other.column_order.len() {
            return false;
        }

        for col in &self.column_order {
            match (self.values.get(col), other.values.get(col)) {
                (Some(v1), Some(v2)) if v1 == v2 => {}
                _ => return false,
            }
        }

        true
    }
}

impl Eq for Row {}

impl Hash for Row {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent so that it agrees with PartialEq
        let mut columns: Vec<&String> = self.column_order.iter().collect();
        columns.sort();
        for col in columns {
            col.hash(state);
            self.values.get(col).hash(state);
        }
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.values_with_names().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.column_order.len()))?;
        for (name, value) in self.values_with_names() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Row {
    /// Create a new empty row
    pub fn new() -> Self {
        Row {
            values: HashMap::new(),
            column_order: Vec::new(),
        }
    }

    /// Create a row from column values
    pub fn from_values(columns: Vec<String>, values: Vec<DataValue>) -> Self {
        let mut row = Row::new();
        for (col, val) in columns.into_iter().zip(values) {
            row.set(col, val);
        }
        row
    }

    /// Build a row from `(column, value)` pairs, keeping their order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DataValue>,
    {
        let mut row = Row::new();
        for (col, val) in pairs {
            row.set(col.into(), val.into());
        }
        row
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&DataValue> {
        self.values.get(column)
    }

    /// Get a value by column name, failing with `FieldError` when absent
    pub fn require(&self, column: &str) -> QueryResult<&DataValue> {
        self.values
            .get(column)
            .ok_or_else(|| QueryError::FieldError(column.to_string()))
    }

    /// Set a value for a column
    pub fn set(&mut self, column: String, value: DataValue) {
        if !self.values.contains_key(&column) {
            self.column_order.push(column.clone());
        }
        self.values.insert(column, value);
    }

    /// Copy of this row without the given column
    pub fn without(&self, column: &str) -> Row {
        let mut row = Row::new();
        for (name, value) in self.values_with_names() {
            if name != column {
                row.set(name.clone(), value.clone());
            }
        }
        row
    }

    /// Get all columns in the row
    pub fn columns(&self) -> &[String] {
        &self.column_order
    }

    /// Get all values in column order
    pub fn values(&self) -> Vec<&DataValue> {
        self.column_order.iter()
            .filter_map(|col| self.values.get(col))
            .collect()
    }

    /// Get all values with their corresponding column names, in column order
    pub fn values_with_names(&self) -> impl Iterator<Item = (&String, &DataValue)> {
        self.column_order.iter()
            .filter_map(move |col| self.values.get(col).map(|v| (col, v)))
    }
}

/// Represents query execution error
#[derive(Error, Debug)]
pub enum QueryError {
    /// Unknown table, or a field that cannot exist in a stage's input shape
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// A stage referenced a field absent from the current row
    #[error("Field not found: {0}")]
    FieldError(String),
    /// Invalid stage parameter
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Error in data type comparison or conversion
    #[error("Type error: {0}")]
    TypeError(String),
    /// First failure of a pipeline, tagged with the failing stage
    #[error("Stage {index} ({stage}) failed: {source}")]
    StageError {
        index: usize,
        stage: String,
        source: Box<QueryError>,
    },
    /// Dataset could not be read or decoded
    #[error("Load error: {0}")]
    LoadError(String),
    /// Operator protocol misuse
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl QueryError {
    /// Wrap an error as the failure of pipeline stage `index`
    pub fn in_stage(self, index: usize, stage: impl Into<String>) -> Self {
        match self {
            // Already attributed to a stage further up the chain
            QueryError::StageError { .. } => self,
            other => QueryError::StageError {
                index,
                stage: stage.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through `StageError` wrappers
    pub fn root_cause(&self) -> &QueryError {
        match self {
            QueryError::StageError { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> Self {
        QueryError::SchemaError(err.to_string())
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        QueryError::LoadError(err.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::LoadError(format!("Invalid JSON: {}", err))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query resultset representation
#[derive(Debug, Clone)]
pub struct QueryResultSet {
    /// Column names in the resultset
    columns: Vec<String>,
    /// Rows of data
    rows: Vec<Row>,
}

impl QueryResultSet {
    /// Create a new empty resultset with column names
    pub fn new(columns: Vec<String>) -> Self {
        QueryResultSet {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row to the resultset
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Get the columns in the resultset
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the rows in the resultset
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Format the resultset as a string table
    pub fn to_string_table(&self) -> String {
        if self.columns.is_empty() {
            return "Empty result".to_string();
        }

        let cells: Vec<Vec<String>> = self.rows.iter()
            .map(|row| {
                self.columns.iter()
                    .map(|col| row.get(col).map(|v| v.to_string()).unwrap_or_else(|| "NULL".to_string()))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self.columns.iter().enumerate()
            .map(|(i, col)| {
                cells.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(col.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut result = String::new();

        // Add column headers
        result.push('|');
        for (col, width) in self.columns.iter().zip(&widths) {
            result.push_str(&format!(" {:<width$} |", col, width = width));
        }
        result.push('\n');

        // Add separator
        result.push('|');
        for width in &widths {
            result.push_str(&format!("{}|", "-".repeat(width + 2)));
        }
        result.push('\n');

        for row in &cells {
            result.push('|');
            for (cell, width) in row.iter().zip(&widths) {
                result.push_str(&format!(" {:<width$} |", cell, width = width));
            }
            result.push('\n');
        }

        result
    }

    /// Return a message for empty result sets
    pub fn empty_message(&self) -> String {
        if self.columns.is_empty() {
            "Empty result".to_string()
        } else {
            format!("Empty result set with columns: {}", self.columns.join(", "))
        }
    }
}

impl FromIterator<Row> for QueryResultSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        let rows: Vec<Row> = iter.into_iter().collect();
        let columns = rows.first().map(|r| r.columns().to_vec()).unwrap_or_default();
        QueryResultSet { columns, rows }
    }
}
