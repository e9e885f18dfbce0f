// Record Store Module
//
// In-memory home of the dataset. Each table is an ordered, immutable list of
// rows with a fixed schema. The store is built once, then only read; scans
// share the rows through an `Arc` and keep their own cursor.

pub mod loader;

use std::sync::Arc;

use linked_hash_map::LinkedHashMap;
use log::debug;

use crate::catalog::{
    events_schema, results_schema, Athlete, Event, ResultRecord, Sex, TableSchema, TypeValidator,
    RESULTS_TABLE,
};
use crate::query::executor::operators::scan::TableScanOperator;
use crate::query::executor::operators::BoxedOperator;
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};

struct StoredTable {
    schema: TableSchema,
    rows: Arc<Vec<Row>>,
}

/// Read-only collection of named tables
pub struct RecordStore {
    tables: LinkedHashMap<String, StoredTable>,
}

impl RecordStore {
    /// Build the store for the athletics dataset
    pub fn new(events: Vec<Event>, results: Vec<ResultRecord>) -> Self {
        let mut store = RecordStore::empty();
        store.put(events_schema(), events.iter().map(Event::to_row).collect());
        store.put(results_schema(), results.iter().map(ResultRecord::to_row).collect());
        store
    }

    /// A store with no tables
    pub fn empty() -> Self {
        RecordStore { tables: LinkedHashMap::new() }
    }

    /// Add (or replace) a table. Every row must match the schema exactly.
    pub fn with_table(mut self, schema: TableSchema, rows: Vec<Row>) -> QueryResult<Self> {
        for (i, row) in rows.iter().enumerate() {
            TypeValidator::validate_row(row, &schema).map_err(|e| {
                QueryError::SchemaError(format!("Table '{}' row {}: {}", schema.name(), i, e))
            })?;
        }
        self.put(schema, rows);
        Ok(self)
    }

    fn put(&mut self, schema: TableSchema, rows: Vec<Row>) {
        debug!("storing table '{}' with {} rows", schema.name(), rows.len());
        self.tables.insert(schema.name().to_string(), StoredTable {
            schema,
            rows: Arc::new(rows),
        });
    }

    fn table(&self, table: &str) -> QueryResult<&StoredTable> {
        self.tables
            .get(table)
            .ok_or_else(|| QueryError::SchemaError(format!("Unknown table '{}'", table)))
    }

    pub fn schema(&self, table: &str) -> QueryResult<&TableSchema> {
        Ok(&self.table(table)?.schema)
    }

    /// Table names in insertion order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn row_count(&self, table: &str) -> QueryResult<usize> {
        Ok(self.table(table)?.rows.len())
    }

    /// Fresh scan over `table`, starting from its first row
    pub fn scan(&self, table: &str) -> QueryResult<BoxedOperator> {
        let stored = self.table(table)?;
        Ok(Box::new(TableScanOperator::new(table, Arc::clone(&stored.rows))))
    }

    /// Athletes derived from the results table, one per `athlete_id`, in
    /// order of first appearance
    pub fn athletes(&self) -> QueryResult<Vec<Athlete>> {
        let mut athletes: LinkedHashMap<i64, Athlete> = LinkedHashMap::new();
        for row in self.table(RESULTS_TABLE)?.rows.iter() {
            let athlete_id = match row.require("athlete_id")? {
                DataValue::Integer(id) => *id,
                other => return Err(QueryError::TypeError(format!("athlete_id is {}", other.type_name()))),
            };
            if athletes.contains_key(&athlete_id) {
                continue;
            }

            let athlete_name = text_field(row, "athlete_name")?.to_string();
            let sex = text_field(row, "sex")?.parse::<Sex>().map_err(QueryError::TypeError)?;
            athletes.insert(athlete_id, Athlete { athlete_id, athlete_name, sex });
        }
        Ok(athletes.into_iter().map(|(_, athlete)| athlete).collect())
    }
}

fn text_field<'r>(row: &'r Row, field: &str) -> QueryResult<&'r str> {
    row.require(field)?
        .as_text()
        .ok_or_else(|| QueryError::TypeError(format!("{} is not text", field)))
}
