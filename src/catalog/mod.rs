//! Catalog Module
//!
//! Schema metadata for the record store: column types, table schemas, the two
//! fixed tables of the athletics dataset and their typed records.

pub mod schema;
pub mod table;
pub mod column;
pub mod model;
pub mod validation;
mod validation_error;

// Re-export key types
pub use self::schema::DataType;
pub use self::table::TableSchema;
pub use self::column::Column;
pub use self::model::{Athlete, Event, Medal, ResultRecord, Sex};
pub use self::validation::TypeValidator;
pub use self::validation_error::{ValidationError, ValidationResult};

/// Name of the disciplines table
pub const EVENTS_TABLE: &str = "events";
/// Name of the participations table
pub const RESULTS_TABLE: &str = "results";

/// Schema of the `events` table
pub fn events_schema() -> TableSchema {
    TableSchema::new(EVENTS_TABLE, vec![
        Column::new("event_name", DataType::Text),
        Column::new("nb_editions", DataType::Integer).nullable(),
    ])
}

/// Schema of the `results` table
pub fn results_schema() -> TableSchema {
    TableSchema::new(RESULTS_TABLE, vec![
        Column::new("athlete_id", DataType::Integer),
        Column::new("athlete_name", DataType::Text),
        Column::new("event", DataType::Text),
        Column::new("year", DataType::Integer),
        Column::new("sex", DataType::Text),
        Column::new("noc", DataType::Text),
        Column::new("medal", DataType::Text),
    ])
}
