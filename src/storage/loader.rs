// Dataset Loader
//
// Reads the two tables from JSON files. A file is either one JSON array of
// objects or one object per line (the format produced by mongoexport). Keys
// that are not part of a record, such as `_id`, are ignored.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::de::DeserializeOwned;

use crate::catalog::{Event, ResultRecord};
use crate::config::StoreConfig;
use crate::query::executor::result::{QueryError, QueryResult};
use crate::storage::RecordStore;

/// Decode records from JSON text, either an array or JSON Lines
pub fn parse_records<T: DeserializeOwned>(content: &str) -> QueryResult<Vec<T>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    let mut records = Vec::new();
    let mut blank_lines = 0;
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            blank_lines += 1;
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|e| QueryError::LoadError(format!("line {}: {}", number + 1, e)))?;
        records.push(record);
    }

    if blank_lines > 0 {
        warn!("skipped {} blank lines", blank_lines);
    }
    Ok(records)
}

/// Read and decode a JSON records file
pub fn read_records<T: DeserializeOwned>(path: &Path) -> QueryResult<Vec<T>> {
    let content = fs::read_to_string(path)
        .map_err(|e| QueryError::LoadError(format!("{}: {}", path.display(), e)))?;
    parse_records(&content).map_err(|e| match e {
        QueryError::LoadError(msg) => QueryError::LoadError(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

impl RecordStore {
    /// Load the events and results tables from the configured files
    pub fn load(config: &StoreConfig) -> QueryResult<Self> {
        let events: Vec<Event> = read_records(&config.events_path)?;
        let results: Vec<ResultRecord> = read_records(&config.results_path)?;
        info!(
            "loaded {} events from {} and {} results from {}",
            events.len(),
            config.events_path.display(),
            results.len(),
            config.results_path.display()
        );
        Ok(RecordStore::new(events, results))
    }
}
