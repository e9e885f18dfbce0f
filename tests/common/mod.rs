#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use athledb::catalog::{Event, Medal, ResultRecord, Sex};
use athledb::{DataValue, RecordStore, Row};

pub fn result(id: i64, name: &str, event: &str, year: i64, sex: Sex, noc: &str, medal: Medal) -> ResultRecord {
    ResultRecord {
        athlete_id: id,
        athlete_name: name.to_string(),
        event: event.to_string(),
        year,
        sex,
        noc: noc.to_string(),
        medal,
    }
}

pub fn fixture_events() -> Vec<Event> {
    vec![
        Event::new("100m, Women", 20),
        Event::new("200m, Women", 18),
        Event::new("Decathlon, Men", 25),
        Event::new("100m, Men", 29),
        Event::new("Aeronautics", 1),
        Event::new("Tug-Of-War, Men", 6),
        // Merged in from the world championships, no edition count
        Event::unnumbered("100 Metres Men"),
    ]
}

pub fn fixture_results() -> Vec<ResultRecord> {
    use Medal::*;
    use Sex::*;
    vec![
        result(1, "Alice", "100m, Women", 1996, Female, "USA", Gold),
        result(1, "Alice", "200m, Women", 1996, Female, "USA", Silver),
        result(1, "Alice", "100m, Women", 2000, Female, "USA", NoMedal),
        result(1, "Alice", "200m, Women", 2000, Female, "USA", Gold),
        result(2, "Bruno", "Decathlon, Men", 1996, Male, "FRA", Bronze),
        result(2, "Bruno", "Decathlon, Men", 2000, Male, "FRA", Gold),
        result(3, "Carl", "Decathlon, Men", 2000, Male, "USA", Silver),
        result(3, "Carl", "100m, Men", 2000, Male, "USA", Gold),
        result(4, "Dina", "100m, Women", 1996, Female, "JAM", Bronze),
        result(4, "Dina", "100m, Women", 2000, Female, "JAM", Gold),
        result(5, "Eve", "200m, Women", 2000, Female, "FRA", NoMedal),
        result(6, "Femi", "Decathlon, Men", 1996, Male, "NGR", NoMedal),
        result(3, "Carl", "Decathlon, Men", 2004, Male, "USA", Bronze),
    ]
}

// Small dataset with hand-computed answers for every catalog query
pub fn fixture_store() -> RecordStore {
    RecordStore::new(fixture_events(), fixture_results())
}

// Write the fixture as an events JSON array and a results JSON Lines file
pub fn write_fixture_files(dir: &Path) -> Result<()> {
    std::fs::write(dir.join("events.json"), serde_json::to_string_pretty(&fixture_events())?)?;

    let mut lines = String::new();
    for record in fixture_results() {
        lines.push_str(&serde_json::to_string(&record)?);
        lines.push('\n');
    }
    std::fs::write(dir.join("results.json"), lines)?;
    Ok(())
}

pub fn int(row: &Row, column: &str) -> i64 {
    row.get(column)
        .and_then(DataValue::as_integer)
        .unwrap_or_else(|| panic!("no integer '{}' in {}", column, row))
}

pub fn text<'r>(row: &'r Row, column: &str) -> &'r str {
    row.get(column)
        .and_then(DataValue::as_text)
        .unwrap_or_else(|| panic!("no text '{}' in {}", column, row))
}

// Rows built from plain integer ids, for pipelines over ad-hoc data
pub fn id_rows(ids: impl IntoIterator<Item = i64>) -> Vec<Row> {
    ids.into_iter().map(|id| Row::from_pairs([("id", id)])).collect()
}
