#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use athledb::query::executor::operators::scan::TableScanOperator;
use athledb::query::executor::operators::Operator;
use athledb::query::{Aggregate, Predicate, ProjectField, SortKey, Stage};
use athledb::{DataValue, ExecutionEngine, Pipeline, QueryError, QueryResult, RecordStore, Row};
use common::{fixture_store, id_rows, int, text};

// Source that counts how many rows were pulled from it
struct CountingSource {
    rows: Vec<Row>,
    cursor: usize,
    pulled: Arc<AtomicUsize>,
}

impl CountingSource {
    fn new(rows: Vec<Row>) -> (Self, Arc<AtomicUsize>) {
        let pulled = Arc::new(AtomicUsize::new(0));
        (CountingSource { rows, cursor: 0, pulled: pulled.clone() }, pulled)
    }
}

impl Operator for CountingSource {
    fn init(&mut self) -> QueryResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        let row = self.rows.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
            self.pulled.fetch_add(1, Ordering::SeqCst);
        }
        Ok(row)
    }

    fn close(&mut self) -> QueryResult<()> {
        Ok(())
    }
}

fn run_values(rows: Vec<Row>, stages: &[Stage]) -> QueryResult<Vec<Row>> {
    let store = RecordStore::empty();
    let engine = ExecutionEngine::new(&store);
    engine.run(Box::new(TableScanOperator::from_rows(rows)), stages)?.collect()
}

#[test]
fn test_q6_style_end_to_end() -> Result<()> {
    let rows = vec![
        Row::from_pairs([("athlete_name", "Alice"), ("medal", "Gold")]),
        Row::from_pairs([("athlete_name", "Alice"), ("medal", "Silver")]),
        Row::from_pairs([("athlete_name", "Bob"), ("medal", "na")]),
        Row::from_pairs([("athlete_name", "Carl"), ("medal", "Bronze")]),
    ];
    let pipeline = Pipeline::new()
        .filter(Predicate::new().ne("medal", "na"))
        .group_by(&["athlete_name"], vec![Aggregate::count("total")])
        .sort(vec![SortKey::desc("total")])
        .limit(2);

    let output = run_values(rows, pipeline.stages())?;
    assert_eq!(output, vec![
        Row::from_pairs([("athlete_name", DataValue::from("Alice")), ("total", DataValue::Integer(2))]),
        Row::from_pairs([("athlete_name", DataValue::from("Carl")), ("total", DataValue::Integer(1))]),
    ]);
    Ok(())
}

#[test]
fn test_q8_style_end_to_end() -> Result<()> {
    let rows = vec![
        Row::from_pairs([("event_name", DataValue::from("Aeronautics")), ("nb_editions", DataValue::Integer(1))]),
        Row::from_pairs([("event_name", DataValue::from("Marathon")), ("nb_editions", DataValue::Integer(29))]),
    ];
    let pipeline = Pipeline::new()
        .filter(Predicate::new().lt("nb_editions", 10))
        .project(["event_name", "nb_editions"])
        .sort(vec![SortKey::asc("nb_editions")]);

    let output = run_values(rows, pipeline.stages())?;
    assert_eq!(output.len(), 1);
    assert_eq!(text(&output[0], "event_name"), "Aeronautics");
    assert_eq!(int(&output[0], "nb_editions"), 1);
    Ok(())
}

#[test]
fn test_limit_boundaries() -> Result<()> {
    for (input, limit, expected) in [(5, 0, 0), (5, 5, 5), (3, 5, 3), (8, 5, 5)] {
        let output = run_values(id_rows(0..input), &[Stage::Limit(limit)])?;
        assert_eq!(output.len(), expected, "{} rows limited to {}", input, limit);
    }
    Ok(())
}

#[test]
fn test_negative_limit_is_stage_error() {
    let result = run_values(id_rows(0..3), &[Stage::Limit(-1)]);
    match result {
        Err(QueryError::StageError { index, stage, source }) => {
            assert_eq!(index, 0);
            assert_eq!(stage, "Limit");
            assert!(matches!(*source, QueryError::ValidationError(_)));
        }
        other => panic!("expected a stage error, got {:?}", other),
    }
}

#[test]
fn test_limit_stops_pulling_through_streaming_stages() -> Result<()> {
    let store = RecordStore::empty();
    let engine = ExecutionEngine::new(&store);
    let (source, pulled) = CountingSource::new(id_rows(0..10_000));
    let stages = [
        Stage::Filter(Predicate::new().ge("id", 0)),
        Stage::Project(vec![ProjectField::renamed("id", "n")]),
        Stage::Limit(3),
    ];

    let rows: Vec<Row> = engine.run(Box::new(source), &stages)?.collect::<QueryResult<_>>()?;
    assert_eq!(rows.len(), 3);
    assert_eq!(pulled.load(Ordering::SeqCst), 3);
    Ok(())
}

#[test]
fn test_blocking_stage_reads_all_input() -> Result<()> {
    let store = RecordStore::empty();
    let engine = ExecutionEngine::new(&store);
    let (source, pulled) = CountingSource::new(id_rows(0..100));
    let stages = [Stage::Sort(vec![SortKey::desc("id")]), Stage::Limit(1)];

    let rows: Vec<Row> = engine.run(Box::new(source), &stages)?.collect::<QueryResult<_>>()?;
    assert_eq!(int(&rows[0], "id"), 99);
    assert_eq!(pulled.load(Ordering::SeqCst), 100);
    Ok(())
}

#[test]
fn test_failure_stops_the_stream() {
    let store = RecordStore::empty();
    let engine = ExecutionEngine::new(&store);
    let mut rows = id_rows(0..3);
    rows.insert(1, Row::from_pairs([("other", 1)]));
    let stages = [Stage::Filter(Predicate::new().ge("id", 0)), Stage::Limit(10)];

    let mut stream = engine.run(Box::new(TableScanOperator::from_rows(rows)), &stages).unwrap();
    assert!(matches!(stream.next(), Some(Ok(_))));
    match stream.next() {
        Some(Err(err)) => {
            assert!(matches!(err, QueryError::StageError { index: 0, .. }));
            assert!(matches!(err.root_cause(), QueryError::FieldError(f) if f == "id"));
        }
        other => panic!("expected an error, got {:?}", other),
    }
    assert!(stream.next().is_none());
}

#[test]
fn test_result_set_has_no_partial_rows() {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let stages = [
        Stage::Filter(Predicate::new().ne("medal", "na")),
        Stage::Project(vec![ProjectField::new("athlete_name")]),
        // text compared with an integer
        Stage::Filter(Predicate::new().lt("athlete_name", 2000)),
    ];
    let result = engine.run_table("results", &stages).and_then(|s| s.into_result_set());
    match result {
        Err(QueryError::StageError { index, source, .. }) => {
            assert_eq!(index, 2);
            assert!(matches!(*source, QueryError::TypeError(_)));
        }
        other => panic!("expected a stage error, got {:?}", other.map(|r| r.row_count())),
    }
}

#[test]
fn test_unknown_table() {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let result = engine.run_table("athletes", &[]);
    assert!(matches!(result.err(), Some(QueryError::SchemaError(msg)) if msg.contains("athletes")));
}

#[test]
fn test_static_validation_rejects_unknown_field() {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let stages = [
        Stage::GroupBy { keys: vec!["noc".to_string()], aggregates: vec![Aggregate::count("total")] },
        Stage::Sort(vec![SortKey::desc("medal")]),
    ];
    match engine.run_table("results", &stages).err() {
        Some(QueryError::StageError { index: 1, stage, source }) => {
            assert_eq!(stage, "Sort");
            assert!(matches!(*source, QueryError::SchemaError(_)));
        }
        other => panic!("expected a schema error, got {:?}", other),
    }
}

#[test]
fn test_scan_restarts_for_each_run() -> Result<()> {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let first = engine.run_table("events", &[])?.into_result_set()?;
    let second = engine.run_table("events", &[])?.into_result_set()?;
    assert_eq!(first.rows(), second.rows());
    assert_eq!(first.row_count(), 6);
    Ok(())
}
