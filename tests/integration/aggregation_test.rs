#[path = "../common/mod.rs"]
mod common;

use anyhow::Result;
use athledb::query::executor::operators::scan::TableScanOperator;
use athledb::query::stage::CHAMPIONS_COLUMN;
use athledb::query::{Aggregate, Predicate, SortKey, Stage};
use athledb::{DataValue, ExecutionEngine, Pipeline, QueryResult, RecordStore, Row};
use common::{fixture_store, int, text};

fn run_values(rows: Vec<Row>, pipeline: &Pipeline) -> QueryResult<Vec<Row>> {
    let store = RecordStore::empty();
    let engine = ExecutionEngine::new(&store);
    engine.run(Box::new(TableScanOperator::from_rows(rows)), pipeline.stages())?.collect()
}

fn scored(group: &str, name: &str, score: i64) -> Row {
    Row::from_pairs([
        ("g", DataValue::from(group)),
        ("name", DataValue::from(name)),
        ("score", DataValue::Integer(score)),
    ])
}

#[test]
fn test_top_within_group_keeps_ties() -> Result<()> {
    let rows = vec![scored("A", "x", 3), scored("A", "y", 3), scored("A", "z", 1)];
    let output = run_values(rows, &Pipeline::new().top_within_group("g", "score"))?;

    assert_eq!(output.len(), 1);
    assert_eq!(text(&output[0], "g"), "A");
    assert_eq!(int(&output[0], "score"), 3);

    let champions = output[0].get(CHAMPIONS_COLUMN).and_then(|v| v.as_list()).unwrap_or_default();
    let names: Vec<&str> = champions.iter().map(|c| text(c, "name")).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert!(champions.iter().all(|c| c.get("g").is_none()));
    Ok(())
}

#[test]
fn test_top_within_group_one_row_per_group() -> Result<()> {
    let rows = vec![
        scored("A", "x", 1),
        scored("B", "y", 7),
        scored("A", "z", 4),
        scored("C", "w", 0),
    ];
    let output = run_values(rows, &Pipeline::new().top_within_group("g", "score"))?;
    let groups: Vec<(&str, i64)> = output.iter().map(|r| (text(r, "g"), int(r, "score"))).collect();
    assert_eq!(groups, vec![("A", 4), ("B", 7), ("C", 0)]);
    Ok(())
}

#[test]
fn test_regrouping_keeps_group_count() -> Result<()> {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let once = Pipeline::new().group_by(&["noc"], vec![Aggregate::count("n")]);
    let twice = once.clone().group_by(&["noc"], vec![Aggregate::count("groups")]);

    let first = engine.run_table("results", once.stages())?.into_result_set()?;
    let second = engine.run_table("results", twice.stages())?.into_result_set()?;
    assert_eq!(first.row_count(), second.row_count());
    assert!(second.rows().iter().all(|r| int(r, "groups") == 1));
    Ok(())
}

#[test]
fn test_distinct_count_counts_each_value_once() -> Result<()> {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let pipeline = Pipeline::new().distinct_count("noc", "countries");
    let result = engine.run_table("results", pipeline.stages())?.into_result_set()?;
    assert_eq!(result.columns(), &["countries"]);
    assert_eq!(int(&result.rows()[0], "countries"), 4);
    Ok(())
}

#[test]
fn test_distinct_count_over_nothing_is_zero() -> Result<()> {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let pipeline = Pipeline::new()
        .filter(Predicate::new().lt("year", 1900))
        .distinct_count("athlete_id", "total");
    let result = engine.run_table("results", pipeline.stages())?.into_result_set()?;
    assert_eq!(result.row_count(), 1);
    assert_eq!(int(&result.rows()[0], "total"), 0);
    Ok(())
}

#[test]
fn test_group_by_numeric_aggregates() -> Result<()> {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let pipeline = Pipeline::new()
        .group_by(&["athlete_name"], vec![
            Aggregate::min("year", "first"),
            Aggregate::max("year", "last"),
            Aggregate::count_distinct("event", "events"),
        ])
        .sort(vec![SortKey::asc("athlete_name")]);
    let result = engine.run_table("results", pipeline.stages())?.into_result_set()?;

    let carl = result.rows().iter().find(|r| text(r, "athlete_name") == "Carl").unwrap();
    assert_eq!(int(carl, "first"), 2000);
    assert_eq!(int(carl, "last"), 2004);
    assert_eq!(int(carl, "events"), 2);
    Ok(())
}

#[test]
fn test_collect_aggregate_builds_lists() -> Result<()> {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let pipeline = Pipeline::new()
        .filter(Predicate::new().eq("event", "Decathlon, Men"))
        .group_by(&["year"], vec![Aggregate::collect(&["athlete_name", "medal"], "entrants")]);
    let result = engine.run_table("results", pipeline.stages())?.into_result_set()?;

    let year_2000 = result.rows().iter().find(|r| int(r, "year") == 2000).unwrap();
    let entrants = year_2000.get("entrants").and_then(|v| v.as_list()).unwrap_or_default();
    let names: Vec<&str> = entrants.iter().map(|e| text(e, "athlete_name")).collect();
    assert_eq!(names, vec!["Bruno", "Carl"]);
    Ok(())
}

#[test]
fn test_group_by_unknown_key_fails_statically() {
    let store = fixture_store();
    let engine = ExecutionEngine::new(&store);
    let stages = [Stage::GroupBy { keys: vec!["country".to_string()], aggregates: vec![] }];
    let err = engine.run_table("results", &stages).err();
    assert!(matches!(
        err.as_ref().map(|e| e.root_cause()),
        Some(athledb::QueryError::SchemaError(_))
    ));
}
