#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;

use anyhow::Result;
use athledb::query::executor::operators::scan::TableScanOperator;
use athledb::query::{Aggregate, SortKey};
use athledb::{DataValue, ExecutionEngine, Pipeline, QueryResult, RecordStore, Row};
use common::int;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROUNDS: usize = 20;

fn run_values(rows: Vec<Row>, pipeline: &Pipeline) -> QueryResult<Vec<Row>> {
    let store = RecordStore::empty();
    let engine = ExecutionEngine::new(&store);
    engine.run(Box::new(TableScanOperator::from_rows(rows)), pipeline.stages())?.collect()
}

// Rows with a small-range key so that duplicates and ties are frequent
fn random_rows(rng: &mut StdRng, len: usize) -> Vec<Row> {
    (0..len)
        .map(|seq| Row::from_pairs([
            ("seq", DataValue::Integer(seq as i64)),
            ("key", DataValue::Integer(rng.gen_range(0..8))),
            ("group", DataValue::from(["a", "b", "c"][rng.gen_range(0..3)])),
        ]))
        .collect()
}

#[test]
fn test_distinct_count_is_set_cardinality() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..ROUNDS {
        let len = rng.gen_range(0..200);
        let rows = random_rows(&mut rng, len);
        let expected: HashSet<DataValue> = rows.iter().filter_map(|r| r.get("key").cloned()).collect();

        let output = run_values(rows, &Pipeline::new().distinct_count("key", "n"))?;
        assert_eq!(output.len(), 1);
        assert_eq!(int(&output[0], "n"), expected.len() as i64);
    }
    Ok(())
}

#[test]
fn test_sort_is_stable() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..ROUNDS {
        let len = rng.gen_range(0..200);
        let rows = random_rows(&mut rng, len);
        let output = run_values(rows, &Pipeline::new().sort(vec![SortKey::desc("key")]))?;

        assert_eq!(output.len(), len);
        for pair in output.windows(2) {
            let (k0, k1) = (int(&pair[0], "key"), int(&pair[1], "key"));
            assert!(k0 >= k1);
            if k0 == k1 {
                assert!(int(&pair[0], "seq") < int(&pair[1], "seq"), "equal keys reordered");
            }
        }
    }
    Ok(())
}

#[test]
fn test_regroup_preserves_group_count() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..ROUNDS {
        let len = rng.gen_range(0..200);
        let rows = random_rows(&mut rng, len);
        let once = Pipeline::new().group_by(&["group", "key"], vec![Aggregate::count("n")]);
        let twice = once.clone().group_by(&["group", "key"], vec![]);

        let first = run_values(rows.clone(), &once)?;
        let second = run_values(rows, &twice)?;
        assert_eq!(first.len(), second.len());
    }
    Ok(())
}

#[test]
fn test_group_counts_sum_to_input_size() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..ROUNDS {
        let len = rng.gen_range(0..200);
        let rows = random_rows(&mut rng, len);
        let output = run_values(rows, &Pipeline::new().group_by(&["group"], vec![Aggregate::count("n")]))?;
        let total: i64 = output.iter().map(|r| int(r, "n")).sum();
        assert_eq!(total, len as i64);
    }
    Ok(())
}

#[test]
fn test_limit_is_min_of_n_and_input() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(19);
    for _ in 0..ROUNDS {
        let len = rng.gen_range(0..50);
        let limit = rng.gen_range(0..60);
        let rows = random_rows(&mut rng, len);
        let output = run_values(rows, &Pipeline::new().limit(limit as i64))?;
        assert_eq!(output.len(), len.min(limit));
        assert!(output.iter().enumerate().all(|(i, r)| int(r, "seq") == i as i64));
    }
    Ok(())
}

#[test]
fn test_top_within_group_scores_are_group_maxima() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..ROUNDS {
        let len = rng.gen_range(1..200);
        let rows = random_rows(&mut rng, len);
        let output = run_values(rows.clone(), &Pipeline::new().top_within_group("group", "key"))?;

        for top in &output {
            let group = top.get("group").cloned();
            let best = int(top, "key");
            let members: Vec<&Row> = rows.iter().filter(|r| r.get("group").cloned() == group).collect();
            let expected_max = members.iter().map(|r| int(r, "key")).max().unwrap_or_default();
            let expected_ties = members.iter().filter(|r| int(r, "key") == expected_max).count();

            assert_eq!(best, expected_max);
            let champions = top.get("champions").and_then(|v| v.as_list()).unwrap_or_default();
            assert_eq!(champions.len(), expected_ties);
        }
    }
    Ok(())
}
