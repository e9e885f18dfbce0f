// Top-within-group Operator
//
// For every distinct group key this operator finds the maximum score and emits
// one row carrying every input row of the group that reaches it. Ties are all
// kept. The input is read once and buffered; the first pass computes the
// maxima, the second selects the champions.

use std::cmp::Ordering;

use linked_hash_map::LinkedHashMap;
use log::debug;

use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};
use crate::query::stage::CHAMPIONS_COLUMN;

pub struct TopWithinGroupOperator {
    input: BoxedOperator,
    group_key: String,
    score_field: String,
    initialized: bool,
    result_iter: Option<std::vec::IntoIter<Row>>,
}

impl TopWithinGroupOperator {
    pub fn new(input: BoxedOperator, group_key: String, score_field: String) -> Self {
        TopWithinGroupOperator {
            input,
            group_key,
            score_field,
            initialized: false,
            result_iter: None,
        }
    }

    fn select_champions(&mut self) -> QueryResult<Vec<Row>> {
        let mut rows = Vec::new();
        let mut maxima: LinkedHashMap<DataValue, DataValue> = LinkedHashMap::new();

        // Pass 1: maximum score per group
        while let Some(row) = self.input.next()? {
            let key = row.require(&self.group_key)?.clone();
            let score = row.require(&self.score_field)?;

            let replace = match maxima.get(&key) {
                None => true,
                Some(best) => best.compare(score)? == Ordering::Less,
            };
            if replace {
                maxima.insert(key, score.clone());
            }
            rows.push(row);
        }

        // Pass 2: keep the rows that reach their group's maximum
        let mut champions: LinkedHashMap<DataValue, Vec<Row>> = maxima.keys()
            .map(|k| (k.clone(), Vec::new()))
            .collect();
        for row in rows {
            let (Some(key), Some(score)) = (row.get(&self.group_key), row.get(&self.score_field)) else {
                continue;
            };
            let reaches_max = match maxima.get(key) {
                Some(best) => best.compare(score)? == Ordering::Equal,
                None => false,
            };
            if reaches_max {
                if let Some(list) = champions.get_mut(key) {
                    list.push(row.without(&self.group_key));
                }
            }
        }

        debug!("top-within-group on '{}' selected champions for {} groups", self.group_key, maxima.len());

        let output = maxima.into_iter()
            .map(|(key, best)| {
                let winners = champions.remove(&key).unwrap_or_default();
                let mut out = Row::new();
                out.set(self.group_key.clone(), key);
                out.set(self.score_field.clone(), best);
                out.set(CHAMPIONS_COLUMN.to_string(), DataValue::List(winners));
                out
            })
            .collect();
        Ok(output)
    }
}

impl Operator for TopWithinGroupOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.result_iter = None;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::ExecutionError("Operator not initialized".to_string()));
        }

        if self.result_iter.is_none() {
            let rows = self.select_champions()?;
            self.result_iter = Some(rows.into_iter());
        }

        Ok(self.result_iter.as_mut().and_then(|iter| iter.next()))
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        self.result_iter = None;
        self.input.close()
    }
}
