// Hash-based Aggregation Operator
//
// This operator implements aggregation using a hash table to group rows.
// Groups are kept in first-seen order so output is deterministic for a given
// input, although callers that need an order must still sort.

use std::collections::HashSet;
use std::cmp::Ordering;

use linked_hash_map::LinkedHashMap;
use log::debug;

use crate::query::executor::result::{Row, QueryResult, DataValue, QueryError};
use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::stage::{Aggregate, AggregateType};

/// Running state of one aggregate within one group
#[derive(Debug, Clone)]
enum AggregateState {
    Count(i64),
    CountWhere(i64),
    CountDistinct(HashSet<DataValue>),
    Sum(Option<DataValue>),
    Min(Option<DataValue>),
    Max(Option<DataValue>),
    Avg { sum: f64, count: i64 },
    Collect(Vec<Row>),
}

impl AggregateState {
    fn new(agg_type: &AggregateType) -> Self {
        match agg_type {
            AggregateType::Count => AggregateState::Count(0),
            AggregateType::CountWhere(_) => AggregateState::CountWhere(0),
            AggregateType::CountDistinct => AggregateState::CountDistinct(HashSet::new()),
            AggregateType::Sum => AggregateState::Sum(None),
            AggregateType::Min => AggregateState::Min(None),
            AggregateType::Max => AggregateState::Max(None),
            AggregateType::Avg => AggregateState::Avg { sum: 0.0, count: 0 },
            AggregateType::Collect(_) => AggregateState::Collect(Vec::new()),
        }
    }

    /// Update the aggregate with one input row
    fn update(&mut self, aggregate: &Aggregate, row: &Row) -> QueryResult<()> {
        if let AggregateState::Count(count) = self {
            *count += 1;
            return Ok(());
        }

        if let (AggregateState::CountWhere(count), AggregateType::CountWhere(predicate)) = (&mut *self, &aggregate.agg_type) {
            if predicate.evaluate(row)? {
                *count += 1;
            }
            return Ok(());
        }

        if let (AggregateState::Collect(items), AggregateType::Collect(fields)) = (&mut *self, &aggregate.agg_type) {
            let mut item = Row::new();
            for field in fields {
                item.set(field.clone(), row.require(field)?.clone());
            }
            items.push(item);
            return Ok(());
        }

        let column = aggregate.column.as_deref().ok_or_else(|| {
            QueryError::ValidationError(format!("Aggregate {} has no input column", aggregate.output_name))
        })?;
        let value = row.require(column)?;

        match self {
            AggregateState::CountDistinct(seen) => {
                // Null is a distinct value of its own
                if !seen.contains(value) {
                    seen.insert(value.clone());
                }
            }
            // NULLs are skipped by the numeric and ordering aggregates
            _ if matches!(value, DataValue::Null) => {}
            AggregateState::Sum(sum) => {
                *sum = Some(add(sum.take(), value)?);
            }
            AggregateState::Min(min) => {
                let replace = match min {
                    None => true,
                    Some(current) => current.compare(value)? == Ordering::Greater,
                };
                if replace {
                    *min = Some(value.clone());
                }
            }
            AggregateState::Max(max) => {
                let replace = match max {
                    None => true,
                    Some(current) => current.compare(value)? == Ordering::Less,
                };
                if replace {
                    *max = Some(value.clone());
                }
            }
            AggregateState::Avg { sum, count } => {
                *sum += numeric(value)?;
                *count += 1;
            }
            AggregateState::Count(_) | AggregateState::CountWhere(_) | AggregateState::Collect(_) => {}
        }
        Ok(())
    }

    /// Get the final aggregate value
    fn result(self) -> DataValue {
        match self {
            AggregateState::Count(count) | AggregateState::CountWhere(count) => DataValue::Integer(count),
            AggregateState::CountDistinct(seen) => DataValue::Integer(seen.len() as i64),
            AggregateState::Sum(sum) => sum.unwrap_or(DataValue::Integer(0)),
            AggregateState::Min(value) | AggregateState::Max(value) => value.unwrap_or(DataValue::Null),
            AggregateState::Avg { sum, count } => {
                if count > 0 {
                    DataValue::Float(sum / count as f64)
                } else {
                    DataValue::Null
                }
            }
            AggregateState::Collect(items) => DataValue::List(items),
        }
    }
}

fn numeric(value: &DataValue) -> QueryResult<f64> {
    match value {
        DataValue::Integer(i) => Ok(*i as f64),
        DataValue::Float(f) => Ok(*f),
        other => Err(QueryError::TypeError(format!("Cannot aggregate non-numeric value of type {}", other.type_name()))),
    }
}

fn add(sum: Option<DataValue>, value: &DataValue) -> QueryResult<DataValue> {
    match (sum, value) {
        (None, DataValue::Integer(i)) => Ok(DataValue::Integer(*i)),
        (None, DataValue::Float(f)) => Ok(DataValue::Float(*f)),
        (Some(DataValue::Integer(s)), DataValue::Integer(i)) => s.checked_add(*i)
            .map(DataValue::Integer)
            .ok_or_else(|| QueryError::TypeError("Integer overflow in sum".to_string())),
        (Some(DataValue::Integer(s)), DataValue::Float(f)) => Ok(DataValue::Float(s as f64 + f)),
        (Some(DataValue::Float(s)), DataValue::Integer(i)) => Ok(DataValue::Float(s + *i as f64)),
        (Some(DataValue::Float(s)), DataValue::Float(f)) => Ok(DataValue::Float(s + f)),
        (_, other) => Err(QueryError::TypeError(format!("Cannot sum non-numeric value of type {}", other.type_name()))),
    }
}

/// Key for the grouping hash table - combination of values from GROUP BY columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    values: Vec<DataValue>,
}

impl GroupKey {
    /// Extract a group key from a row based on column names
    fn from_row(row: &Row, columns: &[String]) -> QueryResult<Self> {
        let values = columns.iter()
            .map(|col| row.require(col).cloned())
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(GroupKey { values })
    }
}

/// HashAggregateOperator performs grouping and aggregation using a hash table
pub struct HashAggregateOperator {
    input: BoxedOperator,
    group_by_columns: Vec<String>,
    aggregates: Vec<Aggregate>,
    initialized: bool,
    result_iter: Option<std::vec::IntoIter<Row>>,
}

impl HashAggregateOperator {
    pub fn new(input: BoxedOperator, group_by_columns: Vec<String>, aggregates: Vec<Aggregate>) -> Self {
        HashAggregateOperator {
            input,
            group_by_columns,
            aggregates,
            initialized: false,
            result_iter: None,
        }
    }

    fn new_group(&self) -> Vec<AggregateState> {
        self.aggregates.iter().map(|a| AggregateState::new(&a.agg_type)).collect()
    }

    // Process all input and build the groups
    fn process_input(&mut self) -> QueryResult<Vec<Row>> {
        let mut groups: LinkedHashMap<GroupKey, Vec<AggregateState>> = LinkedHashMap::new();
        let mut input_rows = 0usize;

        while let Some(row) = self.input.next()? {
            input_rows += 1;
            let key = GroupKey::from_row(&row, &self.group_by_columns)?;
            if !groups.contains_key(&key) {
                let fresh = self.new_group();
                groups.insert(key.clone(), fresh);
            }
            if let Some(states) = groups.get_mut(&key) {
                for (state, aggregate) in states.iter_mut().zip(&self.aggregates) {
                    state.update(aggregate, &row)?;
                }
            }
        }

        // A keyless aggregate over no rows still produces its single group
        if groups.is_empty() && self.group_by_columns.is_empty() {
            groups.insert(GroupKey { values: Vec::new() }, self.new_group());
        }

        debug!("hash aggregate grouped {} rows into {} groups", input_rows, groups.len());

        let rows = groups.into_iter()
            .map(|(key, states)| {
                let mut row = Row::new();
                for (col, value) in self.group_by_columns.iter().zip(key.values) {
                    row.set(col.clone(), value);
                }
                for (aggregate, state) in self.aggregates.iter().zip(states) {
                    row.set(aggregate.output_name.clone(), state.result());
                }
                row
            })
            .collect();
        Ok(rows)
    }
}

impl Operator for HashAggregateOperator {
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
            let rows = self.process_input()?;
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
