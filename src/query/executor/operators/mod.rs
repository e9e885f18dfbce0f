// Query Operators Module
//
// This module defines the operators used for pipeline execution in the
// iterator-based execution model. Every pipeline stage maps to one operator
// that pulls rows from the operator before it.

pub mod scan;
pub mod filter;
pub mod project;
pub mod sort;
pub mod limit;
pub mod agg;

use crate::query::executor::result::{Row, QueryResult};
use crate::query::stage::{Aggregate, Predicate, ProjectField, SortKey};

/// The Operator trait defines the interface for all query execution operators
/// in the iterator-based execution model. Each operator processes rows and
/// passes them to the next operator in the pipeline.
pub trait Operator: Send {
    /// Initialize the operator before execution
    fn init(&mut self) -> QueryResult<()>;

    /// Get the next row of data from this operator
    fn next(&mut self) -> QueryResult<Option<Row>>;

    /// Close the operator and release any resources
    fn close(&mut self) -> QueryResult<()>;
}

/// Owned operator handle; each operator exclusively owns its input
pub type BoxedOperator = Box<dyn Operator>;

// Factory functions for creating operators
pub fn create_filter(input: BoxedOperator, predicate: Predicate) -> BoxedOperator {
    Box::new(filter::FilterOperator::new(input, predicate))
}

pub fn create_projection(input: BoxedOperator, fields: Vec<ProjectField>) -> BoxedOperator {
    Box::new(project::ProjectionOperator::new(input, fields))
}

pub fn create_sort(input: BoxedOperator, keys: Vec<SortKey>) -> BoxedOperator {
    Box::new(sort::SortOperator::new(input, keys))
}

pub fn create_limit(input: BoxedOperator, limit: i64) -> QueryResult<BoxedOperator> {
    Ok(Box::new(limit::LimitOperator::new(input, limit)?))
}

pub fn create_hash_aggregate(input: BoxedOperator, keys: Vec<String>, aggregates: Vec<Aggregate>) -> BoxedOperator {
    Box::new(agg::HashAggregateOperator::new(input, keys, aggregates))
}

pub fn create_top_within_group(input: BoxedOperator, group_key: String, score_field: String) -> BoxedOperator {
    Box::new(agg::TopWithinGroupOperator::new(input, group_key, score_field))
}
