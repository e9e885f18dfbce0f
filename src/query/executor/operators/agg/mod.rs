// Aggregation Operators Module
//
// This module contains the grouping operators: hash-based GROUP BY with its
// aggregate functions, and the tie-inclusive best-of-group selection.

mod hash;
mod top;

pub use hash::HashAggregateOperator;
pub use top::TopWithinGroupOperator;
