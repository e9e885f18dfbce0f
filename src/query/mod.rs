// Query Processing Module
//
// This module contains the pipeline stages, the pipeline builder and the
// executor that runs them.

pub mod stage;
pub mod pipeline;
pub mod executor;

// Export key public interfaces
pub use stage::{Aggregate, CompareOp, Predicate, ProjectField, SortKey, Stage};
pub use pipeline::Pipeline;
pub use executor::engine::{ExecutionEngine, RowStream};
pub use executor::result::{QueryError, QueryResult};
