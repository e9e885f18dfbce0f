// Query Executor Module
//
// This module is responsible for running stage pipelines and producing
// results. It implements the iterator-based execution model.

pub mod engine;
pub mod result;
pub mod operators;

// Export key types
pub use self::engine::{ExecutionEngine, RowStream};
pub use self::result::{DataValue, QueryError, QueryResult, QueryResultSet, Row};
pub use self::operators::Operator;
