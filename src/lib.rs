// AthleDB: aggregation and query engine over athletics results

pub mod catalog;
pub mod config;
pub mod output;
pub mod queries;
pub mod query;
pub mod storage;

// Re-export key items for convenient access
pub use config::{OutputFormat, StoreConfig};
pub use query::executor::engine::{ExecutionEngine, RowStream};
pub use query::executor::result::{DataValue, QueryError, QueryResult, QueryResultSet, Row};
pub use query::pipeline::Pipeline;
pub use query::stage::Stage;
pub use queries::{NamedQuery, QueryId, QueryParameter};
pub use storage::RecordStore;
