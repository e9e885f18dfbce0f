// Query Execution Engine Implementation
//
// This module turns a sequence of pipeline stages into a chain of operators
// and runs it. Each stage's operator is wrapped so that its first failure is
// reported together with the stage position and kind.

use log::{debug, info};

use crate::query::executor::operators::{self, BoxedOperator, Operator};
use crate::query::executor::result::{QueryResult, QueryResultSet, Row};
use crate::query::stage::{Aggregate, Stage};
use crate::queries::NamedQuery;
use crate::storage::RecordStore;

/// Attributes errors of one stage's operator to that stage
struct StageOperator {
    inner: BoxedOperator,
    index: usize,
    stage: &'static str,
    emitted: usize,
}

impl StageOperator {
    fn wrap(inner: BoxedOperator, index: usize, stage: &'static str) -> BoxedOperator {
        Box::new(StageOperator { inner, index, stage, emitted: 0 })
    }
}

impl Operator for StageOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.emitted = 0;
        self.inner.init().map_err(|e| e.in_stage(self.index, self.stage))
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        match self.inner.next() {
            Ok(Some(row)) => {
                self.emitted += 1;
                Ok(Some(row))
            }
            Ok(None) => {
                debug!("stage {} ({}) produced {} rows", self.index, self.stage, self.emitted);
                Ok(None)
            }
            Err(e) => Err(e.in_stage(self.index, self.stage)),
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.inner.close().map_err(|e| e.in_stage(self.index, self.stage))
    }
}

/// Lazy sequence of pipeline output rows.
///
/// Rows are produced on demand by pulling the last operator of the chain. The
/// first error ends the stream: it is yielded once and every later call
/// returns `None`.
pub struct RowStream {
    root: Option<BoxedOperator>,
    columns: Option<Vec<String>>,
}

impl RowStream {
    fn new(root: BoxedOperator, columns: Option<Vec<String>>) -> Self {
        RowStream { root: Some(root), columns }
    }

    /// Output columns when known before execution
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Drain the stream into a result set.
    ///
    /// On failure the error is returned and rows produced before it are
    /// discarded.
    pub fn into_result_set(mut self) -> QueryResult<QueryResultSet> {
        let mut rows = Vec::new();
        for row in self.by_ref() {
            rows.push(row?);
        }

        let columns = match self.columns.take() {
            Some(columns) => columns,
            None => rows.first().map(|r| r.columns().to_vec()).unwrap_or_default(),
        };
        let mut result_set = QueryResultSet::new(columns);
        for row in rows {
            result_set.add_row(row);
        }
        Ok(result_set)
    }

    fn finish(&mut self) {
        if let Some(mut root) = self.root.take() {
            // Nothing to report here: closing only releases buffered rows
            let _ = root.close();
        }
    }
}

impl Iterator for RowStream {
    type Item = QueryResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let root = self.root.as_mut()?;
        match root.next() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Builds and runs stage pipelines against a record store
pub struct ExecutionEngine<'a> {
    store: &'a RecordStore,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        ExecutionEngine { store }
    }

    /// Run `stages` over the rows produced by `source`.
    ///
    /// Stage parameters are checked before anything executes; an invalid
    /// parameter fails as a `StageError` for that stage.
    pub fn run(&self, source: BoxedOperator, stages: &[Stage]) -> QueryResult<RowStream> {
        let root = Self::build(source, stages)?;
        Self::start(root, None)
    }

    /// Scan `table` and run `stages` over it.
    ///
    /// Every field reference is checked against the table schema propagated
    /// through the stages, so a pipeline that names a field no row can carry
    /// fails with `SchemaError` before any row is read.
    pub fn run_table(&self, table: &str, stages: &[Stage]) -> QueryResult<RowStream> {
        let schema = self.store.schema(table)?;
        let columns = Self::output_columns(schema.column_names(), stages)?;
        let source = self.store.scan(table)?;
        let root = Self::build(source, stages)?;
        Self::start(root, Some(columns))
    }

    /// Run a catalog query to completion, binding `argument` if it takes one
    pub fn execute(&self, query: &NamedQuery, argument: Option<&str>) -> QueryResult<QueryResultSet> {
        let pipeline = query.pipeline(argument)?;
        debug!("executing {} ({}) on '{}': {}", query.id, query.name, query.table, pipeline);
        let result = self.run_table(query.table, pipeline.stages())?.into_result_set()?;
        info!("{} returned {} rows", query.id, result.row_count());
        Ok(result)
    }

    /// Propagate a column list through the stages, validating each one
    pub fn output_columns(input: Vec<String>, stages: &[Stage]) -> QueryResult<Vec<String>> {
        let mut columns = input;
        for (index, stage) in stages.iter().enumerate() {
            stage.validate().map_err(|e| e.in_stage(index, stage.name()))?;
            columns = stage.output_columns(&columns).map_err(|e| e.in_stage(index, stage.name()))?;
        }
        Ok(columns)
    }

    fn build(source: BoxedOperator, stages: &[Stage]) -> QueryResult<BoxedOperator> {
        let mut current = source;
        for (index, stage) in stages.iter().enumerate() {
            stage.validate().map_err(|e| e.in_stage(index, stage.name()))?;
            debug!("stage {}: {}", index, stage);
            let op = Self::create_operator(current, stage).map_err(|e| e.in_stage(index, stage.name()))?;
            current = StageOperator::wrap(op, index, stage.name());
        }
        Ok(current)
    }

    fn create_operator(input: BoxedOperator, stage: &Stage) -> QueryResult<BoxedOperator> {
        let op = match stage {
            Stage::Filter(predicate) => operators::create_filter(input, predicate.clone()),
            Stage::Project(fields) => operators::create_projection(input, fields.clone()),
            Stage::GroupBy { keys, aggregates } => {
                operators::create_hash_aggregate(input, keys.clone(), aggregates.clone())
            }
            Stage::DistinctCount { field, output } => operators::create_hash_aggregate(
                input,
                Vec::new(),
                vec![Aggregate::count_distinct(field, output)],
            ),
            Stage::Sort(keys) => operators::create_sort(input, keys.clone()),
            Stage::Limit(n) => operators::create_limit(input, *n)?,
            Stage::TopWithinGroup { group_key, score_field } => {
                operators::create_top_within_group(input, group_key.clone(), score_field.clone())
            }
        };
        Ok(op)
    }

    fn start(mut root: BoxedOperator, columns: Option<Vec<String>>) -> QueryResult<RowStream> {
        root.init()?;
        Ok(RowStream::new(root, columns))
    }
}
