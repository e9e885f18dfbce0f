// Limit Operator Implementation
//
// Passes through at most `limit` rows. Once the limit is reached it stops
// pulling from its input, so an upstream streaming chain is never read past
// what is needed.

use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{QueryError, QueryResult, Row};

pub struct LimitOperator {
    input: BoxedOperator,
    limit: usize,
    emitted: usize,
    initialized: bool,
}

impl LimitOperator {
    /// Create a limit operator; a negative limit fails with `ValidationError`
    pub fn new(input: BoxedOperator, limit: i64) -> QueryResult<Self> {
        let limit = usize::try_from(limit).map_err(|_| {
            QueryError::ValidationError(format!("Limit must be non-negative, got {}", limit))
        })?;

        Ok(LimitOperator {
            input,
            limit,
            emitted: 0,
            initialized: false,
        })
    }
}

impl Operator for LimitOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.emitted = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::ExecutionError("Operator not initialized".to_string()));
        }

        if self.emitted >= self.limit {
            return Ok(None);
        }

        let row = self.input.next()?;
        if row.is_some() {
            self.emitted += 1;
        }
        Ok(row)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        self.input.close()
    }
}
