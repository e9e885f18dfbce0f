// Sort Operator Implementation
//
// Blocking operator: reads its whole input on the first call to `next()`,
// sorts it with a stable multi-key sort and then hands rows out one by one.

use std::cmp::Ordering;

use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};
use crate::query::stage::{SortDirection, SortKey};

pub struct SortOperator {
    input: BoxedOperator,
    keys: Vec<SortKey>,
    initialized: bool,
    output_iter: Option<std::vec::IntoIter<Row>>,
}

impl SortOperator {
    pub fn new(input: BoxedOperator, keys: Vec<SortKey>) -> Self {
        SortOperator {
            input,
            keys,
            initialized: false,
            output_iter: None,
        }
    }

    /// Read all input rows and sort them.
    ///
    /// Sort keys are extracted up front so a missing field surfaces as a
    /// `FieldError` before sorting. `sort_by` is stable, rows with equal keys
    /// keep their input order.
    fn sort_input(&mut self) -> QueryResult<Vec<Row>> {
        let mut keyed: Vec<(Vec<DataValue>, Row)> = Vec::new();
        while let Some(row) = self.input.next()? {
            let key = self.keys.iter()
                .map(|k| row.require(&k.field).cloned())
                .collect::<QueryResult<Vec<_>>>()?;
            keyed.push((key, row));
        }

        // The comparator cannot return an error; keep the first one and report it after
        let mut comparison_error: Option<QueryError> = None;
        keyed.sort_by(|(a, _), (b, _)| {
            for ((va, vb), key) in a.iter().zip(b).zip(&self.keys) {
                match va.compare(vb) {
                    Ok(Ordering::Equal) => continue,
                    Ok(ord) => {
                        return match key.direction {
                            SortDirection::Ascending => ord,
                            SortDirection::Descending => ord.reverse(),
                        };
                    }
                    Err(e) => {
                        if comparison_error.is_none() {
                            comparison_error = Some(e);
                        }
                        return Ordering::Equal;
                    }
                }
            }
            Ordering::Equal
        });

        match comparison_error {
            Some(e) => Err(e),
            None => Ok(keyed.into_iter().map(|(_, row)| row).collect()),
        }
    }
}

impl Operator for SortOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.output_iter = None;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::ExecutionError("Operator not initialized".to_string()));
        }

        if self.output_iter.is_none() {
            let sorted = self.sort_input()?;
            self.output_iter = Some(sorted.into_iter());
        }

        Ok(self.output_iter.as_mut().and_then(|iter| iter.next()))
    }

    fn close(&mut self) -> QueryResult<()> {
        self.output_iter = None;
        self.initialized = false;
        self.input.close()
    }
}
