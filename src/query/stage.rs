// Pipeline Stage Definitions
//
// A pipeline is an ordered list of `Stage` values. Each variant carries its
// parameters; the execution engine turns it into an operator. Stages can also
// describe the columns they produce so a pipeline can be checked against a
// table schema before any row is read.

use std::collections::HashSet;
use std::fmt;

use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};

/// Output column of `TopWithinGroup` holding the tied entities
pub const CHAMPIONS_COLUMN: &str = "champions";

/// Comparison used by a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Apply the comparison. Equality never fails; ordering comparisons between
    /// incompatible types fail with `TypeError`. An ordering comparison with a
    /// `Null` side never matches.
    pub fn evaluate(&self, left: &DataValue, right: &DataValue) -> QueryResult<bool> {
        use std::cmp::Ordering;

        let ordering = !matches!(self, CompareOp::Eq | CompareOp::Ne);
        if ordering && (matches!(left, DataValue::Null) || matches!(right, DataValue::Null)) {
            return Ok(false);
        }

        match self {
            CompareOp::Eq => Ok(left == right),
            CompareOp::Ne => Ok(left != right),
            CompareOp::Lt => Ok(left.compare(right)? == Ordering::Less),
            CompareOp::Le => Ok(left.compare(right)? != Ordering::Greater),
            CompareOp::Gt => Ok(left.compare(right)? == Ordering::Greater),
            CompareOp::Ge => Ok(left.compare(right)? != Ordering::Less),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A single test on one named field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: String,
        op: CompareOp,
        value: DataValue,
    },
    /// Membership in a fixed set of values
    In {
        field: String,
        values: Vec<DataValue>,
    },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Compare { field, .. } | Condition::In { field, .. } => field,
        }
    }

    fn evaluate(&self, value: &DataValue) -> QueryResult<bool> {
        match self {
            Condition::Compare { op, value: constant, .. } => op.evaluate(value, constant),
            Condition::In { values, .. } => Ok(values.contains(value)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { field, op, value } => write!(f, "{} {} {}", field, op.symbol(), value),
            Condition::In { field, values } => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} in [{}]", field, items.join(", "))
            }
        }
    }
}

/// Conjunction of conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// An empty predicate accepts every row
    pub fn new() -> Self {
        Predicate { conditions: Vec::new() }
    }

    pub fn compare(mut self, field: &str, op: CompareOp, value: impl Into<DataValue>) -> Self {
        self.conditions.push(Condition::Compare {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.compare(field, CompareOp::Eq, value)
    }

    pub fn ne(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.compare(field, CompareOp::Ne, value)
    }

    pub fn lt(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.compare(field, CompareOp::Lt, value)
    }

    pub fn le(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.compare(field, CompareOp::Le, value)
    }

    pub fn gt(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.compare(field, CompareOp::Gt, value)
    }

    pub fn ge(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.compare(field, CompareOp::Ge, value)
    }

    pub fn is_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DataValue>,
    {
        self.conditions.push(Condition::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluate the predicate against a row.
    ///
    /// Every referenced field must be present, even when an earlier condition
    /// already rejected the row.
    pub fn evaluate(&self, row: &Row) -> QueryResult<bool> {
        let values = self.conditions
            .iter()
            .map(|c| row.require(c.field()))
            .collect::<QueryResult<Vec<_>>>()?;

        for (condition, value) in self.conditions.iter().zip(values) {
            if !condition.evaluate(value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "true");
        }
        let parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" AND "))
    }
}

/// A projected field, optionally renamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectField {
    pub source: String,
    pub alias: String,
}

impl ProjectField {
    pub fn new(source: &str) -> Self {
        ProjectField {
            source: source.to_string(),
            alias: source.to_string(),
        }
    }

    pub fn renamed(source: &str, alias: &str) -> Self {
        ProjectField {
            source: source.to_string(),
            alias: alias.to_string(),
        }
    }
}

impl From<&str> for ProjectField {
    fn from(source: &str) -> Self {
        ProjectField::new(source)
    }
}

/// Types of supported aggregate functions
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateType {
    Count,
    /// Number of rows of the group matching the predicate
    CountWhere(Predicate),
    CountDistinct,
    Sum,
    Min,
    Max,
    Avg,
    /// List of per-row projections onto the given fields
    Collect(Vec<String>),
}

/// One aggregate computed per group
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub agg_type: AggregateType,
    /// Input column; `None` for `Count`, `CountWhere` and `Collect`
    pub column: Option<String>,
    pub output_name: String,
}

impl Aggregate {
    pub fn count(output_name: &str) -> Self {
        Aggregate {
            agg_type: AggregateType::Count,
            column: None,
            output_name: output_name.to_string(),
        }
    }

    pub fn count_where(predicate: Predicate, output_name: &str) -> Self {
        Aggregate {
            agg_type: AggregateType::CountWhere(predicate),
            column: None,
            output_name: output_name.to_string(),
        }
    }

    pub fn count_distinct(column: &str, output_name: &str) -> Self {
        Self::over(AggregateType::CountDistinct, column, output_name)
    }

    pub fn sum(column: &str, output_name: &str) -> Self {
        Self::over(AggregateType::Sum, column, output_name)
    }

    pub fn min(column: &str, output_name: &str) -> Self {
        Self::over(AggregateType::Min, column, output_name)
    }

    pub fn max(column: &str, output_name: &str) -> Self {
        Self::over(AggregateType::Max, column, output_name)
    }

    pub fn avg(column: &str, output_name: &str) -> Self {
        Self::over(AggregateType::Avg, column, output_name)
    }

    pub fn collect(fields: &[&str], output_name: &str) -> Self {
        Aggregate {
            agg_type: AggregateType::Collect(fields.iter().map(|f| f.to_string()).collect()),
            column: None,
            output_name: output_name.to_string(),
        }
    }

    fn over(agg_type: AggregateType, column: &str, output_name: &str) -> Self {
        Aggregate {
            agg_type,
            column: Some(column.to_string()),
            output_name: output_name.to_string(),
        }
    }

    /// Input fields this aggregate reads
    pub fn input_fields(&self) -> Vec<&str> {
        match (&self.agg_type, &self.column) {
            (AggregateType::Collect(fields), _) => fields.iter().map(String::as_str).collect(),
            (AggregateType::CountWhere(predicate), _) => predicate.conditions().iter().map(|c| c.field()).collect(),
            (_, Some(column)) => vec![column.as_str()],
            (_, None) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        SortKey { field: field.to_string(), direction: SortDirection::Ascending }
    }

    pub fn desc(field: &str) -> Self {
        SortKey { field: field.to_string(), direction: SortDirection::Descending }
    }
}

/// One transformation of a pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Filter(Predicate),
    Project(Vec<ProjectField>),
    GroupBy {
        keys: Vec<String>,
        aggregates: Vec<Aggregate>,
    },
    /// Keyless group with a single distinct count named `output`
    DistinctCount {
        field: String,
        output: String,
    },
    Sort(Vec<SortKey>),
    /// Signed so that a negative count can be reported instead of wrapping
    Limit(i64),
    TopWithinGroup {
        group_key: String,
        score_field: String,
    },
}

impl Stage {
    /// Short stage kind name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Filter(_) => "Filter",
            Stage::Project(_) => "Project",
            Stage::GroupBy { .. } => "GroupBy",
            Stage::DistinctCount { .. } => "DistinctCount",
            Stage::Sort(_) => "Sort",
            Stage::Limit(_) => "Limit",
            Stage::TopWithinGroup { .. } => "TopWithinGroup",
        }
    }

    /// Check the stage's own parameters, independent of any input
    pub fn validate(&self) -> QueryResult<()> {
        match self {
            Stage::Limit(n) if *n < 0 => Err(QueryError::ValidationError(
                format!("Limit must be non-negative, got {}", n)
            )),
            Stage::Project(fields) if fields.is_empty() => Err(QueryError::ValidationError(
                "Project needs at least one field".to_string()
            )),
            Stage::Project(fields) => ensure_unique(fields.iter().map(|f| f.alias.as_str())),
            Stage::Sort(keys) if keys.is_empty() => Err(QueryError::ValidationError(
                "Sort needs at least one key".to_string()
            )),
            Stage::GroupBy { keys, aggregates } => {
                for agg in aggregates {
                    if let AggregateType::Collect(fields) = &agg.agg_type {
                        if fields.is_empty() {
                            return Err(QueryError::ValidationError(
                                format!("Collect aggregate {} needs at least one field", agg.output_name)
                            ));
                        }
                    }
                }
                ensure_unique(
                    keys.iter().map(String::as_str)
                        .chain(aggregates.iter().map(|a| a.output_name.as_str()))
                )
            }
            Stage::TopWithinGroup { group_key, score_field } if group_key == score_field => Err(
                QueryError::ValidationError("TopWithinGroup group key and score must differ".to_string())
            ),
            _ => Ok(()),
        }
    }

    /// Fields this stage reads from its input rows
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            Stage::Filter(predicate) => predicate.conditions().iter().map(|c| c.field()).collect(),
            Stage::Project(fields) => fields.iter().map(|f| f.source.as_str()).collect(),
            Stage::GroupBy { keys, aggregates } => keys.iter()
                .map(String::as_str)
                .chain(aggregates.iter().flat_map(|a| a.input_fields()))
                .collect(),
            Stage::DistinctCount { field, .. } => vec![field.as_str()],
            Stage::Sort(keys) => keys.iter().map(|k| k.field.as_str()).collect(),
            Stage::Limit(_) => Vec::new(),
            Stage::TopWithinGroup { group_key, score_field } => vec![group_key.as_str(), score_field.as_str()],
        }
    }

    /// Columns produced by this stage given the columns of its input.
    ///
    /// Fails with `SchemaError` when the stage reads a field the input cannot
    /// contain.
    pub fn output_columns(&self, input: &[String]) -> QueryResult<Vec<String>> {
        for field in self.referenced_fields() {
            if !input.iter().any(|c| c == field) {
                return Err(QueryError::SchemaError(format!(
                    "{} references unknown field '{}' (available: {})",
                    self.name(), field, input.join(", ")
                )));
            }
        }

        let columns = match self {
            Stage::Filter(_) | Stage::Sort(_) | Stage::Limit(_) => input.to_vec(),
            Stage::Project(fields) => fields.iter().map(|f| f.alias.clone()).collect(),
            Stage::GroupBy { keys, aggregates } => keys.iter()
                .cloned()
                .chain(aggregates.iter().map(|a| a.output_name.clone()))
                .collect(),
            Stage::DistinctCount { output, .. } => vec![output.clone()],
            Stage::TopWithinGroup { group_key, score_field } => vec![
                group_key.clone(),
                score_field.clone(),
                CHAMPIONS_COLUMN.to_string(),
            ],
        };
        Ok(columns)
    }
}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> QueryResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(QueryError::ValidationError(format!("Duplicate output column '{}'", name)));
        }
    }
    Ok(())
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Filter(predicate) => write!(f, "Filter({})", predicate),
            Stage::Project(fields) => {
                let parts: Vec<String> = fields.iter()
                    .map(|p| if p.source == p.alias { p.source.clone() } else { format!("{} AS {}", p.source, p.alias) })
                    .collect();
                write!(f, "Project({})", parts.join(", "))
            }
            Stage::GroupBy { keys, aggregates } => {
                let aggs: Vec<&str> = aggregates.iter().map(|a| a.output_name.as_str()).collect();
                write!(f, "GroupBy([{}] -> {})", keys.join(", "), aggs.join(", "))
            }
            Stage::DistinctCount { field, output } => write!(f, "DistinctCount({} AS {})", field, output),
            Stage::Sort(keys) => {
                let parts: Vec<String> = keys.iter()
                    .map(|k| match k.direction {
                        SortDirection::Ascending => format!("{} ASC", k.field),
                        SortDirection::Descending => format!("{} DESC", k.field),
                    })
                    .collect();
                write!(f, "Sort({})", parts.join(", "))
            }
            Stage::Limit(n) => write!(f, "Limit({})", n),
            Stage::TopWithinGroup { group_key, score_field } => {
                write!(f, "TopWithinGroup({} by max {})", group_key, score_field)
            }
        }
    }
}
