// Pipeline Builder
//
// A pipeline is an ordered list of stages. The builder methods here are the
// way catalog queries and callers compose them.

use std::fmt;

use crate::query::stage::{Aggregate, Predicate, ProjectField, SortKey, Stage};

/// Ordered sequence of stages, executed first to last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        self.stage(Stage::Filter(predicate))
    }

    pub fn project<F: Into<ProjectField>>(self, fields: impl IntoIterator<Item = F>) -> Self {
        self.stage(Stage::Project(fields.into_iter().map(Into::into).collect()))
    }

    pub fn group_by(self, keys: &[&str], aggregates: Vec<Aggregate>) -> Self {
        self.stage(Stage::GroupBy {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            aggregates,
        })
    }

    pub fn distinct_count(self, field: &str, output: &str) -> Self {
        self.stage(Stage::DistinctCount {
            field: field.to_string(),
            output: output.to_string(),
        })
    }

    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        self.stage(Stage::Sort(keys))
    }

    pub fn limit(self, n: i64) -> Self {
        self.stage(Stage::Limit(n))
    }

    pub fn top_within_group(self, group_key: &str, score_field: &str) -> Self {
        self.stage(Stage::TopWithinGroup {
            group_key: group_key.to_string(),
            score_field: score_field.to_string(),
        })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl From<Vec<Stage>> for Pipeline {
    fn from(stages: Vec<Stage>) -> Self {
        Pipeline { stages }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}
