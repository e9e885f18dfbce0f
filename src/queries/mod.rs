// Query Catalog
//
// The named analytical questions over the athletics dataset, each expressed
// as one pipeline over the `events` or `results` table. Some questions are
// asked about one country or one discipline; those take an argument that is
// bound into the pipeline when the query runs. The catalog is built once on
// first use and shared read-only.

use std::fmt;

use log::{debug, info};
use once_cell::sync::Lazy;

use crate::catalog::{Medal, EVENTS_TABLE, RESULTS_TABLE};
use crate::query::executor::engine::ExecutionEngine;
use crate::query::executor::result::{QueryError, QueryResult, QueryResultSet};
use crate::query::pipeline::Pipeline;
use crate::query::stage::{Aggregate, Predicate, ProjectField, SortKey};
use crate::storage::RecordStore;

/// Catalog number of a query (`Q1` ... `Q18`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u8);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// Argument taken by a parameterized query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParameter {
    pub name: &'static str,
    /// Used when the caller gives no argument
    pub default: &'static str,
}

#[derive(Debug, Clone)]
enum QueryShape {
    Fixed(Pipeline),
    Bound {
        parameter: QueryParameter,
        build: fn(&str) -> Pipeline,
    },
}

/// A catalog entry
#[derive(Debug, Clone)]
pub struct NamedQuery {
    pub id: QueryId,
    pub name: &'static str,
    pub description: &'static str,
    pub table: &'static str,
    shape: QueryShape,
}

impl NamedQuery {
    fn fixed(id: u8, name: &'static str, description: &'static str, table: &'static str, pipeline: Pipeline) -> Self {
        NamedQuery { id: QueryId(id), name, description, table, shape: QueryShape::Fixed(pipeline) }
    }

    fn bound(
        id: u8,
        name: &'static str,
        description: &'static str,
        parameter: QueryParameter,
        build: fn(&str) -> Pipeline,
    ) -> Self {
        NamedQuery { id: QueryId(id), name, description, table: RESULTS_TABLE, shape: QueryShape::Bound { parameter, build } }
    }

    /// The argument this query takes, if any
    pub fn parameter(&self) -> Option<QueryParameter> {
        match &self.shape {
            QueryShape::Fixed(_) => None,
            QueryShape::Bound { parameter, .. } => Some(*parameter),
        }
    }

    /// Pipeline of this query with `argument` bound, or the parameter's
    /// default when `argument` is `None`.
    ///
    /// Passing an argument to a query that takes none is a `ValidationError`.
    pub fn pipeline(&self, argument: Option<&str>) -> QueryResult<Pipeline> {
        match (&self.shape, argument) {
            (QueryShape::Fixed(pipeline), None) => Ok(pipeline.clone()),
            (QueryShape::Fixed(_), Some(arg)) => Err(QueryError::ValidationError(
                format!("{} takes no argument, got '{}'", self.id, arg)
            )),
            (QueryShape::Bound { parameter, build }, arg) => Ok(build(arg.unwrap_or(parameter.default))),
        }
    }
}

const COUNTRY: QueryParameter = QueryParameter { name: "noc", default: "USA" };
const DISCIPLINE: QueryParameter = QueryParameter { name: "event", default: "100 metres" };

/// Outcome of one catalog query in a batch run
pub type QueryOutcome = (&'static NamedQuery, QueryResult<QueryResultSet>);

static CATALOG: Lazy<Vec<NamedQuery>> = Lazy::new(build_catalog);

fn not_medalled() -> Predicate {
    Predicate::new().ne("medal", Medal::NO_MEDAL)
}

fn on_podium() -> Predicate {
    Predicate::new().is_in("medal", Medal::podium())
}

/// Gold, silver and bronze counts of each group, then the group total
fn medal_breakdown() -> Vec<Aggregate> {
    vec![
        Aggregate::count_where(Predicate::new().eq("medal", Medal::Gold.as_str()), "or"),
        Aggregate::count_where(Predicate::new().eq("medal", Medal::Silver.as_str()), "argent"),
        Aggregate::count_where(Predicate::new().eq("medal", Medal::Bronze.as_str()), "bronze"),
        Aggregate::count("total"),
    ]
}

fn medal_table_order() -> Vec<SortKey> {
    vec![SortKey::desc("or"), SortKey::desc("argent"), SortKey::desc("bronze"), SortKey::desc("total")]
}

fn country_medals_by_discipline(noc: &str) -> Pipeline {
    Pipeline::new()
        .filter(on_podium().eq("noc", noc))
        .group_by(&["event"], vec![Aggregate::count("total_medailles")])
        .sort(vec![SortKey::desc("total_medailles")])
        .project([ProjectField::renamed("event", "discipline"), ProjectField::renamed("total_medailles", "medailles")])
        .limit(15)
}

fn country_medals_per_year(noc: &str) -> Pipeline {
    Pipeline::new()
        .filter(on_podium().eq("noc", noc))
        .group_by(&["year"], vec![Aggregate::count("total_medailles")])
        .sort(vec![SortKey::asc("year")])
        .project([ProjectField::renamed("year", "annee"), ProjectField::renamed("total_medailles", "medailles")])
}

fn discipline_medals_by_country(event: &str) -> Pipeline {
    Pipeline::new()
        .filter(on_podium().eq("event", event))
        .group_by(&["noc"], medal_breakdown())
        .sort(medal_table_order())
        .project([
            ProjectField::renamed("noc", "pays"),
            ProjectField::new("or"),
            ProjectField::new("argent"),
            ProjectField::new("bronze"),
            ProjectField::new("total"),
        ])
}

fn discipline_top_medallists(event: &str) -> Pipeline {
    Pipeline::new()
        .filter(on_podium().eq("event", event))
        .group_by(&["athlete_name"], medal_breakdown())
        .sort(medal_table_order())
        .limit(10)
}

fn build_catalog() -> Vec<NamedQuery> {
    vec![
        NamedQuery::fixed(
            1,
            "athlete_count",
            "Number of distinct athletes",
            RESULTS_TABLE,
            Pipeline::new().distinct_count("athlete_id", "total"),
        ),
        NamedQuery::fixed(
            2,
            "event_count",
            "Number of disciplines",
            EVENTS_TABLE,
            Pipeline::new().group_by(&[], vec![Aggregate::count("total")]),
        ),
        NamedQuery::fixed(
            3,
            "decathlon_medallists",
            "Medallists of the men's decathlon, latest first",
            RESULTS_TABLE,
            Pipeline::new()
                .filter(not_medalled().eq("event", "Decathlon, Men"))
                .project(["athlete_name", "medal", "year", "noc"])
                .sort(vec![SortKey::desc("year")]),
        ),
        NamedQuery::fixed(
            4,
            "women_before_2000",
            "Distinct female athletes before 2000",
            RESULTS_TABLE,
            Pipeline::new()
                .filter(Predicate::new().eq("sex", "Female").lt("year", 2000))
                .distinct_count("athlete_id", "total_femmes_avant_2000"),
        ),
        NamedQuery::fixed(
            5,
            "athletes_per_event_year",
            "Distinct athletes per discipline and edition",
            RESULTS_TABLE,
            Pipeline::new()
                .group_by(&["event", "year"], vec![Aggregate::count_distinct("athlete_id", "nombre")])
                .project([
                    ProjectField::renamed("event", "discipline"),
                    ProjectField::renamed("year", "annee"),
                    ProjectField::new("nombre"),
                ])
                .sort(vec![SortKey::desc("annee"), SortKey::desc("nombre")]),
        ),
        NamedQuery::fixed(
            6,
            "top_medallists",
            "Top 10 athletes by number of medals",
            RESULTS_TABLE,
            Pipeline::new()
                .filter(not_medalled())
                .group_by(&["athlete_name"], vec![Aggregate::count("total")])
                .sort(vec![SortKey::desc("total")])
                .limit(10),
        ),
        NamedQuery::fixed(
            7,
            "athletes_per_sex_country",
            "Distinct athletes per sex and country",
            RESULTS_TABLE,
            Pipeline::new()
                .group_by(&["sex", "noc"], vec![Aggregate::count_distinct("athlete_id", "nombre")])
                .project([
                    ProjectField::renamed("sex", "sexe"),
                    ProjectField::renamed("noc", "pays"),
                    ProjectField::new("nombre"),
                ])
                .sort(vec![SortKey::asc("pays")]),
        ),
        NamedQuery::fixed(
            8,
            "rare_events",
            "Disciplines held in fewer than 10 editions",
            EVENTS_TABLE,
            Pipeline::new()
                .filter(Predicate::new().lt("nb_editions", 10))
                .project(["event_name", "nb_editions"])
                .sort(vec![SortKey::asc("nb_editions")]),
        ),
        NamedQuery::fixed(
            9,
            "champions_per_event",
            "Most medalled athletes of each discipline, ties included",
            RESULTS_TABLE,
            Pipeline::new()
                .filter(not_medalled())
                .group_by(&["event", "athlete_name"], vec![Aggregate::count("nb")])
                .sort(vec![SortKey::desc("nb")])
                .project([
                    ProjectField::renamed("event", "discipline"),
                    ProjectField::renamed("athlete_name", "n"),
                    ProjectField::renamed("nb", "score"),
                ])
                .top_within_group("discipline", "score"),
        ),
        NamedQuery::fixed(
            10,
            "events_per_edition",
            "Number of disciplines per edition",
            RESULTS_TABLE,
            Pipeline::new()
                .group_by(&["year"], vec![Aggregate::count_distinct("event", "nb_disciplines")])
                .project([ProjectField::renamed("year", "annee"), ProjectField::new("nb_disciplines")])
                .sort(vec![SortKey::desc("annee")]),
        ),
        NamedQuery::fixed(
            11,
            "top_countries",
            "Top 10 countries by number of medals",
            RESULTS_TABLE,
            Pipeline::new()
                .filter(on_podium())
                .group_by(&["noc"], vec![Aggregate::count("total_medailles")])
                .sort(vec![SortKey::desc("total_medailles")])
                .limit(10),
        ),
        NamedQuery::fixed(
            12,
            "disciplines_by_sex",
            "Number of disciplines contested per edition and sex",
            RESULTS_TABLE,
            Pipeline::new()
                .group_by(&["year", "sex", "event"], Vec::new())
                .group_by(&["year", "sex"], vec![Aggregate::count("count_disciplines")])
                .project([
                    ProjectField::renamed("year", "annee"),
                    ProjectField::renamed("sex", "sexe"),
                    ProjectField::new("count_disciplines"),
                ])
                .sort(vec![SortKey::asc("annee")]),
        ),
        NamedQuery::fixed(
            13,
            "medals_by_sex",
            "Number of medals won by each sex",
            RESULTS_TABLE,
            Pipeline::new()
                .filter(on_podium())
                .group_by(&["sex"], vec![Aggregate::count("count")])
                .project([ProjectField::renamed("sex", "sexe"), ProjectField::new("count")]),
        ),
        NamedQuery::fixed(
            14,
            "medal_table",
            "Gold, silver and bronze medals of every country",
            RESULTS_TABLE,
            Pipeline::new()
                .filter(on_podium())
                .group_by(&["noc"], medal_breakdown())
                .project([
                    ProjectField::renamed("noc", "pays"),
                    ProjectField::new("or"),
                    ProjectField::new("argent"),
                    ProjectField::new("bronze"),
                    ProjectField::new("total"),
                ]),
        ),
        NamedQuery::bound(
            15,
            "country_disciplines",
            "Top 15 disciplines of one country by number of medals",
            COUNTRY,
            country_medals_by_discipline,
        ),
        NamedQuery::bound(
            16,
            "country_medals_per_year",
            "Medals of one country per edition",
            COUNTRY,
            country_medals_per_year,
        ),
        NamedQuery::bound(
            17,
            "discipline_medal_table",
            "Gold, silver and bronze medals per country in one discipline",
            DISCIPLINE,
            discipline_medals_by_country,
        ),
        NamedQuery::bound(
            18,
            "discipline_top_medallists",
            "Top 10 medallists of one discipline",
            DISCIPLINE,
            discipline_top_medallists,
        ),
    ]
}

/// Every catalog query, in catalog order
pub fn catalog() -> &'static [NamedQuery] {
    &CATALOG
}

/// Look a query up by id (`Q6`, `q6`, `6`) or by name (`top_medallists`)
pub fn find(key: &str) -> Option<&'static NamedQuery> {
    let key = key.trim();
    let number = key.strip_prefix(['Q', 'q']).unwrap_or(key).parse::<u8>().ok();
    CATALOG.iter().find(|q| Some(q.id.0) == number || q.name.eq_ignore_ascii_case(key))
}

/// Run one catalog query, parameterized queries with their default argument
pub fn execute(store: &RecordStore, query: &NamedQuery) -> QueryResult<QueryResultSet> {
    execute_with(store, query, None)
}

/// Run one catalog query with an optional argument
pub fn execute_with(store: &RecordStore, query: &NamedQuery, argument: Option<&str>) -> QueryResult<QueryResultSet> {
    ExecutionEngine::new(store).execute(query, argument)
}

/// Run one catalog query by id or name
pub fn run(store: &RecordStore, key: &str) -> QueryResult<QueryResultSet> {
    run_with(store, key, None)
}

/// Run one catalog query by id or name with an optional argument
pub fn run_with(store: &RecordStore, key: &str, argument: Option<&str>) -> QueryResult<QueryResultSet> {
    let query = find(key).ok_or_else(|| QueryError::ValidationError(format!("Unknown query '{}'", key)))?;
    execute_with(store, query, argument)
}

/// Run every catalog query one after the other
pub fn run_all(store: &RecordStore) -> Vec<QueryOutcome> {
    CATALOG.iter().map(|q| (q, execute(store, q))).collect()
}

/// Run every catalog query, one thread per query, sharing the store.
///
/// Results come back in catalog order.
pub fn run_all_parallel(store: &RecordStore) -> QueryResult<Vec<QueryOutcome>> {
    debug!("running {} queries in parallel", CATALOG.len());
    let outcomes = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = CATALOG.iter()
            .map(|q| s.spawn(move |_| (q, execute(store, q))))
            .collect();
        handles.into_iter()
            .map(|h| h.join())
            .collect::<Result<Vec<_>, _>>()
    })
    .and_then(|joined| joined)
    .map_err(|_| QueryError::ExecutionError("A query thread panicked".to_string()))?;

    info!("{} queries finished", outcomes.len());
    Ok(outcomes)
}
