// Domain Records
//
// Typed forms of the two stored tables. Rows handed to the pipeline are built
// from these records so their shape always matches `events_schema()` and
// `results_schema()`.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::query::executor::result::{DataValue, Row};

/// Sex of an athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(alias = "M")]
    Male,
    #[serde(alias = "F")]
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" | "M" => Ok(Sex::Male),
            "Female" | "F" => Ok(Sex::Female),
            other => Err(format!("Unknown sex '{}'", other)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Medal outcome of one participation. `NoMedal` is stored as the explicit
/// sentinel `"na"`, it is a value and not a missing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
    #[serde(rename = "na")]
    NoMedal,
}

impl Medal {
    /// Text stored for a participation without a medal
    pub const NO_MEDAL: &'static str = "na";

    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Gold => "Gold",
            Medal::Silver => "Silver",
            Medal::Bronze => "Bronze",
            Medal::NoMedal => Self::NO_MEDAL,
        }
    }

    /// The three podium values, as stored
    pub fn podium() -> [&'static str; 3] {
        [Medal::Gold, Medal::Silver, Medal::Bronze].map(|m| m.as_str())
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discipline. Disciplines merged in from the world championships carry
/// no edition count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_name: String,
    #[serde(default)]
    pub nb_editions: Option<u32>,
}

impl Event {
    pub fn new(event_name: impl Into<String>, nb_editions: u32) -> Self {
        Event {
            event_name: event_name.into(),
            nb_editions: Some(nb_editions),
        }
    }

    /// A discipline with an unknown number of editions
    pub fn unnumbered(event_name: impl Into<String>) -> Self {
        Event {
            event_name: event_name.into(),
            nb_editions: None,
        }
    }

    pub fn to_row(&self) -> Row {
        let nb_editions = match self.nb_editions {
            Some(n) => DataValue::Integer(i64::from(n)),
            None => DataValue::Null,
        };
        Row::from_pairs([
            ("event_name", DataValue::Text(self.event_name.clone())),
            ("nb_editions", nb_editions),
        ])
    }
}

/// One athlete's participation in one event in one edition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub athlete_id: i64,
    pub athlete_name: String,
    pub event: String,
    pub year: i64,
    pub sex: Sex,
    pub noc: String,
    pub medal: Medal,
}

impl ResultRecord {
    pub fn to_row(&self) -> Row {
        Row::from_pairs([
            ("athlete_id", DataValue::Integer(self.athlete_id)),
            ("athlete_name", DataValue::Text(self.athlete_name.clone())),
            ("event", DataValue::Text(self.event.clone())),
            ("year", DataValue::Integer(self.year)),
            ("sex", DataValue::Text(self.sex.as_str().to_string())),
            ("noc", DataValue::Text(self.noc.clone())),
            ("medal", DataValue::Text(self.medal.as_str().to_string())),
        ])
    }
}

/// An athlete as derived from the results table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Athlete {
    pub athlete_id: i64,
    pub athlete_name: String,
    pub sex: Sex,
}

impl From<&ResultRecord> for Athlete {
    fn from(record: &ResultRecord) -> Self {
        Athlete {
            athlete_id: record.athlete_id,
            athlete_name: record.athlete_name.clone(),
            sex: record.sex,
        }
    }
}
