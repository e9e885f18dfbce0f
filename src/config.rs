// Configuration
//
// Where the dataset lives and how results are printed.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// Locations of the two dataset files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub events_path: PathBuf,
    pub results_path: PathBuf,
}

impl StoreConfig {
    pub fn new(events_path: impl Into<PathBuf>, results_path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            events_path: events_path.into(),
            results_path: results_path.into(),
        }
    }

    /// `events.json` and `results.json` inside `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("events.json"), dir.join("results.json"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_dir("data")
    }
}

/// Rendering of query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// One JSON object per row
    Json,
}
