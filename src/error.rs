use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds of the data loader. Every variant is fatal to the dashboard.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Data file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unparseable date {value:?} in {} (line {line})", path.display())]
    InvalidDate {
        path: PathBuf,
        line: u64,
        value: String,
    },
}

/// Rejected user control values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Unknown metric: {0} (expected Mean or Median)")]
    UnknownMetric(String),

    #[error("Unknown granularity: {0} (expected Monthly or Annual)")]
    UnknownGranularity(String),

    #[error("Unknown food item: {0}")]
    UnknownItem(String),
}
