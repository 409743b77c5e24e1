use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the pipeline.
///
/// Only loading (and parsing of user-supplied values) can fail. Filtering,
/// aggregation and summaries are total and encode absence with empty
/// collections or `None` KPIs instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source could not be located, read or parsed at all.
    #[error("Data unavailable ({}): {reason}", .path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    #[error("Invalid configuration ({}): {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("Invalid filter value: {0}")]
    InvalidCriteria(String),
}

impl PipelineError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        PipelineError::DataUnavailable {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
