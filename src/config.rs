use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::aggregate::DEFAULT_TOP_N;
use crate::data::schema::ColumnConfig;
use crate::error::{PipelineError, Result};

/// Where the two datasets live and how their columns are named.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSources {
    pub delays: PathBuf,
    pub accidents: PathBuf,
    pub columns: ColumnConfig,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            delays: PathBuf::from("Realistic_India_Train_Delays_2023_24.csv"),
            accidents: PathBuf::from("India_Train_Accidents_2000_2024.csv"),
            columns: ColumnConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: DEFAULT_TOP_N }
    }
}

/// Top-level configuration file.
///
/// ```toml
/// [data]
/// delays = "delays.csv"
/// accidents = "accidents.parquet"
///
/// [data.columns.delays]
/// train_name = "train"
///
/// [report]
/// top_n = 15
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data: DataSources,
    pub report: ReportConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read a config file. Relative data paths are resolved against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_err = |reason: String| PipelineError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let mut config = Self::from_toml(&text).map_err(|e| config_err(e.to_string()))?;

        if let Some(base) = path.parent() {
            for p in [&mut config.data.delays, &mut config.data.accidents] {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(config)
    }
}
