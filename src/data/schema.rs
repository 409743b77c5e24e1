//! Semantic field → physical column mapping.
//!
//! Dataset variants name the same fields differently, so every column the
//! loader reads goes through one of these mappings. Defaults match the
//! published Indian Railways delay and accident datasets.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Delay columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DelayColumns {
    pub train_name: String,
    pub source_station: String,
    pub destination_station: String,
    pub scheduled_time: String,
    pub actual_time: String,
    pub delay_minutes: String,
}

impl Default for DelayColumns {
    fn default() -> Self {
        Self {
            train_name: "Train Name".into(),
            source_station: "Source".into(),
            destination_station: "Destination".into(),
            scheduled_time: "Scheduled Arrival".into(),
            actual_time: "Actual Arrival".into(),
            delay_minutes: "Delay (Minutes)".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Accident columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccidentColumns {
    pub year: String,
    pub train_name: String,
    pub departure_from: String,
    pub going_to: String,
    pub location: String,
    pub latitude: String,
    pub longitude: String,
    pub severity: String,
}

impl Default for AccidentColumns {
    fn default() -> Self {
        Self {
            year: "Year".into(),
            train_name: "Train Name".into(),
            departure_from: "Departure From".into(),
            going_to: "Going To".into(),
            location: "Accident Location".into(),
            latitude: "Latitude".into(),
            longitude: "Longitude".into(),
            severity: "Severity".into(),
        }
    }
}

/// Both mappings, as found under `[data.columns]` in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnConfig {
    pub delays: DelayColumns,
    pub accidents: AccidentColumns,
}

// ---------------------------------------------------------------------------
// Resolved indices
// ---------------------------------------------------------------------------

/// Column positions of the delay fields within one source's header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DelayIndices {
    pub train_name: usize,
    pub source_station: usize,
    pub destination_station: usize,
    pub delay_minutes: usize,
    pub scheduled_time: Option<usize>,
    pub actual_time: Option<usize>,
}

/// Column positions of the accident fields; any of them may be absent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AccidentIndices {
    pub year: Option<usize>,
    pub train_name: Option<usize>,
    pub departure_from: Option<usize>,
    pub going_to: Option<usize>,
    pub location: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
    pub severity: Option<usize>,
}
