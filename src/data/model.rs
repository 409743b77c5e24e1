use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Cell – a single value read from a tabular source
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from CSV, JSON or Parquet.
///
/// CSV cells always arrive as `Text`; typed variants come from JSON numbers
/// and Arrow columns. Interpretation happens later, per semantic field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// Spellings treated as missing, mirroring the Pandas `read_csv` defaults.
const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>", "-", "#N/A",
];

impl Cell {
    /// Build a cell from raw text, mapping null markers to [`Cell::Null`].
    pub fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        if NULL_MARKERS.contains(&trimmed) {
            Cell::Null
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Float(v) => !v.is_finite(),
            _ => false,
        }
    }

    /// Text form of the value, `None` when missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.clone()),
            Cell::Integer(i) => Some(i.to_string()),
            Cell::Float(v) if v.is_finite() => Some(v.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric interpretation; non-finite values count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Cell::Float(v) => *v,
            Cell::Integer(i) => *i as f64,
            Cell::Text(s) => s.parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Integer interpretation; floats are accepted only when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(i) => Some(*i),
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            Cell::Text(s) => s
                .parse::<i64>()
                .ok()
                .or_else(|| Cell::Float(s.parse::<f64>().ok()?).as_i64()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn all() -> BTreeSet<Severity> {
        Self::ALL.into_iter().collect()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl FromStr for Severity {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(PipelineError::InvalidCriteria(format!(
                "unknown severity '{other}' (expected High, Medium or Low)"
            ))),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One scheduled-vs-actual arrival observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayRecord {
    pub train_name: String,
    pub source_station: String,
    pub destination_station: String,
    pub scheduled_time: Option<NaiveDateTime>,
    pub actual_time: Option<NaiveDateTime>,
    pub delay_minutes: f64,
}

/// One historical accident event. No field is required.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccidentRecord {
    pub year: Option<i32>,
    pub train_name: Option<String>,
    pub departure_from: Option<String>,
    pub going_to: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub severity: Option<Severity>,
}

// ---------------------------------------------------------------------------
// Load diagnostics
// ---------------------------------------------------------------------------

/// What happened while turning source rows into records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows excluded for missing a required field.
    pub rows_dropped: usize,
    /// Timestamp cells that failed to parse and were nulled.
    pub unparsable_timestamps: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.total_rows - self.rows_dropped
    }
}

// ---------------------------------------------------------------------------
// Datasets – the immutable snapshot shared by a session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub delays: Vec<DelayRecord>,
    pub accidents: Vec<AccidentRecord>,
    pub delay_report: LoadReport,
    pub accident_report: LoadReport,
}

impl Datasets {
    /// Sorted distinct train names of the delay collection.
    pub fn train_names(&self) -> Vec<String> {
        self.delays
            .iter()
            .map(|r| r.train_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest scheduled time, ignoring nulls.
    pub fn date_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut times = self.delays.iter().filter_map(|r| r.scheduled_time);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty() && self.accidents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregate output
// ---------------------------------------------------------------------------

/// Grouping key of an aggregate row. Route pairs stay a pair so callers can
/// destructure them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Single(String),
    Pair(String, String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Single(s) => write!(f, "{s}"),
            GroupKey::Pair(a, b) => write!(f, "{a} → {b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn delay(train: &str, day: u32) -> DelayRecord {
        DelayRecord {
            train_name: train.into(),
            source_station: "A".into(),
            destination_station: "B".into(),
            scheduled_time: NaiveDate::from_ymd_opt(2023, 5, day)
                .and_then(|d| d.and_hms_opt(8, 0, 0)),
            actual_time: None,
            delay_minutes: 5.0,
        }
    }

    #[test]
    fn null_markers_become_null() {
        assert_eq!(Cell::from_text("  "), Cell::Null);
        assert_eq!(Cell::from_text("NaN"), Cell::Null);
        assert_eq!(Cell::from_text(" Rajdhani "), Cell::Text("Rajdhani".into()));
    }

    #[test]
    fn numeric_interpretation() {
        assert_eq!(Cell::Text("12.5".into()).as_f64(), Some(12.5));
        assert_eq!(Cell::Text("late".into()).as_f64(), None);
        assert_eq!(Cell::Float(f64::NAN).as_f64(), None);
        assert_eq!(Cell::Text("2019.0".into()).as_i64(), Some(2019));
        assert_eq!(Cell::Float(2019.5).as_i64(), None);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("high".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(" Medium ".parse::<Severity>().unwrap(), Severity::Medium);
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn train_names_are_sorted_and_distinct() {
        let ds = Datasets {
            delays: vec![delay("Shatabdi", 1), delay("Duronto", 2), delay("Shatabdi", 3)],
            ..Default::default()
        };
        assert_eq!(ds.train_names(), vec!["Duronto", "Shatabdi"]);
    }

    #[test]
    fn date_bounds_skip_nulls() {
        let mut undated = delay("X", 1);
        undated.scheduled_time = None;
        let ds = Datasets {
            delays: vec![delay("A", 9), undated, delay("B", 2)],
            ..Default::default()
        };
        let (lo, hi) = ds.date_bounds().unwrap();
        assert_eq!(lo.date(), NaiveDate::from_ymd_opt(2023, 5, 2).unwrap());
        assert_eq!(hi.date(), NaiveDate::from_ymd_opt(2023, 5, 9).unwrap());
        assert!(Datasets::default().date_bounds().is_none());
    }

    #[test]
    fn group_keys_order_lexically() {
        let mut keys = vec![
            GroupKey::Single("b".into()),
            GroupKey::Single("a".into()),
        ];
        keys.sort();
        assert_eq!(keys[0], GroupKey::Single("a".into()));
        assert_eq!(GroupKey::Pair("A".into(), "B".into()).to_string(), "A → B");
    }
}
