use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::model::{AccidentRecord, Datasets, DelayRecord, Severity};

/// Sentinel offered ahead of the train names; selects every train.
pub const ALL_TRAINS: &str = "All";

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum TrainSelection {
    #[default]
    All,
    /// Exact, case-sensitive train name.
    Named(String),
}

impl TrainSelection {
    /// Interpret a choice from the train selector, where [`ALL_TRAINS`] is
    /// the sentinel.
    pub fn from_choice(choice: &str) -> Self {
        if choice == ALL_TRAINS {
            TrainSelection::All
        } else {
            TrainSelection::Named(choice.to_string())
        }
    }

    fn matches(&self, train_name: Option<&str>) -> bool {
        match self {
            TrainSelection::All => true,
            TrainSelection::Named(name) => train_name == Some(name.as_str()),
        }
    }
}

/// Inclusive `[start, end]` bound on the scheduled time.
///
/// An inverted range (`start > end`) is kept as given and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whole calendar days: from midnight of `start` through the last instant
    /// of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let last_instant = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap_or(NaiveTime::MIN);
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(last_instant),
        }
    }

    /// A range no timestamp falls in.
    pub fn empty() -> Self {
        Self {
            start: NaiveDateTime::MAX,
            end: NaiveDateTime::MIN,
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        !self.is_inverted() && self.start <= t && t <= self.end
    }
}

/// One query's worth of user constraints. Built per interaction, never stored
/// beyond the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub train: TrainSelection,
    /// `None` leaves the date dimension unfiltered.
    pub date_range: Option<DateRange>,
    /// `None` leaves severity unfiltered. `Some(empty)` selects nothing.
    pub severities: Option<BTreeSet<Severity>>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            train: TrainSelection::All,
            date_range: None,
            severities: None,
        }
    }
}

impl FilterCriteria {
    /// A delay record passes when it matches the train selection and, with a
    /// date range active, has a scheduled time inside it. Null timestamps
    /// never satisfy an active range.
    pub fn matches_delay(&self, record: &DelayRecord) -> bool {
        if !self.train.matches(Some(&record.train_name)) {
            return false;
        }
        match &self.date_range {
            None => true,
            Some(range) => record.scheduled_time.is_some_and(|t| range.contains(t)),
        }
    }

    /// An accident passes when it matches the train selection and, with a
    /// severity set active, its severity is a member. Accidents without a
    /// train name or severity fail the corresponding active filter.
    pub fn matches_accident(&self, record: &AccidentRecord) -> bool {
        if !self.train.matches(record.train_name.as_deref()) {
            return false;
        }
        match &self.severities {
            None => true,
            Some(selected) => record.severity.is_some_and(|s| selected.contains(&s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Borrowed view over the records passing a set of criteria.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    pub delays: Vec<&'a DelayRecord>,
    pub accidents: Vec<&'a AccidentRecord>,
}

pub fn filter_delays<'a>(
    delays: &'a [DelayRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a DelayRecord> {
    delays.iter().filter(|r| criteria.matches_delay(r)).collect()
}

pub fn filter_accidents<'a>(
    accidents: &'a [AccidentRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a AccidentRecord> {
    accidents.iter().filter(|r| criteria.matches_accident(r)).collect()
}

/// Narrow both collections. Inputs are never modified.
pub fn filter<'a>(
    delays: &'a [DelayRecord],
    accidents: &'a [AccidentRecord],
    criteria: &FilterCriteria,
) -> FilteredView<'a> {
    FilteredView {
        delays: filter_delays(delays, criteria),
        accidents: filter_accidents(accidents, criteria),
    }
}

/// Positions of the passing records, for holding a filter result alongside a
/// shared snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredIndices {
    pub delays: Vec<usize>,
    pub accidents: Vec<usize>,
}

impl FilteredIndices {
    /// Resolve back into records of the snapshot the indices were built from.
    pub fn view<'a>(&self, dataset: &'a Datasets) -> FilteredView<'a> {
        FilteredView {
            delays: self.delays.iter().map(|&i| &dataset.delays[i]).collect(),
            accidents: self.accidents.iter().map(|&i| &dataset.accidents[i]).collect(),
        }
    }
}

/// Return indices of records that pass all active filters.
pub fn filtered_indices(dataset: &Datasets, criteria: &FilterCriteria) -> FilteredIndices {
    fn passing<T>(items: &[T], keep: impl Fn(&T) -> bool) -> Vec<usize> {
        items
            .iter()
            .enumerate()
            .filter(|&(_, item)| keep(item))
            .map(|(i, _)| i)
            .collect()
    }

    FilteredIndices {
        delays: passing(&dataset.delays, |r| criteria.matches_delay(r)),
        accidents: passing(&dataset.accidents, |r| criteria.matches_accident(r)),
    }
}
