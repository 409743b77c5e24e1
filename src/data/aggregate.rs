use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{AccidentRecord, AggregateRow, DelayRecord, GroupKey};

/// Cap used for the "top N" views.
pub const DEFAULT_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Generic grouped mean / count
// ---------------------------------------------------------------------------

/// Group `records` by `key`, average `value` per group, and return the first
/// `top_n` groups ordered by mean descending, ties by ascending key.
///
/// Records whose key is `None` are skipped. A group only appears if at least
/// one of its records has a finite value, so no row is ever a mean of nothing.
pub fn aggregate_by<'a, R: 'a>(
    records: impl IntoIterator<Item = &'a R>,
    key: impl Fn(&R) -> Option<GroupKey>,
    value: impl Fn(&R) -> Option<f64>,
    top_n: usize,
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for record in records {
        let (Some(k), Some(v)) = (key(record), value(record)) else {
            continue;
        };
        if !v.is_finite() {
            continue;
        }
        let acc = groups.entry(k).or_insert((0.0, 0));
        acc.0 += v;
        acc.1 += 1;
    }

    let rows = groups
        .into_iter()
        .map(|(key, (sum, n))| AggregateRow {
            key,
            value: sum / n as f64,
        })
        .collect();
    ranked(rows, top_n)
}

/// Number of records per group, with the same ordering and cap as
/// [`aggregate_by`].
pub fn count_by<'a, R: 'a>(
    records: impl IntoIterator<Item = &'a R>,
    key: impl Fn(&R) -> Option<GroupKey>,
    top_n: usize,
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for k in records.into_iter().filter_map(|r| key(r)) {
        *groups.entry(k).or_default() += 1;
    }

    let rows = groups
        .into_iter()
        .map(|(key, n)| AggregateRow {
            key,
            value: n as f64,
        })
        .collect();
    ranked(rows, top_n)
}

fn ranked(mut rows: Vec<AggregateRow>, top_n: usize) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    rows.truncate(top_n);
    rows
}

// ---------------------------------------------------------------------------
// Delay views
// ---------------------------------------------------------------------------

/// Which field of a delay record forms the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DelayGroup {
    Train,
    SourceStation,
    DestinationStation,
    /// `(source, destination)` pair.
    Route,
}

impl DelayGroup {
    pub fn key(self, r: &DelayRecord) -> GroupKey {
        match self {
            DelayGroup::Train => GroupKey::Single(r.train_name.clone()),
            DelayGroup::SourceStation => GroupKey::Single(r.source_station.clone()),
            DelayGroup::DestinationStation => GroupKey::Single(r.destination_station.clone()),
            DelayGroup::Route => {
                GroupKey::Pair(r.source_station.clone(), r.destination_station.clone())
            }
        }
    }
}

/// Mean `delay_minutes` per group.
pub fn aggregate_delays<'a>(
    records: impl IntoIterator<Item = &'a DelayRecord>,
    group: DelayGroup,
    top_n: usize,
) -> Vec<AggregateRow> {
    aggregate_by(records, |r| Some(group.key(r)), |r| Some(r.delay_minutes), top_n)
}

pub fn top_delayed_trains<'a>(
    records: impl IntoIterator<Item = &'a DelayRecord>,
    top_n: usize,
) -> Vec<AggregateRow> {
    aggregate_delays(records, DelayGroup::Train, top_n)
}

pub fn delay_by_source<'a>(
    records: impl IntoIterator<Item = &'a DelayRecord>,
    top_n: usize,
) -> Vec<AggregateRow> {
    aggregate_delays(records, DelayGroup::SourceStation, top_n)
}

pub fn delay_by_destination<'a>(
    records: impl IntoIterator<Item = &'a DelayRecord>,
    top_n: usize,
) -> Vec<AggregateRow> {
    aggregate_delays(records, DelayGroup::DestinationStation, top_n)
}

pub fn route_delays<'a>(
    records: impl IntoIterator<Item = &'a DelayRecord>,
    top_n: usize,
) -> Vec<AggregateRow> {
    aggregate_delays(records, DelayGroup::Route, top_n)
}

// ---------------------------------------------------------------------------
// Accident views
// ---------------------------------------------------------------------------

pub fn accidents_by_year<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    top_n: usize,
) -> Vec<AggregateRow> {
    count_by(records, |r| r.year.map(|y| GroupKey::Single(y.to_string())), top_n)
}

pub fn accidents_by_severity<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
) -> Vec<AggregateRow> {
    count_by(
        records,
        |r| r.severity.map(|s| GroupKey::Single(s.to_string())),
        usize::MAX,
    )
}
