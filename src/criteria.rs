//! Turning raw user input (CLI flags, form values) into [`FilterCriteria`]
//! pieces.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;

use crate::data::filter::DateRange;
use crate::data::model::Severity;
use crate::error::{PipelineError, Result};

const NO_SEVERITY: &str = "none";

/// Date range for a pair of optional day bounds.
///
/// `ignore_dates` drops the date filter entirely. With no bounds given the
/// range spans `data_bounds` (unfiltered when the data carries no times).
/// Only one bound given is an incomplete range and matches nothing.
pub fn date_range_from_args(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    ignore_dates: bool,
    data_bounds: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Option<DateRange> {
    if ignore_dates {
        return None;
    }
    match (from, to) {
        (Some(start), Some(end)) => Some(DateRange::from_dates(start, end)),
        (None, None) => data_bounds.map(|(start, end)| DateRange::new(start, end)),
        (start, end) => {
            warn!("Incomplete date range (from {start:?}, to {end:?}); nothing will match");
            Some(DateRange::empty())
        }
    }
}

/// Severity selection from a list of labels.
///
/// No labels means no severity filter. `none` on its own selects the empty
/// set and cannot be combined with levels.
pub fn parse_severities<S: AsRef<str>>(values: &[S]) -> Result<Option<BTreeSet<Severity>>> {
    if values.is_empty() {
        return Ok(None);
    }
    let is_none = |v: &S| v.as_ref().trim().eq_ignore_ascii_case(NO_SEVERITY);
    if values.iter().any(is_none) {
        if values.len() > 1 {
            return Err(PipelineError::InvalidCriteria(format!(
                "'{NO_SEVERITY}' cannot be combined with severity levels"
            )));
        }
        return Ok(Some(BTreeSet::new()));
    }
    let set = values
        .iter()
        .map(|v| v.as_ref().parse::<Severity>())
        .collect::<Result<BTreeSet<_>>>()?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, d).unwrap()
    }

    fn bounds() -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((
            day(1).and_hms_opt(8, 0, 0).unwrap(),
            day(10).and_hms_opt(18, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn both_bounds_cover_whole_days() {
        let range = date_range_from_args(Some(day(2)), Some(day(4)), false, bounds());
        assert_eq!(range, Some(DateRange::from_dates(day(2), day(4))));
    }

    #[test]
    fn no_bounds_span_the_data() {
        let range = date_range_from_args(None, None, false, bounds()).unwrap();
        assert_eq!(range.start, day(1).and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(range.end, day(10).and_hms_opt(18, 0, 0).unwrap());

        assert_eq!(date_range_from_args(None, None, false, None), None);
    }

    #[test]
    fn single_bound_matches_nothing() {
        let inside = day(5).and_hms_opt(12, 0, 0).unwrap();

        let from_only = date_range_from_args(Some(day(5)), None, false, bounds()).unwrap();
        assert!(!from_only.contains(inside));

        let to_only = date_range_from_args(None, Some(day(5)), false, bounds()).unwrap();
        assert!(!to_only.contains(inside));
    }

    #[test]
    fn single_bound_is_kept_without_data_times() {
        // Data with no parsable times has no bounds; the user's bound still
        // applies rather than silently disappearing.
        let range = date_range_from_args(Some(day(5)), None, false, None);
        assert_eq!(range, Some(DateRange::empty()));
    }

    #[test]
    fn ignoring_dates_drops_the_filter() {
        assert_eq!(date_range_from_args(None, None, true, bounds()), None);
    }

    #[test]
    fn no_labels_means_unfiltered() {
        assert_eq!(parse_severities::<&str>(&[]).unwrap(), None);
    }

    #[test]
    fn labels_are_case_insensitive() {
        let set = parse_severities(&["high", " LOW "]).unwrap().unwrap();
        assert_eq!(set, [Severity::High, Severity::Low].into_iter().collect());
    }

    #[test]
    fn none_alone_selects_nothing() {
        assert_eq!(parse_severities(&["None"]).unwrap(), Some(BTreeSet::new()));
    }

    #[test]
    fn none_mixed_with_levels_is_rejected() {
        let err = parse_severities(&["High", "none"]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCriteria(_)));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = parse_severities(&["High", "Catastrophic"]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCriteria(_)));
    }
}
