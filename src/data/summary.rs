use std::collections::HashSet;

use serde::Serialize;

use super::model::{AccidentRecord, DelayRecord, Severity};

/// Shown in place of a KPI that has no value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Scalar KPIs over a filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Mean delay in minutes; `None` when there are no delay records.
    pub avg_delay: Option<f64>,
    pub accident_count: usize,
    pub distinct_train_count: usize,
}

impl Summary {
    pub fn avg_delay_label(&self) -> String {
        self.avg_delay
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

pub fn summarize<'a>(
    delays: impl IntoIterator<Item = &'a DelayRecord>,
    accidents: impl IntoIterator<Item = &'a AccidentRecord>,
) -> Summary {
    let mut sum = 0.0;
    let mut n = 0usize;
    let mut trains: HashSet<&str> = HashSet::new();
    for r in delays {
        trains.insert(&r.train_name);
        if r.delay_minutes.is_finite() {
            sum += r.delay_minutes;
            n += 1;
        }
    }

    Summary {
        avg_delay: (n > 0).then(|| sum / n as f64),
        accident_count: accidents.into_iter().count(),
        distinct_train_count: trains.len(),
    }
}

// ---------------------------------------------------------------------------
// Map layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub train_name: Option<String>,
    pub year: Option<i32>,
    pub severity: Option<Severity>,
}

/// Accidents that carry both coordinates; the rest cannot be placed.
pub fn map_points<'a>(accidents: impl IntoIterator<Item = &'a AccidentRecord>) -> Vec<MapPoint> {
    accidents
        .into_iter()
        .filter_map(|a| {
            Some(MapPoint {
                latitude: a.latitude?,
                longitude: a.longitude?,
                location: a.location.clone(),
                train_name: a.train_name.clone(),
                year: a.year,
                severity: a.severity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(train: &str, minutes: f64) -> DelayRecord {
        DelayRecord {
            train_name: train.into(),
            source_station: "A".into(),
            destination_station: "B".into(),
            scheduled_time: None,
            actual_time: None,
            delay_minutes: minutes,
        }
    }

    fn accident(lat: Option<f64>, lon: Option<f64>) -> AccidentRecord {
        AccidentRecord {
            year: Some(2018),
            train_name: Some("Howrah Mail".into()),
            departure_from: None,
            going_to: None,
            location: Some("Kharagpur".into()),
            latitude: lat,
            longitude: lon,
            severity: Some(Severity::Medium),
        }
    }

    #[test]
    fn empty_input_has_no_average() {
        let summary = summarize(&Vec::<DelayRecord>::new(), &Vec::<AccidentRecord>::new());
        assert_eq!(summary.avg_delay, None);
        assert_eq!(summary.accident_count, 0);
        assert_eq!(summary.distinct_train_count, 0);
        assert_eq!(summary.avg_delay_label(), "N/A");
    }

    #[test]
    fn kpis_over_records() {
        let delays = vec![delay("T1", 10.0), delay("T2", 30.0), delay("T1", 20.0)];
        let accidents = vec![accident(None, None), accident(None, None)];
        let summary = summarize(&delays, &accidents);
        assert_eq!(summary.avg_delay, Some(20.0));
        assert_eq!(summary.accident_count, 2);
        assert_eq!(summary.distinct_train_count, 2);
        assert_eq!(summary.avg_delay_label(), "20.00");
    }

    #[test]
    fn map_points_need_both_coordinates() {
        let accidents = vec![
            accident(Some(22.3), Some(87.3)),
            accident(Some(22.3), None),
            accident(None, None),
        ];
        let points = map_points(&accidents);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].location.as_deref(), Some("Kharagpur"));
    }
}
