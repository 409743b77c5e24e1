use std::fmt::Write;

use crate::data::filter::{FilterCriteria, TrainSelection};
use crate::data::model::AggregateRow;
use crate::data::summary::NOT_AVAILABLE;
use crate::state::DashboardView;

const NO_DATA: &str = "  (no data for the current filters)";

// ---------------------------------------------------------------------------
// Text report
// ---------------------------------------------------------------------------

/// Render the dashboard as plain-text tables. `raw` appends the filtered
/// delay rows.
pub fn render_text(view: &DashboardView, raw: bool) -> String {
    let mut out = String::new();
    let title = "Train Delay & Accident Risk Report";
    let _ = writeln!(out, "{title}\n{}", "=".repeat(title.chars().count()));

    if let Some(msg) = &view.status_message {
        let _ = writeln!(out, "{msg}");
    }
    let _ = writeln!(out, "Filters: {}\n", describe_criteria(&view.criteria));

    // ---- KPIs ----
    let _ = writeln!(
        out,
        "{:<20}{:<20}{:<20}",
        "Avg Delay (mins)", "Accidents", "Trains Monitored"
    );
    let _ = writeln!(
        out,
        "{:<20}{:<20}{:<20}\n",
        view.summary.avg_delay_label(),
        view.summary.accident_count,
        view.summary.distinct_train_count
    );

    section(&mut out, "Top Delayed Trains", "Train", "Avg delay", &view.top_delayed_trains);
    section(&mut out, "Delay by Source City", "Source", "Avg delay", &view.delay_by_source);
    section(
        &mut out,
        "Delay by Destination City",
        "Destination",
        "Avg delay",
        &view.delay_by_destination,
    );
    section(&mut out, "Delay by Route", "Route", "Avg delay", &view.route_delays);
    section(&mut out, "Accidents by Year", "Year", "Count", &view.accidents_by_year);
    section(&mut out, "Accidents by Severity", "Severity", "Count", &view.accidents_by_severity);

    // ---- Accident table ----
    let _ = writeln!(out, "Accidents ({})", view.accidents.len());
    if view.accidents.is_empty() {
        let _ = writeln!(out, "{NO_DATA}");
    }
    for a in &view.accidents {
        let _ = writeln!(
            out,
            "  {:<6} {:<28} {:<18} {:<18} {}",
            a.year.map(|y| y.to_string()).unwrap_or_default(),
            a.train_name.as_deref().unwrap_or(""),
            a.departure_from.as_deref().unwrap_or(""),
            a.going_to.as_deref().unwrap_or(""),
            a.location.as_deref().unwrap_or(""),
        );
    }
    let _ = writeln!(out, "Mapped accident locations: {}", view.map_points.len());

    if raw {
        let _ = writeln!(out, "\nRaw Delay Data ({})", view.delays.len());
        for d in &view.delays {
            let _ = writeln!(
                out,
                "  {:<28} {:<16} {:<16} {:<20} {:<20} {:>8.1}",
                d.train_name,
                d.source_station,
                d.destination_station,
                timestamp_label(d.scheduled_time),
                timestamp_label(d.actual_time),
                d.delay_minutes
            );
        }
    }

    out
}

fn section(
    out: &mut String,
    title: &str,
    key_label: &str,
    value_label: &str,
    rows: &[AggregateRow],
) {
    let _ = writeln!(out, "{title}");
    if rows.is_empty() {
        let _ = writeln!(out, "{NO_DATA}\n");
        return;
    }
    let width = rows
        .iter()
        .map(|r| r.key.to_string().chars().count())
        .chain(std::iter::once(key_label.len()))
        .max()
        .unwrap_or(0);
    let _ = writeln!(out, "  {key_label:<width$}  {value_label:>10}");
    for row in rows {
        let _ = writeln!(out, "  {:<width$}  {:>10.2}", row.key.to_string(), row.value);
    }
    out.push('\n');
}

fn timestamp_label(t: Option<chrono::NaiveDateTime>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn describe_criteria(criteria: &FilterCriteria) -> String {
    let train = match &criteria.train {
        TrainSelection::All => "All".to_string(),
        TrainSelection::Named(name) => name.clone(),
    };
    let dates = match &criteria.date_range {
        None => "any".to_string(),
        Some(r) if r.is_inverted() => "none".to_string(),
        Some(r) => format!("{} to {}", r.start.format("%Y-%m-%d"), r.end.format("%Y-%m-%d")),
    };
    let severity = match &criteria.severities {
        None => "any".to_string(),
        Some(set) if set.is_empty() => "none".to_string(),
        Some(set) => set.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
    };
    format!("train={train}; dates={dates}; severity={severity}")
}

// ---------------------------------------------------------------------------
// JSON report
// ---------------------------------------------------------------------------

pub fn render_json(view: &DashboardView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(view)
}
