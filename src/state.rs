use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, error};
use serde::Serialize;

use crate::cache::DatasetCache;
use crate::data::aggregate;
use crate::data::filter::{
    filtered_indices, DateRange, FilterCriteria, FilteredIndices, FilteredView, TrainSelection,
    ALL_TRAINS,
};
use crate::data::model::{AccidentRecord, AggregateRow, Datasets, DelayRecord, Severity};
use crate::data::summary::{map_points, summarize, MapPoint, Summary};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// One user's session, independent of rendering.
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Shared snapshot (None when loading failed).
    pub datasets: Option<Arc<Datasets>>,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Records passing the current filters (cached).
    pub visible: FilteredIndices,

    /// Status / error message for the presentation layer.
    pub status_message: Option<String>,
}

impl DashboardState {
    /// Start a session from the cache. A failed load leaves the session in
    /// its placeholder state with the reason in `status_message`.
    pub fn from_cache(cache: &DatasetCache) -> Self {
        let mut state = Self::default();
        match cache.get() {
            Ok(ds) => state.set_datasets(ds),
            Err(e) => {
                error!("Failed to load datasets: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
        state
    }

    /// Ingest a snapshot and reset filters. The date range defaults to the
    /// data's scheduled-time bounds, as the date picker would.
    pub fn set_datasets(&mut self, datasets: Arc<Datasets>) {
        self.criteria = FilterCriteria {
            date_range: datasets
                .date_bounds()
                .map(|(start, end)| DateRange::new(start, end)),
            ..Default::default()
        };
        self.datasets = Some(datasets);
        self.status_message = None;
        self.refilter();
    }

    pub fn has_data(&self) -> bool {
        self.datasets.is_some()
    }

    /// Recompute `visible` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.datasets {
            self.visible = filtered_indices(ds, &self.criteria);
            debug!(
                "Filter {:?}: {} delays, {} accidents visible",
                self.criteria,
                self.visible.delays.len(),
                self.visible.accidents.len()
            );
        }
    }

    /// "All" followed by every train name, for the train selector.
    pub fn train_choices(&self) -> Vec<String> {
        let mut choices = vec![ALL_TRAINS.to_string()];
        if let Some(ds) = &self.datasets {
            choices.extend(ds.train_names());
        }
        choices
    }

    pub fn select_train(&mut self, choice: &str) {
        self.criteria.train = TrainSelection::from_choice(choice);
        self.refilter();
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.criteria.date_range = Some(range);
        self.refilter();
    }

    pub fn clear_date_range(&mut self) {
        self.criteria.date_range = None;
        self.refilter();
    }

    /// Toggle a single severity. The first toggle starts from every level
    /// selected; from then on the set is explicit, so unclassified accidents
    /// stay hidden even with all three levels selected.
    pub fn toggle_severity(&mut self, severity: Severity) {
        let mut selected = self
            .criteria
            .severities
            .take()
            .unwrap_or_else(Severity::all);
        if !selected.remove(&severity) {
            selected.insert(severity);
        }
        self.criteria.severities = Some(selected);
        self.refilter();
    }

    pub fn select_all_severities(&mut self) {
        self.criteria.severities = Some(Severity::all());
        self.refilter();
    }

    /// Back to the initial state: severity not filtered at all.
    pub fn clear_severity_filter(&mut self) {
        self.criteria.severities = None;
        self.refilter();
    }

    pub fn select_no_severities(&mut self) {
        self.criteria.severities = Some(BTreeSet::new());
        self.refilter();
    }

    /// Replace every criterion at once.
    pub fn apply(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    pub fn filtered(&self) -> FilteredView<'_> {
        match &self.datasets {
            Some(ds) => self.visible.view(ds),
            None => FilteredView::default(),
        }
    }

    /// Everything the presentation layer shows for the current filters.
    pub fn view(&self, top_n: usize) -> DashboardView {
        let FilteredView { delays, accidents } = self.filtered();
        let delays_iter = || delays.iter().copied();
        let accidents_iter = || accidents.iter().copied();

        DashboardView {
            criteria: self.criteria.clone(),
            summary: summarize(delays_iter(), accidents_iter()),
            top_delayed_trains: aggregate::top_delayed_trains(delays_iter(), top_n),
            delay_by_source: aggregate::delay_by_source(delays_iter(), top_n),
            delay_by_destination: aggregate::delay_by_destination(delays_iter(), top_n),
            route_delays: aggregate::route_delays(delays_iter(), top_n),
            accidents_by_year: aggregate::accidents_by_year(accidents_iter(), top_n),
            accidents_by_severity: aggregate::accidents_by_severity(accidents_iter()),
            map_points: map_points(accidents_iter()),
            delays: delays_iter().cloned().collect(),
            accidents: accidents_iter().cloned().collect(),
            status_message: self.status_message.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub summary: Summary,
    pub top_delayed_trains: Vec<AggregateRow>,
    pub delay_by_source: Vec<AggregateRow>,
    pub delay_by_destination: Vec<AggregateRow>,
    pub route_delays: Vec<AggregateRow>,
    pub accidents_by_year: Vec<AggregateRow>,
    pub accidents_by_severity: Vec<AggregateRow>,
    pub map_points: Vec<MapPoint>,
    pub delays: Vec<DelayRecord>,
    pub accidents: Vec<AccidentRecord>,
    pub status_message: Option<String>,
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty() && self.accidents.is_empty()
    }
}
