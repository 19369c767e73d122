use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::data::cache::Memo;
use crate::data::filter::{DateRange, FilterSelection};
use crate::data::loader::{DataLoadError, DataStore};
use crate::data::model::{FilterColumn, GameTable};
use crate::data::summary::DashboardSummary;

/// Memo key for a filtered view of a loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ViewKey {
    source: String,
    filters: FilterSelection,
    dates: Option<DateRange>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    store: DataStore,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<GameTable>>,

    /// Where `dataset` was read from.
    pub source_path: Option<PathBuf>,

    /// Sidebar option lists, in first-appearance order.
    pub options: BTreeMap<FilterColumn, Vec<String>>,

    /// Per-column filter selections.
    pub filters: FilterSelection,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Whether the start/end dates restrict `release_date`.
    pub apply_date_range: bool,

    /// Current filtered view and its summary (cached).
    pub view: Option<Arc<GameTable>>,
    pub summary: Option<Arc<DashboardSummary>>,

    views: Memo<ViewKey, GameTable>,
    summaries: Memo<(String, usize), DashboardSummary>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: DataStore::new(),
            dataset: None,
            source_path: None,
            options: BTreeMap::new(),
            filters: FilterSelection::new(),
            start_date: NaiveDate::default(),
            end_date: NaiveDate::default(),
            apply_date_range: false,
            view: None,
            summary: None,
            views: Memo::new(),
            summaries: Memo::new(),
            status_message: None,
        }
    }

    /// Load `path` through the cache and make it the current dataset.
    ///
    /// On failure nothing stays on screen except the error.
    pub fn open(&mut self, path: &Path) {
        match self.load_path(path) {
            Ok(()) => {
                if let Some(ds) = &self.dataset {
                    log::info!(
                        "Loaded {} games from {} ({} sources cached)",
                        ds.len(),
                        path.display(),
                        self.store.cached_tables()
                    );
                }
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.dataset = None;
                self.source_path = None;
                self.view = None;
                self.summary = None;
                self.options.clear();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn load_path(&mut self, path: &Path) -> Result<(), DataLoadError> {
        let table = self.store.load(path)?;
        self.set_dataset(table, Some(path.to_path_buf()));
        Ok(())
    }

    /// Ingest a newly loaded dataset, reset filters and date defaults.
    pub fn set_dataset(&mut self, dataset: Arc<GameTable>, source: Option<PathBuf>) {
        self.options = FilterColumn::ALL
            .into_iter()
            .map(|c| (c, dataset.distinct(c)))
            .collect();
        self.filters = FilterSelection::new();
        self.start_date = dataset.release_date_min().unwrap_or_default();
        self.end_date = dataset.as_of_max().unwrap_or_default();
        self.apply_date_range = false;

        self.dataset = Some(dataset);
        self.source_path = source;
        self.status_message = None;
        self.refilter();
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.apply_date_range.then_some(DateRange {
            start: self.start_date,
            end: self.end_date,
        })
    }

    /// Recompute `view` and `summary` after a filter change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.view = None;
            self.summary = None;
            return;
        };

        let dates = self.date_range();
        let key = ViewKey {
            source: ds.fingerprint().to_string(),
            filters: self.filters.clone(),
            dates,
        };
        let filters = &self.filters;
        let view = self.views.get_or_insert_with(key, || {
            let view = filters.apply(ds);
            match dates {
                Some(range) => range.apply(&view),
                None => view,
            }
        });

        let top_n = self.config.top_n;
        let summary = self
            .summaries
            .get_or_insert_with((view.fingerprint().to_string(), top_n), || {
                DashboardSummary::compute(&view, top_n)
            });
        log::debug!(
            "{} of {} games visible (view cache {:?}, summary cache {:?})",
            view.len(),
            ds.len(),
            self.views.stats(),
            self.summaries.stats()
        );

        self.view = Some(view);
        self.summary = Some(summary);
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: FilterColumn, value: &str) {
        self.filters.toggle(column, value);
        self.refilter();
    }

    /// Drop every selection for a column (show all).
    pub fn clear_filter(&mut self, column: FilterColumn) {
        self.filters.clear(column);
        self.refilter();
    }

    /// Write the current summary, with the filters that produced it, as JSON.
    pub fn export_summary(&self, path: &Path) -> anyhow::Result<()> {
        let summary = self
            .summary
            .as_deref()
            .context("no dataset loaded, nothing to export")?;
        let export = SummaryExport {
            source: self.source_path.as_deref(),
            filters: &self.filters,
            date_range: self.date_range(),
            summary,
        };
        let json = serde_json::to_string_pretty(&export).context("serialising summary")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SummaryExport<'a> {
    source: Option<&'a Path>,
    filters: &'a FilterSelection,
    date_range: Option<DateRange>,
    summary: &'a DashboardSummary,
}
