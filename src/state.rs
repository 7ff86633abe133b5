use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::color::StatusColors;
use crate::data::filter::{FilterSelection, filtered_indices};
use crate::data::loader::{ColumnConfig, load_file};
use crate::data::model::CaseDataset;
use crate::data::summary::{Summary, SummaryOptions, summarize};

// ---------------------------------------------------------------------------
// Source bookkeeping for reload-on-change
// ---------------------------------------------------------------------------

/// Where the dataset came from, with the modification time observed at load.
/// A reload request re-parses only when the file changed on disk.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl SourceInfo {
    fn observe(path: &Path) -> SourceInfo {
        SourceInfo {
            path: path.to_path_buf(),
            modified: std::fs::metadata(path).and_then(|m| m.modified()).ok(),
        }
    }

    fn is_stale(&self) -> bool {
        let current = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok();
        current != self.modified
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until the user opens a file).
    pub dataset: Option<CaseDataset>,

    /// Source of the current dataset, for reload-on-change.
    pub source: Option<SourceInfo>,

    /// Logical field → source column name mapping.
    pub columns: ColumnConfig,

    /// Current filter selection.
    pub selection: FilterSelection,

    /// Indices of records passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// Summary views for the current subset; `None` means no data or an
    /// empty result.
    pub summary: Option<Summary>,

    /// Top-N limits for the frequency and duration tables.
    pub options: SummaryOptions,

    /// Status value → chart colour mapping.
    pub status_colors: Option<StatusColors>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            source: None,
            columns: ColumnConfig::default(),
            selection: FilterSelection::all(),
            visible_indices: Vec::new(),
            summary: None,
            options: SummaryOptions::default(),
            status_colors: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Load a dataset from disk, replacing the current one.  Errors leave
    /// the previous dataset in place and surface as a status message.
    pub fn load_from_path(&mut self, path: &Path) {
        match load_file(path, &self.columns) {
            Ok(dataset) => {
                self.source = Some(SourceInfo::observe(path));
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Re-parse the source if it changed on disk; otherwise keep the cached
    /// dataset and say so.
    pub fn reload_if_changed(&mut self) {
        let Some(source) = self.source.clone() else {
            return;
        };
        if source.is_stale() {
            log::info!("source changed on disk, reloading {}", source.path.display());
            self.load_from_path(&source.path);
        } else {
            self.status_message = Some("Source unchanged, using cached data".to_string());
        }
    }

    /// Ingest a newly loaded dataset and reset the selection.
    ///
    /// Initial selection mirrors the original sheet defaults: every year and
    /// status selected, municipalities unrestricted.
    pub fn set_dataset(&mut self, dataset: CaseDataset) {
        self.selection = FilterSelection {
            years: dataset.years.clone(),
            statuses: dataset.statuses.clone(),
            municipalities: BTreeSet::new(),
        };
        self.status_colors = Some(StatusColors::new(&dataset.statuses));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the visible subset and its summary after any selection or
    /// option change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.selection);
            self.summary = summarize(ds, &self.visible_indices, &self.options);
        } else {
            self.visible_indices.clear();
            self.summary = None;
        }
    }

    /// Toggle a single year in the selection.
    pub fn toggle_year(&mut self, year: i32) {
        if !self.selection.years.remove(&year) {
            self.selection.years.insert(year);
        }
        self.refilter();
    }

    /// Toggle a status or municipality value.  A no-op for the year
    /// dimension, which holds integers (see [`AppState::toggle_year`]).
    pub fn toggle_value(&mut self, dimension: Dimension, value: &str) {
        let set = match dimension {
            Dimension::Status => &mut self.selection.statuses,
            Dimension::Municipality => &mut self.selection.municipalities,
            Dimension::Year => return,
        };
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every value of a dimension.
    pub fn select_all(&mut self, dimension: Dimension) {
        if let Some(ds) = &self.dataset {
            match dimension {
                Dimension::Year => self.selection.years = ds.years.clone(),
                Dimension::Status => self.selection.statuses = ds.statuses.clone(),
                Dimension::Municipality => {
                    self.selection.municipalities = ds.municipalities.clone()
                }
            }
            self.refilter();
        }
    }

    /// Clear a dimension.  Under the inclusive policy this removes the
    /// restriction rather than hiding everything.
    pub fn select_none(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::Year => self.selection.years.clear(),
            Dimension::Status => self.selection.statuses.clear(),
            Dimension::Municipality => self.selection.municipalities.clear(),
        }
        self.refilter();
    }
}

/// The three filterable dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Year,
    Status,
    Municipality,
}
