use std::collections::BTreeSet;

use super::model::CaseDataset;

// ---------------------------------------------------------------------------
// Filter selection: which values are allowed per dimension
// ---------------------------------------------------------------------------

/// Per-interaction selection over the three filterable dimensions.
///
/// Policy: an **empty set means "no restriction"** on that dimension, for all
/// three dimensions uniformly.  (The source sheets were inconsistent here;
/// this app picks the inclusive reading so that clearing a filter widens the
/// view instead of blanking it.)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    pub statuses: BTreeSet<String>,
    pub municipalities: BTreeSet<String>,
}

impl FilterSelection {
    /// A selection with every dimension unrestricted.
    pub fn all() -> Self {
        FilterSelection::default()
    }

    /// Whether any dimension actually restricts the view.
    pub fn is_unrestricted(&self, dataset: &CaseDataset) -> bool {
        let unrestricted = |selected: &BTreeSet<String>, all: &BTreeSet<String>| {
            selected.is_empty() || selected.len() == all.len()
        };
        (self.years.is_empty() || self.years.len() == dataset.years.len())
            && unrestricted(&self.statuses, &dataset.statuses)
            && unrestricted(&self.municipalities, &dataset.municipalities)
    }
}

/// Return indices of records that pass all active filters.
///
/// A record passes a dimension when:
/// * the selected set for that dimension is empty → passes (no restriction)
/// * the record's value is in the selected set → passes
pub fn filtered_indices(dataset: &CaseDataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            (selection.years.is_empty() || selection.years.contains(&rec.year))
                && (selection.statuses.is_empty() || selection.statuses.contains(&rec.status))
                && (selection.municipalities.is_empty()
                    || selection.municipalities.contains(&rec.municipality))
        })
        .map(|(i, _)| i)
        .collect()
}
