use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;

use super::model::{CaseDataset, Month};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Allowed range for the longest-cases table size.
pub const TOP_DURATIONS_RANGE: RangeInclusive<usize> = 5..=50;

/// Knobs for the summary views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Row limit for the top-N frequency tables.
    pub top_n: usize,
    /// Row limit for the longest-cases table, clamped to
    /// [`TOP_DURATIONS_RANGE`].
    pub top_durations: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            top_n: 10,
            top_durations: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary views
// ---------------------------------------------------------------------------

/// Headline figures for the KPI row.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub distinct_protocols: usize,
    pub distinct_municipalities: usize,
    pub distinct_subjects: usize,
    /// Mean processing duration over rows that have one; `None` when the
    /// subset has no completed case.
    pub mean_duration_days: Option<f64>,
}

/// One row of a grouped count (status distribution, top-N tables).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

/// One duration histogram bin covering `lower..upper` days (upper exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramBin {
    pub lower: i64,
    pub upper: i64,
    pub count: usize,
}

/// Everything the dashboard renders for one filter interaction.  Produced by
/// [`summarize`]; never built for an empty subset.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Size of the filtered subset.
    pub total_records: usize,
    pub kpis: Kpis,
    /// Record counts per entry month, calendar order, zero months omitted.
    pub monthly_trend: Vec<(Month, usize)>,
    /// Record counts per status, largest first.
    pub status_distribution: Vec<FrequencyEntry>,
    pub top_municipalities: Vec<FrequencyEntry>,
    pub top_subjects: Vec<FrequencyEntry>,
    pub top_protocols: Vec<FrequencyEntry>,
    /// Indices (into the dataset) of the longest-running completed cases,
    /// duration descending.
    pub longest_cases: Vec<usize>,
    /// Fixed-width duration histogram; empty when no row has a duration.
    pub duration_histogram: Vec<HistogramBin>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compute all summary views for the filtered subset.
///
/// Pure function of (dataset, indices, options).  Returns `None` when the
/// subset is empty: that is the explicit "no results" signal, and no
/// aggregate is computed in that case.
pub fn summarize(
    dataset: &CaseDataset,
    indices: &[usize],
    options: &SummaryOptions,
) -> Option<Summary> {
    if indices.is_empty() {
        return None;
    }
    let top_durations = options
        .top_durations
        .clamp(*TOP_DURATIONS_RANGE.start(), *TOP_DURATIONS_RANGE.end());

    let records = |i: &usize| &dataset.records[*i];

    // -- KPIs: distinct counts over the subset --
    let mut protocols = BTreeSet::new();
    let mut municipalities = BTreeSet::new();
    let mut subjects = BTreeSet::new();
    for rec in indices.iter().map(records) {
        protocols.insert(rec.protocol.as_str());
        municipalities.insert(rec.municipality.as_str());
        subjects.insert(rec.subject.as_str());
    }

    // -- Durations: mean, ranking, histogram --
    let durations: Vec<(usize, i64)> = indices
        .iter()
        .filter_map(|&i| dataset.records[i].duration_days.map(|d| (i, d)))
        .collect();
    let mean_duration_days = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().map(|&(_, d)| d as f64).sum::<f64>() / durations.len() as f64)
    };
    let longest_cases = {
        let mut ranked = durations.clone();
        // Stable sort: equal durations keep source order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(top_durations);
        ranked.into_iter().map(|(i, _)| i).collect()
    };
    let duration_histogram = duration_histogram(&durations);

    // -- Monthly trend, calendar order --
    let mut by_month: BTreeMap<Month, usize> = BTreeMap::new();
    for rec in indices.iter().map(records) {
        *by_month.entry(rec.month).or_default() += 1;
    }
    let monthly_trend: Vec<(Month, usize)> = by_month.into_iter().collect();

    Some(Summary {
        total_records: indices.len(),
        kpis: Kpis {
            distinct_protocols: protocols.len(),
            distinct_municipalities: municipalities.len(),
            distinct_subjects: subjects.len(),
            mean_duration_days,
        },
        monthly_trend,
        status_distribution: top_frequencies(dataset, indices, |r| &r.status, usize::MAX),
        top_municipalities: top_frequencies(dataset, indices, |r| &r.municipality, options.top_n),
        top_subjects: top_frequencies(dataset, indices, |r| &r.subject, options.top_n),
        top_protocols: top_frequencies(dataset, indices, |r| &r.protocol, options.top_n),
        longest_cases,
        duration_histogram,
    })
}

/// Group the subset by a categorical field, count, sort by count descending
/// (stable, so ties keep first-seen order) and keep the first `n` entries.
fn top_frequencies(
    dataset: &CaseDataset,
    indices: &[usize],
    field: impl Fn(&crate::data::model::CaseRecord) -> &String,
    n: usize,
) -> Vec<FrequencyEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for &i in indices {
        let value = field(&dataset.records[i]).as_str();
        match counts.get_mut(value) {
            Some(c) => *c += 1,
            None => {
                counts.insert(value, 1);
                first_seen.push(value);
            }
        }
    }
    let mut entries: Vec<FrequencyEntry> = first_seen
        .into_iter()
        .map(|value| FrequencyEntry {
            count: counts[value],
            value: value.to_string(),
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(n);
    entries
}

/// Bucket durations into fixed-width bins from zero to the maximum value.
/// Aims for about a dozen bins; always at least one day wide.
fn duration_histogram(durations: &[(usize, i64)]) -> Vec<HistogramBin> {
    let max = match durations.iter().map(|&(_, d)| d).max() {
        Some(m) => m,
        None => return Vec::new(),
    };
    let width = (max / 12 + 1).max(1);
    let n_bins = (max / width + 1) as usize;

    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|b| HistogramBin {
            lower: b as i64 * width,
            upper: (b as i64 + 1) * width,
            count: 0,
        })
        .collect();
    for &(_, d) in durations {
        bins[(d / width) as usize].count += 1;
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterSelection, filtered_indices};
    use crate::data::model::CaseRecord;
    use chrono::NaiveDate;

    fn record(
        protocol: &str,
        entry: (i32, u32, u32),
        duration: Option<i64>,
        status: &str,
        municipality: &str,
        subject: &str,
    ) -> CaseRecord {
        let entry_date = NaiveDate::from_ymd_opt(entry.0, entry.1, entry.2).unwrap();
        let exit_date = duration.map(|d| entry_date + chrono::Duration::days(d));
        CaseRecord::new(
            protocol.to_string(),
            entry_date,
            exit_date,
            status.to_string(),
            municipality.to_string(),
            subject.to_string(),
        )
        .unwrap()
    }

    fn sample_dataset() -> CaseDataset {
        CaseDataset::from_records(vec![
            record("P-1", (2023, 3, 1), Some(30), "Open", "Belém", "Licensing"),
            record("P-2", (2023, 1, 5), Some(10), "Closed", "Marabá", "Appeal"),
            record("P-3", (2023, 3, 9), None, "Open", "Belém", "Licensing"),
            record("P-4", (2023, 12, 2), Some(80), "Closed", "Santarém", "Licensing"),
            record("P-5", (2023, 1, 20), Some(40), "Open", "Belém", "Appeal"),
        ])
    }

    fn all_indices(ds: &CaseDataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn empty_subset_yields_no_summary() {
        let ds = sample_dataset();
        assert!(summarize(&ds, &[], &SummaryOptions::default()).is_none());
    }

    #[test]
    fn kpis_count_distinct_values() {
        let ds = sample_dataset();
        let s = summarize(&ds, &all_indices(&ds), &SummaryOptions::default()).unwrap();
        assert_eq!(s.total_records, 5);
        assert_eq!(s.kpis.distinct_protocols, 5);
        assert_eq!(s.kpis.distinct_municipalities, 3);
        assert_eq!(s.kpis.distinct_subjects, 2);
    }

    #[test]
    fn mean_ignores_rows_without_duration() {
        let ds = sample_dataset();
        let s = summarize(&ds, &all_indices(&ds), &SummaryOptions::default()).unwrap();
        // (30 + 10 + 80 + 40) / 4
        assert_eq!(s.kpis.mean_duration_days, Some(40.0));
    }

    #[test]
    fn mean_is_none_when_no_case_is_complete() {
        let ds = CaseDataset::from_records(vec![record(
            "P-1",
            (2023, 3, 1),
            None,
            "Open",
            "Belém",
            "Licensing",
        )]);
        let s = summarize(&ds, &[0], &SummaryOptions::default()).unwrap();
        assert_eq!(s.kpis.mean_duration_days, None);
        assert!(s.duration_histogram.is_empty());
        assert!(s.longest_cases.is_empty());
    }

    #[test]
    fn monthly_trend_is_calendar_ordered() {
        let ds = sample_dataset();
        let s = summarize(&ds, &all_indices(&ds), &SummaryOptions::default()).unwrap();
        let months: Vec<Month> = s.monthly_trend.iter().map(|&(m, _)| m).collect();
        assert_eq!(months, vec![Month::January, Month::March, Month::December]);
        let counts: Vec<usize> = s.monthly_trend.iter().map(|&(_, c)| c).collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn top_n_is_bounded_and_non_increasing() {
        let ds = sample_dataset();
        let options = SummaryOptions {
            top_n: 2,
            ..Default::default()
        };
        let s = summarize(&ds, &all_indices(&ds), &options).unwrap();
        assert!(s.top_municipalities.len() <= 2);
        assert_eq!(s.top_municipalities[0].value, "Belém");
        assert_eq!(s.top_municipalities[0].count, 3);
        for pair in s.top_municipalities.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn top_n_ties_keep_first_seen_order() {
        let ds = sample_dataset();
        let s = summarize(&ds, &all_indices(&ds), &SummaryOptions::default()).unwrap();
        // Marabá and Santarém both count 1; Marabá appears first in the data.
        assert_eq!(s.top_municipalities[1].value, "Marabá");
        assert_eq!(s.top_municipalities[2].value, "Santarém");
    }

    #[test]
    fn top_protocols_rank_repeated_protocols() {
        // Protocols are not unique: P-7 appears three times, P-8 twice.
        let ds = CaseDataset::from_records(vec![
            record("P-7", (2023, 1, 3), None, "Open", "Belém", "Licensing"),
            record("P-8", (2023, 2, 1), None, "Open", "Marabá", "Appeal"),
            record("P-7", (2023, 2, 9), None, "Closed", "Belém", "Licensing"),
            record("P-9", (2023, 3, 4), None, "Open", "Santarém", "Appeal"),
            record("P-8", (2023, 3, 8), None, "Closed", "Marabá", "Appeal"),
            record("P-7", (2023, 4, 2), None, "Open", "Belém", "Licensing"),
        ]);
        let options = SummaryOptions {
            top_n: 2,
            ..Default::default()
        };
        let s = summarize(&ds, &all_indices(&ds), &options).unwrap();

        assert_eq!(s.top_protocols.len(), 2);
        assert_eq!(s.top_protocols[0].value, "P-7");
        assert_eq!(s.top_protocols[0].count, 3);
        assert_eq!(s.top_protocols[1].value, "P-8");
        assert_eq!(s.top_protocols[1].count, 2);
        // The KPI counts the distinct protocols, not the rows.
        assert_eq!(s.kpis.distinct_protocols, 3);
    }

    #[test]
    fn longest_cases_are_duration_descending() {
        let ds = sample_dataset();
        let s = summarize(&ds, &all_indices(&ds), &SummaryOptions::default()).unwrap();
        let durations: Vec<i64> = s
            .longest_cases
            .iter()
            .map(|&i| ds.records[i].duration_days.unwrap())
            .collect();
        assert_eq!(durations, vec![80, 40, 30, 10]);
    }

    #[test]
    fn longest_cases_limit_is_clamped() {
        let ds = sample_dataset();
        let options = SummaryOptions {
            top_durations: 1, // below the allowed minimum of 5
            ..Default::default()
        };
        let s = summarize(&ds, &all_indices(&ds), &options).unwrap();
        // Clamped up to 5, but only 4 rows have durations.
        assert_eq!(s.longest_cases.len(), 4);
    }

    #[test]
    fn histogram_covers_all_durations() {
        let ds = sample_dataset();
        let s = summarize(&ds, &all_indices(&ds), &SummaryOptions::default()).unwrap();
        let total: usize = s.duration_histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 4);
        for bin in &s.duration_histogram {
            assert!(bin.lower < bin.upper);
        }
    }

    #[test]
    fn filtered_summary_only_sees_subset() {
        let ds = sample_dataset();
        let mut sel = FilterSelection::all();
        sel.statuses.insert("Closed".to_string());
        let idx = filtered_indices(&ds, &sel);
        let s = summarize(&ds, &idx, &SummaryOptions::default()).unwrap();
        assert_eq!(s.total_records, 2);
        assert_eq!(s.kpis.mean_duration_days, Some(45.0));
        assert_eq!(s.status_distribution.len(), 1);
        assert_eq!(s.status_distribution[0].value, "Closed");
    }
}
