use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// Month – calendar month with chronological ordering
// ---------------------------------------------------------------------------

/// Calendar month of the entry date.  The derived `Ord` follows the variant
/// order, so grouping by `Month` sorts January..December, never alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// From a chrono month number (1–12).
    pub fn from_number(n: u32) -> Option<Month> {
        Month::ALL.get(n.checked_sub(1)? as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Three-letter abbreviation for chart axis labels.
    pub fn abbrev(self) -> &'static str {
        &self.name()[..3]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// CaseRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single administrative case record (one row of the source sheet).
/// Immutable after load; derived fields are computed once by the loader.
#[derive(Debug, Clone)]
pub struct CaseRecord {
    /// Protocol identifier.  Not guaranteed unique across rows.
    pub protocol: String,
    /// Entry date.  Rows without a parseable entry date never reach the
    /// working set.
    pub entry_date: NaiveDate,
    /// Exit date, when the source provides one.
    pub exit_date: Option<NaiveDate>,
    pub status: String,
    pub municipality: String,
    pub subject: String,
    /// Entry year, derived from `entry_date`.
    pub year: i32,
    /// Entry month, derived from `entry_date`.
    pub month: Month,
    /// Whole days between entry and exit.  `Some` implies ≥ 0; rows with a
    /// negative difference are dropped by the loader.
    pub duration_days: Option<i64>,
}

impl CaseRecord {
    /// Build a record from parsed fields, deriving year, month and duration.
    /// Returns `None` when the exit date precedes the entry date.
    pub fn new(
        protocol: String,
        entry_date: NaiveDate,
        exit_date: Option<NaiveDate>,
        status: String,
        municipality: String,
        subject: String,
    ) -> Option<CaseRecord> {
        let duration_days = match exit_date {
            Some(exit) => {
                let days = (exit - entry_date).num_days();
                if days < 0 {
                    return None;
                }
                Some(days)
            }
            None => None,
        };
        let month = Month::from_number(entry_date.month())?;
        Some(CaseRecord {
            protocol,
            year: entry_date.year(),
            month,
            entry_date,
            exit_date,
            status,
            municipality,
            subject,
            duration_days,
        })
    }
}

// ---------------------------------------------------------------------------
// CaseDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full normalized dataset with pre-computed per-dimension indexes.
#[derive(Debug, Clone)]
pub struct CaseDataset {
    /// All case records (rows), in source order.
    pub records: Vec<CaseRecord>,
    /// Unique entry years, ascending.
    pub years: BTreeSet<i32>,
    /// Unique status values.
    pub statuses: BTreeSet<String>,
    /// Unique municipality values.
    pub municipalities: BTreeSet<String>,
    /// Unique subject values.
    pub subjects: BTreeSet<String>,
}

impl CaseDataset {
    /// Build the dimension indexes from the loaded records.
    pub fn from_records(records: Vec<CaseRecord>) -> Self {
        let mut years = BTreeSet::new();
        let mut statuses = BTreeSet::new();
        let mut municipalities = BTreeSet::new();
        let mut subjects = BTreeSet::new();

        for rec in &records {
            years.insert(rec.year);
            statuses.insert(rec.status.clone());
            municipalities.insert(rec.municipality.clone());
            subjects.insert(rec.subject.clone());
        }
        CaseDataset {
            records,
            years,
            statuses,
            municipalities,
            subjects,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_ordering_is_chronological() {
        let mut months = vec![Month::December, Month::April, Month::August, Month::January];
        months.sort();
        assert_eq!(
            months,
            vec![Month::January, Month::April, Month::August, Month::December]
        );
    }

    #[test]
    fn record_derives_year_month_duration() {
        let rec = CaseRecord::new(
            "P-1".into(),
            date(2023, 3, 10),
            Some(date(2023, 3, 25)),
            "Open".into(),
            "Belém".into(),
            "Licensing".into(),
        )
        .unwrap();
        assert_eq!(rec.year, 2023);
        assert_eq!(rec.month, Month::March);
        assert_eq!(rec.duration_days, Some(15));
    }

    #[test]
    fn exit_before_entry_is_rejected() {
        let rec = CaseRecord::new(
            "P-2".into(),
            date(2023, 3, 10),
            Some(date(2023, 3, 1)),
            "Closed".into(),
            "Belém".into(),
            "Licensing".into(),
        );
        assert!(rec.is_none());
    }

    #[test]
    fn missing_exit_date_keeps_record_without_duration() {
        let rec = CaseRecord::new(
            "P-3".into(),
            date(2022, 12, 31),
            None,
            "Open".into(),
            "Marabá".into(),
            "Appeal".into(),
        )
        .unwrap();
        assert_eq!(rec.duration_days, None);
        assert_eq!(rec.month, Month::December);
    }

    #[test]
    fn dataset_indexes_unique_values() {
        let recs = vec![
            CaseRecord::new(
                "A".into(),
                date(2022, 1, 1),
                None,
                "Open".into(),
                "Belém".into(),
                "Licensing".into(),
            )
            .unwrap(),
            CaseRecord::new(
                "B".into(),
                date(2023, 2, 1),
                None,
                "Open".into(),
                "Belém".into(),
                "Appeal".into(),
            )
            .unwrap(),
        ];
        let ds = CaseDataset::from_records(recs);
        assert_eq!(ds.years.iter().copied().collect::<Vec<_>>(), vec![2022, 2023]);
        assert_eq!(ds.statuses.len(), 1);
        assert_eq!(ds.municipalities.len(), 1);
        assert_eq!(ds.subjects.len(), 2);
    }
}
