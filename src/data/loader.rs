use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Date32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{CaseDataset, CaseRecord};

// ---------------------------------------------------------------------------
// Column configuration
// ---------------------------------------------------------------------------

/// Maps the logical record fields onto source column names.  The exact
/// headers vary between sheet revisions ("STATUS" vs "Status Processo"), so
/// they are configuration, not part of the loader contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub protocol: String,
    pub entry_date: String,
    /// Exit-date column.  When the source has no such column the duration
    /// views are simply absent.
    pub exit_date: String,
    pub status: String,
    pub municipality: String,
    pub subject: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        // Headers of the original control sheet.
        ColumnConfig {
            protocol: "Protocolo".to_string(),
            entry_date: "Dt. Entrada".to_string(),
            exit_date: "Dt. Saída".to_string(),
            status: "STATUS".to_string(),
            municipality: "MUNICÍPIO".to_string(),
            subject: "Assunto".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural load failures.  Individual malformed cell values are not
/// errors; those rows are silently dropped.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("source is missing required column '{0}'")]
    MissingColumn(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a case dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the configured column names
/// * `.json`    – records-oriented array, `[{ "Protocolo": ..., ... }, ...]`
/// * `.parquet` – one row per record, string or date columns
///
/// Rows with an unparseable entry date, or with an exit date before the
/// entry date, are dropped from the working set.
pub fn load_file(path: &Path, columns: &ColumnConfig) -> Result<CaseDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path, columns)?,
        "json" => load_json(path, columns)?,
        "parquet" | "pq" => load_parquet(path, columns)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    };

    log::info!(
        "loaded {} case records ({} years, {} statuses, {} municipalities)",
        dataset.len(),
        dataset.years.len(),
        dataset.statuses.len(),
        dataset.municipalities.len(),
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parse a date cell.  Accepts ISO dates, Brazilian day-first forms, and
/// datetime strings (time part ignored).  `None` means "missing".
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // Datetime forms first: take the date prefix.
    let date_part = s.split(|c| c == ' ' || c == 'T').next().unwrap_or(s);
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(d);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Row assembly
// ---------------------------------------------------------------------------

/// Raw cell values for one row, before validation.
struct RawRow {
    protocol: String,
    entry_date: Option<NaiveDate>,
    exit_date: Option<NaiveDate>,
    status: String,
    municipality: String,
    subject: String,
}

impl RawRow {
    /// Validate and derive.  `None` drops the row: missing entry date, or
    /// exit before entry.
    fn into_record(self) -> Option<CaseRecord> {
        let entry = self.entry_date?;
        CaseRecord::new(
            self.protocol,
            entry,
            self.exit_date,
            self.status,
            self.municipality,
            self.subject,
        )
    }
}

fn collect_records(rows: impl Iterator<Item = RawRow>) -> CaseDataset {
    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        match row.into_record() {
            Some(rec) => records.push(rec),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::warn!("dropped {dropped} rows with missing entry date or negative duration");
    }
    CaseDataset::from_records(records)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, columns: &ColumnConfig) -> Result<CaseDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let find = |name: &str| headers.iter().position(|h| h == name);
    let require = |name: &str| -> Result<usize> {
        find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()).into())
    };

    let protocol_idx = require(&columns.protocol)?;
    let entry_idx = require(&columns.entry_date)?;
    let status_idx = require(&columns.status)?;
    let municipality_idx = require(&columns.municipality)?;
    let subject_idx = require(&columns.subject)?;
    // Exit date is optional: absent column disables the duration views.
    let exit_idx = find(&columns.exit_date);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        rows.push(RawRow {
            protocol: cell(protocol_idx),
            entry_date: parse_date(record.get(entry_idx).unwrap_or("")),
            exit_date: exit_idx.and_then(|i| parse_date(record.get(i).unwrap_or(""))),
            status: cell(status_idx),
            municipality: cell(municipality_idx),
            subject: cell(subject_idx),
        });
    }

    Ok(collect_records(rows.into_iter()))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Protocolo": "2023/0001",
///     "Dt. Entrada": "2023-01-12",
///     "Dt. Saída": "2023-02-03",
///     "STATUS": "Concluído",
///     "MUNICÍPIO": "Belém",
///     "Assunto": "Regularização"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path, columns: &ColumnConfig) -> Result<CaseDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    // Required columns must appear in at least one record.
    for name in [
        &columns.protocol,
        &columns.entry_date,
        &columns.status,
        &columns.municipality,
        &columns.subject,
    ] {
        let present = records
            .iter()
            .any(|r| r.as_object().is_some_and(|o| o.contains_key(name)));
        if !records.is_empty() && !present {
            return Err(LoadError::MissingColumn(name.clone()).into());
        }
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let text_field = |name: &str| match obj.get(name) {
            Some(JsonValue::String(s)) => s.trim().to_string(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let date_field = |name: &str| match obj.get(name) {
            Some(JsonValue::String(s)) => parse_date(s),
            _ => None,
        };

        rows.push(RawRow {
            protocol: text_field(&columns.protocol),
            entry_date: date_field(&columns.entry_date),
            exit_date: date_field(&columns.exit_date),
            status: text_field(&columns.status),
            municipality: text_field(&columns.municipality),
            subject: text_field(&columns.subject),
        });
    }

    Ok(collect_records(rows.into_iter()))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of case records.
///
/// Expected schema: one column per configured field.  Text columns are Utf8;
/// date columns may be Utf8 (parsed like CSV cells) or Date32.  Works with
/// files written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path, columns: &ColumnConfig) -> Result<CaseDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let require = |name: &str| -> Result<usize> {
            schema
                .index_of(name)
                .map_err(|_| LoadError::MissingColumn(name.to_string()).into())
        };

        let protocol_idx = require(&columns.protocol)?;
        let entry_idx = require(&columns.entry_date)?;
        let status_idx = require(&columns.status)?;
        let municipality_idx = require(&columns.municipality)?;
        let subject_idx = require(&columns.subject)?;
        let exit_idx = schema.index_of(&columns.exit_date).ok();

        for row in 0..batch.num_rows() {
            rows.push(RawRow {
                protocol: extract_text(batch.column(protocol_idx), row),
                entry_date: extract_date(batch.column(entry_idx), row)
                    .with_context(|| format!("Row {row}: failed to read entry date"))?,
                exit_date: match exit_idx {
                    Some(i) => extract_date(batch.column(i), row)
                        .with_context(|| format!("Row {row}: failed to read exit date"))?,
                    None => None,
                },
                status: extract_text(batch.column(status_idx), row),
                municipality: extract_text(batch.column(municipality_idx), row),
                subject: extract_text(batch.column(subject_idx), row),
            });
        }
    }

    Ok(collect_records(rows.into_iter()))
}

// -- Parquet / Arrow helpers --

/// Extract a text cell.  Integer protocol columns are formatted as text.
fn extract_text(col: &Arc<dyn Array>, row: usize) -> String {
    if col.is_null(row) {
        return String::new();
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>();
            arr.map(|a| a.value(row).trim().to_string()).unwrap_or_default()
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>();
            arr.map(|a| a.value(row).to_string()).unwrap_or_default()
        }
        _ => String::new(),
    }
}

/// Extract a date cell from a Utf8 or Date32 column.  Null or unparseable
/// values are "missing", not errors.
fn extract_date(col: &Arc<dyn Array>, row: usize) -> Result<Option<NaiveDate>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(parse_date(arr.value(row)))
        }
        DataType::Date32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Date32Array>()
                .context("expected Date32Array")?;
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            Ok(Some(epoch + chrono::Duration::days(arr.value(row) as i64)))
        }
        other => bail!("Expected Utf8 or Date32 date column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_date_forms() {
        assert_eq!(parse_date("2023-04-05"), Some(date(2023, 4, 5)));
        assert_eq!(parse_date("05/04/2023"), Some(date(2023, 4, 5)));
        assert_eq!(parse_date("05-04-2023"), Some(date(2023, 4, 5)));
        assert_eq!(parse_date("2023-04-05 00:00:00"), Some(date(2023, 4, 5)));
        assert_eq!(parse_date("2023-04-05T12:30:00"), Some(date(2023, 4, 5)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
    }

    fn write_temp_csv(contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "procdash-test-{}-{}.csv",
            std::process::id(),
            contents.len()
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_load_drops_invalid_rows() {
        let csv = "\
Protocolo,Dt. Entrada,Dt. Saída,STATUS,MUNICÍPIO,Assunto
2023/001,2023-01-10,2023-02-01,Concluído,Belém,Regularização
2023/002,not-a-date,,Em análise,Marabá,Licenciamento
2023/003,2023-03-05,2023-02-01,Concluído,Belém,Regularização
2023/004,2023-04-01,,Em análise,Santarém,Recurso
";
        let path = write_temp_csv(csv);
        let ds = load_file(&path, &ColumnConfig::default()).unwrap();
        std::fs::remove_file(&path).ok();

        // Row 2 has no entry date, row 3 has exit before entry.
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].protocol, "2023/001");
        assert_eq!(ds.records[0].duration_days, Some(22));
        assert_eq!(ds.records[1].protocol, "2023/004");
        assert_eq!(ds.records[1].duration_days, None);
        for rec in &ds.records {
            assert!(rec.duration_days.map_or(true, |d| d >= 0));
        }
    }

    #[test]
    fn csv_missing_required_column_is_fatal() {
        let csv = "Protocolo,Dt. Entrada\n2023/001,2023-01-10\n";
        let path = write_temp_csv(csv);
        let err = load_file(&path, &ColumnConfig::default()).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("STATUS"));
    }

    #[test]
    fn csv_without_exit_column_loads_without_durations() {
        let csv = "\
Protocolo,Dt. Entrada,STATUS,MUNICÍPIO,Assunto
2022/010,2022-06-15,Em análise,Belém,Recurso
";
        let path = write_temp_csv(csv);
        let ds = load_file(&path, &ColumnConfig::default()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].duration_days, None);
    }

    #[test]
    fn json_load_respects_column_config() {
        let json = r#"[
            {"id": "A-1", "in": "2022-01-05", "out": "2022-01-20",
             "state": "Open", "city": "Belém", "topic": "Licensing"},
            {"id": "A-2", "in": "10/02/2022",
             "state": "Open", "city": "Marabá", "topic": "Appeal"}
        ]"#;
        let dir = std::env::temp_dir();
        let path = dir.join(format!("procdash-test-{}.json", std::process::id()));
        std::fs::write(&path, json).unwrap();

        let columns = ColumnConfig {
            protocol: "id".into(),
            entry_date: "in".into(),
            exit_date: "out".into(),
            status: "state".into(),
            municipality: "city".into(),
            subject: "topic".into(),
        };
        let ds = load_file(&path, &columns).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].duration_days, Some(15));
        assert_eq!(ds.records[1].entry_date, date(2022, 2, 10));
    }

    #[test]
    fn unsupported_extension_is_fatal() {
        let err = load_file(Path::new("data.xlsx"), &ColumnConfig::default()).unwrap_err();
        assert!(err.to_string().contains("xlsx"));
    }
}
