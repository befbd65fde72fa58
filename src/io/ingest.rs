//! Observation file ingest.
//!
//! Two formats are accepted:
//!
//! - delimited text, one `<timestamp><delim><value>` record per line (extra
//!   columns ignored). Timestamps are epoch milliseconds or naive
//!   `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` local times.
//! - a JSON array of objects with numeric `time` (epoch ms) and `value` (or `fans`).
//!
//! Lines that cannot be parsed are recorded as row errors and skipped. Numeric
//! validity (finite, positive) is not checked here: that is the job of
//! `TimeSeries::from_records`, which never trusts the loader.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use csv::StringRecord;
use serde_json::Value;
use tracing::debug;

use crate::domain::{RawRecord, TimeSeries, ValidationReport};
use crate::error::AppError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// How to read a text input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub delimiter: u8,
    /// Offset applied to naive date-time strings.
    pub utc_offset: FixedOffset,
}

impl IngestOptions {
    pub fn new(delimiter: char, utc_offset_hours: i32) -> Result<Self, AppError> {
        if !delimiter.is_ascii() {
            return Err(AppError::new(
                2,
                format!("Delimiter must be a single ASCII character (got {delimiter:?})."),
            ));
        }
        Ok(Self {
            delimiter: delimiter as u8,
            utc_offset: utc_offset(utc_offset_hours)?,
        })
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            utc_offset: Utc.fix(),
        }
    }
}

/// Fixed offset from whole hours east of UTC.
pub fn utc_offset(hours: i32) -> Result<FixedOffset, AppError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| AppError::new(2, format!("UTC offset out of range: {hours} hours.")))
}

/// Input file format, chosen from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Delimited,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            InputFormat::Json
        } else {
            InputFormat::Delimited
        }
    }
}

/// A record that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line (text) or array index + 1 (JSON).
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated series plus what was dropped along the way.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: PathBuf,
    pub series: TimeSeries,
    pub report: ValidationReport,
    pub row_errors: Vec<RowError>,
}

/// Load and validate an observation file.
pub fn load_series(path: &Path, options: &IngestOptions) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open input '{}': {e}", path.display())))?;

    let (records, row_errors) = match InputFormat::from_path(path) {
        InputFormat::Json => read_json_records(file)?,
        InputFormat::Delimited => read_delimited_records(file, options),
    };

    for err in &row_errors {
        debug!(line = err.line, message = %err.message, "row skipped");
    }

    let (series, report) = TimeSeries::from_records(records)?;
    debug!(
        path = %path.display(),
        read = report.read,
        kept = report.kept,
        rejected = report.rejected,
        row_errors = row_errors.len(),
        "input loaded"
    );

    Ok(IngestedData {
        source: path.to_path_buf(),
        series,
        report,
        row_errors,
    })
}

/// Parse delimited text records.
///
/// A first line with no parseable field is treated as a header and skipped.
pub fn read_delimited_records<R: Read>(
    reader: R,
    options: &IngestOptions,
) -> (Vec<RawRecord>, Vec<RowError>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .delimiter(options.delimiter)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let fallback_line = idx + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                row_errors.push(RowError {
                    line,
                    message: format!("parse error: {e}"),
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        match parse_record(&record, options.utc_offset) {
            Ok(raw) => records.push(raw),
            Err(_) if idx == 0 && looks_like_header(&record) => {
                debug!(line, "header line skipped");
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    (records, row_errors)
}

/// Parse a JSON array of `{ "time": <ms>, "value" | "fans": <number> }`.
///
/// A malformed document is an error; a malformed element is a row error.
pub fn read_json_records<R: Read>(reader: R) -> Result<(Vec<RawRecord>, Vec<RowError>), AppError> {
    let doc: Value = serde_json::from_reader(reader)
        .map_err(|e| AppError::new(2, format!("Invalid JSON input: {e}")))?;
    let Value::Array(items) = doc else {
        return Err(AppError::new(2, "JSON input must be an array of records."));
    };

    let mut records = Vec::with_capacity(items.len());
    let mut row_errors = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        let time = item.get("time").and_then(Value::as_f64);
        let value = item
            .get("value")
            .or_else(|| item.get("fans"))
            .and_then(Value::as_f64);
        match (time, value) {
            (Some(t), Some(v)) => records.push(RawRecord::new(t, v)),
            _ => row_errors.push(RowError {
                line: idx + 1,
                message: "expected numeric `time` and `value` (or `fans`)".to_string(),
            }),
        }
    }

    Ok((records, row_errors))
}

/// Parse a timestamp as epoch milliseconds.
///
/// Accepts a plain number, or a naive date-time (or date, at midnight)
/// interpreted at `offset`.
pub fn parse_timestamp(s: &str, offset: FixedOffset) -> Result<f64, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<f64>() {
        return Ok(ms);
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            format!("unrecognized timestamp `{s}` (expected epoch ms or YYYY-MM-DD HH:MM:SS)")
        })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp_millis() as f64)
        .ok_or_else(|| format!("ambiguous local time `{s}`"))
}

fn parse_record(record: &StringRecord, offset: FixedOffset) -> Result<RawRecord, String> {
    let (Some(time), Some(value)) = (record.get(0), record.get(1)) else {
        return Err(format!("expected at least 2 fields, found {}", record.len()));
    };
    let timestamp = parse_timestamp(time, offset)?;
    let value = value
        .parse::<f64>()
        .map_err(|_| format!("invalid value `{value}`"))?;
    Ok(RawRecord::new(timestamp, value))
}

fn looks_like_header(record: &StringRecord) -> bool {
    record.iter().all(|field| field.parse::<f64>().is_err())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    #[test]
    fn parses_tab_separated_local_times() {
        let text = "2024-01-01 00:00:00\t1900.5\n\n2024-01-02 12:00:00\t1890\n";
        let (records, errors) = read_delimited_records(Cursor::new(text), &IngestOptions::default());

        assert!(errors.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, 1_704_067_200_000.0);
        assert_eq!(records[1].timestamp, 1_704_067_200_000.0 + 1.5 * 86_400_000.0);
        assert_eq!(records[1].value, 1890.0);
    }

    #[test]
    fn utc_offset_shifts_naive_times() {
        let options = IngestOptions::new('\t', 8).unwrap();
        let (records, _) =
            read_delimited_records(Cursor::new("2024-01-01T08:00:00\t5\n"), &options);
        assert_eq!(records[0].timestamp, 1_704_067_200_000.0);
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let text = "time,value\n1000,5\nnot-a-time,3\n2000\n3000,abc\n4000,7,extra\n";
        let options = IngestOptions::new(',', 0).unwrap();
        let (records, errors) = read_delimited_records(Cursor::new(text), &options);

        assert_eq!(records.len(), 2);
        let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn json_accepts_value_or_fans() {
        let doc = r#"[
            {"time": 1000, "fans": 12.5, "timestamp": "2024-01-01T00:00:00"},
            {"time": 2000, "value": 11.0},
            {"time": "x", "value": 1.0}
        ]"#;
        let (records, errors) = read_json_records(Cursor::new(doc)).unwrap();
        assert_eq!(records, vec![RawRecord::new(1000.0, 12.5), RawRecord::new(2000.0, 11.0)]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
    }

    #[test]
    fn json_must_be_an_array() {
        let err = read_json_records(Cursor::new(r#"{"time": 1}"#)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_series_validates_and_sorts() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "3000\t30").unwrap();
        writeln!(file, "1000\t10").unwrap();
        writeln!(file, "2000\t-4").unwrap();
        writeln!(file, "oops").unwrap();
        file.flush().unwrap();

        let data = load_series(file.path(), &IngestOptions::default()).unwrap();
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.series.start_time(), 1000);
        assert_eq!(data.report.rejected, 1);
        assert_eq!(data.row_errors.len(), 1);
    }

    #[test]
    fn date_only_means_midnight() {
        assert_eq!(parse_timestamp("2024-01-01", Utc.fix()).unwrap(), 1_704_067_200_000.0);
        assert!(parse_timestamp("01/01/2024", Utc.fix()).is_err());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/b.JSON")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("data.txt")), InputFormat::Delimited);
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        assert!(IngestOptions::new('→', 0).is_err());
        assert!(IngestOptions::new(',', 100_000_000).is_err());
    }
}
