//! CSV loading of yield-curve panels.
//!
//! Purpose
//! -------
//! Read a delimited file with a date column and one column per maturity,
//! drop rows with missing values, restrict to a date window, and return a
//! validated [`YieldPanel`].
//!
//! Key behaviors
//! -------------
//! - Columns are selected by header name; the caller maps each maturity to a
//!   column via [`CsvSpec::maturity_columns`].
//! - A cell equal to the missing-value sentinel (or empty) drops the whole
//!   row, for yields and observed factors alike.
//! - Rows are sorted by date before the panel is built, so files in
//!   descending order load correctly; duplicate dates are still rejected.
//!
//! Conventions
//! -----------
//! - Row numbers in errors are 1-based data rows (the header is row 0).
//! - The date window `[start, end]` is inclusive on both ends.
use crate::term_structure::{
    core::data::YieldPanel,
    errors::{AffineError, AffineResult},
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, path::Path};

/// Layout of a yield-curve CSV file.
///
/// Fields
/// ------
/// - `delimiter`: field separator (default `;`).
/// - `na_sentinel`: text marking a missing value (default `"M"`).
/// - `date_column`: header of the date column; `None` uses the first column.
/// - `date_format`: `chrono` format string (default `%Y-%m-%d`).
/// - `maturity_columns`: `(maturity, header)` pairs, in model order.
/// - `factor_columns`: headers of observed-factor columns, in state order.
/// - `start`, `end`: optional inclusive date bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvSpec {
    pub delimiter: u8,
    pub na_sentinel: String,
    pub date_column: Option<String>,
    pub date_format: String,
    pub maturity_columns: Vec<(usize, String)>,
    pub factor_columns: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl CsvSpec {
    /// Layout with default delimiter, sentinel, and date handling.
    pub fn new(maturity_columns: Vec<(usize, String)>) -> Self {
        Self {
            delimiter: b';',
            na_sentinel: "M".to_string(),
            date_column: None,
            date_format: "%Y-%m-%d".to_string(),
            maturity_columns,
            factor_columns: Vec::new(),
            start: None,
            end: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_factor_columns(mut self, factor_columns: Vec<String>) -> Self {
        self.factor_columns = factor_columns;
        self
    }

    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    fn in_window(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Load a yield panel from a file path.
///
/// # Errors
/// - `Io` if the file cannot be opened; otherwise as [`read_yield_csv`].
pub fn load_yield_csv<P: AsRef<Path>>(path: P, spec: &CsvSpec) -> AffineResult<YieldPanel> {
    let file = File::open(path.as_ref())?;
    tracing::debug!(path = %path.as_ref().display(), "loading yield csv");
    read_yield_csv(file, spec)
}

/// Read a yield panel from any reader.
///
/// # Errors
/// - `MissingColumn` if a requested header is absent.
/// - `DateParse` / `DataParse` for cells that cannot be parsed.
/// - `Csv` for malformed input.
/// - Any [`YieldPanel::new`] error (e.g. `EmptyPanel` when every row was
///   dropped or filtered out).
pub fn read_yield_csv<R: Read>(reader: R, spec: &CsvSpec) -> AffineResult<YieldPanel> {
    let mut rdr = ReaderBuilder::new().delimiter(spec.delimiter).trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_idx = match &spec.date_column {
        Some(name) => column_index(&headers, name)?,
        None => 0,
    };
    let yield_idx: Vec<usize> = spec
        .maturity_columns
        .iter()
        .map(|(_, name)| column_index(&headers, name))
        .collect::<AffineResult<_>>()?;
    let factor_idx: Vec<usize> = spec
        .factor_columns
        .iter()
        .map(|name| column_index(&headers, name))
        .collect::<AffineResult<_>>()?;

    let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    let mut dropped = 0usize;
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, &spec.date_format)
            .map_err(|_| AffineError::DateParse { row, value: raw_date.to_string() })?;
        if !spec.in_window(date) {
            continue;
        }
        match parse_values(&record, &headers, yield_idx.iter().chain(&factor_idx), row, spec)? {
            Some(values) => rows.push((date, values)),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, kept = rows.len(), "dropped rows with missing values");
    }

    rows.sort_by_key(|(date, _)| *date);
    let m = yield_idx.len();
    let n_fac = factor_idx.len();
    let t = rows.len();
    let mut yields = Array2::zeros((t, m));
    let mut factors = Array2::zeros((t, n_fac));
    let mut dates = Vec::with_capacity(t);
    for (r, (date, values)) in rows.into_iter().enumerate() {
        dates.push(date);
        for (j, v) in values.into_iter().enumerate() {
            if j < m {
                yields[(r, j)] = v;
            } else {
                factors[(r, j - m)] = v;
            }
        }
    }

    let maturities = spec.maturity_columns.iter().map(|(n, _)| *n).collect();
    let factors = if n_fac > 0 { Some(factors) } else { None };
    YieldPanel::new(Some(dates), maturities, yields, factors)
}

// ---- Helper Methods ----

fn column_index(headers: &StringRecord, name: &str) -> AffineResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AffineError::MissingColumn { name: name.to_string() })
}

/// Parsed values for the selected columns, or `None` if any is missing.
fn parse_values<'a>(
    record: &StringRecord, headers: &StringRecord, columns: impl Iterator<Item = &'a usize>,
    row: usize, spec: &CsvSpec,
) -> AffineResult<Option<Vec<f64>>> {
    let mut values = Vec::new();
    for &idx in columns {
        let raw = record.get(idx).unwrap_or_default();
        if raw.is_empty() || raw == spec.na_sentinel {
            return Ok(None);
        }
        let value = raw.parse::<f64>().map_err(|_| AffineError::DataParse {
            row,
            column: headers.get(idx).unwrap_or_default().to_string(),
            value: raw.to_string(),
        })?;
        values.push(value);
    }
    Ok(Some(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Missing-value rows being dropped and the date window applied.
    // - Column renaming through the maturity map.
    // - Error reporting for unknown columns and bad cells.
    // -------------------------------------------------------------------------

    const CSV: &str = "\
date;trcr_y1;trcr_y2;gdp
2001-03-01;1.5;1.9;0.4
2001-01-01;1.1;1.4;0.2
2001-02-01;M;1.6;0.3
2001-04-01;1.7;2.0;0.5
";

    fn spec() -> CsvSpec {
        CsvSpec::new(vec![(4, "trcr_y1".to_string()), (8, "trcr_y2".to_string())])
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    // Purpose
    // -------
    // Verify sentinel rows are dropped, rows are sorted, and the window is
    // inclusive.
    //
    // Given
    // -----
    // - Four rows (one with "M"), out of order; window Jan 1 to Mar 1.
    //
    // Expect
    // ------
    // - Two rows (Jan, Mar) with maturities [4, 8].
    fn read_drops_missing_rows_and_applies_window() {
        // Arrange
        let spec = spec().with_window(Some(ymd(2001, 1, 1)), Some(ymd(2001, 3, 1)));

        // Act
        let panel = read_yield_csv(CSV.as_bytes(), &spec).expect("valid csv");

        // Assert
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.maturities(), &[4, 8]);
        assert_eq!(panel.dates(), Some(&[ymd(2001, 1, 1), ymd(2001, 3, 1)][..]));
        assert_eq!(panel.yields()[(0, 0)], 1.1);
        assert_eq!(panel.yields()[(1, 1)], 1.9);
        assert!(panel.factors().is_none());
    }

    #[test]
    // Purpose
    // -------
    // Check observed-factor columns are read into the factor block.
    //
    // Given
    // -----
    // - `factor_columns = ["gdp"]`, no window.
    //
    // Expect
    // ------
    // - Three rows; factors [0.2, 0.4, 0.5].
    fn read_collects_factor_columns() {
        // Arrange
        let spec = spec().with_factor_columns(vec!["gdp".to_string()]);

        // Act
        let panel = read_yield_csv(CSV.as_bytes(), &spec).expect("valid csv");

        // Assert
        let factors = panel.factors().expect("factor block present");
        assert_eq!(factors.column(0).to_vec(), vec![0.2, 0.4, 0.5]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure unknown headers and unparsable cells produce typed errors.
    //
    // Given
    // -----
    // - A spec asking for "trcr_y30"; a file with "abc" in a yield cell.
    //
    // Expect
    // ------
    // - `MissingColumn` and `DataParse { row: 1, .. }`.
    fn read_reports_missing_column_and_bad_cell() {
        // Arrange
        let missing = CsvSpec::new(vec![(120, "trcr_y30".to_string())]);
        let bad = "date;trcr_y1;trcr_y2\n2001-01-01;abc;1.0\n";

        // Act
        let e1 = read_yield_csv(CSV.as_bytes(), &missing);
        let e2 = read_yield_csv(bad.as_bytes(), &spec());

        // Assert
        assert_eq!(e1, Err(AffineError::MissingColumn { name: "trcr_y30".to_string() }));
        assert!(matches!(e2, Err(AffineError::DataParse { row: 1, .. })));
    }
}
