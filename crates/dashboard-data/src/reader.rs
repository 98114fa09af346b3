//! CSV loading for the trip and payment exports.
//!
//! Files are read once into raw rows; all typing happens in the
//! normalizer.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{Dataset, PaymentRecord, Schema, TripRecord};
use dashboard_core::normalizer::{FromRawRow, Normalizer, RawRow};
use serde_json::Value;
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Read every row of the CSV file at `path`.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_rows_from(file)?;
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read every row of a CSV stream.
///
/// Header names are trimmed and stripped of a UTF-8 BOM; blank cells become
/// `null`.  Rows the CSV parser rejects are skipped with a warning.
pub fn read_rows_from<R: Read>(input: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                // +2: records start on line 2, lines are 1-based.
                debug!("CSV parse error on line {}: {}", idx + 2, e);
                skipped += 1;
                continue;
            }
        };

        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cell = match record.get(i) {
                    Some(v) if !v.is_empty() => Value::String(v.to_string()),
                    _ => Value::Null,
                };
                (name.clone(), cell)
            })
            .collect();
        rows.push(row);
    }

    if skipped > 0 {
        warn!("Skipped {} unreadable CSV rows", skipped);
    }

    Ok(rows)
}

/// Read and normalize a dataset from `path` under `schema`.
pub fn load_dataset<R: FromRawRow>(path: &Path, schema: &Schema) -> Result<Dataset<R>> {
    let rows = read_rows(path)?;
    Normalizer::normalize(&rows, schema)
}

/// Load the trip export.
pub fn load_trips(path: &Path, schema: &Schema) -> Result<Dataset<TripRecord>> {
    load_dataset(path, schema)
}

/// Load the payment export.
pub fn load_payments(path: &Path, schema: &Schema) -> Result<Dataset<PaymentRecord>> {
    load_dataset(path, schema)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::{TimestampedRecord, PAYMENT_CATEGORY};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    // ── read_rows_from ────────────────────────────────────────────────────────

    #[test]
    fn test_read_rows_maps_headers_to_cells() {
        let data = "Local Timestamp,Local Amount,Category\n\
                   2024-01-01 09:00:00,10.50,tip\n\
                   2024-01-02 10:00:00,,\n";
        let rows = read_rows_from(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Local Amount"], Value::String("10.50".into()));
        assert_eq!(rows[0]["Category"], Value::String("tip".into()));
        assert_eq!(rows[1]["Local Amount"], Value::Null);
        assert_eq!(rows[1]["Category"], Value::Null);
    }

    #[test]
    fn test_read_rows_strips_bom_and_whitespace() {
        let data = "\u{feff} Local Timestamp , Local Amount\n2024-01-01 09:00:00 , 3\n";
        let rows = read_rows_from(data.as_bytes()).unwrap();
        assert_eq!(
            rows[0]["Local Timestamp"],
            Value::String("2024-01-01 09:00:00".into())
        );
        assert_eq!(rows[0]["Local Amount"], Value::String("3".into()));
    }

    #[test]
    fn test_read_rows_short_record_fills_nulls() {
        let data = "a,b,c\n1,2\n";
        let rows = read_rows_from(data.as_bytes()).unwrap();
        assert_eq!(rows[0]["c"], Value::Null);
    }

    #[test]
    fn test_read_rows_header_only() {
        let rows = read_rows_from("a,b\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    // ── read_rows / load_* ────────────────────────────────────────────────────

    #[test]
    fn test_read_rows_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_rows(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::FileRead { .. }));
    }

    #[test]
    fn test_load_trips_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "trips.csv",
            "Local Dropoff Timestamp,Trip Distance (miles),Local Original Fare\n\
             2024-01-08 10:00:00,7.0,21.00\n\
             bad,3.0,9.00\n\
             2024-01-01 09:00:00,5.0,\n",
        );
        let trips = load_trips(&path, &Schema::trips()).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips.records()[0].distance_miles(), 5.0);
        assert_eq!(trips.records()[0].original_fare(), None);
        assert_eq!(trips.records()[1].original_fare(), Some(21.0));
        assert_eq!(trips.report().dropped_timestamps, 1);
    }

    #[test]
    fn test_load_payments_without_category_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "payments.csv",
            "Local Timestamp,Local Amount\n2024-01-01 09:00:00,12.00\n",
        );
        let payments = load_payments(&path, &Schema::payments()).unwrap();
        assert_eq!(payments.len(), 1);
        assert!(!payments.has_column(PAYMENT_CATEGORY));
        assert_eq!(payments.records()[0].category(), None);
    }

    #[test]
    fn test_load_payments_wrong_schema() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "payments.csv",
            "When,Local Amount\n2024-01-01 09:00:00,12.00\n",
        );
        let err = load_payments(&path, &Schema::payments()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn { .. }));
    }
}
