use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the driver dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A raw row could not be turned into a typed record.
    ///
    /// Raised per row inside the normalizer, where it is counted and
    /// swallowed; callers of [`crate::normalizer::Normalizer`] never see it.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A filter was requested with its start date after its end date.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A ranking or aggregation named a column the dataset does not carry.
    #[error("Column `{column}` is not available for {dataset}")]
    UnsupportedColumn { dataset: String, column: String },

    /// The raw input lacks a column the dataset schema requires.
    #[error("Missing required column `{column}` in {dataset} input")]
    MissingColumn { dataset: String, column: String },

    /// A day-of-week label is not one of the seven weekday names.
    #[error("Invalid day of week: {0}")]
    InvalidDay(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_range() {
        let err = DashboardError::InvalidRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid date range: start 2024-02-01 is after end 2024-01-01"
        );
    }

    #[test]
    fn test_error_display_unsupported_column() {
        let err = DashboardError::UnsupportedColumn {
            dataset: "trips".to_string(),
            column: "Local Amount".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Column `Local Amount` is not available for trips"
        );
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = DashboardError::MissingColumn {
            dataset: "payments".to_string(),
            column: "Local Timestamp".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required column `Local Timestamp` in payments input"
        );
    }

    #[test]
    fn test_error_display_malformed_record() {
        let err = DashboardError::MalformedRecord("bad distance".to_string());
        assert_eq!(err.to_string(), "Malformed record: bad distance");
    }

    #[test]
    fn test_error_display_invalid_day() {
        let err = DashboardError::InvalidDay("Funday".to_string());
        assert_eq!(err.to_string(), "Invalid day of week: Funday");
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = DashboardError::FileRead {
            path: PathBuf::from("/data/trips.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/trips.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_from_csv() {
        let data = "a,b\n1,2,3\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let csv_err = reader.records().next().unwrap().unwrap_err();
        let err: DashboardError = csv_err.into();
        assert!(err.to_string().starts_with("Failed to parse CSV"));
    }
}
