//! Raw row → typed record conversion.
//!
//! Rows arrive as loosely-typed column maps.  Each row is validated against a
//! [`Schema`], its timestamp parsed into naive local time, and the calendar
//! fields derived once.  Rows that cannot be parsed are dropped and counted.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::models::{
    Dataset, PaymentRecord, Schema, TimestampedRecord, TripRecord, ORIGINAL_FARE,
    PAYMENT_AMOUNT, PAYMENT_CATEGORY, TRIP_DISTANCE,
};

/// One raw input row: column name → raw cell value.
pub type RawRow = serde_json::Map<String, Value>;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses timestamps from the formats found in driver exports.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Attempt to parse a raw cell into a naive local [`NaiveDateTime`].
    ///
    /// Handles:
    /// * `null`       → `None`
    /// * JSON string  → RFC 3339 (the wall-clock part is kept, the offset is
    ///   discarded) or one of the common date-time patterns.
    /// * JSON number  → Unix timestamp (integer or float seconds).
    pub fn parse(value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::Null => None,
            Value::String(s) => Self::parse_str(s.trim()),
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
                } else if let Some(f) = n.as_f64() {
                    if !f.is_finite() {
                        return None;
                    }
                    let floor = f.floor();
                    // Sub-second part is non-negative and must stay below 1e9 nanos.
                    let nanos = (((f - floor) * 1_000_000_000.0).round() as u32).min(999_999_999);
                    DateTime::from_timestamp(floor as i64, nanos).map(|dt| dt.naive_utc())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn parse_str(s: &str) -> Option<NaiveDateTime> {
        if s.is_empty() {
            return None;
        }

        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.naive_local());
        }
        if let Ok(dt) = DateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Some(dt.naive_local());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%m/%d/%Y %H:%M:%S",
            "%m/%d/%Y %H:%M",
        ];
        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        debug!("TimestampProcessor: could not parse timestamp \"{}\"", s);
        None
    }
}

// ── Cell helpers ──────────────────────────────────────────────────────────────

/// Parse a numeric cell.  Strings may carry a leading `$` and thousands
/// separators.  Non-finite values are rejected.
pub fn parse_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ── FromRawRow ────────────────────────────────────────────────────────────────

/// Record types that can be built from a raw row once its timestamp is known.
pub trait FromRawRow: TimestampedRecord + Sized {
    /// Build the record, or fail with [`DashboardError::MalformedRecord`].
    fn from_raw(timestamp: NaiveDateTime, row: &RawRow) -> Result<Self>;
}

impl FromRawRow for TripRecord {
    fn from_raw(timestamp: NaiveDateTime, row: &RawRow) -> Result<Self> {
        let distance = parse_number(row.get(TRIP_DISTANCE)).ok_or_else(|| {
            DashboardError::MalformedRecord(format!("missing or invalid `{TRIP_DISTANCE}`"))
        })?;
        if distance < 0.0 {
            return Err(DashboardError::MalformedRecord(format!(
                "negative trip distance {distance}"
            )));
        }
        let fare = parse_number(row.get(ORIGINAL_FARE));
        Ok(TripRecord::new(timestamp, distance, fare))
    }
}

impl FromRawRow for PaymentRecord {
    fn from_raw(timestamp: NaiveDateTime, row: &RawRow) -> Result<Self> {
        let amount = parse_number(row.get(PAYMENT_AMOUNT)).ok_or_else(|| {
            DashboardError::MalformedRecord(format!("missing or invalid `{PAYMENT_AMOUNT}`"))
        })?;
        let category = parse_label(row.get(PAYMENT_CATEGORY));
        Ok(PaymentRecord::new(timestamp, amount, category))
    }
}

// ── NormalizationReport ───────────────────────────────────────────────────────

/// Row accounting for one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub rows_read: usize,
    pub records_kept: usize,
    /// Rows dropped because the timestamp was missing or unparsable.
    pub dropped_timestamps: usize,
    /// Rows dropped because a required payload value was unusable.
    pub dropped_payload: usize,
}

impl NormalizationReport {
    /// Report for `n` records that needed no parsing.
    pub fn complete(n: usize) -> Self {
        Self {
            rows_read: n,
            records_kept: n,
            ..Self::default()
        }
    }

    /// Total rows that did not become records.
    pub fn dropped(&self) -> usize {
        self.dropped_timestamps + self.dropped_payload
    }
}

// ── Normalizer ────────────────────────────────────────────────────────────────

/// Stateless raw row normalizer.
pub struct Normalizer;

impl Normalizer {
    /// Convert `rows` into a [`Dataset`] of `R`, ordered by timestamp.
    ///
    /// Fails only when the input lacks a column the schema requires; bad rows
    /// are dropped and reported in the dataset's [`NormalizationReport`].
    pub fn normalize<R: FromRawRow>(rows: &[RawRow], schema: &Schema) -> Result<Dataset<R>> {
        let header: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();

        if !rows.is_empty() {
            let required = std::iter::once(&schema.timestamp_column).chain(schema.required.iter());
            for column in required {
                if !header.contains(column.as_str()) {
                    return Err(DashboardError::MissingColumn {
                        dataset: schema.dataset.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        let mut columns: BTreeSet<String> = schema.required.iter().cloned().collect();
        columns.extend(
            schema
                .optional
                .iter()
                .filter(|c| header.contains(c.as_str()))
                .cloned(),
        );

        let mut report = NormalizationReport {
            rows_read: rows.len(),
            ..NormalizationReport::default()
        };
        let mut records: Vec<R> = Vec::with_capacity(rows.len());

        for row in rows {
            let Some(ts) = row
                .get(&schema.timestamp_column)
                .and_then(TimestampProcessor::parse)
            else {
                report.dropped_timestamps += 1;
                continue;
            };

            match R::from_raw(ts, row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!("Dropping {} row at {}: {}", schema.dataset, ts, e);
                    report.dropped_payload += 1;
                }
            }
        }

        records.sort_by_key(|r| r.timestamp());
        report.records_kept = records.len();

        if report.dropped() > 0 {
            warn!(
                "Dropped {} of {} {} rows ({} bad timestamps, {} bad payloads)",
                report.dropped(),
                report.rows_read,
                schema.dataset,
                report.dropped_timestamps,
                report.dropped_payload
            );
        }
        debug!(
            "Normalized {} {} records",
            report.records_kept, schema.dataset
        );

        Ok(Dataset::with_parts(records, columns, report))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
