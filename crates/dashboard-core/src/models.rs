use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::normalizer::NormalizationReport;

/// Trip distance column in the raw trip export.
pub const TRIP_DISTANCE: &str = "Trip Distance (miles)";
/// Optional fare column in the raw trip export.
pub const ORIGINAL_FARE: &str = "Local Original Fare";
/// Payment amount column in the raw payment export.
pub const PAYMENT_AMOUNT: &str = "Local Amount";
/// Optional payment category column.
pub const PAYMENT_CATEGORY: &str = "Category";

/// Default timestamp column of the trip export.
pub const TRIP_TIMESTAMP: &str = "Local Dropoff Timestamp";
/// Default timestamp column of the payment export.
pub const PAYMENT_TIMESTAMP: &str = "Local Timestamp";

// ── DayOfWeek ─────────────────────────────────────────────────────────────────

/// Calendar day name.  Ordering follows the calendar, starting on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All seven days in calendar order.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Full English name, e.g. `"Monday"`.
    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Weekday name of the calendar date `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    /// Every day of the week as a set; the default filter selection.
    pub fn all_days() -> BTreeSet<DayOfWeek> {
        Self::ALL.into_iter().collect()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = DashboardError;

    /// Accepts the full name or the three-letter abbreviation, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| {
                let name = day.name().to_lowercase();
                lower == name || (lower.len() == 3 && name.starts_with(&lower))
            })
            .ok_or_else(|| DashboardError::InvalidDay(s.to_string()))
    }
}

// ── CalendarFields ────────────────────────────────────────────────────────────

/// Calendar fields derived from a record's timestamp at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub day_of_week: DayOfWeek,
}

impl CalendarFields {
    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
            day: ts.day(),
            hour: ts.hour(),
            day_of_week: DayOfWeek::from(ts.weekday()),
        }
    }
}

// ── TimestampedRecord ─────────────────────────────────────────────────────────

/// Shape shared by every normalized record: a naive local timestamp, the
/// calendar fields derived from it, and a set of named numeric columns.
pub trait TimestampedRecord: Clone {
    /// Human-readable dataset name used in errors and logs.
    const DATASET: &'static str;

    /// Numeric payload columns this record type can expose.
    const NUMERIC_COLUMNS: &'static [&'static str];

    fn timestamp(&self) -> NaiveDateTime;

    fn calendar(&self) -> &CalendarFields;

    /// Value of the numeric column `column`, or `None` when the column is
    /// unknown to this record type or holds no value on this record.
    fn numeric_value(&self, column: &str) -> Option<f64>;

    /// Category label, for record types that carry one.
    fn category(&self) -> Option<&str> {
        None
    }

    fn date(&self) -> NaiveDate {
        self.timestamp().date()
    }

    fn day_of_week(&self) -> DayOfWeek {
        self.calendar().day_of_week
    }
}

// ── TripRecord ────────────────────────────────────────────────────────────────

/// One completed trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    timestamp: NaiveDateTime,
    #[serde(flatten)]
    calendar: CalendarFields,
    distance_miles: f64,
    original_fare: Option<f64>,
}

impl TripRecord {
    pub fn new(timestamp: NaiveDateTime, distance_miles: f64, original_fare: Option<f64>) -> Self {
        Self {
            timestamp,
            calendar: CalendarFields::from_timestamp(timestamp),
            distance_miles,
            original_fare,
        }
    }

    pub fn distance_miles(&self) -> f64 {
        self.distance_miles
    }

    pub fn original_fare(&self) -> Option<f64> {
        self.original_fare
    }
}

impl TimestampedRecord for TripRecord {
    const DATASET: &'static str = "trips";
    const NUMERIC_COLUMNS: &'static [&'static str] = &[TRIP_DISTANCE, ORIGINAL_FARE];

    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn calendar(&self) -> &CalendarFields {
        &self.calendar
    }

    fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            TRIP_DISTANCE => Some(self.distance_miles),
            ORIGINAL_FARE => self.original_fare,
            _ => None,
        }
    }
}

// ── PaymentRecord ─────────────────────────────────────────────────────────────

/// One payment line.  Negative amounts are adjustments and stay as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    timestamp: NaiveDateTime,
    #[serde(flatten)]
    calendar: CalendarFields,
    amount: f64,
    category: Option<String>,
}

impl PaymentRecord {
    pub fn new(timestamp: NaiveDateTime, amount: f64, category: Option<String>) -> Self {
        Self {
            timestamp,
            calendar: CalendarFields::from_timestamp(timestamp),
            amount,
            category,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

impl TimestampedRecord for PaymentRecord {
    const DATASET: &'static str = "payments";
    const NUMERIC_COLUMNS: &'static [&'static str] = &[PAYMENT_AMOUNT];

    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn calendar(&self) -> &CalendarFields {
        &self.calendar
    }

    fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            PAYMENT_AMOUNT => Some(self.amount),
            _ => None,
        }
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Column contract of one raw dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub dataset: String,
    pub timestamp_column: String,
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl Schema {
    /// Schema of the trip export.
    pub fn trips() -> Self {
        Self {
            dataset: TripRecord::DATASET.to_string(),
            timestamp_column: TRIP_TIMESTAMP.to_string(),
            required: vec![TRIP_DISTANCE.to_string()],
            optional: vec![ORIGINAL_FARE.to_string()],
        }
    }

    /// Schema of the payment export.
    pub fn payments() -> Self {
        Self {
            dataset: PaymentRecord::DATASET.to_string(),
            timestamp_column: PAYMENT_TIMESTAMP.to_string(),
            required: vec![PAYMENT_AMOUNT.to_string()],
            optional: vec![PAYMENT_CATEGORY.to_string()],
        }
    }

    /// Replace the timestamp column name.
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// An owned, normalized record collection plus the payload columns its raw
/// input actually carried.
#[derive(Debug, Clone)]
pub struct Dataset<R> {
    records: Vec<R>,
    columns: BTreeSet<String>,
    report: NormalizationReport,
}

impl<R: TimestampedRecord> Dataset<R> {
    /// Build a dataset directly from typed records.
    ///
    /// All numeric columns of `R` are considered present.  The category
    /// column is present when at least one record carries a category; use
    /// [`Dataset::with_column`] to mark it on records that all lack one.
    pub fn from_records(records: Vec<R>) -> Self {
        let mut columns: BTreeSet<String> =
            R::NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        if records.iter().any(|r| r.category().is_some()) {
            columns.insert(PAYMENT_CATEGORY.to_string());
        }
        let report = NormalizationReport::complete(records.len());
        Self {
            records,
            columns,
            report,
        }
    }

    pub(crate) fn with_parts(
        records: Vec<R>,
        columns: BTreeSet<String>,
        report: NormalizationReport,
    ) -> Self {
        Self {
            records,
            columns,
            report,
        }
    }

    /// Same dataset shape with a different record set.
    pub(crate) fn derive(&self, records: Vec<R>) -> Self {
        Self {
            records,
            columns: self.columns.clone(),
            report: self.report.clone(),
        }
    }

    /// Mark `column` as present (e.g. a category column).
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.columns.insert(column.into());
        self
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn name(&self) -> &'static str {
        R::DATASET
    }

    /// Whether the raw input carried `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Statistics gathered while normalizing the raw input.
    pub fn report(&self) -> &NormalizationReport {
        &self.report
    }

    /// Earliest and latest calendar dates, or `None` when empty.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.date();
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            let d = r.date();
            (lo.min(d), hi.max(d))
        }))
    }

    /// The first `n` records, for table previews.
    pub fn preview(&self, n: usize) -> &[R] {
        &self.records[..n.min(self.records.len())]
    }

    pub(crate) fn require_numeric(&self, column: &str) -> crate::error::Result<()> {
        if R::NUMERIC_COLUMNS.contains(&column) && self.has_column(column) {
            Ok(())
        } else {
            Err(self.unsupported(column))
        }
    }

    pub(crate) fn unsupported(&self, column: &str) -> DashboardError {
        DashboardError::UnsupportedColumn {
            dataset: R::DATASET.to_string(),
            column: column.to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
