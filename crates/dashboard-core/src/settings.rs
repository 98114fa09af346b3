use chrono::NaiveDate;
use clap::Parser;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{DashboardError, Result};
use crate::models::{DayOfWeek, Schema, PAYMENT_TIMESTAMP, TRIP_TIMESTAMP};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Trip and payment analytics for a rideshare driver
#[derive(Parser, Debug, Clone)]
#[command(
    name = "driver-dashboard",
    about = "Trip and payment analytics for a rideshare driver",
    version
)]
pub struct Settings {
    /// Cleaned trips CSV
    #[arg(
        long,
        env = "DRIVER_DASHBOARD_TRIPS",
        default_value = "analysis/cleaned_driver_trips_2024_2025.csv"
    )]
    pub trips: PathBuf,

    /// Cleaned payments CSV
    #[arg(
        long,
        env = "DRIVER_DASHBOARD_PAYMENTS",
        default_value = "analysis/cleaned_driver_payments_2024_2025.csv"
    )]
    pub payments: PathBuf,

    /// Timestamp column of the trips file
    #[arg(long, default_value = TRIP_TIMESTAMP)]
    pub trip_timestamp_column: String,

    /// Timestamp column of the payments file
    #[arg(long, default_value = PAYMENT_TIMESTAMP)]
    pub payment_timestamp_column: String,

    /// First trip date to include (YYYY-MM-DD); defaults to the earliest trip
    #[arg(long)]
    pub trips_start: Option<NaiveDate>,

    /// Last trip date to include (YYYY-MM-DD); defaults to the latest trip
    #[arg(long)]
    pub trips_end: Option<NaiveDate>,

    /// First payment date to include (YYYY-MM-DD)
    #[arg(long)]
    pub payments_start: Option<NaiveDate>,

    /// Last payment date to include (YYYY-MM-DD)
    #[arg(long)]
    pub payments_end: Option<NaiveDate>,

    /// Days of week for both datasets, comma separated; all observed days when omitted
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub days: Option<Vec<DayOfWeek>>,

    /// Number of rows in the largest trips/payments tables
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Number of filtered rows to preview
    #[arg(long, default_value = "10")]
    pub preview: usize,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from(std::env::args_os())
    }

    /// Parse an explicit argument list; `--debug` overrides the log level.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn trip_schema(&self) -> Schema {
        Schema::trips().with_timestamp_column(&self.trip_timestamp_column)
    }

    pub fn payment_schema(&self) -> Schema {
        Schema::payments().with_timestamp_column(&self.payment_timestamp_column)
    }

    /// The user's filter selection, with explicit ranges checked for order.
    pub fn to_selection(&self) -> Result<DashboardSelection> {
        let selection = DashboardSelection {
            trips: DateSelection::new(self.trips_start, self.trips_end)?,
            payments: DateSelection::new(self.payments_start, self.payments_end)?,
            days: self.days.as_ref().map(|d| d.iter().copied().collect()),
            top_n: self.top,
            preview_rows: self.preview,
        };
        Ok(selection)
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// Optional date bounds for one dataset; missing bounds default to the
/// dataset's own first/last date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateSelection {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(DashboardError::InvalidRange { start: s, end: e });
            }
        }
        Ok(Self { start, end })
    }

    /// Fill missing bounds from `bounds`.
    ///
    /// A filled-in bound never crosses the supplied one, so a start after the
    /// data's last date resolves to an empty single-day range rather than an
    /// inverted one.
    pub fn resolve(&self, bounds: (NaiveDate, NaiveDate)) -> (NaiveDate, NaiveDate) {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, bounds.1.max(start)),
            (None, Some(end)) => (bounds.0.min(end), end),
            (None, None) => bounds,
        }
    }
}

/// Everything the user picks before the dashboard is computed.
///
/// Trips and payments keep independent date ranges; the day-of-week
/// selection is shared by both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSelection {
    pub trips: DateSelection,
    pub payments: DateSelection,
    /// `None` selects every observed day.
    pub days: Option<BTreeSet<DayOfWeek>>,
    pub top_n: usize,
    pub preview_rows: usize,
}

impl Default for DashboardSelection {
    fn default() -> Self {
        Self {
            trips: DateSelection::default(),
            payments: DateSelection::default(),
            days: None,
            top_n: 10,
            preview_rows: 10,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
