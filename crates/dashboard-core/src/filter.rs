//! Date-range and day-of-week filtering.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::{Dataset, DayOfWeek, TimestampedRecord};

// ── FilterCriteria ────────────────────────────────────────────────────────────

/// Inclusive calendar-date range plus the set of allowed weekdays.
///
/// Constructed only through [`FilterCriteria::new`] and friends, so
/// `start_date <= end_date` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    start_date: NaiveDate,
    end_date: NaiveDate,
    allowed_days: BTreeSet<DayOfWeek>,
}

impl FilterCriteria {
    /// Build criteria, rejecting a start date after the end date.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        allowed_days: impl IntoIterator<Item = DayOfWeek>,
    ) -> Result<Self> {
        if start_date > end_date {
            return Err(DashboardError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            allowed_days: allowed_days.into_iter().collect(),
        })
    }

    /// Criteria over `[start_date, end_date]` allowing all seven days.
    pub fn all_days(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        Self::new(start_date, end_date, DayOfWeek::ALL)
    }

    /// Criteria spanning a dataset's full date range, or `None` for an empty
    /// dataset.
    pub fn covering<R: TimestampedRecord>(
        dataset: &Dataset<R>,
        allowed_days: impl IntoIterator<Item = DayOfWeek>,
    ) -> Option<Self> {
        let (start, end) = dataset.date_bounds()?;
        Self::new(start, end, allowed_days).ok()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn allowed_days(&self) -> &BTreeSet<DayOfWeek> {
        &self.allowed_days
    }

    /// Whether `record` falls inside the range and on an allowed day.
    pub fn matches<R: TimestampedRecord>(&self, record: &R) -> bool {
        let date = record.date();
        self.start_date <= date
            && date <= self.end_date
            && self.allowed_days.contains(&record.day_of_week())
    }
}

// ── FilterEngine ──────────────────────────────────────────────────────────────

/// Stateless record filter.
pub struct FilterEngine;

impl FilterEngine {
    /// Records of `records` matching `criteria`, in input order.
    pub fn apply<R: TimestampedRecord>(records: &[R], criteria: &FilterCriteria) -> Vec<R> {
        if criteria.allowed_days.is_empty() {
            return Vec::new();
        }
        records
            .iter()
            .filter(|r| criteria.matches(*r))
            .cloned()
            .collect()
    }
}

impl<R: TimestampedRecord> Dataset<R> {
    /// New dataset holding the records matching `criteria`.
    pub fn filter(&self, criteria: &FilterCriteria) -> Dataset<R> {
        self.derive(FilterEngine::apply(self.records(), criteria))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
