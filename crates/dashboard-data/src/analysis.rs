//! Dashboard pipeline.
//!
//! Resolves the shared weekday options, filters each dataset with its own
//! date range, and computes every metric, series and ranking the dashboard
//! shows, returning a [`DashboardReport`] ready for rendering.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use dashboard_core::aggregator::{
    AggregationKind, AggregationResult, Aggregator, GroupBy, GroupLabel, Summary,
};
use dashboard_core::domain::UnifiedDaySet;
use dashboard_core::error::Result;
use dashboard_core::filter::FilterCriteria;
use dashboard_core::models::{
    Dataset, DayOfWeek, PaymentRecord, TimestampedRecord, TripRecord, PAYMENT_AMOUNT,
    PAYMENT_CATEGORY, TRIP_DISTANCE,
};
use dashboard_core::normalizer::NormalizationReport;
use dashboard_core::settings::{DashboardSelection, DateSelection};
use serde::Serialize;
use tracing::debug;

// ── Public types ──────────────────────────────────────────────────────────────

/// The filter actually applied to one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedFilter {
    /// `None` when the dataset was empty and nothing was filtered.
    pub criteria: Option<FilterCriteria>,
    /// Earliest and latest dates available before filtering.
    pub available_range: Option<(NaiveDate, NaiveDate)>,
    pub normalization: NormalizationReport,
}

/// Everything shown on the trips tab.
#[derive(Debug, Clone, Serialize)]
pub struct TripsView {
    pub filter: AppliedFilter,
    pub total_trips: usize,
    pub preview: Vec<TripRecord>,
    pub distance: Summary,
    /// Mean trip distance per calendar date.
    pub daily_average_distance: AggregationResult<GroupLabel>,
    /// Trip count per weekday.
    pub trips_by_day: AggregationResult<GroupLabel>,
    pub longest_trips: Vec<TripRecord>,
}

/// Everything shown on the payments tab.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentsView {
    pub filter: AppliedFilter,
    pub total_payments: usize,
    pub preview: Vec<PaymentRecord>,
    pub amount: Summary,
    /// Total amount per calendar date.
    pub daily_total: AggregationResult<GroupLabel>,
    /// Total amount per category, largest first.  `None` when the input had
    /// no category column.
    pub by_category: Option<AggregationResult<GroupLabel>>,
    pub largest_payments: Vec<PaymentRecord>,
}

/// Report metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    /// RFC 3339 timestamp when this report was generated.
    pub generated_at: String,
    /// Weekdays observed in either dataset.
    pub available_days: UnifiedDaySet,
    /// Weekdays the filters allowed.
    pub selected_days: BTreeSet<DayOfWeek>,
}

/// The complete output of [`build_dashboard`].
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: DashboardMetadata,
    pub trips: TripsView,
    pub payments: PaymentsView,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the dashboard pipeline over already-loaded datasets.
///
/// 1. Resolve the weekday options shared by both datasets.
/// 2. Build each dataset's criteria from its own date range and the shared
///    day selection.
/// 3. Filter both datasets.
/// 4. Compute the trips and payments views.
///
/// Fails only on an explicit inverted date range; empty data or a range
/// outside the data yields empty views.
pub fn build_dashboard(
    trips: &Dataset<TripRecord>,
    payments: &Dataset<PaymentRecord>,
    selection: &DashboardSelection,
) -> Result<DashboardReport> {
    // ── Step 1: Shared weekday options ────────────────────────────────────────
    let available_days = UnifiedDaySet::resolve(trips.records(), payments.records());
    let selected_days = selection
        .days
        .clone()
        .unwrap_or_else(|| available_days.default_selection());
    debug!(
        "Available days: {:?}, selected: {:?}",
        available_days.days(),
        selected_days
    );

    // ── Steps 2-3: Criteria + filtering ───────────────────────────────────────
    let (filtered_trips, trip_filter) = apply_selection(trips, &selection.trips, &selected_days)?;
    let (filtered_payments, payment_filter) =
        apply_selection(payments, &selection.payments, &selected_days)?;
    debug!(
        "Filtered {} of {} trips, {} of {} payments",
        filtered_trips.len(),
        trips.len(),
        filtered_payments.len(),
        payments.len()
    );

    // ── Step 4: Views ─────────────────────────────────────────────────────────
    let trips_view = trips_view(&filtered_trips, trip_filter, selection)?;
    let payments_view = payments_view(&filtered_payments, payment_filter, selection)?;

    Ok(DashboardReport {
        metadata: DashboardMetadata {
            generated_at: Utc::now().to_rfc3339(),
            available_days,
            selected_days,
        },
        trips: trips_view,
        payments: payments_view,
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Filter `dataset` by its date selection and the shared day set.
///
/// An empty dataset has no date bounds and passes through unfiltered.  Only
/// an explicit start after an explicit end fails.
fn apply_selection<R: TimestampedRecord>(
    dataset: &Dataset<R>,
    dates: &DateSelection,
    days: &BTreeSet<DayOfWeek>,
) -> Result<(Dataset<R>, AppliedFilter)> {
    let available_range = dataset.date_bounds();
    let criteria = match available_range {
        Some(bounds) => {
            let (start, end) = dates.resolve(bounds);
            Some(FilterCriteria::new(start, end, days.iter().copied())?)
        }
        None => None,
    };

    let filtered = match &criteria {
        Some(c) => dataset.filter(c),
        None => dataset.clone(),
    };

    let applied = AppliedFilter {
        criteria,
        available_range,
        normalization: dataset.report().clone(),
    };
    Ok((filtered, applied))
}

fn trips_view(
    trips: &Dataset<TripRecord>,
    filter: AppliedFilter,
    selection: &DashboardSelection,
) -> Result<TripsView> {
    Ok(TripsView {
        filter,
        total_trips: trips.len(),
        preview: trips.preview(selection.preview_rows).to_vec(),
        distance: trips.summarize(TRIP_DISTANCE)?,
        daily_average_distance: trips.aggregate(
            GroupBy::Date,
            Some(TRIP_DISTANCE),
            AggregationKind::Mean,
        )?,
        trips_by_day: Aggregator::count_by(trips.records(), |t| {
            Some(GroupLabel::Day(t.day_of_week()))
        }),
        longest_trips: trips.top_n(TRIP_DISTANCE, selection.top_n)?,
    })
}

fn payments_view(
    payments: &Dataset<PaymentRecord>,
    filter: AppliedFilter,
    selection: &DashboardSelection,
) -> Result<PaymentsView> {
    let by_category = if payments.has_column(PAYMENT_CATEGORY) {
        Some(
            payments
                .aggregate(GroupBy::Category, Some(PAYMENT_AMOUNT), AggregationKind::Sum)?
                .sorted_by_value_desc(),
        )
    } else {
        None
    };

    Ok(PaymentsView {
        filter,
        total_payments: payments.len(),
        preview: payments.preview(selection.preview_rows).to_vec(),
        amount: payments.summarize(PAYMENT_AMOUNT)?,
        daily_total: payments.aggregate(
            GroupBy::Date,
            Some(PAYMENT_AMOUNT),
            AggregationKind::Sum,
        )?,
        by_category,
        largest_payments: payments.top_n(PAYMENT_AMOUNT, selection.top_n)?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
