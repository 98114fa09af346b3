//! Plain-text rendering of a [`DashboardReport`].

use std::fmt;

use dashboard_core::aggregator::{AggregationResult, GroupLabel};
use dashboard_core::formatting::{format_currency, format_miles, format_number, percentage};
use dashboard_core::models::{PaymentRecord, TimestampedRecord, TripRecord};
use dashboard_data::analysis::{AppliedFilter, DashboardReport, PaymentsView, TripsView};

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Text view of a [`DashboardReport`].
pub struct TextReport<'a>(pub &'a DashboardReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let days: Vec<&str> = report
            .metadata
            .selected_days
            .iter()
            .map(|d| d.name())
            .collect();
        writeln!(f, "Driver Dashboard")?;
        writeln!(
            f,
            "Days of week (trips & payments): {}",
            if days.is_empty() {
                "none".to_string()
            } else {
                days.join(", ")
            }
        )?;
        writeln!(f, "{RULE}")?;

        write_trips(f, &report.trips)?;
        writeln!(f, "{RULE}")?;
        write_payments(f, &report.payments)
    }
}

/// Render the whole report as text.
pub fn render_text(report: &DashboardReport) -> String {
    TextReport(report).to_string()
}

fn write_filter(f: &mut fmt::Formatter<'_>, name: &str, filter: &AppliedFilter) -> fmt::Result {
    match &filter.criteria {
        Some(c) => writeln!(
            f,
            "{name} from {} to {}",
            c.start_date().format("%Y-%m-%d"),
            c.end_date().format("%Y-%m-%d")
        )?,
        None => writeln!(f, "{name}: no data")?,
    }

    let norm = &filter.normalization;
    if norm.dropped() > 0 {
        writeln!(
            f,
            "  ({} of {} rows dropped, {}%)",
            norm.dropped(),
            norm.rows_read,
            percentage(norm.dropped() as f64, norm.rows_read as f64, 1)
        )?;
    }
    Ok(())
}

fn write_trips(f: &mut fmt::Formatter<'_>, view: &TripsView) -> fmt::Result {
    write_filter(f, "Trips", &view.filter)?;
    writeln!(f, "{} total trips in selection.", view.total_trips)?;

    if view.total_trips == 0 {
        return Ok(());
    }

    if let Some(mean) = view.distance.mean {
        writeln!(f, "Average trip distance: {}", format_miles(mean))?;
    }

    writeln!(f, "\nPreview:")?;
    for trip in &view.preview {
        writeln!(f, "  {}", trip_line(trip))?;
    }

    write_series(f, "Average daily trip distance (mi)", &view.daily_average_distance, 2)?;
    write_series(f, "Trips by day of week", &view.trips_by_day, 0)?;

    writeln!(f, "\nLongest trips:")?;
    for trip in &view.longest_trips {
        writeln!(f, "  {}", trip_line(trip))?;
    }
    Ok(())
}

fn write_payments(f: &mut fmt::Formatter<'_>, view: &PaymentsView) -> fmt::Result {
    write_filter(f, "Payments", &view.filter)?;
    writeln!(f, "{} payment records in selection.", view.total_payments)?;

    if view.total_payments == 0 {
        return Ok(());
    }

    writeln!(f, "Total earnings: {}", format_currency(view.amount.sum))?;

    writeln!(f, "\nPreview:")?;
    for payment in &view.preview {
        writeln!(f, "  {}", payment_line(payment))?;
    }

    write_series(f, "Daily total payment (USD)", &view.daily_total, 2)?;
    if let Some(categories) = &view.by_category {
        write_series(f, "Payments by category (USD)", categories, 2)?;
    }

    writeln!(f, "\nLargest payments:")?;
    for payment in &view.largest_payments {
        writeln!(f, "  {}", payment_line(payment))?;
    }
    Ok(())
}

fn write_series(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    series: &AggregationResult<GroupLabel>,
    decimals: u32,
) -> fmt::Result {
    if series.is_empty() {
        return Ok(());
    }
    writeln!(f, "\n{title}:")?;
    let width = series
        .keys()
        .map(|k| k.to_string().len())
        .max()
        .unwrap_or(0);
    for (key, value) in series.entries() {
        writeln!(
            f,
            "  {:<width$}  {:>12}",
            key.to_string(),
            format_number(*value, decimals)
        )?;
    }
    Ok(())
}

fn trip_line(trip: &TripRecord) -> String {
    let fare = trip
        .original_fare()
        .map(format_currency)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {:<9}  {:>10}  {:>10}",
        trip.timestamp().format("%Y-%m-%d %H:%M"),
        trip.day_of_week().name(),
        format_miles(trip.distance_miles()),
        fare
    )
}

fn payment_line(payment: &PaymentRecord) -> String {
    format!(
        "{}  {:<9}  {:>10}  {}",
        payment.timestamp().format("%Y-%m-%d %H:%M"),
        payment.day_of_week().name(),
        format_currency(payment.amount()),
        payment.category().unwrap_or("-")
    )
}
