use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use dashboard_core::aggregator::{AggregationKind, GroupBy, GroupLabel};
use dashboard_core::domain::UnifiedDaySet;
use dashboard_core::error::DashboardError;
use dashboard_core::filter::FilterCriteria;
use dashboard_core::models::{DayOfWeek, Schema, PAYMENT_AMOUNT, TRIP_DISTANCE};
use dashboard_core::settings::DashboardSelection;
use dashboard_data::analysis::build_dashboard;
use dashboard_data::reader::{load_payments, load_trips};
use tempfile::TempDir;

const TRIPS_CSV: &str = "\
Local Dropoff Timestamp,Trip Distance (miles),Local Original Fare
2024-01-01 08:15:00,5.0,14.20
2024-01-08 21:40:00,7.0,19.85
2024-01-10 12:00:00,3.5,
not a date,9.9,30.00
,1.0,4.00
2024-01-13 02:05:00,12.25,41.10
";

const PAYMENTS_CSV: &str = "\
Local Timestamp,Local Amount,Category
2024-01-01 09:00:00,10.00,tip
2024-01-01 18:00:00,50.00,fare
2024-01-13 03:00:00,-2.50,adjustment
2024-01-14 11:00:00,33.00,fare
garbage,100.00,fare
";

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_pipeline_from_csv_files() {
    let dir = TempDir::new().unwrap();
    let trips_path = write_file(dir.path(), "trips.csv", TRIPS_CSV);
    let payments_path = write_file(dir.path(), "payments.csv", PAYMENTS_CSV);

    let trips = load_trips(&trips_path, &Schema::trips()).unwrap();
    let payments = load_payments(&payments_path, &Schema::payments()).unwrap();

    assert_eq!(trips.len(), 4);
    assert_eq!(trips.report().dropped_timestamps, 2);
    assert_eq!(payments.len(), 4);
    assert_eq!(payments.report().dropped_timestamps, 1);

    // Monday, Wednesday, Saturday from trips; Monday, Saturday, Sunday from payments.
    let days = UnifiedDaySet::resolve(trips.records(), payments.records());
    assert_eq!(
        days.days(),
        &[
            DayOfWeek::Monday,
            DayOfWeek::Wednesday,
            DayOfWeek::Saturday,
            DayOfWeek::Sunday
        ]
    );

    let report = build_dashboard(&trips, &payments, &DashboardSelection::default()).unwrap();
    assert_eq!(report.trips.total_trips, 4);
    assert_eq!(report.payments.total_payments, 4);
    assert!((report.payments.amount.sum - 90.5).abs() < 1e-9);

    let categories = report.payments.by_category.unwrap();
    assert_eq!(
        categories.entries().first(),
        Some(&(GroupLabel::Category("fare".to_string()), 83.0))
    );
    assert_eq!(report.trips.longest_trips[0].distance_miles(), 12.25);
}

#[test]
fn test_monday_mean_example() {
    let dir = TempDir::new().unwrap();
    let trips_path = write_file(dir.path(), "trips.csv", TRIPS_CSV);
    let trips = load_trips(&trips_path, &Schema::trips()).unwrap();

    let criteria =
        FilterCriteria::new(date("2024-01-01"), date("2024-01-08"), [DayOfWeek::Monday]).unwrap();
    let mondays = trips.filter(&criteria);
    assert_eq!(mondays.len(), 2);

    let mean = mondays
        .aggregate(GroupBy::DayOfWeek, Some(TRIP_DISTANCE), AggregationKind::Mean)
        .unwrap();
    assert_eq!(mean.entries(), &[(GroupLabel::Day(DayOfWeek::Monday), 6.0)]);

    // Filtering again with the same criteria changes nothing.
    assert_eq!(mondays.filter(&criteria).records(), mondays.records());
}

#[test]
fn test_empty_filtered_payments_aggregate_to_nothing() {
    let dir = TempDir::new().unwrap();
    let payments_path = write_file(dir.path(), "payments.csv", PAYMENTS_CSV);
    let payments = load_payments(&payments_path, &Schema::payments()).unwrap();

    let criteria = FilterCriteria::all_days(date("2025-01-01"), date("2025-12-31")).unwrap();
    let empty = payments.filter(&criteria);
    assert!(empty.is_empty());

    for group_by in [GroupBy::Date, GroupBy::DayOfWeek, GroupBy::Category] {
        for kind in [AggregationKind::Count, AggregationKind::Sum, AggregationKind::Mean] {
            let result = empty.aggregate(group_by, Some(PAYMENT_AMOUNT), kind).unwrap();
            assert!(result.is_empty());
        }
    }
    assert!(empty.top_n(PAYMENT_AMOUNT, 3).unwrap().is_empty());
}

#[test]
fn test_inverted_range_is_rejected() {
    let err = FilterCriteria::all_days(date("2024-02-01"), date("2024-01-01")).unwrap_err();
    assert!(matches!(err, DashboardError::InvalidRange { .. }));
}
