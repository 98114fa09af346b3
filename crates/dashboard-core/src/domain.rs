//! Day-of-week option set shared by the trip and payment filters.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::models::{DayOfWeek, TimestampedRecord};

/// Calendar-ordered union of the weekdays observed in two datasets.
///
/// Only days that actually occur are included, so a dataset without any
/// Sunday records does not offer Sunday unless the other one has it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnifiedDaySet {
    days: Vec<DayOfWeek>,
}

impl UnifiedDaySet {
    /// Resolve the shared day set from both record collections.
    pub fn resolve<A, B>(left: &[A], right: &[B]) -> Self
    where
        A: TimestampedRecord,
        B: TimestampedRecord,
    {
        let observed: BTreeSet<DayOfWeek> = left
            .iter()
            .map(TimestampedRecord::day_of_week)
            .chain(right.iter().map(TimestampedRecord::day_of_week))
            .collect();
        Self {
            days: observed.into_iter().collect(),
        }
    }

    /// Observed days, Monday first.
    pub fn days(&self) -> &[DayOfWeek] {
        &self.days
    }

    pub fn contains(&self, day: DayOfWeek) -> bool {
        self.days.binary_search(&day).is_ok()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Every observed day; the selection offered before the user narrows it.
    pub fn default_selection(&self) -> BTreeSet<DayOfWeek> {
        self.days.iter().copied().collect()
    }

    /// Criteria over `[start, end]` allowing every observed day.
    pub fn criteria(&self, start: NaiveDate, end: NaiveDate) -> Result<FilterCriteria> {
        FilterCriteria::new(start, end, self.days.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::models::{PaymentRecord, TripRecord};
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_union_in_calendar_order() {
        let trips = vec![
            TripRecord::new(ts("2024-01-07 10:00:00"), 1.0, None), // Sunday
            TripRecord::new(ts("2024-01-03 10:00:00"), 1.0, None), // Wednesday
        ];
        let payments = vec![
            PaymentRecord::new(ts("2024-01-01 10:00:00"), 5.0, None), // Monday
            PaymentRecord::new(ts("2024-01-10 10:00:00"), 5.0, None), // Wednesday
        ];
        let set = UnifiedDaySet::resolve(&trips, &payments);
        assert_eq!(
            set.days(),
            &[DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Sunday]
        );
        assert!(set.contains(DayOfWeek::Sunday));
        assert!(!set.contains(DayOfWeek::Friday));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let trips = vec![TripRecord::new(ts("2024-01-05 10:00:00"), 1.0, None)];
        let payments = vec![PaymentRecord::new(ts("2024-01-02 10:00:00"), 5.0, None)];
        assert_eq!(
            UnifiedDaySet::resolve(&trips, &payments).days(),
            UnifiedDaySet::resolve(&payments, &trips).days()
        );
    }

    #[test]
    fn test_empty_inputs_yield_empty_set() {
        let set = UnifiedDaySet::resolve::<TripRecord, PaymentRecord>(&[], &[]);
        assert!(set.is_empty());
        assert!(set.default_selection().is_empty());
    }

    #[test]
    fn test_one_sided_input() {
        let payments = vec![PaymentRecord::new(ts("2024-01-06 10:00:00"), 5.0, None)];
        let set = UnifiedDaySet::resolve::<TripRecord, _>(&[], &payments);
        assert_eq!(set.days(), &[DayOfWeek::Saturday]);
    }

    #[test]
    fn test_criteria_uses_observed_days() {
        let trips = vec![TripRecord::new(ts("2024-01-02 10:00:00"), 1.0, None)];
        let set = UnifiedDaySet::resolve::<_, PaymentRecord>(&trips, &[]);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let c = set.criteria(start, end).unwrap();
        assert_eq!(c.allowed_days().len(), 1);
        assert!(c.allowed_days().contains(&DayOfWeek::Tuesday));

        assert!(matches!(
            set.criteria(end, start),
            Err(DashboardError::InvalidRange { .. })
        ));
    }
}
