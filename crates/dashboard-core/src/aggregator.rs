//! Grouped aggregation and top-N ranking over record collections.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Dataset, DayOfWeek, TimestampedRecord, PAYMENT_CATEGORY};

// ── AggregationKind ───────────────────────────────────────────────────────────

/// How values within a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    /// Number of records in the group; values are ignored.
    Count,
    /// Total of the values; a group without any value sums to `0.0`.
    Sum,
    /// Arithmetic mean; groups without any value are left out.
    Mean,
}

// ── GroupStats ────────────────────────────────────────────────────────────────

/// Running accumulator for one group.
#[derive(Debug, Clone, Copy, Default)]
struct GroupStats {
    records: usize,
    values: usize,
    sum: f64,
}

impl GroupStats {
    fn add(&mut self, value: Option<f64>) {
        self.records += 1;
        if let Some(v) = value {
            self.values += 1;
            self.sum += v;
        }
    }

    fn finish(&self, kind: AggregationKind) -> Option<f64> {
        match kind {
            AggregationKind::Count => Some(self.records as f64),
            AggregationKind::Sum => Some(self.sum),
            AggregationKind::Mean if self.values > 0 => Some(self.sum / self.values as f64),
            AggregationKind::Mean => None,
        }
    }
}

// ── AggregationResult ─────────────────────────────────────────────────────────

/// Ordered `(group key, value)` pairs.
///
/// Results come out of [`Aggregator::aggregate`] ordered by key ascending,
/// the order time-series charts want.  [`sorted_by_value_desc`] gives the
/// ranked order bar charts want.
///
/// [`sorted_by_value_desc`]: AggregationResult::sorted_by_value_desc
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult<K> {
    entries: Vec<(K, f64)>,
}

impl<K> Default for AggregationResult<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> AggregationResult<K> {
    pub fn entries(&self) -> &[(K, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for `key`, if that group exists.
    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    /// Reorder by value, largest first.  Equal values keep their key order.
    pub fn sorted_by_value_desc(mut self) -> Self {
        self.entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        self
    }

    pub fn into_entries(self) -> Vec<(K, f64)> {
        self.entries
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Headline scalars over one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Number of records, with or without a value.
    pub count: usize,
    pub sum: f64,
    /// `None` when no record carried a value.
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Stateless helper that groups records and combines their values.
pub struct Aggregator;

impl Aggregator {
    /// Group `records` by `key_fn` and combine `value_fn` per group.
    ///
    /// Records whose key is `None` are not grouped.  For [`Sum`] and
    /// [`Mean`], records whose value is `None` are skipped.  A group left with
    /// no values sums to `0.0` and is absent from [`Mean`] results.
    ///
    /// Returns groups sorted by key (ascending).
    ///
    /// [`Sum`]: AggregationKind::Sum
    /// [`Mean`]: AggregationKind::Mean
    pub fn aggregate<R, K, FK, FV>(
        records: &[R],
        key_fn: FK,
        value_fn: FV,
        kind: AggregationKind,
    ) -> AggregationResult<K>
    where
        K: Ord,
        FK: Fn(&R) -> Option<K>,
        FV: Fn(&R) -> Option<f64>,
    {
        let mut groups: BTreeMap<K, GroupStats> = BTreeMap::new();

        for record in records {
            let Some(key) = key_fn(record) else { continue };
            let value = match kind {
                AggregationKind::Count => None,
                _ => value_fn(record),
            };
            groups.entry(key).or_default().add(value);
        }

        let entries = groups
            .into_iter()
            .filter_map(|(key, stats)| stats.finish(kind).map(|v| (key, v)))
            .collect();

        AggregationResult { entries }
    }

    /// Number of records per key.
    pub fn count_by<R, K, FK>(records: &[R], key_fn: FK) -> AggregationResult<K>
    where
        K: Ord,
        FK: Fn(&R) -> Option<K>,
    {
        Self::aggregate(records, key_fn, |_| None, AggregationKind::Count)
    }

    /// Headline scalars of `value_fn` over all records.
    pub fn summarize<R, FV>(records: &[R], value_fn: FV) -> Summary
    where
        FV: Fn(&R) -> Option<f64>,
    {
        let mut summary = Summary {
            count: records.len(),
            ..Summary::default()
        };
        let mut values = 0usize;

        for v in records.iter().filter_map(&value_fn) {
            values += 1;
            summary.sum += v;
            summary.min = Some(summary.min.map_or(v, |m| m.min(v)));
            summary.max = Some(summary.max.map_or(v, |m| m.max(v)));
        }

        if values > 0 {
            summary.mean = Some(summary.sum / values as f64);
        }
        summary
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

/// Top-N selection by a numeric value.
pub struct Ranking;

impl Ranking {
    /// The `n` records with the largest `value_fn`, largest first.
    ///
    /// The sort is stable: records with equal values keep their input order.
    /// Records without a value are not ranked.
    pub fn top_n<R, FV>(records: &[R], value_fn: FV, n: usize) -> Vec<R>
    where
        R: Clone,
        FV: Fn(&R) -> Option<f64>,
    {
        let mut scored: Vec<(f64, &R)> = records
            .iter()
            .filter_map(|r| value_fn(r).map(|v| (v, r)))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(n)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

// ── Column-driven grouping ────────────────────────────────────────────────────

/// Grouping keys available to column-driven aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Date,
    DayOfWeek,
    /// Calendar month, keyed by `(year, month)`.
    Month,
    Hour,
    Category,
}

/// Group key produced by [`GroupBy`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupLabel {
    Date(NaiveDate),
    Day(DayOfWeek),
    Month { year: i32, month: u32 },
    Hour(u32),
    Category(String),
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            GroupLabel::Day(d) => write!(f, "{d}"),
            GroupLabel::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            GroupLabel::Hour(h) => write!(f, "{h:02}:00"),
            GroupLabel::Category(c) => f.write_str(c),
        }
    }
}

fn group_label<R: TimestampedRecord>(record: &R, group_by: GroupBy) -> Option<GroupLabel> {
    let cal = record.calendar();
    match group_by {
        GroupBy::Date => Some(GroupLabel::Date(record.date())),
        GroupBy::DayOfWeek => Some(GroupLabel::Day(cal.day_of_week)),
        GroupBy::Month => Some(GroupLabel::Month {
            year: cal.year,
            month: cal.month,
        }),
        GroupBy::Hour => Some(GroupLabel::Hour(cal.hour)),
        GroupBy::Category => record.category().map(|c| GroupLabel::Category(c.to_string())),
    }
}

impl<R: TimestampedRecord> Dataset<R> {
    /// Aggregate the column named `column` grouped by `group_by`.
    ///
    /// `column` may be `None` only for [`AggregationKind::Count`].  Fails with
    /// `UnsupportedColumn` when the dataset does not carry the value column or
    /// the grouping column.
    pub fn aggregate(
        &self,
        group_by: GroupBy,
        column: Option<&str>,
        kind: AggregationKind,
    ) -> Result<AggregationResult<GroupLabel>> {
        if group_by == GroupBy::Category && !self.has_column(PAYMENT_CATEGORY) {
            return Err(self.unsupported(PAYMENT_CATEGORY));
        }
        let column = match (column, kind) {
            (Some(c), _) => {
                self.require_numeric(c)?;
                Some(c)
            }
            (None, AggregationKind::Count) => None,
            (None, _) => return Err(self.unsupported("<none>")),
        };

        Ok(Aggregator::aggregate(
            self.records(),
            |r| group_label(r, group_by),
            |r| column.and_then(|c| r.numeric_value(c)),
            kind,
        ))
    }

    /// Headline scalars of `column`.
    pub fn summarize(&self, column: &str) -> Result<Summary> {
        self.require_numeric(column)?;
        Ok(Aggregator::summarize(self.records(), |r| {
            r.numeric_value(column)
        }))
    }

    /// The `n` records with the largest `column` value.
    pub fn top_n(&self, column: &str, n: usize) -> Result<Vec<R>> {
        self.require_numeric(column)?;
        Ok(Ranking::top_n(self.records(), |r| r.numeric_value(column), n))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
