//! Activity log
//!
//! This module stores the dated activity of one tracked item (a book, a habit
//! goal). The log keeps at most one entry per `(date, metric)` pair: a second
//! contribution on the same day accumulates into the existing entry.

use crate::error::ComputeError;
use crate::types::{ActivityEntry, CalendarDate, MetricKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Date-ordered store of activity entries for a single tracked item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActivityLogDocument", into = "ActivityLogDocument")]
pub struct ActivityLog {
    /// Identifier of the tracked item, if the caller supplied one
    item_id: Option<String>,
    /// Entries sorted by `(date, metric)`, unique per pair
    entries: Vec<ActivityEntry>,
}

/// Persisted shape of an [`ActivityLog`]
///
/// Entries may arrive unsorted or duplicated; converting into a log
/// normalizes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default)]
    pub entries: Vec<ActivityEntry>,
}

impl TryFrom<ActivityLogDocument> for ActivityLog {
    type Error = ComputeError;

    fn try_from(doc: ActivityLogDocument) -> Result<Self, Self::Error> {
        let mut log = ActivityLog {
            item_id: doc.item_id,
            entries: Vec::with_capacity(doc.entries.len()),
        };
        for entry in doc.entries {
            if !entry.amount.is_finite() || entry.amount < 0.0 {
                return Err(ComputeError::InvalidAmount(entry.amount));
            }
            // A zero entry records no activity and must not count as an active day
            if entry.amount == 0.0 {
                continue;
            }
            log.accumulate(entry.date, entry.metric, entry.amount);
        }
        Ok(log)
    }
}

impl From<ActivityLog> for ActivityLogDocument {
    fn from(log: ActivityLog) -> Self {
        Self {
            item_id: log.item_id,
            entries: log.entries,
        }
    }
}

impl ActivityLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log for a named tracked item
    pub fn for_item(item_id: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            entries: Vec::new(),
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    /// Add `amount` to the entry for `(date, metric)`, inserting it if absent.
    ///
    /// Returns the day's new total. A non-positive or non-finite amount is
    /// rejected with [`ComputeError::InvalidAmount`] and leaves the log untouched.
    pub fn record(
        &mut self,
        date: CalendarDate,
        metric: MetricKind,
        amount: f64,
    ) -> Result<f64, ComputeError> {
        validate_amount(amount)?;
        let total = self.accumulate(date, metric.clone(), amount);
        debug!(%date, %metric, amount, total, "recorded activity");
        Ok(total)
    }

    /// Replace the day's value for `(date, metric)` outright.
    ///
    /// For callers that re-log an absolute daily figure rather than a delta.
    /// Returns the previous amount, if any.
    pub fn overwrite(
        &mut self,
        date: CalendarDate,
        metric: MetricKind,
        amount: f64,
    ) -> Result<Option<f64>, ComputeError> {
        validate_amount(amount)?;
        let previous = match self.position(date, &metric) {
            Ok(idx) => Some(std::mem::replace(&mut self.entries[idx].amount, amount)),
            Err(idx) => {
                self.entries.insert(
                    idx,
                    ActivityEntry {
                        date,
                        metric: metric.clone(),
                        amount,
                    },
                );
                None
            }
        };
        debug!(%date, %metric, amount, ?previous, "overwrote activity");
        Ok(previous)
    }

    /// Fold another log's entries into this one, accumulating same-day amounts
    pub fn merge(&mut self, other: &ActivityLog) {
        for entry in &other.entries {
            self.accumulate(entry.date, entry.metric.clone(), entry.amount);
        }
        debug!(
            merged = other.entries.len(),
            total_entries = self.entries.len(),
            "merged activity logs"
        );
    }

    /// Sorted, distinct dates bearing an entry, optionally for one metric only
    pub fn all_dates(&self, metric: Option<&MetricKind>) -> Vec<CalendarDate> {
        let mut dates: Vec<CalendarDate> = self
            .entries
            .iter()
            .filter(|e| metric.map_or(true, |m| &e.metric == m))
            .map(|e| e.date)
            .collect();
        // Entries are already date-ordered; only same-day metrics repeat.
        dates.dedup();
        dates
    }

    /// Total amount for `metric` over `[from, to]` inclusive
    pub fn sum(&self, metric: &MetricKind, from: CalendarDate, to: CalendarDate) -> f64 {
        if from > to {
            return 0.0;
        }
        self.entries
            .iter()
            .skip_while(|e| e.date < from)
            .take_while(|e| e.date <= to)
            .filter(|e| &e.metric == metric)
            .map(|e| e.amount)
            .sum()
    }

    /// Total amount for `metric` across the whole log
    pub fn total(&self, metric: &MetricKind) -> f64 {
        self.entries_for(metric).map(|e| e.amount).sum()
    }

    /// Amount logged for `(date, metric)`, if any
    pub fn amount_on(&self, date: CalendarDate, metric: &MetricKind) -> Option<f64> {
        self.position(date, metric)
            .ok()
            .map(|idx| self.entries[idx].amount)
    }

    /// Most recent date bearing an entry, optionally for one metric only
    pub fn latest_date(&self, metric: Option<&MetricKind>) -> Option<CalendarDate> {
        self.entries
            .iter()
            .rev()
            .find(|e| metric.map_or(true, |m| &e.metric == m))
            .map(|e| e.date)
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn entries_for<'a>(
        &'a self,
        metric: &'a MetricKind,
    ) -> impl Iterator<Item = &'a ActivityEntry> + 'a {
        self.entries.iter().filter(move |e| &e.metric == metric)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wipe every entry, keeping the item id
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load a log from JSON, normalizing duplicate same-day entries
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the log to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn accumulate(&mut self, date: CalendarDate, metric: MetricKind, amount: f64) -> f64 {
        match self.position(date, &metric) {
            Ok(idx) => {
                self.entries[idx].amount += amount;
                self.entries[idx].amount
            }
            Err(idx) => {
                self.entries.insert(
                    idx,
                    ActivityEntry {
                        date,
                        metric,
                        amount,
                    },
                );
                amount
            }
        }
    }

    fn position(&self, date: CalendarDate, metric: &MetricKind) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|e| match e.date.cmp(&date) {
                Ordering::Equal => e.metric.cmp(metric),
                other => other,
            })
    }
}

fn validate_amount(amount: f64) -> Result<(), ComputeError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        warn!(amount, "rejected non-positive activity amount");
        Err(ComputeError::InvalidAmount(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn day(s: &str) -> CalendarDate {
        CalendarDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_same_day_accumulates() {
        let mut log = ActivityLog::new();
        log.record(day("2024-01-01"), MetricKind::Pages, 3.0).unwrap();
        let total = log.record(day("2024-01-01"), MetricKind::Pages, 4.0).unwrap();

        assert_eq!(total, 7.0);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].amount, 7.0);
    }

    #[test]
    fn test_different_metrics_same_day_are_separate() {
        let mut log = ActivityLog::new();
        log.record(day("2024-01-01"), MetricKind::Pages, 10.0).unwrap();
        log.record(day("2024-01-01"), MetricKind::Minutes, 25.0).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.all_dates(None), vec![day("2024-01-01")]);
        assert_eq!(log.amount_on(day("2024-01-01"), &MetricKind::Minutes), Some(25.0));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut log = ActivityLog::new();
        log.record(day("2024-01-01"), MetricKind::Steps, 500.0).unwrap();
        let before = log.clone();

        assert!(matches!(
            log.record(day("2024-01-01"), MetricKind::Steps, 0.0),
            Err(ComputeError::InvalidAmount(_))
        ));
        assert!(log.record(day("2024-01-02"), MetricKind::Steps, -5.0).is_err());
        assert!(log.record(day("2024-01-02"), MetricKind::Steps, f64::NAN).is_err());
        assert!(log.overwrite(day("2024-01-01"), MetricKind::Steps, 0.0).is_err());

        assert_eq!(log, before);
    }

    #[test]
    fn test_all_dates_sorted_and_filtered() {
        let mut log = ActivityLog::new();
        log.record(day("2024-01-05"), MetricKind::Pages, 1.0).unwrap();
        log.record(day("2024-01-01"), MetricKind::Pages, 1.0).unwrap();
        log.record(day("2024-01-03"), MetricKind::Minutes, 1.0).unwrap();
        log.record(day("2024-01-01"), MetricKind::Minutes, 1.0).unwrap();

        assert_eq!(
            log.all_dates(None),
            vec![day("2024-01-01"), day("2024-01-03"), day("2024-01-05")]
        );
        assert_eq!(
            log.all_dates(Some(&MetricKind::Pages)),
            vec![day("2024-01-01"), day("2024-01-05")]
        );
        assert_eq!(log.latest_date(Some(&MetricKind::Minutes)), Some(day("2024-01-03")));
    }

    #[test]
    fn test_sum_inclusive_window() {
        let mut log = ActivityLog::new();
        for (d, amount) in [("2024-01-01", 10.0), ("2024-01-02", 20.0), ("2024-01-03", 30.0)] {
            log.record(day(d), MetricKind::Pages, amount).unwrap();
        }
        log.record(day("2024-01-02"), MetricKind::Minutes, 99.0).unwrap();

        assert_eq!(log.sum(&MetricKind::Pages, day("2024-01-01"), day("2024-01-02")), 30.0);
        assert_eq!(log.sum(&MetricKind::Pages, day("2024-01-02"), day("2024-01-02")), 20.0);
        assert_eq!(log.sum(&MetricKind::Pages, day("2024-01-04"), day("2024-01-09")), 0.0);
        assert_eq!(log.sum(&MetricKind::Pages, day("2024-01-03"), day("2024-01-01")), 0.0);
        assert_eq!(log.total(&MetricKind::Pages), 60.0);
    }

    #[test]
    fn test_overwrite_replaces_day_value() {
        let mut log = ActivityLog::new();
        log.record(day("2024-01-01"), MetricKind::Steps, 4000.0).unwrap();
        let previous = log.overwrite(day("2024-01-01"), MetricKind::Steps, 9000.0).unwrap();

        assert_eq!(previous, Some(4000.0));
        assert_eq!(log.amount_on(day("2024-01-01"), &MetricKind::Steps), Some(9000.0));

        let previous = log.overwrite(day("2024-01-02"), MetricKind::Steps, 100.0).unwrap();
        assert_eq!(previous, None);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_merge_accumulates() {
        let mut a = ActivityLog::new();
        a.record(day("2024-01-01"), MetricKind::Pages, 5.0).unwrap();
        let mut b = ActivityLog::new();
        b.record(day("2024-01-01"), MetricKind::Pages, 2.0).unwrap();
        b.record(day("2024-01-02"), MetricKind::Pages, 8.0).unwrap();

        a.merge(&b);

        assert_eq!(a.amount_on(day("2024-01-01"), &MetricKind::Pages), Some(7.0));
        assert_eq!(a.amount_on(day("2024-01-02"), &MetricKind::Pages), Some(8.0));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_clear_keeps_item_id() {
        let mut log = ActivityLog::for_item("book-42");
        log.record(day("2024-01-01"), MetricKind::Pages, 5.0).unwrap();
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.item_id(), Some("book-42"));
    }

    #[test]
    fn test_serialization() {
        let mut log = ActivityLog::for_item("habit-1");
        log.record(day("2024-01-02"), MetricKind::Steps, 1200.0).unwrap();
        log.record(day("2024-01-01"), MetricKind::Steps, 800.0).unwrap();

        let json = log.to_json().unwrap();
        assert!(json.contains("\"2024-01-01\""));

        let loaded = ActivityLog::from_json(&json).unwrap();
        assert_eq!(loaded, log);
    }

    #[test]
    fn test_document_duplicates_are_normalized() {
        let json = r#"{
            "entries": [
                {"date": "2024-01-02", "metric": "pages", "amount": 4},
                {"date": "2024-01-01", "metric": "pages", "amount": 1},
                {"date": "2024-01-02", "metric": "pages", "amount": 3}
            ]
        }"#;
        let log = ActivityLog::from_json(json).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].date, day("2024-01-01"));
        assert_eq!(log.amount_on(day("2024-01-02"), &MetricKind::Pages), Some(7.0));
    }

    #[test]
    fn test_document_zero_entries_dropped() {
        let json = r#"{
            "entries": [
                {"date": "2024-01-01", "metric": "pages", "amount": 5},
                {"date": "2024-01-02", "metric": "pages", "amount": 0},
                {"date": "2024-01-03", "metric": "pages", "amount": 0}
            ]
        }"#;
        let log = ActivityLog::from_json(json).unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.all_dates(None), vec![day("2024-01-01")]);
        assert_eq!(log.latest_date(None), Some(day("2024-01-01")));
    }

    #[test]
    fn test_saved_amounts_survive_reload() {
        let mut log = ActivityLog::new();
        log.record(day("2024-01-01"), MetricKind::Pages, 391.27321946245587).unwrap();

        let loaded = ActivityLog::from_json(&log.to_json().unwrap()).unwrap();

        assert_eq!(loaded, log);
    }

    #[test]
    fn test_document_negative_amount_rejected() {
        let json = r#"{"entries": [{"date": "2024-01-01", "metric": "pages", "amount": -1}]}"#;
        assert!(ActivityLog::from_json(json).is_err());
    }

    fn arb_log() -> impl Strategy<Value = ActivityLog> {
        prop::collection::vec((0i64..60, 0usize..3, 0.5f64..500.0), 0..40).prop_map(|raw| {
            let start = day("2024-01-01");
            let metrics = [MetricKind::Pages, MetricKind::Minutes, MetricKind::Steps];
            let mut log = ActivityLog::new();
            for (offset, m, amount) in raw {
                let date = start + chrono::Duration::days(offset);
                log.record(date, metrics[m].clone(), amount).unwrap();
            }
            log
        })
    }

    proptest! {
        #[test]
        fn prop_non_positive_amount_is_noop(
            log in arb_log(),
            offset in 0i64..60,
            amount in -1000.0f64..=0.0,
        ) {
            let mut updated = log.clone();
            let date = day("2024-01-01") + chrono::Duration::days(offset);
            prop_assert!(updated.record(date, MetricKind::Pages, amount).is_err());
            prop_assert_eq!(updated, log);
        }

        #[test]
        fn prop_one_entry_per_day_and_metric(log in arb_log()) {
            let entries = log.entries();
            for pair in entries.windows(2) {
                prop_assert!((pair[0].date, &pair[0].metric) < (pair[1].date, &pair[1].metric));
            }
        }
    }
}
