//! Streak derivation
//!
//! This module turns the set of dates bearing activity into consecutive-day
//! streaks. Only distinct calendar days count; two entries on the same day do
//! not lengthen a run.

use crate::activity_log::ActivityLog;
use crate::types::{CalendarDate, MetricKind, StreakState};
use tracing::debug;

/// Calculator for current and longest streaks
pub struct StreakCalculator;

impl StreakCalculator {
    /// Compute the streak state for ascending `dates` as seen on `today`.
    ///
    /// The current streak is the run containing the latest date, counted only
    /// when that date is `today` or the day before. `last_activity_date` is
    /// reported regardless so a lapsed streak still carries its history.
    pub fn compute(dates: &[CalendarDate], today: CalendarDate) -> StreakState {
        debug_assert!(dates.windows(2).all(|w| w[0] <= w[1]), "dates must be sorted");

        let (first, last) = match (dates.first(), dates.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return StreakState::default(),
        };

        let mut longest = 1u32;
        let mut run = 1u32;
        let mut prev = first;

        for &date in &dates[1..] {
            match (date - prev).num_days() {
                0 => continue,
                1 => run += 1,
                _ => run = 1,
            }
            longest = longest.max(run);
            prev = date;
        }

        let days_since_last = (today - last).num_days();
        let current = if (0..=1).contains(&days_since_last) {
            run
        } else {
            0
        };

        StreakState {
            current,
            longest,
            last_activity_date: Some(last),
        }
    }

    /// Compute the streak for a log, optionally restricted to one metric
    pub fn compute_for_log(
        log: &ActivityLog,
        metric: Option<&MetricKind>,
        today: CalendarDate,
    ) -> StreakState {
        let dates = log.all_dates(metric);
        let state = Self::compute(&dates, today);
        debug!(
            %today,
            current = state.current,
            longest = state.longest,
            active_days = dates.len(),
            "computed streak"
        );
        state
    }
}
