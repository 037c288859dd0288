//! Progress aggregation
//!
//! This module sums activity inside a date window and compares it with a goal's
//! resolved target:
//! - Window selection from the goal period (day, campaign week/month, to date)
//! - Target resolution at the caller-supplied `today`
//! - Per-day history for calendar-style views

use crate::activity_log::ActivityLog;
use crate::error::ComputeError;
use crate::escalation::{DAYS_PER_MONTH, DAYS_PER_WEEK};
use crate::goal::Campaign;
use crate::types::{CalendarDate, GoalDefinition, GoalPeriod, MetricKind, ProgressSnapshot};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inclusive date range over which activity is summed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressWindow {
    pub from: CalendarDate,
    pub to: CalendarDate,
}

impl ProgressWindow {
    pub fn new(from: CalendarDate, to: CalendarDate) -> Self {
        Self { from, to }
    }

    /// Single-day window
    pub fn day(date: CalendarDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of days covered; 0 for an inverted window
    pub fn len_days(&self) -> i64 {
        ((self.to - self.from).num_days() + 1).max(0)
    }
}

/// One day of a goal's history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: CalendarDate,
    pub elapsed_days: i64,
    pub snapshot: ProgressSnapshot,
}

/// Aggregator comparing windowed activity with goal targets
pub struct ProgressAggregator;

impl ProgressAggregator {
    /// Sum `metric` over `window` and compare with an already-resolved `target`
    pub fn snapshot(
        log: &ActivityLog,
        metric: &MetricKind,
        window: ProgressWindow,
        target: f64,
    ) -> ProgressSnapshot {
        let current = log.sum(metric, window.from, window.to);
        ProgressSnapshot::new(current, target)
    }

    /// Window selected by `period` for `today`
    pub fn window_for(
        period: GoalPeriod,
        campaign: &Campaign,
        today: CalendarDate,
    ) -> Result<ProgressWindow, ComputeError> {
        let window = match period {
            GoalPeriod::Daily => ProgressWindow::day(today),
            GoalPeriod::Weekly => {
                let (from, to) = campaign.block_bounds(today, DAYS_PER_WEEK)?;
                ProgressWindow::new(from, to)
            }
            GoalPeriod::Monthly => {
                let (from, to) = campaign.block_bounds(today, DAYS_PER_MONTH)?;
                ProgressWindow::new(from, to)
            }
            GoalPeriod::Campaign => {
                let elapsed = campaign.elapsed_days(today);
                if elapsed < 1 {
                    return Err(ComputeError::PreCampaign(elapsed));
                }
                ProgressWindow::new(campaign.start, today)
            }
        };
        Ok(window)
    }

    /// Progress of `goal` over its own period as seen on `today`
    pub fn snapshot_for_goal(
        log: &ActivityLog,
        goal: &GoalDefinition,
        campaign: &Campaign,
        today: CalendarDate,
    ) -> Result<(ProgressWindow, ProgressSnapshot), ComputeError> {
        let window = Self::window_for(goal.period, campaign, today)?;
        let snapshot = Self::snapshot_in_window(log, goal, campaign, window, today)?;
        Ok((window, snapshot))
    }

    /// Progress of `goal` over an explicit window, target resolved at `today`
    pub fn snapshot_in_window(
        log: &ActivityLog,
        goal: &GoalDefinition,
        campaign: &Campaign,
        window: ProgressWindow,
        today: CalendarDate,
    ) -> Result<ProgressSnapshot, ComputeError> {
        let elapsed = campaign.elapsed_days(today);
        let target = goal.resolve_target(elapsed)?;
        let snapshot = Self::snapshot(log, &goal.metric, window, target);
        debug!(
            goal = %goal.id,
            elapsed,
            from = %window.from,
            to = %window.to,
            current = snapshot.current,
            target = snapshot.target,
            "computed progress"
        );
        Ok(snapshot)
    }

    /// Day-by-day progress of `goal` over `[from, to]`, each day against its own target.
    ///
    /// Days before the campaign start are skipped.
    pub fn daily_history(
        log: &ActivityLog,
        goal: &GoalDefinition,
        campaign: &Campaign,
        from: CalendarDate,
        to: CalendarDate,
    ) -> Result<Vec<DailyProgress>, ComputeError> {
        let mut history = Vec::new();
        let mut date = from.max(campaign.start);
        while date <= to {
            let elapsed_days = campaign.elapsed_days(date);
            let target = goal.resolve_target(elapsed_days)?;
            history.push(DailyProgress {
                date,
                elapsed_days,
                snapshot: Self::snapshot(log, &goal.metric, ProgressWindow::day(date), target),
            });
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(history)
    }

    /// Window covering `today` and the `days_back` days before it
    pub fn history_window(
        today: CalendarDate,
        days_back: u32,
    ) -> Result<ProgressWindow, ComputeError> {
        let from = today
            .checked_sub_signed(Duration::days(i64::from(days_back)))
            .ok_or_else(|| {
                ComputeError::DateOutOfRange(format!("{} days before {}", days_back, today))
            })?;
        Ok(ProgressWindow::new(from, today))
    }
}
