//! Goal model and campaign calendar
//!
//! A goal pairs a metric with a target rule. Fixed targets are constant;
//! escalating targets are resolved through the [`EscalationScheduler`] from the
//! number of days elapsed since the campaign start.

use crate::error::ComputeError;
use crate::escalation::{EscalationScheduler, DAYS_PER_MONTH, DAYS_PER_WEEK};
use crate::types::{CalendarDate, GoalDefinition, GoalPeriod, MetricKind, TargetRule, TierFamily};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

impl GoalDefinition {
    pub fn new(
        id: impl Into<String>,
        metric: MetricKind,
        period: GoalPeriod,
        target_rule: TargetRule,
    ) -> Self {
        Self {
            id: id.into(),
            metric,
            period,
            target_rule,
        }
    }

    /// Daily goal with a constant target
    pub fn fixed(id: impl Into<String>, metric: MetricKind, target: f64) -> Self {
        Self::new(id, metric, GoalPeriod::Daily, TargetRule::Fixed { target })
    }

    /// Daily goal whose target ramps up over the campaign
    pub fn escalating(
        id: impl Into<String>,
        metric: MetricKind,
        base: f64,
        family: TierFamily,
    ) -> Self {
        Self::new(
            id,
            metric,
            GoalPeriod::Daily,
            TargetRule::Escalating { base, family },
        )
    }

    pub fn with_period(mut self, period: GoalPeriod) -> Self {
        self.period = period;
        self
    }

    /// Resolve the numeric target on campaign day `elapsed_days` (day 1 = start).
    ///
    /// Days before the campaign are undefined for every rule and yield
    /// [`ComputeError::PreCampaign`].
    pub fn resolve_target(&self, elapsed_days: i64) -> Result<f64, ComputeError> {
        if elapsed_days < 1 {
            warn!(goal = %self.id, elapsed_days, "target requested before campaign start");
            return Err(ComputeError::PreCampaign(elapsed_days));
        }
        match self.target_rule {
            TargetRule::Fixed { target } => Ok(target),
            TargetRule::Escalating { base, family } => {
                EscalationScheduler::resolve(family, base, elapsed_days)
            }
        }
    }
}

/// Fixed-start period over which escalating goals ramp up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Day 1 of the campaign
    pub start: CalendarDate,
}

impl Campaign {
    pub fn new(start: CalendarDate) -> Self {
        Self { start }
    }

    /// 1-based day number of `today`; 0 or negative before the start
    pub fn elapsed_days(&self, today: CalendarDate) -> i64 {
        (today - self.start).num_days() + 1
    }

    /// Whether `today` falls on or after the campaign start
    pub fn contains(&self, today: CalendarDate) -> bool {
        self.elapsed_days(today) >= 1
    }

    /// 1-based campaign week containing `today`
    pub fn week(&self, today: CalendarDate) -> Result<u32, ComputeError> {
        self.period_of(today, DAYS_PER_WEEK)
    }

    /// 1-based campaign month (30-day block) containing `today`
    pub fn month(&self, today: CalendarDate) -> Result<u32, ComputeError> {
        self.period_of(today, DAYS_PER_MONTH)
    }

    /// First and last date of the `length`-day block containing `today`
    pub(crate) fn block_bounds(
        &self,
        today: CalendarDate,
        length: i64,
    ) -> Result<(CalendarDate, CalendarDate), ComputeError> {
        let index = i64::from(self.period_of(today, length)?);
        let from = self.start.checked_add_signed(Duration::days((index - 1) * length));
        let to = from.and_then(|from| from.checked_add_signed(Duration::days(length - 1)));
        match (from, to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(ComputeError::DateOutOfRange(format!(
                "{}-day block containing {}",
                length, today
            ))),
        }
    }

    fn period_of(&self, today: CalendarDate, length: i64) -> Result<u32, ComputeError> {
        let elapsed = self.elapsed_days(today);
        if elapsed < 1 {
            return Err(ComputeError::PreCampaign(elapsed));
        }
        let period = (elapsed + length - 1) / length;
        Ok(u32::try_from(period).unwrap_or(u32::MAX))
    }
}
