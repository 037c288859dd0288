//! Core types for the Stride Flux engine
//!
//! This module defines the values that flow between the engine stages:
//! logged activity entries, goal definitions, and the derived streak and
//! progress snapshots handed back to the caller for display or persistence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar date with day granularity (no time of day)
pub type CalendarDate = NaiveDate;

/// Unit of progress being logged
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Pages,
    Minutes,
    Steps,
    Currency,
    Count,
    /// For metrics not covered above (e.g. "pushups")
    #[serde(untagged)]
    Custom(String),
}

impl MetricKind {
    pub fn as_str(&self) -> &str {
        match self {
            MetricKind::Pages => "pages",
            MetricKind::Minutes => "minutes",
            MetricKind::Steps => "steps",
            MetricKind::Currency => "currency",
            MetricKind::Count => "count",
            MetricKind::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MetricKind {
    fn from(s: &str) -> Self {
        match s {
            "pages" => MetricKind::Pages,
            "minutes" => MetricKind::Minutes,
            "steps" => MetricKind::Steps,
            "currency" => MetricKind::Currency,
            "count" => MetricKind::Count,
            other => MetricKind::Custom(other.to_string()),
        }
    }
}

impl FromStr for MetricKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MetricKind::from(s))
    }
}

/// A single day's accumulated amount for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Day the activity happened on
    pub date: CalendarDate,
    /// Unit of the amount
    pub metric: MetricKind,
    /// Accumulated amount (never negative)
    pub amount: f64,
}

/// Consecutive-day streak derived from a log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Length of the run ending today or yesterday, 0 if lapsed
    pub current: u32,
    /// Length of the longest run ever recorded
    pub longest: u32,
    /// Most recent date bearing activity, even when the streak has lapsed
    pub last_activity_date: Option<CalendarDate>,
}

/// Escalation rule set governing how a goal's target grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierFamily {
    /// Week-indexed: x1.0 / x1.2 / x1.5
    Steps,
    /// Week-indexed: x1.0 / x1.5 / x2.0
    Training,
    /// Month-indexed: x1.0 / x1.3 / x1.6 / x2.0
    Standard,
}

impl TierFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierFamily::Steps => "steps",
            TierFamily::Training => "training",
            TierFamily::Standard => "standard",
        }
    }
}

impl fmt::Display for TierFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "steps" => Ok(TierFamily::Steps),
            "training" => Ok(TierFamily::Training),
            "standard" => Ok(TierFamily::Standard),
            _ => Err(format!("Unknown tier family: {}", s)),
        }
    }
}

/// How a goal's numeric target is determined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRule {
    /// Constant target for the whole campaign
    Fixed { target: f64 },
    /// Target that ramps up with elapsed campaign time
    Escalating { base: f64, family: TierFamily },
}

/// Window over which a goal's progress is summed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    /// Just `today`
    #[default]
    Daily,
    /// The campaign week containing `today`
    Weekly,
    /// The campaign month (30-day block) containing `today`
    Monthly,
    /// Campaign start through `today`
    Campaign,
}

/// A goal tracked against one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub id: String,
    pub metric: MetricKind,
    #[serde(default)]
    pub period: GoalPeriod,
    #[serde(rename = "target")]
    pub target_rule: TargetRule,
}

/// Progress of a window's activity against a resolved target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Amount summed over the window
    pub current: f64,
    /// Resolved target for the window
    pub target: f64,
    /// Uncapped `current / target * 100`; 0 when the target is 0
    pub percentage: f64,
}

impl ProgressSnapshot {
    /// Build a snapshot. A zero (or negative) target is valid and yields 0%.
    pub fn new(current: f64, target: f64) -> Self {
        let percentage = if target > 0.0 {
            (current / target) * 100.0
        } else {
            0.0
        };
        Self {
            current,
            target,
            percentage,
        }
    }

    /// Whether the target has been reached. A zero target is never "met".
    pub fn is_met(&self) -> bool {
        self.target > 0.0 && self.current >= self.target
    }

    /// Amount still needed to reach the target
    pub fn remaining(&self) -> f64 {
        (self.target - self.current).max(0.0)
    }

    /// Percentage clamped to 0-100 for display
    pub fn clamped_percentage(&self) -> f64 {
        self.percentage.clamp(0.0, 100.0)
    }
}
