//! Escalating goal targets
//!
//! This module resolves the numeric target of an escalating goal for a given
//! elapsed campaign day. Each tier family scales a base figure by a multiplier
//! chosen from a week-indexed or month-indexed tier table, so the same base
//! yields a harder target the longer the campaign runs.

use crate::error::ComputeError;
use crate::types::TierFamily;
use serde::Serialize;

/// Days per week-indexed period
pub const DAYS_PER_WEEK: i64 = 7;

/// Days per month-indexed period (campaign months are fixed 30-day blocks)
pub const DAYS_PER_MONTH: i64 = 30;

/// Period used to index a tier table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBase {
    Week,
    Month,
}

impl TimeBase {
    pub fn length_days(&self) -> i64 {
        match self {
            TimeBase::Week => DAYS_PER_WEEK,
            TimeBase::Month => DAYS_PER_MONTH,
        }
    }
}

/// One band of a tier table, in effect from `from_period` onwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tier {
    /// First 1-based week or month the multiplier applies to
    pub from_period: u32,
    pub multiplier: f64,
}

const STEPS_TIERS: &[Tier] = &[
    Tier { from_period: 1, multiplier: 1.0 },
    Tier { from_period: 5, multiplier: 1.2 },
    Tier { from_period: 9, multiplier: 1.5 },
];

const TRAINING_TIERS: &[Tier] = &[
    Tier { from_period: 1, multiplier: 1.0 },
    Tier { from_period: 5, multiplier: 1.5 },
    Tier { from_period: 13, multiplier: 2.0 },
];

// Months 3 and 4 share a plateau distinct from months 5+.
const STANDARD_TIERS: &[Tier] = &[
    Tier { from_period: 1, multiplier: 1.0 },
    Tier { from_period: 2, multiplier: 1.3 },
    Tier { from_period: 3, multiplier: 1.6 },
    Tier { from_period: 5, multiplier: 2.0 },
];

/// Scheduler mapping elapsed campaign days to escalated targets
pub struct EscalationScheduler;

impl EscalationScheduler {
    /// Resolve the target for `base` on campaign day `elapsed_days` (day 1 = start).
    ///
    /// The result is `base * multiplier` rounded to the nearest integer, halves up.
    pub fn resolve(family: TierFamily, base: f64, elapsed_days: i64) -> Result<f64, ComputeError> {
        let multiplier = Self::multiplier(family, elapsed_days)?;
        Ok(round_half_up(base * multiplier))
    }

    /// Multiplier in effect for `family` on campaign day `elapsed_days`
    pub fn multiplier(family: TierFamily, elapsed_days: i64) -> Result<f64, ComputeError> {
        let period = Self::period_index(family, elapsed_days)?;
        let multiplier = Self::tiers(family)
            .iter()
            .rev()
            .find(|tier| tier.from_period <= period)
            .map_or(1.0, |tier| tier.multiplier);
        Ok(multiplier)
    }

    /// 1-based week or month containing campaign day `elapsed_days`
    pub fn period_index(family: TierFamily, elapsed_days: i64) -> Result<u32, ComputeError> {
        if elapsed_days < 1 {
            return Err(ComputeError::PreCampaign(elapsed_days));
        }
        let length = Self::time_base(family).length_days();
        let period = (elapsed_days + length - 1) / length;
        Ok(u32::try_from(period).unwrap_or(u32::MAX))
    }

    pub fn time_base(family: TierFamily) -> TimeBase {
        match family {
            TierFamily::Steps | TierFamily::Training => TimeBase::Week,
            TierFamily::Standard => TimeBase::Month,
        }
    }

    pub fn tiers(family: TierFamily) -> &'static [Tier] {
        match family {
            TierFamily::Steps => STEPS_TIERS,
            TierFamily::Training => TRAINING_TIERS,
            TierFamily::Standard => STANDARD_TIERS,
        }
    }
}

fn round_half_up(value: f64) -> f64 {
    // `value - floor` is exact, unlike `value + 0.5`
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}
