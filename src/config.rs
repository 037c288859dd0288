//! Goal configuration
//!
//! Goals and the campaign start date are declared in a TOML file:
//!
//! ```toml
//! campaign_start = "2024-01-01"
//!
//! [[goals]]
//! id = "daily-steps"
//! metric = "steps"
//! target = { escalating = { base = 10000, family = "steps" } }
//!
//! [[goals]]
//! id = "reading"
//! metric = "pages"
//! period = "weekly"
//! target = { fixed = { target = 150 } }
//! ```

use crate::error::ComputeError;
use crate::goal::Campaign;
use crate::types::{CalendarDate, GoalDefinition, TargetRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Engine configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrideConfig {
    /// Day 1 of the campaign
    pub campaign_start: CalendarDate,
    #[serde(default)]
    pub goals: Vec<GoalDefinition>,
}

impl StrideConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ComputeError> {
        let config: StrideConfig =
            toml::from_str(toml_str).map_err(|e| ComputeError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ComputeError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn campaign(&self) -> Campaign {
        Campaign::new(self.campaign_start)
    }

    /// Look up a goal by id
    pub fn goal(&self, id: &str) -> Result<&GoalDefinition, ComputeError> {
        self.goals
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| ComputeError::UnknownGoal(id.to_string()))
    }

    /// Reject duplicate ids and unusable target figures
    pub fn validate(&self) -> Result<(), ComputeError> {
        let mut seen = HashSet::new();
        for goal in &self.goals {
            if goal.id.trim().is_empty() {
                return Err(ComputeError::ConfigError("goal id must not be empty".to_string()));
            }
            if !seen.insert(goal.id.as_str()) {
                return Err(ComputeError::ConfigError(format!(
                    "duplicate goal id: {}",
                    goal.id
                )));
            }
            let figure = match goal.target_rule {
                TargetRule::Fixed { target } => target,
                TargetRule::Escalating { base, .. } => base,
            };
            if !figure.is_finite() || figure < 0.0 {
                return Err(ComputeError::ConfigError(format!(
                    "goal {} has invalid target figure {}",
                    goal.id, figure
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GoalPeriod, MetricKind, TierFamily};
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
campaign_start = "2024-01-01"

[[goals]]
id = "daily-steps"
metric = "steps"
target = { escalating = { base = 10000, family = "steps" } }

[[goals]]
id = "reading"
metric = "pages"
period = "weekly"
target = { fixed = { target = 150 } }
"#;

    #[test]
    fn test_parse_config() {
        let config = StrideConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.goals.len(), 2);
        assert_eq!(
            config.goal("daily-steps").unwrap(),
            &GoalDefinition::escalating("daily-steps", MetricKind::Steps, 10000.0, TierFamily::Steps)
        );
        let reading = config.goal("reading").unwrap();
        assert_eq!(reading.period, GoalPeriod::Weekly);
        assert_eq!(reading.target_rule, TargetRule::Fixed { target: 150.0 });
        assert_eq!(
            config.campaign().start,
            CalendarDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_unknown_goal() {
        let config = StrideConfig::from_toml_str(SAMPLE).unwrap();
        assert!(matches!(config.goal("nope"), Err(ComputeError::UnknownGoal(_))));
    }

    #[test]
    fn test_duplicate_goal_rejected() {
        let toml_str = r#"
campaign_start = "2024-01-01"

[[goals]]
id = "a"
metric = "pages"
target = { fixed = { target = 1 } }

[[goals]]
id = "a"
metric = "minutes"
target = { fixed = { target = 2 } }
"#;
        assert!(matches!(
            StrideConfig::from_toml_str(toml_str),
            Err(ComputeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_negative_base_rejected() {
        let toml_str = r#"
campaign_start = "2024-01-01"

[[goals]]
id = "a"
metric = "steps"
target = { escalating = { base = -5, family = "training" } }
"#;
        assert!(StrideConfig::from_toml_str(toml_str).is_err());
    }
}
