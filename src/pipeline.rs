//! Recompute orchestration
//!
//! This module provides the public API for Stride Flux. After every logged
//! contribution the caller recomputes derived state from the log it owns:
//! log → streak derivation → target resolution → windowed progress.

use crate::activity_log::ActivityLog;
use crate::error::ComputeError;
use crate::goal::Campaign;
use crate::ledger::{CashPosition, DerivedLedgerCalculator, LedgerInputs, LedgerOutputs};
use crate::progress::{ProgressAggregator, ProgressWindow};
use crate::schema::{ActivityRecord, ApplyReport, RecordAdapter};
use crate::streak::StreakCalculator;
use crate::types::{CalendarDate, GoalDefinition, MetricKind, ProgressSnapshot, StreakState};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Recompute the streak and progress of `goal` as seen on `today`.
///
/// The streak only counts days bearing the goal's metric.
///
/// # Example
/// ```ignore
/// let (streak, progress) = recompute(&log, &goal, &campaign, today)?;
/// ```
pub fn recompute(
    log: &ActivityLog,
    goal: &GoalDefinition,
    campaign: &Campaign,
    today: CalendarDate,
) -> Result<(StreakState, ProgressSnapshot), ComputeError> {
    let status = goal_status(log, goal, campaign, today)?;
    Ok((status.streak, status.progress))
}

/// Full derived state of one goal on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalStatus {
    pub goal_id: String,
    pub metric: MetricKind,
    pub today: CalendarDate,
    /// 1-based campaign day of `today`
    pub elapsed_days: i64,
    pub window: ProgressWindow,
    pub streak: StreakState,
    pub progress: ProgressSnapshot,
}

/// Recompute `goal` and keep the window and campaign day alongside the result
pub fn goal_status(
    log: &ActivityLog,
    goal: &GoalDefinition,
    campaign: &Campaign,
    today: CalendarDate,
) -> Result<GoalStatus, ComputeError> {
    // Stage 1: Streak over the goal's metric
    let streak = StreakCalculator::compute_for_log(log, Some(&goal.metric), today);

    // Stage 2: Window selection, target resolution, aggregation
    let (window, progress) = ProgressAggregator::snapshot_for_goal(log, goal, campaign, today)?;

    debug!(
        goal = %goal.id,
        %today,
        current_streak = streak.current,
        percentage = progress.percentage,
        "recomputed goal status"
    );

    Ok(GoalStatus {
        goal_id: goal.id.clone(),
        metric: goal.metric.clone(),
        today,
        elapsed_days: campaign.elapsed_days(today),
        window,
        streak,
        progress,
    })
}

/// JSON request accepted by [`recompute_json`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeRequest {
    pub log: ActivityLog,
    pub goal: GoalDefinition,
    pub campaign_start: CalendarDate,
    pub today: CalendarDate,
}

/// Recompute from a JSON [`RecomputeRequest`] and return a JSON [`GoalStatus`]
pub fn recompute_json(request_json: &str) -> Result<String, ComputeError> {
    let request: RecomputeRequest = serde_json::from_str(request_json)?;
    let campaign = Campaign::new(request.campaign_start);
    let status = goal_status(&request.log, &request.goal, &campaign, request.today)?;
    serde_json::to_string(&status).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

/// Ledger figures together with the discrepancy direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    #[serde(flatten)]
    pub outputs: LedgerOutputs,
    pub position: CashPosition,
}

impl From<LedgerOutputs> for LedgerReport {
    fn from(outputs: LedgerOutputs) -> Self {
        Self {
            position: outputs.position(),
            outputs,
        }
    }
}

/// Evaluate JSON [`LedgerInputs`] and return a JSON [`LedgerReport`]
pub fn ledger_json(inputs_json: &str) -> Result<String, ComputeError> {
    let inputs: LedgerInputs = serde_json::from_str(inputs_json)?;
    let report = LedgerReport::from(DerivedLedgerCalculator::compute(&inputs));
    serde_json::to_string(&report).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

/// Stateful processor owning one tracked item's log.
///
/// Use this when the caller wants to log and recompute repeatedly against the
/// same campaign. Calls must be serialized by the caller.
pub struct ProgressProcessor {
    log: ActivityLog,
    campaign: Campaign,
}

impl ProgressProcessor {
    /// Create a processor with an empty log
    pub fn new(campaign: Campaign) -> Self {
        Self::with_log(campaign, ActivityLog::new())
    }

    /// Create a processor around an existing log
    pub fn with_log(campaign: Campaign, log: ActivityLog) -> Self {
        Self { log, campaign }
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    /// Accumulate a contribution; returns the day's new total
    pub fn record(
        &mut self,
        date: CalendarDate,
        metric: MetricKind,
        amount: f64,
    ) -> Result<f64, ComputeError> {
        self.log.record(date, metric, amount)
    }

    /// Replace the day's amount; returns the previous amount, if any
    pub fn overwrite(
        &mut self,
        date: CalendarDate,
        metric: MetricKind,
        amount: f64,
    ) -> Result<Option<f64>, ComputeError> {
        self.log.overwrite(date, metric, amount)
    }

    /// Apply a batch of schema records
    pub fn apply_records(&mut self, records: &[ActivityRecord]) -> ApplyReport {
        RecordAdapter::apply(&mut self.log, records)
    }

    /// Derived state of `goal` on `today`
    pub fn status(
        &self,
        goal: &GoalDefinition,
        today: CalendarDate,
    ) -> Result<GoalStatus, ComputeError> {
        goal_status(&self.log, goal, &self.campaign, today)
    }

    /// Derived state of several goals on `today`
    pub fn statuses(
        &self,
        goals: &[GoalDefinition],
        today: CalendarDate,
    ) -> Result<Vec<GoalStatus>, ComputeError> {
        goals.iter().map(|goal| self.status(goal, today)).collect()
    }

    /// Streak across all metrics, or one metric only
    pub fn streak(&self, metric: Option<&MetricKind>, today: CalendarDate) -> StreakState {
        StreakCalculator::compute_for_log(&self.log, metric, today)
    }

    /// Load log state from JSON
    pub fn load_log(&mut self, json: &str) -> Result<(), ComputeError> {
        self.log =
            ActivityLog::from_json(json).map_err(|e| ComputeError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Save log state to JSON
    pub fn save_log(&self) -> Result<String, ComputeError> {
        self.log
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GoalPeriod, TierFamily};
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn day(s: &str) -> CalendarDate {
        CalendarDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn reading_log() -> ActivityLog {
        let mut log = ActivityLog::for_item("book-1");
        for (d, pages) in [
            ("2024-01-01", 10.0),
            ("2024-01-02", 15.0),
            ("2024-01-05", 8.0),
            ("2024-01-06", 12.0),
        ] {
            log.record(day(d), MetricKind::Pages, pages).unwrap();
        }
        log.record(day("2024-01-03"), MetricKind::Minutes, 30.0).unwrap();
        log
    }

    #[test]
    fn test_recompute() {
        let log = reading_log();
        let goal = GoalDefinition::fixed("read", MetricKind::Pages, 20.0);
        let campaign = Campaign::new(day("2024-01-01"));

        let (streak, progress) = recompute(&log, &goal, &campaign, day("2024-01-06")).unwrap();

        assert_eq!(
            streak,
            StreakState {
                current: 2,
                longest: 2,
                last_activity_date: Some(day("2024-01-06")),
            }
        );
        assert_eq!(progress, ProgressSnapshot::new(12.0, 20.0));
    }

    #[test]
    fn test_goal_status_fields() {
        let log = reading_log();
        let goal = GoalDefinition::fixed("read", MetricKind::Pages, 50.0)
            .with_period(GoalPeriod::Campaign);
        let campaign = Campaign::new(day("2024-01-01"));

        let status = goal_status(&log, &goal, &campaign, day("2024-01-08")).unwrap();

        assert_eq!(status.elapsed_days, 8);
        assert_eq!(status.window, ProgressWindow::new(day("2024-01-01"), day("2024-01-08")));
        assert_eq!(status.progress.current, 45.0);
        assert_eq!(status.streak.current, 0);
        assert_eq!(status.streak.last_activity_date, Some(day("2024-01-06")));
    }

    #[test]
    fn test_recompute_pre_campaign() {
        let log = reading_log();
        let goal = GoalDefinition::fixed("read", MetricKind::Pages, 20.0);
        let campaign = Campaign::new(day("2024-02-01"));

        let result = recompute(&log, &goal, &campaign, day("2024-01-06"));
        assert!(matches!(result, Err(ComputeError::PreCampaign(_))));
    }

    #[test]
    fn test_recompute_json() {
        let request = RecomputeRequest {
            log: reading_log(),
            goal: GoalDefinition::escalating("walk", MetricKind::Pages, 10.0, TierFamily::Training),
            campaign_start: day("2024-01-01"),
            today: day("2024-01-06"),
        };
        let json = serde_json::to_string(&request).unwrap();

        let output = recompute_json(&json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["goal_id"], "walk");
        assert_eq!(value["streak"]["current"], 2);
        assert_eq!(value["streak"]["last_activity_date"], "2024-01-06");
        assert_eq!(value["progress"]["target"], 10.0);
        let percentage = value["progress"]["percentage"].as_f64().unwrap();
        assert!((percentage - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_recompute_json_invalid() {
        assert!(recompute_json("not json").is_err());
    }

    #[test]
    fn test_ledger_json() {
        let inputs = r#"{
            "accounts": [{"allowance": 50, "debt": 10}, {"allowance": 30, "debt": 0}],
            "line_items": [{"amount": 20}],
            "bank": 40,
            "cash": 15
        }"#;

        let output = ledger_json(inputs).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["expected_cash"], 10.0);
        assert_eq!(value["cash_discrepancy"], -5.0);
        assert_eq!(value["official_cash_figure"], 40.0);
        assert_eq!(value["position"], "surplus");
    }

    #[test]
    fn test_processor_round_trip() {
        let campaign = Campaign::new(day("2024-01-01"));
        let goal = GoalDefinition::escalating("walk", MetricKind::Steps, 10000.0, TierFamily::Steps);
        let mut processor = ProgressProcessor::new(campaign);

        processor.record(day("2024-01-28"), MetricKind::Steps, 9000.0).unwrap();
        processor.record(day("2024-01-29"), MetricKind::Steps, 6000.0).unwrap();
        processor.record(day("2024-01-29"), MetricKind::Steps, 6000.0).unwrap();
        assert!(processor.record(day("2024-01-29"), MetricKind::Steps, 0.0).is_err());

        let status = processor.status(&goal, day("2024-01-29")).unwrap();
        assert_eq!(status.progress.current, 12000.0);
        assert_eq!(status.progress.target, 12000.0);
        assert!(status.progress.is_met());
        assert_eq!(status.streak.current, 2);

        let saved = processor.save_log().unwrap();
        let mut restored = ProgressProcessor::new(campaign);
        restored.load_log(&saved).unwrap();

        assert_eq!(restored.status(&goal, day("2024-01-29")).unwrap(), status);
    }

    #[test]
    fn test_processor_statuses_and_records() {
        let campaign = Campaign::new(day("2024-01-01"));
        let mut processor = ProgressProcessor::new(campaign);
        let records = vec![
            ActivityRecord::new(day("2024-01-02"), MetricKind::Pages, 20.0),
            ActivityRecord::overwrite(day("2024-01-02"), MetricKind::Minutes, 45.0),
        ];

        let report = processor.apply_records(&records);
        assert_eq!(report.applied, 2);

        let goals = vec![
            GoalDefinition::fixed("read", MetricKind::Pages, 40.0),
            GoalDefinition::fixed("listen", MetricKind::Minutes, 30.0),
        ];
        let statuses = processor.statuses(&goals, day("2024-01-02")).unwrap();

        assert_eq!(statuses.len(), 2);
        assert!((statuses[0].progress.percentage - 50.0).abs() < 1e-9);
        assert!((statuses[1].progress.percentage - 150.0).abs() < 1e-9);
        assert_eq!(processor.streak(None, day("2024-01-03")).current, 1);
    }

    #[test]
    fn test_processor_load_invalid_log() {
        let mut processor = ProgressProcessor::new(Campaign::new(day("2024-01-01")));
        assert!(matches!(
            processor.load_log("{\"entries\": 5}"),
            Err(ComputeError::ParseError(_))
        ));
    }

    #[test]
    fn test_saved_log_reproduces_exact_amounts() {
        let start = day("2024-01-01");
        let mut log = ActivityLog::new();
        log.record(start, MetricKind::Pages, 391.27321946245587).unwrap();
        let goal = GoalDefinition::fixed("read", MetricKind::Pages, 33.0);
        let campaign = Campaign::new(start);

        let restored = ActivityLog::from_json(&log.to_json().unwrap()).unwrap();

        assert_eq!(
            restored.amount_on(start, &MetricKind::Pages),
            Some(391.27321946245587)
        );
        assert_eq!(
            recompute(&log, &goal, &campaign, start).unwrap(),
            recompute(&restored, &goal, &campaign, start).unwrap()
        );
    }

    proptest! {
        #[test]
        fn prop_serialization_preserves_derived_state(
            raw in prop::collection::vec((0i64..45, 0usize..2, 0.5f64..400.0), 0..40),
            today_offset in 0i64..50,
        ) {
            let start = day("2024-01-01");
            let metrics = [MetricKind::Pages, MetricKind::Minutes];
            let mut log = ActivityLog::new();
            for (offset, m, amount) in raw {
                log.record(start + Duration::days(offset), metrics[m].clone(), amount).unwrap();
            }
            let goal = GoalDefinition::escalating("read", MetricKind::Pages, 25.0, TierFamily::Standard)
                .with_period(GoalPeriod::Weekly);
            let campaign = Campaign::new(start);
            let today = start + Duration::days(today_offset);

            let restored = ActivityLog::from_json(&log.to_json().unwrap()).unwrap();

            prop_assert_eq!(
                recompute(&log, &goal, &campaign, today).unwrap(),
                recompute(&restored, &goal, &campaign, today).unwrap()
            );
        }
    }
}
