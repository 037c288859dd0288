//! Adapter for applying stride.activity_record.v1 records to an activity log

use crate::activity_log::ActivityLog;
use crate::error::ComputeError;
use crate::schema::record::*;
use serde::Serialize;
use tracing::{debug, warn};

/// Adapter for parsing, validating and applying activity records
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<ActivityRecord>, ComputeError> {
        let records: Vec<ActivityRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ActivityRecord>, ComputeError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ActivityRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[ActivityRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    record_id: record.record_id.clone(),
                    error,
                })
            })
            .collect()
    }

    /// Apply records to `log` in order.
    ///
    /// Invalid records, and records naming a different item than the log, are
    /// skipped and reported; they never abort the batch or touch the log.
    pub fn apply(log: &mut ActivityLog, records: &[ActivityRecord]) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (idx, record) in records.iter().enumerate() {
            if let Err(error) = Self::check(log, record) {
                warn!(index = idx, %error, "skipping activity record");
                report.rejected.push(ValidationResult {
                    index: idx,
                    record_id: record.record_id.clone(),
                    error,
                });
                continue;
            }

            let applied = match record.mode {
                RecordMode::Accumulate => log
                    .record(record.date, record.metric.clone(), record.amount)
                    .map(|_| ()),
                RecordMode::Overwrite => log
                    .overwrite(record.date, record.metric.clone(), record.amount)
                    .map(|_| ()),
            };

            // Amounts were validated above, so the log cannot refuse them.
            if applied.is_ok() {
                report.applied += 1;
            }
        }

        debug!(
            applied = report.applied,
            rejected = report.rejected.len(),
            "applied activity records"
        );
        report
    }

    fn check(log: &ActivityLog, record: &ActivityRecord) -> Result<(), ValidationError> {
        record.validate()?;
        if let (Some(record_item), Some(log_item)) = (record.item_id.as_deref(), log.item_id()) {
            if record_item != log_item {
                return Err(ValidationError::ItemMismatch {
                    record_item: record_item.to_string(),
                    log_item: log_item.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub record_id: Option<String>,
    pub error: ValidationError,
}

/// Outcome of [`RecordAdapter::apply`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: usize,
    pub rejected: Vec<ValidationResult>,
}

/// Serializable summary of an [`ApplyReport`]
#[derive(Debug, Clone, Serialize)]
pub struct ApplySummary {
    pub applied: usize,
    pub rejected: usize,
    pub errors: Vec<String>,
}

impl From<&ApplyReport> for ApplySummary {
    fn from(report: &ApplyReport) -> Self {
        Self {
            applied: report.applied,
            rejected: report.rejected.len(),
            errors: report
                .rejected
                .iter()
                .map(|r| format!("record {}: {}", r.index, r.error))
                .collect(),
        }
    }
}
