//! stride.activity_record.v1 record definition

use crate::error::ComputeError;
use crate::types::{CalendarDate, MetricKind};
use serde::{Deserialize, Serialize};

/// Current schema version
pub const RECORD_SCHEMA_VERSION: &str = "stride.activity_record.v1";

/// How a record combines with an existing same-day entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Add to the day's existing amount
    #[default]
    Accumulate,
    /// Replace the day's amount
    Overwrite,
}

/// A single logged contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Schema version (must be "stride.activity_record.v1")
    pub schema_version: String,
    /// Unique record identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Tracked item the record belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Day the activity happened on
    pub date: CalendarDate,
    pub metric: MetricKind,
    pub amount: f64,
    #[serde(default)]
    pub mode: RecordMode,
}

impl ActivityRecord {
    /// Create an accumulating record
    pub fn new(date: CalendarDate, metric: MetricKind, amount: f64) -> Self {
        ActivityRecord {
            schema_version: RECORD_SCHEMA_VERSION.to_string(),
            record_id: Some(uuid::Uuid::new_v4().to_string()),
            item_id: None,
            date,
            metric,
            amount,
            mode: RecordMode::Accumulate,
        }
    }

    /// Create a record that replaces the day's amount
    pub fn overwrite(date: CalendarDate, metric: MetricKind, amount: f64) -> Self {
        ActivityRecord {
            mode: RecordMode::Overwrite,
            ..Self::new(date, metric, amount)
        }
    }

    /// Attach the tracked item id
    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Validate the record schema and amount
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != RECORD_SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: RECORD_SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount {
                amount: self.amount,
            });
        }

        Ok(())
    }
}

/// Validation errors for activity records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Amount must be positive and finite, got {amount}")]
    NonPositiveAmount { amount: f64 },

    #[error("Record belongs to item {record_item} but the log tracks {log_item}")]
    ItemMismatch {
        record_item: String,
        log_item: String,
    },
}

impl From<ValidationError> for ComputeError {
    fn from(e: ValidationError) -> Self {
        ComputeError::InvalidRecord(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> CalendarDate {
        CalendarDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_serialize_record() {
        let record = ActivityRecord::new(day("2024-01-15"), MetricKind::Pages, 12.0)
            .with_item_id("book-1");
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("stride.activity_record.v1"));
        assert!(json.contains("\"2024-01-15\""));
        assert!(json.contains("\"pages\""));
        assert!(json.contains("\"accumulate\""));
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "schema_version": "stride.activity_record.v1",
            "date": "2024-01-15",
            "metric": "minutes",
            "amount": 25
        }"#;
        let record: ActivityRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.mode, RecordMode::Accumulate);
        assert_eq!(record.metric, MetricKind::Minutes);
        assert!(record.record_id.is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_schema_version() {
        let mut record = ActivityRecord::new(day("2024-01-15"), MetricKind::Steps, 100.0);
        record.schema_version = "stride.activity_record.v0".to_string();

        assert!(matches!(
            record.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_validate_amount() {
        let record = ActivityRecord::new(day("2024-01-15"), MetricKind::Steps, 0.0);
        assert!(matches!(
            record.validate(),
            Err(ValidationError::NonPositiveAmount { .. })
        ));

        let record = ActivityRecord::overwrite(day("2024-01-15"), MetricKind::Steps, -3.0);
        let err = ComputeError::from(record.validate().unwrap_err());
        assert!(matches!(err, ComputeError::InvalidRecord(_)));
    }
}
