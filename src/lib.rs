//! Stride Flux - Deterministic progress engine for streaks, escalating goals and ledgers
//!
//! Flux derives display state from an append-mostly activity log through a
//! pure pipeline: log → streak derivation → target resolution → windowed
//! progress. The caller owns persistence and supplies "today"; the engine
//! never reads the clock.
//!
//! ## Modules
//!
//! - **Progress Pipeline**: Streaks and goal progress recomputed after every logged contribution
//! - **Ledger**: Spreadsheet-style cascade over allowance sub-accounts and cash figures

pub mod activity_log;
pub mod config;
pub mod error;
pub mod escalation;
pub mod goal;
pub mod ledger;
pub mod pipeline;
pub mod progress;
pub mod schema;
pub mod streak;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use activity_log::ActivityLog;
pub use config::StrideConfig;
pub use error::ComputeError;
pub use escalation::EscalationScheduler;
pub use goal::Campaign;
pub use ledger::{DerivedLedgerCalculator, LedgerInputs, LedgerOutputs};
pub use pipeline::{goal_status, recompute, GoalStatus, ProgressProcessor};
pub use progress::{ProgressAggregator, ProgressWindow};
pub use streak::StreakCalculator;

// Schema exports
pub use schema::{ActivityRecord, RecordAdapter, RECORD_SCHEMA_VERSION};

/// Stride Flux library version
pub const STRIDE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "stride-flux";
