//! stride.activity_record.v1 schema
//!
//! This module defines the input record a caller submits when logging
//! progress, and the adapter that validates records and applies them to an
//! activity log. Records can arrive one per line (NDJSON) or as a JSON array.

mod adapter;
mod record;

pub use adapter::*;
pub use record::*;
