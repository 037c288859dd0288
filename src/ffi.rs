//! FFI bindings for Stride Flux
//!
//! This module provides C-compatible functions for calling Stride from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `stride_free_string`. Dates are ISO
//! `YYYY-MM-DD` strings.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::goal::Campaign;
use crate::pipeline::{ledger_json, recompute_json, ProgressProcessor};
use crate::types::{CalendarDate, GoalDefinition, MetricKind};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Read a C string argument, recording an error naming `what` on failure
unsafe fn read_arg(ptr: *const c_char, what: &str) -> Option<String> {
    if ptr.is_null() {
        set_last_error(&format!("Null {} pointer", what));
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s.to_string()),
        Err(_) => {
            set_last_error(&format!("Invalid UTF-8 in {}", what));
            None
        }
    }
}

/// Read an ISO date argument
unsafe fn read_date(ptr: *const c_char, what: &str) -> Option<CalendarDate> {
    let raw = read_arg(ptr, what)?;
    match CalendarDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            set_last_error(&format!("Invalid {} '{}': {}", what, raw, e));
            None
        }
    }
}

/// Convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Recompute streak and progress from a JSON request.
///
/// The request carries `log`, `goal`, `campaign_start` and `today`; the
/// result is a JSON goal status.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `stride_free_string`.
/// - Returns NULL on error; call `stride_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stride_recompute(request_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(request) = read_arg(request_json, "request") else {
        return ptr::null_mut();
    };

    match recompute_json(&request) {
        Ok(status) => string_to_cstr(&status),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Evaluate the derived ledger figures from JSON inputs.
///
/// # Safety
/// - `inputs_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `stride_free_string`.
/// - Returns NULL on error; call `stride_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stride_ledger(inputs_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(inputs) = read_arg(inputs_json, "inputs") else {
        return ptr::null_mut();
    };

    match ledger_json(&inputs) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Resolve a goal's numeric target on campaign day `elapsed_days`.
///
/// # Safety
/// - `goal_json` must be a valid null-terminated C string.
/// - `out_target` must be a valid pointer to an `f64`.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `stride_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stride_resolve_target(
    goal_json: *const c_char,
    elapsed_days: i64,
    out_target: *mut f64,
) -> i32 {
    clear_last_error();

    if out_target.is_null() {
        set_last_error("Null output pointer");
        return -1;
    }

    let Some(goal_str) = read_arg(goal_json, "goal") else {
        return -1;
    };

    let goal: GoalDefinition = match serde_json::from_str(&goal_str) {
        Ok(goal) => goal,
        Err(e) => {
            set_last_error(&format!("Invalid goal JSON: {}", e));
            return -1;
        }
    };

    match goal.resolve_target(elapsed_days) {
        Ok(target) => {
            *out_target = target;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Stateful Log API
// ============================================================================

/// Opaque handle to a ProgressProcessor
pub struct StrideProcessorHandle {
    processor: ProgressProcessor,
}

/// Create a processor with an empty log for the campaign starting on `campaign_start`.
///
/// # Safety
/// - `campaign_start` must be a valid null-terminated C string.
/// - Must be freed with `stride_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn stride_processor_new(
    campaign_start: *const c_char,
) -> *mut StrideProcessorHandle {
    clear_last_error();

    let Some(start) = read_date(campaign_start, "campaign start") else {
        return ptr::null_mut();
    };

    let processor = ProgressProcessor::new(Campaign::new(start));
    Box::into_raw(Box::new(StrideProcessorHandle { processor }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `stride_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stride_processor_free(processor: *mut StrideProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Log a contribution, accumulating into the day's entry.
///
/// When `overwrite` is non-zero the day's amount is replaced instead.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `stride_processor_new`.
/// - `date` and `metric` must be valid null-terminated C strings.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `stride_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stride_processor_record(
    processor: *mut StrideProcessorHandle,
    date: *const c_char,
    metric: *const c_char,
    amount: f64,
    overwrite: i32,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(date) = read_date(date, "date") else {
        return -1;
    };
    let Some(metric) = read_arg(metric, "metric") else {
        return -1;
    };
    let metric = MetricKind::from(metric.as_str());

    let result = if overwrite != 0 {
        handle.processor.overwrite(date, metric, amount).map(|_| ())
    } else {
        handle.processor.record(date, metric, amount).map(|_| ())
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Recompute a goal against the processor's log.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `stride_processor_new`.
/// - `goal_json` and `today` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `stride_free_string`.
/// - Returns NULL on error; call `stride_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stride_processor_status(
    processor: *mut StrideProcessorHandle,
    goal_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(goal_str) = read_arg(goal_json, "goal") else {
        return ptr::null_mut();
    };
    let Some(today) = read_date(today, "today") else {
        return ptr::null_mut();
    };

    let goal: GoalDefinition = match serde_json::from_str(&goal_str) {
        Ok(goal) => goal,
        Err(e) => {
            set_last_error(&format!("Invalid goal JSON: {}", e));
            return ptr::null_mut();
        }
    };

    let encoded = handle
        .processor
        .status(&goal, today)
        .and_then(|status| serde_json::to_string(&status).map_err(Into::into));

    match encoded {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save the processor's log to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `stride_processor_new`.
/// - Returns a newly allocated string that must be freed with `stride_free_string`.
/// - Returns NULL on error; call `stride_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stride_processor_save_log(
    processor: *mut StrideProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_log() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Replace the processor's log with one loaded from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `stride_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `stride_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stride_processor_load_log(
    processor: *mut StrideProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(json_str) = read_arg(json, "log JSON") else {
        return -1;
    };

    match handle.processor.load_log(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Stride functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Stride function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stride_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Stride function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn stride_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Stride library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn stride_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
