//! FFI bindings for Synheart Motion
//!
//! This module provides C-compatible functions for calling Motion from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `motion_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::{AveragingConfig, DEFAULT_TARGET_LEN};
use crate::pipeline::{average_sessions_with_config, summarize_sessions, MotionProcessor};

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

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Non-positive lengths select the default
fn config_for_target_len(target_len: i32) -> AveragingConfig {
    let target_len = if target_len <= 0 {
        DEFAULT_TARGET_LEN
    } else {
        target_len as usize
    };
    AveragingConfig::default().with_target_len(target_len)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Average a JSON array of session records and return the averaged record JSON.
///
/// `target_len` is the resampled sequence length; zero or a negative value
/// selects the default of 100 samples instead of failing.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `motion_free_string`.
/// - Returns NULL on error; call `motion_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn motion_average_json(json: *const c_char, target_len: i32) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match average_sessions_with_config(&json_str, config_for_target_len(target_len)) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Summarize a JSON array of session records.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `motion_free_string`.
/// - Returns NULL on error; call `motion_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn motion_summary_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match summarize_sessions(&json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a MotionProcessor
pub struct MotionProcessorHandle {
    processor: MotionProcessor,
}

/// Create a new MotionProcessor resampling to `target_len` samples
/// (non-positive selects the default).
///
/// # Safety
/// - Returns a pointer to a newly allocated MotionProcessor.
/// - Must be freed with `motion_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn motion_processor_new(target_len: i32) -> *mut MotionProcessorHandle {
    clear_last_error();

    match MotionProcessor::with_config(config_for_target_len(target_len)) {
        Ok(processor) => Box::into_raw(Box::new(MotionProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a MotionProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `motion_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn motion_processor_free(processor: *mut MotionProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Add one record object or an array of records to the processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `motion_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns the number of records added, or -1 on error.
/// - On error, call `motion_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn motion_processor_push(
    processor: *mut MotionProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.push_json(&json_str) {
        Ok(added) => i32::try_from(added).unwrap_or(i32::MAX),
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Average every record pushed so far and return the payload JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `motion_processor_new`.
/// - Returns a newly allocated string that must be freed with `motion_free_string`.
/// - Returns NULL on error; call `motion_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn motion_processor_average(
    processor: *mut MotionProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.average_to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Motion functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Motion function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn motion_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Motion function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn motion_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Motion library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn motion_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_records_json() -> CString {
        CString::new(
            r#"[
                {"accelerations": [0, 10, 20, 30], "timestamps": [0, 16, 33, 50], "totalTime": 2.0},
                {"accelerations": [0, 20, 40, 60], "timestamps": [0, 20, 40, 60], "totalTime": 4.0}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_average_json() {
        let json = sample_records_json();

        unsafe {
            let result = motion_average_json(json.as_ptr(), 10);
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(value["question"], "Average over 2 samples");
            assert_eq!(value["accelerations"].as_array().unwrap().len(), 10);
            assert_eq!(value["totalTime"], 3.0);

            motion_free_string(result);
        }
    }

    #[test]
    fn test_ffi_default_target_len() {
        let json = sample_records_json();

        unsafe {
            let result = motion_average_json(json.as_ptr(), 0);
            assert!(!result.is_null());

            let value: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(value["timestamps"].as_array().unwrap().len(), DEFAULT_TARGET_LEN);

            motion_free_string(result);
        }
    }

    #[test]
    fn test_ffi_summary_json() {
        let json = sample_records_json();

        unsafe {
            let result = motion_summary_json(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("averageTotalTime"));

            motion_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = motion_processor_new(20);
            assert!(!processor.is_null());

            let json = sample_records_json();
            assert_eq!(motion_processor_push(processor, json.as_ptr()), 2);

            let single = CString::new(r#"{"totalTime": 6.0}"#).unwrap();
            assert_eq!(motion_processor_push(processor, single.as_ptr()), 1);

            let result = motion_processor_average(processor);
            assert!(!result.is_null());

            let payload: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(payload["records_processed"], 3);
            assert_eq!(payload["result"]["totalTime"], 4.0);

            motion_free_string(result);
            motion_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();

            let result = motion_average_json(invalid_json.as_ptr(), 10);
            assert!(result.is_null());

            let error = motion_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_null_pointers() {
        unsafe {
            assert!(motion_average_json(ptr::null(), 10).is_null());
            assert_eq!(motion_processor_push(ptr::null_mut(), ptr::null()), -1);
            assert!(motion_processor_average(ptr::null_mut()).is_null());

            let error_str = CStr::from_ptr(motion_last_error()).to_str().unwrap();
            assert_eq!(error_str, "Null processor pointer");
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = motion_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
