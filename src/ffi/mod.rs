//! Native engine interface (C ABI)
//!
//! The raw surface the binding layer is written against: status codes as
//! `c_int`, keys and values as `(pointer, length)` pairs, and scans driven by
//! an `extern "C"` callback plus an opaque context pointer.
//!
//! ## Callback Contract
//! ```text
//! engine ── kv_get_kv_cb(key, kb, value, vb, arg) ──► caller
//!        ◄──────────── 0 = continue, nonzero = stop ──
//! ```
//! Key and value pointers are valid only until the callback returns. A scan
//! stopped by its callback returns `KV_STATUS_STOPPED_BY_CB`.
//!
//! # Safety
//!
//! Every `extern "C"` function here follows the same contract: pointer
//! arguments must be valid for the duration of the call and out-pointers must
//! point to writable memory. Null handles and null buffers with a nonzero
//! length are rejected with `KV_STATUS_INVALID_ARGUMENT` rather than invoking
//! undefined behavior. The message for the last failure on the calling thread
//! is available from `kv_errormsg`.
#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

mod config;
mod db;

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};

use serde_json::{Map, Value};

use crate::engine::{EngineFault, StorageEngine};
use crate::status::Status;

pub use config::*;
pub use db::*;

// =============================================================================
// Status Codes
// =============================================================================

pub const KV_STATUS_OK: c_int = 0;
pub const KV_STATUS_FAILED: c_int = 1;
pub const KV_STATUS_NOT_FOUND: c_int = 2;
pub const KV_STATUS_INVALID_ARGUMENT: c_int = 4;
pub const KV_STATUS_CONFIG_PARSING_ERROR: c_int = 5;
pub const KV_STATUS_STOPPED_BY_CB: c_int = 7;
pub const KV_STATUS_OUT_OF_MEMORY: c_int = 8;
pub const KV_STATUS_WRONG_ENGINE_NAME: c_int = 9;
pub const KV_STATUS_ENGINE_NOT_FOUND: c_int = 10;
pub const KV_STATUS_UNKNOWN_ERROR: c_int = 11;

// =============================================================================
// Handles and Callbacks
// =============================================================================

/// An opened engine instance
pub struct kv_db {
    pub(crate) engine: Box<dyn StorageEngine>,
}

/// Engine configuration, loaded from JSON
pub struct kv_config {
    pub(crate) entries: Map<String, Value>,
}

/// Per-entry scan callback; return 0 to continue, nonzero to stop
pub type kv_get_kv_cb = unsafe extern "C" fn(
    key: *const c_char,
    keybytes: usize,
    value: *const c_char,
    valuebytes: usize,
    arg: *mut c_void,
) -> c_int;

/// Single-value callback used by `kv_get`
pub type kv_get_v_cb = unsafe extern "C" fn(value: *const c_char, valuebytes: usize, arg: *mut c_void);

// =============================================================================
// Last Error Message
// =============================================================================

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn set_error(message: &str) {
    let message = CString::new(message.replace('\0', "\\0")).unwrap_or_default();
    LAST_ERROR.with(|last| *last.borrow_mut() = message);
}

/// Message describing the last failure on the calling thread
///
/// The pointer stays valid until the next failing call on this thread.
pub unsafe extern "C" fn kv_errormsg() -> *const c_char {
    LAST_ERROR.with(|last| last.borrow().as_ptr())
}

/// Owned copy of the calling thread's last error message
pub fn last_error_message() -> String {
    LAST_ERROR.with(|last| last.borrow().to_string_lossy().into_owned())
}

// =============================================================================
// Helpers
// =============================================================================

/// Record the fault's message and return its raw status
pub(crate) fn fail(fault: EngineFault) -> c_int {
    set_error(&fault.message);
    fault.status.as_raw()
}

pub(crate) fn invalid_argument(message: &str) -> c_int {
    fail(EngineFault::invalid_argument(message))
}

/// Collapse an early-returned error status and a success status into one code
pub(crate) fn status_code(result: Result<c_int, c_int>) -> c_int {
    match result {
        Ok(code) | Err(code) => code,
    }
}

pub(crate) unsafe fn require_db<'a>(db: *const kv_db) -> Result<&'a kv_db, c_int> {
    if db.is_null() {
        Err(invalid_argument("db must not be null"))
    } else {
        Ok(&*db)
    }
}

pub(crate) unsafe fn bytes_from_ptr<'a>(ptr: *const c_char, len: usize, name: &str) -> Result<&'a [u8], c_int> {
    if ptr.is_null() && len > 0 {
        Err(invalid_argument(&format!("{} must not be null when length > 0", name)))
    } else if ptr.is_null() {
        Ok(&[])
    } else {
        Ok(std::slice::from_raw_parts(ptr.cast::<u8>(), len))
    }
}

pub(crate) unsafe fn cstr_to_str<'a>(ptr: *const c_char, name: &str, status: Status) -> Result<&'a str, c_int> {
    if ptr.is_null() {
        return Err(invalid_argument(&format!("{} must not be null", name)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| fail(EngineFault::new(status, format!("{} is not valid UTF-8: {}", name, e))))
}
