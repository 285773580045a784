//! Range Query Executor
//!
//! Maps the four scan shapes onto the engine's scan and count primitives.
//!
//! ## Shapes
//! - `All`: every entry
//! - `Above(k)`: key > k
//! - `Below(k)`: key < k
//! - `Between(k1, k2)`: k1 < key < k2, empty when k1 >= k2
//!
//! Every bound is exclusive. Entries arrive in ascending byte-lexicographic key
//! order.

use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

use crate::bridge::{self, IntoContinuation, ScanOutcome};
use crate::error::{KvError, Result, ScanError};
use crate::ffi::{self, kv_db, kv_get_kv_cb};
use crate::view::View;

/// Result of a scan whose callback can fail with `E`
pub type ScanResult<E> = std::result::Result<ScanOutcome, ScanError<E>>;

/// Key range selected by a count or scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRange<'k> {
    /// Every entry
    All,

    /// Entries with key strictly greater than the bound
    Above(&'k [u8]),

    /// Entries with key strictly less than the bound
    Below(&'k [u8]),

    /// Entries strictly between the two bounds
    Between(&'k [u8], &'k [u8]),
}

impl<'k> KeyRange<'k> {
    /// True when the range cannot contain any key
    pub fn is_empty(&self) -> bool {
        matches!(self, KeyRange::Between(lower, upper) if lower >= upper)
    }

    fn scan_op(&self) -> &'static str {
        match self {
            KeyRange::All => "get_all",
            KeyRange::Above(_) => "get_above",
            KeyRange::Below(_) => "get_below",
            KeyRange::Between(..) => "get_between",
        }
    }

    fn count_op(&self) -> &'static str {
        match self {
            KeyRange::All => "count_all",
            KeyRange::Above(_) => "count_above",
            KeyRange::Below(_) => "count_below",
            KeyRange::Between(..) => "count_between",
        }
    }
}

/// Call the engine's scan primitive for `range`
///
/// # Safety
///
/// `db` must be an open handle, and `arg` must be the context `callback`
/// expects.
unsafe fn native_scan(db: NonNull<kv_db>, range: KeyRange<'_>, callback: kv_get_kv_cb, arg: *mut c_void) -> c_int {
    let db = db.as_ptr();
    match range {
        KeyRange::All => ffi::kv_get_all(db, Some(callback), arg),
        KeyRange::Above(key) => ffi::kv_get_above(db, key.as_ptr().cast(), key.len(), Some(callback), arg),
        KeyRange::Below(key) => ffi::kv_get_below(db, key.as_ptr().cast(), key.len(), Some(callback), arg),
        KeyRange::Between(lower, upper) => ffi::kv_get_between(
            db,
            lower.as_ptr().cast(),
            lower.len(),
            upper.as_ptr().cast(),
            upper.len(),
            Some(callback),
            arg,
        ),
    }
}

/// Deliver each key in `range` to `callback`
pub(crate) fn scan_keys<F, R>(db: NonNull<kv_db>, range: KeyRange<'_>, callback: F) -> ScanResult<R::Error>
where
    F: FnMut(View<'_>) -> R,
    R: IntoContinuation,
{
    bridge::drive_keys(range.scan_op(), callback, |trampoline, arg| unsafe {
        native_scan(db, range, trampoline, arg)
    })
}

/// Deliver each key and value in `range` to `callback`
pub(crate) fn scan_entries<F, R>(db: NonNull<kv_db>, range: KeyRange<'_>, callback: F) -> ScanResult<R::Error>
where
    F: FnMut(View<'_>, View<'_>) -> R,
    R: IntoContinuation,
{
    bridge::drive_entries(range.scan_op(), callback, |trampoline, arg| unsafe {
        native_scan(db, range, trampoline, arg)
    })
}

/// Exact number of entries in `range`
pub(crate) fn count(db: NonNull<kv_db>, range: KeyRange<'_>) -> Result<usize> {
    let db = db.as_ptr();
    let mut count = 0usize;
    let code = unsafe {
        match range {
            KeyRange::All => ffi::kv_count_all(db, &mut count),
            KeyRange::Above(key) => ffi::kv_count_above(db, key.as_ptr().cast(), key.len(), &mut count),
            KeyRange::Below(key) => ffi::kv_count_below(db, key.as_ptr().cast(), key.len(), &mut count),
            KeyRange::Between(lower, upper) => ffi::kv_count_between(
                db,
                lower.as_ptr().cast(),
                lower.len(),
                upper.as_ptr().cast(),
                upper.len(),
                &mut count,
            ),
        }
    };

    if code == ffi::KV_STATUS_OK {
        Ok(count)
    } else {
        Err(KvError::engine_failure(range.count_op(), code))
    }
}
