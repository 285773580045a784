//! Database Module
//!
//! The caller-facing façade over one engine handle.
//!
//! ## Responsibilities
//! - Point operations (put / get / remove / exists) with `NotFound` folded into
//!   `Option` and `bool` results
//! - Exact counts over the four range shapes
//! - Callback-driven scans, keys-only or keys and values
//! - Handle lifecycle: idempotent close, `InvalidArgument` after close
//!
//! ## Callbacks and Reentrancy
//! Scan callbacks run synchronously on the calling thread while the engine is
//! iterating. A callback must not write to the same `Database` (put / remove)
//! during the scan: the engine's own locking decides what happens, and with
//! `vsmap` the write blocks forever on the scan's read lock. Reads from a
//! callback are left to the engine as well (`vsmap` allows them, even with a
//! writer queued on another thread); this layer adds no locking.

use std::fmt;
use std::os::raw::c_int;

use bytes::Bytes;

use crate::bridge::{self, IntoContinuation};
use crate::config::Config;
use crate::error::{KvError, Result};
use crate::ffi;
use crate::handle::EngineHandle;
use crate::scan::{self, KeyRange, ScanResult};
use crate::status::Status;
use crate::view::View;

/// An open engine instance
///
/// Exclusively owned by whoever opened it. `close` may be called any number of
/// times; dropping the database closes it. Sharing across threads relies on
/// the engine being thread-safe, which the native interface guarantees.
pub struct Database {
    handle: EngineHandle,
}

impl Database {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open the engine named `engine_name`
    ///
    /// Fails with:
    /// - `ConfigParsing` when the config is not a JSON object (the engine is
    ///   never opened)
    /// - `WrongEngineName` for an unknown engine, `EngineNotFound` for one this
    ///   build lacks
    /// - `InvalidArgument` when the engine rejects its options
    pub fn open(engine_name: &str, config: &Config) -> Result<Self> {
        Ok(Self {
            handle: EngineHandle::open(engine_name, config)?,
        })
    }

    /// Close the engine; later calls are no-ops
    pub fn close(&mut self) {
        self.handle.close();
    }

    pub fn is_closed(&self) -> bool {
        !self.handle.is_open()
    }

    pub fn engine_name(&self) -> &str {
        self.handle.engine_name()
    }

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Insert `key`, overwriting any existing value
    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let db = self.handle.raw()?;
        let (key, value) = (key.as_ref(), value.as_ref());

        let code = unsafe {
            ffi::kv_put(
                db.as_ptr(),
                key.as_ptr().cast(),
                key.len(),
                value.as_ptr().cast(),
                value.len(),
            )
        };
        match code {
            ffi::KV_STATUS_OK => Ok(()),
            code => Err(KvError::engine_failure("put", code)),
        }
    }

    /// Copy of the value stored under `key`
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        self.get_with(key, |value| value.to_bytes())
    }

    /// Run `f` over the stored value without copying it
    ///
    /// The view is only valid inside `f`; whatever `f` returns is handed back.
    /// `Ok(None)` when the key is absent.
    pub fn get_with<F, T>(&self, key: impl AsRef<[u8]>, f: F) -> Result<Option<T>>
    where
        F: FnOnce(View<'_>) -> T,
    {
        let db = self.handle.raw()?;
        let key = key.as_ref();

        let (code, output) = bridge::drive_value(f, |callback, arg| unsafe {
            ffi::kv_get(db.as_ptr(), key.as_ptr().cast(), key.len(), Some(callback), arg)
        });
        match Status::from_raw(code) {
            Status::Ok => Ok(output),
            Status::NotFound => Ok(None),
            _ => Err(KvError::engine_failure("get", code)),
        }
    }

    /// The stored value as an owned UTF-8 string
    pub fn get_string(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.get_with(key, |value| value.to_str().map(str::to_owned))?
            .transpose()
            .map_err(|e| KvError::InvalidArgument(format!("value is not valid UTF-8: {}", e)))
    }

    /// Remove `key`; `Ok(false)` when it was already absent
    pub fn remove(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        let db = self.handle.raw()?;
        let key = key.as_ref();
        let code = unsafe { ffi::kv_remove(db.as_ptr(), key.as_ptr().cast(), key.len()) };
        found("remove", code)
    }

    pub fn exists(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        let db = self.handle.raw()?;
        let key = key.as_ref();
        let code = unsafe { ffi::kv_exists(db.as_ptr(), key.as_ptr().cast(), key.len()) };
        found("exists", code)
    }

    /// Alias of `exists`
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.exists(key)
    }

    // =========================================================================
    // Counts
    // =========================================================================

    pub fn count_all(&self) -> Result<usize> {
        self.count(KeyRange::All)
    }

    /// Entries with key > `key`
    pub fn count_above(&self, key: impl AsRef<[u8]>) -> Result<usize> {
        self.count(KeyRange::Above(key.as_ref()))
    }

    /// Entries with key < `key`
    pub fn count_below(&self, key: impl AsRef<[u8]>) -> Result<usize> {
        self.count(KeyRange::Below(key.as_ref()))
    }

    /// Entries with `lower` < key < `upper`; 0 when `lower >= upper`
    pub fn count_between(&self, lower: impl AsRef<[u8]>, upper: impl AsRef<[u8]>) -> Result<usize> {
        self.count(KeyRange::Between(lower.as_ref(), upper.as_ref()))
    }

    pub fn count(&self, range: KeyRange<'_>) -> Result<usize> {
        scan::count(self.handle.raw()?, range)
    }

    /// Alias of `count_all`
    pub fn len(&self) -> Result<usize> {
        self.count_all()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count_all()? == 0)
    }

    // =========================================================================
    // Keys-Only Scans
    // =========================================================================

    /// Deliver every key in ascending order
    ///
    /// Values are never exposed to the callback. The callback returns a
    /// `Continuation` (or `()`, `bool`, `ControlFlow<()>`, or a `Result` of
    /// those); stopping yields `ScanOutcome::StoppedByUser`, an `Err` yields
    /// `ScanError::Callback`.
    pub fn get_keys<F, R>(&self, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan_keys(KeyRange::All, callback)
    }

    /// Keys strictly greater than `key`
    pub fn get_keys_above<F, R>(&self, key: impl AsRef<[u8]>, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan_keys(KeyRange::Above(key.as_ref()), callback)
    }

    /// Keys strictly less than `key`
    pub fn get_keys_below<F, R>(&self, key: impl AsRef<[u8]>, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan_keys(KeyRange::Below(key.as_ref()), callback)
    }

    /// Keys strictly between `lower` and `upper`
    pub fn get_keys_between<F, R>(
        &self,
        lower: impl AsRef<[u8]>,
        upper: impl AsRef<[u8]>,
        callback: F,
    ) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan_keys(KeyRange::Between(lower.as_ref(), upper.as_ref()), callback)
    }

    pub fn scan_keys<F, R>(&self, range: KeyRange<'_>, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>) -> R,
        R: IntoContinuation,
    {
        scan::scan_keys(self.handle.raw()?, range, callback)
    }

    // =========================================================================
    // Key and Value Scans
    // =========================================================================

    /// Deliver every entry in ascending key order
    pub fn get_all<F, R>(&self, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>, View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan(KeyRange::All, callback)
    }

    pub fn get_above<F, R>(&self, key: impl AsRef<[u8]>, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>, View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan(KeyRange::Above(key.as_ref()), callback)
    }

    pub fn get_below<F, R>(&self, key: impl AsRef<[u8]>, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>, View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan(KeyRange::Below(key.as_ref()), callback)
    }

    pub fn get_between<F, R>(
        &self,
        lower: impl AsRef<[u8]>,
        upper: impl AsRef<[u8]>,
        callback: F,
    ) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>, View<'_>) -> R,
        R: IntoContinuation,
    {
        self.scan(KeyRange::Between(lower.as_ref(), upper.as_ref()), callback)
    }

    pub fn scan<F, R>(&self, range: KeyRange<'_>, callback: F) -> ScanResult<R::Error>
    where
        F: FnMut(View<'_>, View<'_>) -> R,
        R: IntoContinuation,
    {
        scan::scan_entries(self.handle.raw()?, range, callback)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("engine", &self.engine_name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// `Ok` → true, `NotFound` → false, anything else is an error
fn found(op: &'static str, code: c_int) -> Result<bool> {
    match Status::from_raw(code) {
        Status::Ok => Ok(true),
        Status::NotFound => Ok(false),
        _ => Err(KvError::engine_failure(op, code)),
    }
}
