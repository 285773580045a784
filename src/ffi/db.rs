use std::ops::ControlFlow;
use std::os::raw::{c_char, c_int, c_void};

use tracing::trace;

use crate::engine::{self, Bounds, EngineResult};
use crate::status::Status;

use super::*;

// =============================================================================
// Lifecycle
// =============================================================================

/// Open the engine named `engine_name` with `config`, writing the new handle to `out_db`
///
/// Takes ownership of `config` whether or not the open succeeds.
pub unsafe extern "C" fn kv_open(engine_name: *const c_char, config: *mut kv_config, out_db: *mut *mut kv_db) -> c_int {
    if config.is_null() {
        return invalid_argument("config must not be null");
    }
    let config = Box::from_raw(config);

    status_code((|| {
        if out_db.is_null() {
            return Err(invalid_argument("out_db must not be null"));
        }
        let name = cstr_to_str(engine_name, "engine_name", Status::WrongEngineName)?;
        let engine = engine::open(name, &config.entries).map_err(fail)?;

        trace!(engine = engine.name(), "native engine opened");
        *out_db = Box::into_raw(Box::new(kv_db { engine }));
        Ok(KV_STATUS_OK)
    })())
}

/// Release an engine handle; null is ignored
pub unsafe extern "C" fn kv_close(db: *mut kv_db) {
    if !db.is_null() {
        let db = Box::from_raw(db);
        trace!(engine = db.engine.name(), "native engine closed");
    }
}

// =============================================================================
// Point Operations
// =============================================================================

pub unsafe extern "C" fn kv_put(
    db: *mut kv_db,
    key: *const c_char,
    keybytes: usize,
    value: *const c_char,
    valuebytes: usize,
) -> c_int {
    status_code((|| {
        let db = require_db(db)?;
        let key = bytes_from_ptr(key, keybytes, "key")?;
        let value = bytes_from_ptr(value, valuebytes, "value")?;
        db.engine.put(key, value).map_err(fail)?;
        Ok(KV_STATUS_OK)
    })())
}

/// Look up `key`, invoking `callback` once with the value when present
///
/// The value pointer is valid only until the callback returns.
pub unsafe extern "C" fn kv_get(
    db: *mut kv_db,
    key: *const c_char,
    keybytes: usize,
    callback: Option<kv_get_v_cb>,
    arg: *mut c_void,
) -> c_int {
    status_code((|| {
        let db = require_db(db)?;
        let key = bytes_from_ptr(key, keybytes, "key")?;
        let Some(callback) = callback else {
            return Err(invalid_argument("callback must not be null"));
        };

        let mut sink = |value: &[u8]| callback(value.as_ptr().cast(), value.len(), arg);
        found(db.engine.get(key, &mut sink))
    })())
}

pub unsafe extern "C" fn kv_remove(db: *mut kv_db, key: *const c_char, keybytes: usize) -> c_int {
    status_code((|| {
        let db = require_db(db)?;
        let key = bytes_from_ptr(key, keybytes, "key")?;
        found(db.engine.remove(key))
    })())
}

pub unsafe extern "C" fn kv_exists(db: *mut kv_db, key: *const c_char, keybytes: usize) -> c_int {
    status_code((|| {
        let db = require_db(db)?;
        let key = bytes_from_ptr(key, keybytes, "key")?;
        found(db.engine.exists(key))
    })())
}

fn found(result: EngineResult<bool>) -> Result<c_int, c_int> {
    match result {
        Ok(true) => Ok(KV_STATUS_OK),
        Ok(false) => Ok(KV_STATUS_NOT_FOUND),
        Err(fault) => Err(fail(fault)),
    }
}

// =============================================================================
// Counts
// =============================================================================

pub unsafe extern "C" fn kv_count_all(db: *mut kv_db, out_count: *mut usize) -> c_int {
    count(db, out_count, || Ok(Bounds::all()))
}

pub unsafe extern "C" fn kv_count_above(db: *mut kv_db, key: *const c_char, keybytes: usize, out_count: *mut usize) -> c_int {
    count(db, out_count, || Ok(Bounds::above(bytes_from_ptr(key, keybytes, "key")?)))
}

pub unsafe extern "C" fn kv_count_below(db: *mut kv_db, key: *const c_char, keybytes: usize, out_count: *mut usize) -> c_int {
    count(db, out_count, || Ok(Bounds::below(bytes_from_ptr(key, keybytes, "key")?)))
}

pub unsafe extern "C" fn kv_count_between(
    db: *mut kv_db,
    key1: *const c_char,
    keybytes1: usize,
    key2: *const c_char,
    keybytes2: usize,
    out_count: *mut usize,
) -> c_int {
    count(db, out_count, || {
        Ok(Bounds::between(
            bytes_from_ptr(key1, keybytes1, "key1")?,
            bytes_from_ptr(key2, keybytes2, "key2")?,
        ))
    })
}

unsafe fn count<'a>(
    db: *mut kv_db,
    out_count: *mut usize,
    bounds: impl FnOnce() -> Result<Bounds<'a>, c_int>,
) -> c_int {
    status_code((|| {
        let db = require_db(db)?;
        if out_count.is_null() {
            return Err(invalid_argument("out_count must not be null"));
        }
        let bounds = bounds()?;
        *out_count = db.engine.count(bounds).map_err(fail)?;
        Ok(KV_STATUS_OK)
    })())
}

// =============================================================================
// Scans
// =============================================================================

pub unsafe extern "C" fn kv_get_all(db: *mut kv_db, callback: Option<kv_get_kv_cb>, arg: *mut c_void) -> c_int {
    scan(db, callback, arg, || Ok(Bounds::all()))
}

pub unsafe extern "C" fn kv_get_above(
    db: *mut kv_db,
    key: *const c_char,
    keybytes: usize,
    callback: Option<kv_get_kv_cb>,
    arg: *mut c_void,
) -> c_int {
    scan(db, callback, arg, || Ok(Bounds::above(bytes_from_ptr(key, keybytes, "key")?)))
}

pub unsafe extern "C" fn kv_get_below(
    db: *mut kv_db,
    key: *const c_char,
    keybytes: usize,
    callback: Option<kv_get_kv_cb>,
    arg: *mut c_void,
) -> c_int {
    scan(db, callback, arg, || Ok(Bounds::below(bytes_from_ptr(key, keybytes, "key")?)))
}

pub unsafe extern "C" fn kv_get_between(
    db: *mut kv_db,
    key1: *const c_char,
    keybytes1: usize,
    key2: *const c_char,
    keybytes2: usize,
    callback: Option<kv_get_kv_cb>,
    arg: *mut c_void,
) -> c_int {
    scan(db, callback, arg, || {
        Ok(Bounds::between(
            bytes_from_ptr(key1, keybytes1, "key1")?,
            bytes_from_ptr(key2, keybytes2, "key2")?,
        ))
    })
}

unsafe fn scan<'a>(
    db: *mut kv_db,
    callback: Option<kv_get_kv_cb>,
    arg: *mut c_void,
    bounds: impl FnOnce() -> Result<Bounds<'a>, c_int>,
) -> c_int {
    status_code((|| {
        let db = require_db(db)?;
        let Some(callback) = callback else {
            return Err(invalid_argument("callback must not be null"));
        };
        let bounds = bounds()?;

        let mut visit = |key: &[u8], value: &[u8]| {
            let rc = callback(key.as_ptr().cast(), key.len(), value.as_ptr().cast(), value.len(), arg);
            if rc == 0 {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        };

        match db.engine.scan(bounds, &mut visit).map_err(fail)? {
            ControlFlow::Continue(()) => Ok(KV_STATUS_OK),
            ControlFlow::Break(()) => Ok(KV_STATUS_STOPPED_BY_CB),
        }
    })())
}
