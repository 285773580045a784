//! Engine Handle
//!
//! Owns one opened native engine instance.
//!
//! ## Lifecycle
//! ```text
//!   open ──► Open(ptr) ──close──► Closed ──close──► Closed (no-op)
//! ```
//! The state is tracked explicitly. Once closed, `raw()` refuses with
//! `InvalidArgument` and native code is never reached with a stale pointer.

use std::ffi::CString;
use std::ptr::{self, NonNull};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::ffi::{self, kv_db};

enum HandleState {
    Open(NonNull<kv_db>),
    Closed,
}

/// Exclusive owner of one native engine instance
pub(crate) struct EngineHandle {
    state: HandleState,
    engine_name: String,
}

// SAFETY: the native engine surface is thread-safe for every call on an open
// handle; the pointer is only released by `close`, which needs `&mut self`.
unsafe impl Send for EngineHandle {}
unsafe impl Sync for EngineHandle {}

impl EngineHandle {
    /// Open `engine_name` with `config`
    ///
    /// Steps:
    /// 1. Allocate a native config (`OutOfMemory` on failure)
    /// 2. Load the JSON text (`ConfigParsingError`; the engine is not opened)
    /// 3. Open the engine, which takes ownership of the config
    pub fn open(engine_name: &str, config: &Config) -> Result<Self> {
        let c_engine = CString::new(engine_name).map_err(|_| {
            KvError::InvalidArgument(format!("engine name {:?} contains a NUL byte", engine_name))
        })?;
        let c_json = CString::new(config.as_json())
            .map_err(|_| KvError::ConfigParsing("config contains a NUL byte".to_string()))?;

        // Step 1: Allocate the native config
        let native_config = NonNull::new(unsafe { ffi::kv_config_new() })
            .ok_or_else(|| KvError::OutOfMemory("allocating a new engine config failed".to_string()))?;

        // Step 2: Load JSON; a rejected document never reaches kv_open
        let code = unsafe { ffi::kv_config_from_json(native_config.as_ptr(), c_json.as_ptr()) };
        if code != ffi::KV_STATUS_OK {
            let message = ffi::last_error_message();
            unsafe { ffi::kv_config_delete(native_config.as_ptr()) };
            warn!(engine = engine_name, %message, "engine config rejected");
            return Err(KvError::from_status("config_from_json", code, message));
        }

        // Step 3: Open (consumes the config whatever the outcome)
        let mut db = ptr::null_mut();
        let code = unsafe { ffi::kv_open(c_engine.as_ptr(), native_config.as_ptr(), &mut db) };
        if code != ffi::KV_STATUS_OK {
            let message = ffi::last_error_message();
            warn!(engine = engine_name, %message, "engine open failed");
            return Err(KvError::from_status("open", code, message));
        }
        let db = NonNull::new(db)
            .ok_or_else(|| KvError::Failed("engine reported success but returned no handle".to_string()))?;

        info!(engine = engine_name, "engine opened");
        Ok(Self {
            state: HandleState::Open(db),
            engine_name: engine_name.to_string(),
        })
    }

    /// The native handle, or `InvalidArgument` once closed
    pub fn raw(&self) -> Result<NonNull<kv_db>> {
        match self.state {
            HandleState::Open(db) => Ok(db),
            HandleState::Closed => Err(KvError::closed()),
        }
    }

    /// Release the native engine; returns false when already closed
    pub fn close(&mut self) -> bool {
        match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Open(db) => {
                unsafe { ffi::kv_close(db.as_ptr()) };
                info!(engine = %self.engine_name, "engine closed");
                true
            }
            HandleState::Closed => false,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, HandleState::Open(_))
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.close();
    }
}
