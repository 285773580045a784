//! vsmap engine
//!
//! Volatile sorted map: a `BTreeMap` behind a `RwLock`, with an optional byte
//! capacity.
//!
//! ## Concurrency
//! - Reads, counts, and scans take a recursive read lock for their whole duration
//! - Writes take the write lock
//!
//! Read locks are recursive so a scan visitor can read the same instance even
//! while a writer on another thread is queued. A visitor that writes to the same
//! instance still blocks on its own read lock.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::status::Status;

use super::{Bounds, EngineFault, EngineResult, StorageEngine, Visitor};

/// Options accepted by vsmap
#[derive(Debug, Deserialize)]
struct VSMapOptions {
    /// Must name an existing directory
    path: PathBuf,

    /// Capacity in bytes (keys plus values); unlimited when absent
    #[serde(default)]
    size: Option<u64>,
}

struct Inner {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,

    /// Sum of key and value lengths currently stored
    used: u64,
}

pub(crate) struct VSMap {
    inner: RwLock<Inner>,
    capacity: Option<u64>,
}

impl VSMap {
    pub const NAME: &'static str = "vsmap";

    pub fn open(options: &Map<String, Value>) -> EngineResult<Self> {
        let options: VSMapOptions = serde_json::from_value(Value::Object(options.clone()))
            .map_err(|e| EngineFault::invalid_argument(format!("vsmap config: {}", e)))?;

        if !options.path.is_dir() {
            return Err(EngineFault::invalid_argument(format!(
                "vsmap config: path '{}' is not an existing directory",
                options.path.display()
            )));
        }

        trace!(path = %options.path.display(), size = ?options.size, "vsmap opened");

        Ok(Self {
            inner: RwLock::new(Inner {
                entries: BTreeMap::new(),
                used: 0,
            }),
            capacity: options.size,
        })
    }
}

fn footprint(key: &[u8], value: &[u8]) -> u64 {
    (key.len() + value.len()) as u64
}

impl StorageEngine for VSMap {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn put(&self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut inner = self.inner.write();

        let released = inner
            .entries
            .get(key)
            .map(|old| footprint(key, old))
            .unwrap_or(0);
        let used = inner.used - released + footprint(key, value);

        if let Some(capacity) = self.capacity {
            if used > capacity {
                return Err(EngineFault::new(
                    Status::OutOfMemory,
                    format!("vsmap capacity of {} bytes exhausted", capacity),
                ));
            }
        }

        inner.entries.insert(key.to_vec(), value.to_vec());
        inner.used = used;
        Ok(())
    }

    fn get(&self, key: &[u8], sink: &mut dyn FnMut(&[u8])) -> EngineResult<bool> {
        let inner = self.inner.read_recursive();
        match inner.entries.get(key) {
            Some(value) => {
                sink(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, key: &[u8]) -> EngineResult<bool> {
        let mut inner = self.inner.write();
        match inner.entries.remove(key) {
            Some(value) => {
                inner.used -= footprint(key, &value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn exists(&self, key: &[u8]) -> EngineResult<bool> {
        Ok(self.inner.read_recursive().entries.contains_key(key))
    }

    fn count(&self, bounds: Bounds<'_>) -> EngineResult<usize> {
        if bounds.is_empty() {
            return Ok(0);
        }
        let inner = self.inner.read_recursive();
        Ok(inner.entries.range::<[u8], _>(bounds.as_range()).count())
    }

    fn scan(&self, bounds: Bounds<'_>, visit: &mut Visitor<'_>) -> EngineResult<ControlFlow<()>> {
        if bounds.is_empty() {
            return Ok(ControlFlow::Continue(()));
        }

        let inner = self.inner.read_recursive();
        for (key, value) in inner.entries.range::<[u8], _>(bounds.as_range()) {
            if visit(key, value).is_break() {
                trace!(key_len = key.len(), "vsmap scan stopped by visitor");
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
