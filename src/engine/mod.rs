//! Engine Module
//!
//! Reference storage engines living behind the native boundary.
//!
//! ## Responsibilities
//! - Resolve an engine name to an implementation
//! - Deserialize each engine's options from the parsed config map
//! - Serve point operations, exact counts, and ordered scans over exclusive bounds
//!
//! Nothing outside `ffi` talks to these types directly; the binding layer only
//! sees the C-ABI surface.
//!
//! ## Engines
//! - `vsmap`: volatile sorted map (`BTreeMap` behind a `RwLock`)
//! - `blackhole`: accepts everything, stores nothing

mod blackhole;
mod vsmap;

use std::ops::{Bound, ControlFlow};

use serde_json::{Map, Value};

use crate::status::Status;

pub(crate) use blackhole::Blackhole;
pub(crate) use vsmap::VSMap;

/// Engines of the wider family that this build does not include
const ABSENT_ENGINES: &[&str] = &[
    "cmap",
    "vcmap",
    "stree",
    "tree3",
    "csmap",
    "radix",
    "robinhood",
    "dram_vcmap",
];

/// Failure raised inside an engine, reported as a status plus message
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EngineFault {
    pub status: Status,
    pub message: String,
}

impl EngineFault {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Status::InvalidArgument, message)
    }
}

pub(crate) type EngineResult<T> = std::result::Result<T, EngineFault>;

/// Per-entry visitor handed to `StorageEngine::scan`
pub(crate) type Visitor<'a> = dyn FnMut(&[u8], &[u8]) -> ControlFlow<()> + 'a;

/// Key bounds of a count or scan
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bounds<'a> {
    pub lower: Bound<&'a [u8]>,
    pub upper: Bound<&'a [u8]>,
}

impl<'a> Bounds<'a> {
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub fn above(key: &'a [u8]) -> Self {
        Self {
            lower: Bound::Excluded(key),
            upper: Bound::Unbounded,
        }
    }

    pub fn below(key: &'a [u8]) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(key),
        }
    }

    pub fn between(lower: &'a [u8], upper: &'a [u8]) -> Self {
        Self {
            lower: Bound::Excluded(lower),
            upper: Bound::Excluded(upper),
        }
    }

    /// True when no key can satisfy both bounds
    ///
    /// Reversed bounds select nothing. `BTreeMap::range` panics on them, so
    /// engines must check this first.
    pub fn is_empty(&self) -> bool {
        let (lower, lower_inclusive) = match self.lower {
            Bound::Included(k) => (k, true),
            Bound::Excluded(k) => (k, false),
            Bound::Unbounded => return false,
        };
        let (upper, upper_inclusive) = match self.upper {
            Bound::Included(k) => (k, true),
            Bound::Excluded(k) => (k, false),
            Bound::Unbounded => return false,
        };
        lower > upper || (lower == upper && !(lower_inclusive && upper_inclusive))
    }

    pub fn as_range(&self) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
        (self.lower, self.upper)
    }
}

/// An opened engine instance
///
/// Implementations must be safe to share between threads; the binding adds no
/// locking of its own.
pub(crate) trait StorageEngine: Send + Sync {
    /// Registered engine name
    fn name(&self) -> &'static str;

    /// Insert or overwrite
    fn put(&self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Hand the stored value to `sink`; `Ok(false)` when absent
    fn get(&self, key: &[u8], sink: &mut dyn FnMut(&[u8])) -> EngineResult<bool>;

    /// `Ok(false)` when the key was absent
    fn remove(&self, key: &[u8]) -> EngineResult<bool>;

    fn exists(&self, key: &[u8]) -> EngineResult<bool>;

    fn count(&self, bounds: Bounds<'_>) -> EngineResult<usize>;

    /// Visit entries within `bounds` in ascending key order
    ///
    /// Returns `ControlFlow::Break` when the visitor stopped the scan.
    fn scan(&self, bounds: Bounds<'_>, visit: &mut Visitor<'_>) -> EngineResult<ControlFlow<()>>;
}

/// Open the engine registered under `name`
pub(crate) fn open(name: &str, options: &Map<String, Value>) -> EngineResult<Box<dyn StorageEngine>> {
    match name {
        VSMap::NAME => Ok(Box::new(VSMap::open(options)?)),
        Blackhole::NAME => Ok(Box::new(Blackhole)),
        absent if ABSENT_ENGINES.contains(&absent) => Err(EngineFault::new(
            Status::EngineNotFound,
            format!("engine '{}' is not available in this build", absent),
        )),
        unknown => Err(EngineFault::new(
            Status::WrongEngineName,
            format!("unknown engine name '{}'", unknown),
        )),
    }
}
