//! blackhole engine
//!
//! Accepts every write and keeps nothing. Useful for measuring binding overhead.

use std::ops::ControlFlow;

use super::{Bounds, EngineResult, StorageEngine, Visitor};

pub(crate) struct Blackhole;

impl Blackhole {
    pub const NAME: &'static str = "blackhole";
}

impl StorageEngine for Blackhole {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn put(&self, _key: &[u8], _value: &[u8]) -> EngineResult<()> {
        Ok(())
    }

    fn get(&self, _key: &[u8], _sink: &mut dyn FnMut(&[u8])) -> EngineResult<bool> {
        Ok(false)
    }

    // Reports success: the key is gone either way.
    fn remove(&self, _key: &[u8]) -> EngineResult<bool> {
        Ok(true)
    }

    fn exists(&self, _key: &[u8]) -> EngineResult<bool> {
        Ok(false)
    }

    fn count(&self, _bounds: Bounds<'_>) -> EngineResult<usize> {
        Ok(0)
    }

    fn scan(&self, _bounds: Bounds<'_>, _visit: &mut Visitor<'_>) -> EngineResult<ControlFlow<()>> {
        Ok(ControlFlow::Continue(()))
    }
}
