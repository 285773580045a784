//! Configuration for opening an engine
//!
//! A `Config` is the JSON document handed to the engine's config loader. This
//! layer only builds or carries the text; parsing and validation happen on the
//! engine side of the boundary.

use std::path::Path;

use serde_json::{Map, Value};

/// JSON configuration passed to `Database::open`
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    json: String,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Wrap raw JSON text
    ///
    /// The text is not checked here. A malformed document is rejected by the
    /// engine with `ConfigParsingError` before any engine is opened.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }

    /// The JSON text handed to the engine
    pub fn as_json(&self) -> &str {
        &self.json
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_json("{}")
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    entries: Map<String, Value>,
}

impl ConfigBuilder {
    /// Set the engine's data path (directory for `vsmap`)
    pub fn path(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy().into_owned();
        self.set("path", path)
    }

    /// Set the engine's capacity (in bytes)
    pub fn size(self, bytes: u64) -> Self {
        self.set("size", bytes)
    }

    /// Ask the engine to create its pool if it does not exist
    pub fn force_create(self, create: bool) -> Self {
        self.set("force_create", create)
    }

    /// Set an arbitrary engine option
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Config {
        Config {
            json: Value::Object(self.entries).to_string(),
        }
    }
}
