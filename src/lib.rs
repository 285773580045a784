//! # kvbridge
//!
//! A safe binding over a native key-value engine interface:
//! - Open / close an engine by name with a JSON configuration
//! - Point operations on arbitrary binary keys and values
//! - Exact counts and ordered, callback-driven range scans
//! - Zero-copy views of engine-owned bytes, valid only inside the callback
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Database                              │
//! │        (put / get / remove / exists / count / scan)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ EngineHandle│          │ Scan Bridge │
//!   │ (lifecycle) │          │ (callbacks) │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          └───────────┬────────────┘
//!                      ▼
//!            ┌───────────────────┐
//!            │  Native Surface   │
//!            │   (extern "C")    │
//!            └─────────┬─────────┘
//!                      ▼
//!            ┌───────────────────┐
//!            │      Engines      │
//!            │ vsmap / blackhole │
//!            └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvbridge::{Config, Database};
//!
//! let config = Config::builder().path("/tmp/kv").size(1 << 20).build();
//! let db = Database::open("vsmap", &config)?;
//!
//! db.put("key1", "value1")?;
//! assert_eq!(db.get_string("key1")?.as_deref(), Some("value1"));
//!
//! db.get_keys(|key| println!("{:?}", key))?;
//! # Ok::<(), kvbridge::KvError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod status;

pub mod ffi;
mod engine;

mod bridge;
mod handle;
pub mod view;
pub mod scan;
pub mod db;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use bridge::{Continuation, IntoContinuation, ScanOutcome};
pub use config::{Config, ConfigBuilder};
pub use db::Database;
pub use error::{KvError, Result, ScanError};
pub use scan::{KeyRange, ScanResult};
pub use status::Status;
pub use view::View;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvbridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
