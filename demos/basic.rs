//! kvbridge basic demo
//!
//! Opens a vsmap engine, writes a few keys, reads them back, and walks them
//! with a scan callback.
//!
//! ```text
//! cargo run --example basic -- --size 1048576
//! RUST_LOG=kvbridge=trace cargo run --example basic
//! ```

use std::path::PathBuf;

use clap::Parser;
use kvbridge::{Config, Database};
use tracing_subscriber::{fmt, EnvFilter};

/// kvbridge basic demo
#[derive(Parser, Debug)]
#[command(name = "kvbridge-basic")]
#[command(version)]
struct Args {
    /// Directory handed to vsmap (a temporary one when omitted)
    #[arg(short, long)]
    path: Option<String>,

    /// Engine capacity in bytes
    #[arg(short, long, default_value = "1073741824")]
    size: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    // Keep the temp dir alive until the engine is closed
    let temp_dir = tempfile::TempDir::new()?;
    let path = match &args.path {
        Some(path) => PathBuf::from(path),
        None => temp_dir.path().to_path_buf(),
    };

    tracing::info!("kvbridge v{}", kvbridge::VERSION);
    let config = Config::builder().path(&path).size(args.size).build();

    println!("Starting engine");
    let mut db = Database::open("vsmap", &config)?;

    println!("Put new key");
    db.put("key1", "value1")?;
    assert_eq!(db.count_all()?, 1);

    println!("Reading key back");
    assert_eq!(db.get_string("key1")?.as_deref(), Some("value1"));

    println!("Iterating existing keys");
    db.put("key2", "value2")?;
    db.put("key3", "value3")?;
    db.get_keys(|key| println!("visited: {}", String::from_utf8_lossy(&key)))?;

    println!("Get single value without copying it");
    let key = "key1";
    db.get_with(key, |value| {
        println!("key: {} with value: {}", key, String::from_utf8_lossy(&value))
    })?;

    println!("Removing existing key");
    db.remove("key1")?;
    assert!(!db.exists("key1")?);

    println!("Stopping engine");
    db.close();
    Ok(())
}
