//! Tests for the callback bridge
//!
//! These tests verify:
//! - Callback errors stop the scan and come back as `ScanError::Callback`
//! - Panics inside callbacks are resumed on the caller's side
//! - The handle stays usable after a failed or panicking callback
//! - Work done by the callback before stopping is kept
//! - Infallible scans convert into `KvError` with `?`
//! - Reads from inside a callback while another thread waits to write

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use kvbridge::{Config, Continuation, Database, KvError, ScanError, ScanOutcome};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_alphabet_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().path(temp_dir.path()).build();
    let db = Database::open("vsmap", &config).unwrap();
    for (key, value) in [("A", "1"), ("AB", "2"), ("AC", "3"), ("B", "4"), ("BB", "5"), ("BC", "6")] {
        db.put(key, value).unwrap();
    }
    (temp_dir, db)
}

#[derive(Debug, PartialEq)]
struct Abort(String);

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aborted at {}", self.0)
    }
}

impl std::error::Error for Abort {}

fn key_count(db: &Database) -> kvbridge::Result<usize> {
    let mut count = 0;
    db.get_keys(|_| count += 1)?;
    Ok(count)
}

fn first_value_over(db: &Database, limit: u32) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let mut found = None;
    db.get_all(|key, value| {
        let text = value.to_str().unwrap_or_default();
        let n: u32 = match text.parse() {
            Ok(n) => n,
            Err(_) => return Err(Abort(key.to_str().unwrap_or("?").to_string())),
        };
        if n > limit {
            found = Some(text.to_string());
            return Ok(Continuation::Stop);
        }
        Ok(Continuation::Continue)
    })?;
    Ok(found)
}

// =============================================================================
// Callback Error Tests
// =============================================================================

#[test]
fn test_callback_error_is_returned() {
    let (_temp, db) = setup_alphabet_db();

    let mut seen = Vec::new();
    let err = db
        .get_keys(|key| {
            let key = key.to_str().unwrap().to_string();
            if key == "AC" {
                return Err(Abort(key));
            }
            seen.push(key);
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err.into_callback(), Some(Abort("AC".to_string())));
    assert_eq!(seen, ["A", "AB"]);
}

#[test]
fn test_callback_error_in_entry_scan() {
    let (_temp, db) = setup_alphabet_db();

    let mut calls = 0;
    let err = db
        .get_between("A", "BC", |_, value| {
            calls += 1;
            if value == b"4" {
                Err(Abort("B".to_string()))
            } else {
                Ok(Continuation::Continue)
            }
        })
        .unwrap_err();

    assert!(matches!(err, ScanError::Callback(Abort(ref key)) if key == "B"));
    assert_eq!(calls, 3);
}

#[test]
fn test_callback_error_display_and_source() {
    let (_temp, db) = setup_alphabet_db();

    let err = db.get_keys(|_| Err::<(), _>(Abort("A".to_string()))).unwrap_err();

    assert_eq!(err.to_string(), "Scan callback failed: aborted at A");
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "aborted at A");
}

#[test]
fn test_callback_error_through_question_mark() {
    let (_temp, db) = setup_alphabet_db();

    assert_eq!(first_value_over(&db, 4).unwrap().as_deref(), Some("5"));
    assert_eq!(first_value_over(&db, 100).unwrap(), None);

    db.put("C", "not a number").unwrap();
    let err = first_value_over(&db, 100).unwrap_err();
    assert_eq!(err.to_string(), "Scan callback failed: aborted at C");
}

#[test]
fn test_infallible_scan_converts_to_kv_error() {
    let (_temp, db) = setup_alphabet_db();

    assert_eq!(key_count(&db).unwrap(), 6);
}

#[test]
fn test_engine_error_converts_to_kv_error() {
    let (_temp, mut db) = setup_alphabet_db();
    db.close();

    let err = key_count(&db).unwrap_err();
    assert!(matches!(err, KvError::InvalidArgument(_)));
}

// =============================================================================
// Panic Tests
// =============================================================================

#[test]
fn test_panic_in_scan_is_resumed() {
    let (_temp, db) = setup_alphabet_db();

    let mut calls = 0;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        db.get_keys(|key| {
            calls += 1;
            if key == b"AB" {
                panic!("callback panicked");
            }
        })
    }));

    let payload = result.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"callback panicked"));
    assert_eq!(calls, 2);
}

#[test]
fn test_database_usable_after_panic() {
    let (_temp, db) = setup_alphabet_db();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        db.get_all(|_, _| -> Continuation { panic!("boom") })
    }));
    assert!(result.is_err());

    // The engine released its scan lock; writes go through
    db.put("C", "7").unwrap();
    assert_eq!(db.count_all().unwrap(), 7);
}

#[test]
fn test_panic_in_get_with_is_resumed() {
    let (_temp, db) = setup_alphabet_db();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        db.get_with("A", |_| -> usize { panic!("value callback panicked") })
    }));
    assert!(result.is_err());

    assert_eq!(db.get_string("A").unwrap().as_deref(), Some("1"));
}

// =============================================================================
// Partial Delivery Tests
// =============================================================================

#[test]
fn test_partial_results_are_kept_on_stop() {
    let (_temp, db) = setup_alphabet_db();

    let mut collected = Vec::new();
    let outcome = db
        .get_all(|key, value| {
            collected.push((key.to_vec(), value.to_vec()));
            if collected.len() == 2 {
                Continuation::Stop
            } else {
                Continuation::Continue
            }
        })
        .unwrap();

    assert_eq!(outcome, ScanOutcome::StoppedByUser);
    assert_eq!(
        collected,
        vec![(b"A".to_vec(), b"1".to_vec()), (b"AB".to_vec(), b"2".to_vec())]
    );
}

#[test]
fn test_scan_outcome_status() {
    let (_temp, db) = setup_alphabet_db();

    let completed = db.get_keys(|_| Continuation::Continue).unwrap();
    let stopped = db.get_keys(|_| Continuation::Stop).unwrap();

    assert_eq!(completed.status(), kvbridge::Status::Ok);
    assert_eq!(stopped.status(), kvbridge::Status::StoppedByUser);
}

#[test]
fn test_reads_from_inside_callback() {
    let (_temp, db) = setup_alphabet_db();

    let mut pairs = Vec::new();
    db.get_keys_below("B", |key| {
        let value = db.get_string(key).unwrap().unwrap();
        pairs.push(format!("{}={}", key.to_str().unwrap(), value));
    })
    .unwrap();

    assert_eq!(pairs, ["A=1", "AB=2", "AC=3"]);
}

#[test]
fn test_reads_from_inside_callback_with_queued_writer() {
    let (_temp, db) = setup_alphabet_db();
    let db = Arc::new(db);
    let (done_tx, done_rx) = mpsc::channel();

    let scanner = Arc::clone(&db);
    thread::spawn(move || {
        let mut writer = None;
        let mut values = Vec::new();
        let outcome = scanner.get_keys_below("B", |key| {
            if writer.is_none() {
                let db = Arc::clone(&scanner);
                writer = Some(thread::spawn(move || db.put("C", "7").unwrap()));
                // Give the writer time to queue behind the scan
                thread::sleep(Duration::from_millis(200));
            }
            values.push(scanner.get_string(key).unwrap().unwrap());
        });
        done_tx.send((outcome.is_ok(), values, writer)).unwrap();
    });

    let (completed, values, writer) = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("scan with in-callback reads did not finish");
    assert!(completed);
    assert_eq!(values, ["1", "2", "3"]);

    writer.unwrap().join().unwrap();
    assert_eq!(db.get_string("C").unwrap().as_deref(), Some("7"));
}
