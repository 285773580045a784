//! Tests for counts and range scans
//!
//! These tests verify:
//! - Ascending byte-order delivery for keys-only and key/value scans
//! - Exclusive bounds on above / below / between
//! - Reversed and equal bounds selecting nothing
//! - Counts agreeing with the number of scan deliveries
//! - Early stop after exactly one callback
//! - Non-ASCII keys ordering by their UTF-8 bytes

use std::ops::ControlFlow;

use kvbridge::{Config, Continuation, Database, KeyRange, ScanOutcome, View};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().path(temp_dir.path()).build();
    let db = Database::open("vsmap", &config).unwrap();
    (temp_dir, db)
}

/// A, AB, AC, B, BB, BC mapped to 1..=6
fn setup_alphabet_db() -> (TempDir, Database) {
    let (temp, db) = setup_temp_db();
    for (key, value) in [("A", "1"), ("AB", "2"), ("AC", "3"), ("B", "4"), ("BB", "5"), ("BC", "6")] {
        db.put(key, value).unwrap();
    }
    (temp, db)
}

fn text(view: View<'_>) -> String {
    view.to_str().unwrap().to_string()
}

fn collect_keys(db: &Database, range: KeyRange<'_>) -> String {
    let mut out = String::new();
    let outcome = db
        .scan_keys(range, |key| {
            out.push_str(&text(key));
            out.push(',');
        })
        .unwrap();
    assert_eq!(outcome, ScanOutcome::Completed);
    out
}

fn collect_entries(db: &Database, range: KeyRange<'_>) -> String {
    let mut out = String::new();
    db.scan(range, |key, value| {
        out.push_str(&format!("{},{}|", text(key), text(value)));
    })
    .unwrap();
    out
}

// =============================================================================
// Keys-Only Scan Tests
// =============================================================================

#[test]
fn test_get_keys() {
    let (_temp, db) = setup_temp_db();
    db.put("1", "one").unwrap();
    db.put("2", "two").unwrap();

    let mut keys = String::new();
    db.get_keys(|key| keys.push_str(&format!("<{}>,", text(key)))).unwrap();
    assert_eq!(keys, "<1>,<2>,");

    db.put("记!", "RR").unwrap();
    let mut keys = String::new();
    db.get_keys(|key| keys.push_str(&format!("<{}>,", text(key)))).unwrap();
    assert_eq!(keys, "<1>,<2>,<记!>,");
}

#[test]
fn test_get_keys_above() {
    let (_temp, db) = setup_alphabet_db();

    let mut keys = Vec::new();
    db.get_keys_above("B", |key| keys.push(text(key))).unwrap();
    assert_eq!(keys, ["BB", "BC"]);

    db.put("记!", "RR").unwrap();
    assert_eq!(collect_keys(&db, KeyRange::Above(b"")), "A,AB,AC,B,BB,BC,记!,");
}

#[test]
fn test_get_keys_below() {
    let (_temp, db) = setup_alphabet_db();

    let mut keys = Vec::new();
    db.get_keys_below("B", |key| keys.push(text(key))).unwrap();
    assert_eq!(keys, ["A", "AB", "AC"]);

    db.put("记!", "RR").unwrap();
    assert_eq!(
        collect_keys(&db, KeyRange::Below("\u{FFFF}".as_bytes())),
        "A,AB,AC,B,BB,BC,记!,"
    );
}

#[test]
fn test_get_keys_between() {
    let (_temp, db) = setup_alphabet_db();

    let mut keys = Vec::new();
    db.get_keys_between("A", "B", |key| keys.push(text(key))).unwrap();
    assert_eq!(keys, ["AB", "AC"]);

    db.put("记!", "RR").unwrap();
    assert_eq!(
        collect_keys(&db, KeyRange::Between(b"B", "\u{FFFF}".as_bytes())),
        "BB,BC,记!,"
    );
}

#[test]
fn test_get_keys_between_empty_ranges() {
    let (_temp, db) = setup_alphabet_db();

    let mut calls = 0;
    for (lower, upper) in [("", ""), ("A", "A"), ("B", "A")] {
        let outcome = db.get_keys_between(lower, upper, |_| calls += 1).unwrap();
        assert_eq!(outcome, ScanOutcome::Completed);
    }
    assert_eq!(calls, 0);
}

#[test]
fn test_keys_are_delivered_in_byte_order() {
    let (_temp, db) = setup_temp_db();
    for key in [&b"\xff"[..], b"b", b"\x00", b"a\x00", b"a", b""] {
        db.put(key, "v").unwrap();
    }

    let mut keys = Vec::new();
    db.get_keys(|key| keys.push(key.to_vec())).unwrap();

    let mut expected = keys.clone();
    expected.sort();
    assert_eq!(keys, expected);
    assert_eq!(keys.first().map(Vec::as_slice), Some(&b""[..]));
    assert_eq!(keys.last().map(Vec::as_slice), Some(&b"\xff"[..]));
}

// =============================================================================
// Key and Value Scan Tests
// =============================================================================

#[test]
fn test_get_all() {
    let (_temp, db) = setup_temp_db();
    db.put("1", "one").unwrap();
    db.put("2", "two").unwrap();

    let mut entries = String::new();
    db.get_all(|key, value| entries.push_str(&format!("<{}>,<{}>|", text(key), text(value))))
        .unwrap();
    assert_eq!(entries, "<1>,<one>|<2>,<two>|");

    db.put("记!", "RR").unwrap();
    assert_eq!(collect_entries(&db, KeyRange::All), "1,one|2,two|记!,RR|");
}

#[test]
fn test_get_above() {
    let (_temp, db) = setup_alphabet_db();

    let mut entries = String::new();
    db.get_above("B", |key, value| entries.push_str(&format!("{},{}|", text(key), text(value))))
        .unwrap();
    assert_eq!(entries, "BB,5|BC,6|");

    db.put("记!", "RR").unwrap();
    assert_eq!(
        collect_entries(&db, KeyRange::Above(b"")),
        "A,1|AB,2|AC,3|B,4|BB,5|BC,6|记!,RR|"
    );
}

#[test]
fn test_get_below() {
    let (_temp, db) = setup_alphabet_db();

    let mut entries = String::new();
    db.get_below("AC", |key, value| entries.push_str(&format!("{},{}|", text(key), text(value))))
        .unwrap();
    assert_eq!(entries, "A,1|AB,2|");

    db.put("记!", "RR").unwrap();
    assert_eq!(
        collect_entries(&db, KeyRange::Below("\u{FFFD}".as_bytes())),
        "A,1|AB,2|AC,3|B,4|BB,5|BC,6|记!,RR|"
    );
}

#[test]
fn test_get_between() {
    let (_temp, db) = setup_alphabet_db();

    let mut entries = String::new();
    db.get_between("A", "B", |key, value| entries.push_str(&format!("{},{}|", text(key), text(value))))
        .unwrap();
    assert_eq!(entries, "AB,2|AC,3|");

    db.put("记!", "RR").unwrap();
    assert_eq!(
        collect_entries(&db, KeyRange::Between(b"B", "\u{FFFD}".as_bytes())),
        "BB,5|BC,6|记!,RR|"
    );

    let mut calls = 0;
    db.get_between("", "", |_, _| calls += 1).unwrap();
    db.get_between("A", "A", |_, _| calls += 1).unwrap();
    db.get_between("B", "A", |_, _| calls += 1).unwrap();
    assert_eq!(calls, 0);
}

#[test]
fn test_binary_values_in_scan() {
    let (_temp, db) = setup_temp_db();
    db.put(b"A\0B", b"\0\x01\0").unwrap();

    let mut seen = Vec::new();
    db.get_all(|key, value| seen.push((key.to_vec(), value.to_vec()))).unwrap();

    assert_eq!(seen, vec![(b"A\0B".to_vec(), b"\0\x01\0".to_vec())]);
}

// =============================================================================
// Count Tests
// =============================================================================

#[test]
fn test_counts() {
    let (_temp, db) = setup_alphabet_db();
    db.put("BD", "7").unwrap();

    assert_eq!(db.count_all().unwrap(), 7);

    assert_eq!(db.count_above("").unwrap(), 7);
    assert_eq!(db.count_above("A").unwrap(), 6);
    assert_eq!(db.count_above("B").unwrap(), 3);
    assert_eq!(db.count_above("BC").unwrap(), 1);
    assert_eq!(db.count_above("BD").unwrap(), 0);
    assert_eq!(db.count_above("Z").unwrap(), 0);

    assert_eq!(db.count_below("").unwrap(), 0);
    assert_eq!(db.count_below("A").unwrap(), 0);
    assert_eq!(db.count_below("B").unwrap(), 3);
    assert_eq!(db.count_below("BD").unwrap(), 6);
    assert_eq!(db.count_below("ZZZZZ").unwrap(), 7);

    assert_eq!(db.count_between("", "ZZZZZ").unwrap(), 7);
    assert_eq!(db.count_between("", "A").unwrap(), 0);
    assert_eq!(db.count_between("", "B").unwrap(), 3);
    assert_eq!(db.count_between("A", "B").unwrap(), 2);
    assert_eq!(db.count_between("B", "ZZZZZ").unwrap(), 3);
}

#[test]
fn test_count_between_reversed_bounds() {
    let (_temp, db) = setup_alphabet_db();
    db.put("BD", "7").unwrap();

    for (lower, upper) in [("", ""), ("A", "A"), ("AC", "A"), ("B", "A"), ("BD", "A"), ("ZZZ", "B")] {
        assert_eq!(db.count_between(lower, upper).unwrap(), 0, "between {:?} and {:?}", lower, upper);
    }
    assert!(KeyRange::Between(b"B", b"A").is_empty());
    assert!(!KeyRange::Between(b"A", b"B").is_empty());
}

#[test]
fn test_count_matches_scan() {
    let (_temp, db) = setup_alphabet_db();

    let ranges = [
        KeyRange::All,
        KeyRange::Above(b"AB"),
        KeyRange::Below(b"BB"),
        KeyRange::Between(b"A", b"BC"),
        KeyRange::Between(b"BC", b"A"),
    ];
    for range in ranges {
        let mut delivered = 0;
        db.scan_keys(range, |_| delivered += 1).unwrap();
        assert_eq!(db.count(range).unwrap(), delivered, "range {:?}", range);
    }
}

#[test]
fn test_len_and_is_empty() {
    let (_temp, db) = setup_temp_db();
    assert!(db.is_empty().unwrap());

    db.put("key1", "value1").unwrap();
    db.put("key2", "value2").unwrap();

    assert_eq!(db.len().unwrap(), 2);
    assert!(!db.is_empty().unwrap());
}

// =============================================================================
// Early Stop Tests
// =============================================================================

#[test]
fn test_stop_after_first_key() {
    let (_temp, db) = setup_alphabet_db();

    let mut calls = 0;
    let outcome = db
        .get_keys(|_| {
            calls += 1;
            Continuation::Stop
        })
        .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(outcome, ScanOutcome::StoppedByUser);
    assert!(outcome.is_stopped());
}

#[test]
fn test_stop_after_first_entry() {
    let (_temp, db) = setup_alphabet_db();

    let mut seen = Vec::new();
    let outcome = db
        .get_above("A", |key, _| {
            seen.push(text(key));
            ControlFlow::Break(())
        })
        .unwrap();

    assert_eq!(seen, ["AB"]);
    assert_eq!(outcome, ScanOutcome::StoppedByUser);
}

#[test]
fn test_stop_with_bool() {
    let (_temp, db) = setup_alphabet_db();

    let mut keys = Vec::new();
    let outcome = db
        .get_keys(|key| {
            keys.push(text(key));
            keys.len() < 3
        })
        .unwrap();

    assert_eq!(keys, ["A", "AB", "AC"]);
    assert!(outcome.is_stopped());
}

#[test]
fn test_completed_scan_over_empty_db() {
    let (_temp, db) = setup_temp_db();

    let mut calls = 0;
    let outcome = db.get_all(|_, _| calls += 1).unwrap();

    assert_eq!(calls, 0);
    assert!(outcome.is_completed());
}
