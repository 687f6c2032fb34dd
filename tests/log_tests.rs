//! Tests for the command log backends
//!
//! These tests verify:
//! - Append then replay, in insertion order
//! - Continuation after reopen
//! - Trailing partial frames dropped, mid-log corruption fatal (file backend)
//! - The on-disk forms match the documented formats

use std::fs::OpenOptions;
use std::io::Write;

use rangekv::log::{DbLog, FileLog, LOG_FILE_NAME, MAX_FRAME_PAYLOAD};
use rangekv::{KvError, MutationRecord};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn put(key: &str, value: &str) -> MutationRecord {
    MutationRecord::Put {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn swap(key: &str, value: &str) -> MutationRecord {
    MutationRecord::Swap {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn delete(key: &str) -> MutationRecord {
    MutationRecord::Delete {
        key: key.to_string(),
    }
}

fn collect_file(log: &mut FileLog) -> Vec<MutationRecord> {
    let mut records = Vec::new();
    log.replay(|r| records.push(r)).unwrap();
    records
}

fn collect_db(log: &mut DbLog) -> Vec<MutationRecord> {
    let mut records = Vec::new();
    log.replay(|r| records.push(r)).unwrap();
    records
}

// =============================================================================
// File Backend
// =============================================================================

#[test]
fn test_file_append_then_replay_in_order() {
    let dir = TempDir::new().unwrap();
    let expected = vec![put("a", "1"), swap("a", "2"), delete("a"), put("b", "9")];

    {
        let mut log = FileLog::open(dir.path()).unwrap();
        for record in &expected {
            log.append(record).unwrap();
        }
    }

    let mut log = FileLog::open(dir.path()).unwrap();
    assert_eq!(collect_file(&mut log), expected);
}

#[test]
fn test_file_replay_of_missing_log_is_empty() {
    let dir = TempDir::new().unwrap();
    let mut log = FileLog::open(dir.path()).unwrap();
    assert!(collect_file(&mut log).is_empty());
}

#[test]
fn test_file_appends_continue_after_replay() {
    let dir = TempDir::new().unwrap();

    {
        let mut log = FileLog::open(dir.path()).unwrap();
        log.append(&put("first", "1")).unwrap();
    }

    {
        let mut log = FileLog::open(dir.path()).unwrap();
        log.replay(|_| {}).unwrap();
        log.append(&put("second", "2")).unwrap();
    }

    let mut log = FileLog::open(dir.path()).unwrap();
    assert_eq!(
        collect_file(&mut log),
        vec![put("first", "1"), put("second", "2")]
    );
}

#[test]
fn test_file_trailing_partial_frame_is_dropped() {
    let dir = TempDir::new().unwrap();

    {
        let mut log = FileLog::open(dir.path()).unwrap();
        log.append(&put("x", "1")).unwrap();
    }

    // Crash mid-append: a length prefix of 10 followed by only 3 payload bytes
    {
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(LOG_FILE_NAME))
            .unwrap();
        file.write_all(&10u32.to_be_bytes()).unwrap();
        file.write_all(b"abc").unwrap();
    }

    let mut log = FileLog::open(dir.path()).unwrap();
    assert_eq!(collect_file(&mut log), vec![put("x", "1")]);

    // The partial tail is gone; the next append is recoverable
    log.append(&put("y", "2")).unwrap();
    drop(log);

    let mut log = FileLog::open(dir.path()).unwrap();
    assert_eq!(collect_file(&mut log), vec![put("x", "1"), put("y", "2")]);
}

#[test]
fn test_file_bare_partial_length_prefix_is_dropped() {
    let dir = TempDir::new().unwrap();

    {
        let mut log = FileLog::open(dir.path()).unwrap();
        log.append(&put("x", "1")).unwrap();
    }

    {
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(LOG_FILE_NAME))
            .unwrap();
        file.write_all(&[0x00, 0x00]).unwrap();
    }

    let mut log = FileLog::open(dir.path()).unwrap();
    assert_eq!(collect_file(&mut log), vec![put("x", "1")]);
}

#[test]
fn test_file_oversized_frame_aborts_replay() {
    let dir = TempDir::new().unwrap();

    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(dir.path().join(LOG_FILE_NAME))
            .unwrap();
        file.write_all(&(MAX_FRAME_PAYLOAD as u32 + 1).to_be_bytes())
            .unwrap();
        file.write_all(&vec![0u8; MAX_FRAME_PAYLOAD + 1]).unwrap();
    }

    let mut log = FileLog::open(dir.path()).unwrap();
    let err = log.replay(|_| {}).unwrap_err();
    assert!(matches!(err, KvError::LogCorruption(_)));
}

#[test]
fn test_file_complete_garbage_frame_aborts_replay() {
    let dir = TempDir::new().unwrap();

    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(dir.path().join(LOG_FILE_NAME))
            .unwrap();
        let payload = br#"{"op":"merge","key":"a"}"#;
        file.write_all(&(payload.len() as u32).to_be_bytes()).unwrap();
        file.write_all(payload).unwrap();
    }

    let mut log = FileLog::open(dir.path()).unwrap();
    let err = log.replay(|_| {}).unwrap_err();
    assert!(matches!(err, KvError::LogCorruption(_)));
}

#[test]
fn test_file_replay_reads_hand_written_frames() {
    let dir = TempDir::new().unwrap();

    // A log produced by any conforming writer: 4-byte BE length + JSON text
    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(dir.path().join(LOG_FILE_NAME))
            .unwrap();
        for payload in [
            br#"{"op":"put","key":"alpha","value":"1"}"#.as_slice(),
            br#"{"op":"put","key":"beta","value":"2"}"#.as_slice(),
            br#"{"op":"delete","key":"alpha"}"#.as_slice(),
        ] {
            file.write_all(&(payload.len() as u32).to_be_bytes()).unwrap();
            file.write_all(payload).unwrap();
        }
    }

    let mut log = FileLog::open(dir.path()).unwrap();
    assert_eq!(
        collect_file(&mut log),
        vec![put("alpha", "1"), put("beta", "2"), delete("alpha")]
    );
}

#[test]
fn test_file_oversized_record_is_refused_and_leaves_log_clean() {
    let dir = TempDir::new().unwrap();

    let mut log = FileLog::open(dir.path()).unwrap();
    log.append(&put("small", "v")).unwrap();

    let err = log
        .append(&put("big", &"v".repeat(2 * MAX_FRAME_PAYLOAD)))
        .unwrap_err();
    assert!(matches!(err, KvError::RecordTooLarge(_)));

    // The failed append left no partial frame behind
    drop(log);
    let mut log = FileLog::open(dir.path()).unwrap();
    assert_eq!(collect_file(&mut log), vec![put("small", "v")]);
}

// =============================================================================
// Database Backend
// =============================================================================

#[test]
fn test_db_append_then_replay_in_order() {
    let dir = TempDir::new().unwrap();
    let expected = vec![put("a", "1"), swap("a", "2"), delete("a"), put("b", "9")];

    {
        let mut log = DbLog::open(dir.path()).unwrap();
        for record in &expected {
            log.append(record).unwrap();
        }
    }

    let mut log = DbLog::open(dir.path()).unwrap();
    assert_eq!(collect_db(&mut log), expected);
}

#[test]
fn test_db_replay_of_fresh_database_is_empty() {
    let dir = TempDir::new().unwrap();
    let mut log = DbLog::open(dir.path()).unwrap();
    assert!(collect_db(&mut log).is_empty());
}

#[test]
fn test_db_appends_continue_after_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let mut log = DbLog::open(dir.path()).unwrap();
        log.append(&put("first", "1")).unwrap();
        log.append(&delete("missing")).unwrap();
    }

    {
        let mut log = DbLog::open(dir.path()).unwrap();
        log.replay(|_| {}).unwrap();
        log.append(&put("second", "2")).unwrap();
    }

    let mut log = DbLog::open(dir.path()).unwrap();
    assert_eq!(
        collect_db(&mut log),
        vec![put("first", "1"), delete("missing"), put("second", "2")]
    );
}

#[test]
fn test_db_replay_visits_each_record_exactly_once() {
    let dir = TempDir::new().unwrap();

    let mut log = DbLog::open(dir.path()).unwrap();
    for i in 0..50 {
        log.append(&put(&format!("key{i:03}"), &i.to_string())).unwrap();
    }

    let records = collect_db(&mut log);
    assert_eq!(records.len(), 50);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.key(), format!("key{i:03}"));
    }
}

// =============================================================================
// Backend Equivalence
// =============================================================================

#[test]
fn test_both_backends_replay_the_same_sequence() {
    let file_dir = TempDir::new().unwrap();
    let db_dir = TempDir::new().unwrap();

    let records = vec![
        put("k1", "v1"),
        put("k1", "v2"),
        swap("k1", "v3"),
        swap("k2", "v9"),
        delete("k1"),
        delete("missing"),
    ];

    let mut file_log = FileLog::open(file_dir.path()).unwrap();
    let mut db_log = DbLog::open(db_dir.path()).unwrap();
    for record in &records {
        file_log.append(record).unwrap();
        db_log.append(record).unwrap();
    }

    assert_eq!(collect_file(&mut file_log), records);
    assert_eq!(collect_db(&mut db_log), records);
}
