// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bell_core::{BlastId, MemberId};
use chrono::DateTime;

fn claim_op(id: &str, member: &str) -> Operation {
    Operation::BlastClaim {
        id: BlastId(id.to_string()),
        member_id: MemberId(member.to_string()),
        at: DateTime::from_timestamp(1_767_225_600, 0).unwrap(),
    }
}

fn append_raw(path: &Path, text: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

#[test]
fn reopen_returns_logged_operations_and_continues_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");

    {
        let (mut wal, ops) = Wal::open(&path).unwrap();
        assert!(ops.is_empty());
        assert_eq!(wal.append(&claim_op("b-1", "alice")).unwrap(), 1);
        assert_eq!(wal.append(&claim_op("b-2", "bob")).unwrap(), 2);
    }

    let (mut wal, ops) = Wal::open(&path).unwrap();
    assert_eq!(ops, vec![claim_op("b-1", "alice"), claim_op("b-2", "bob")]);
    assert_eq!(wal.last_seq(), 2);
    assert_eq!(wal.append(&claim_op("b-3", "carol")).unwrap(), 3);
}

#[test]
fn replay_of_missing_file_is_empty() {
    let ops = Wal::replay(Path::new("/nonexistent/path/wal")).unwrap();
    assert!(ops.is_empty());
}

#[test]
fn blank_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    {
        let (mut wal, _) = Wal::open(&path).unwrap();
        wal.append(&claim_op("b-1", "alice")).unwrap();
    }
    append_raw(&path, "\n\n");

    assert_eq!(Wal::replay(&path).unwrap().len(), 1);
}

#[test]
fn corrupt_middle_line_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    {
        let (mut wal, _) = Wal::open(&path).unwrap();
        wal.append(&claim_op("b-1", "alice")).unwrap();
    }
    append_raw(&path, "{not json\n");

    let err = Wal::replay(&path).unwrap_err();
    assert!(matches!(err, WalError::Corrupt { line: 2, .. }), "{err}");
    assert!(Wal::open(&path).is_err());
}

#[test]
fn torn_tail_is_dropped_and_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    {
        let (mut wal, _) = Wal::open(&path).unwrap();
        wal.append(&claim_op("b-1", "alice")).unwrap();
    }
    let good_len = std::fs::metadata(&path).unwrap().len();
    append_raw(&path, r#"{"seq":2,"op":{"type":"blast:cl"#);

    let (mut wal, ops) = Wal::open(&path).unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);

    assert_eq!(wal.append(&claim_op("b-2", "bob")).unwrap(), 2);
    drop(wal);
    assert_eq!(Wal::replay(&path).unwrap().len(), 2);
}

#[test]
fn unterminated_final_entry_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    {
        let (mut wal, _) = Wal::open(&path).unwrap();
        wal.append(&claim_op("b-1", "alice")).unwrap();
    }
    // Strip the trailing newline from a valid entry
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.trim_end()).unwrap();

    let (mut wal, ops) = Wal::open(&path).unwrap();
    assert_eq!(ops.len(), 1);
    wal.append(&claim_op("b-2", "bob")).unwrap();
    drop(wal);

    assert_eq!(
        Wal::replay(&path).unwrap(),
        vec![claim_op("b-1", "alice"), claim_op("b-2", "bob")]
    );
}

#[test]
fn out_of_order_sequence_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    let entry = serde_json::to_string(&Entry {
        seq: 5,
        op: claim_op("b-1", "alice"),
    })
    .unwrap();
    std::fs::write(&path, format!("{entry}\n")).unwrap();

    let err = Wal::replay(&path).unwrap_err();
    assert!(
        matches!(err, WalError::OutOfOrder { line: 1, expected: 1, found: 5 }),
        "{err}"
    );
}

#[test]
fn torn_tail_split_inside_a_multibyte_character_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    {
        let (mut wal, _) = Wal::open(&path).unwrap();
        wal.append(&claim_op("b-1", "alice")).unwrap();
    }
    let good_len = std::fs::metadata(&path).unwrap().len();

    let entry = serde_json::to_vec(&Entry {
        seq: 2,
        op: claim_op("b-2", "J\u{fc}rgen"),
    })
    .unwrap();
    // Cut right after the first byte of the two-byte 'ü'
    let cut = entry.iter().position(|b| *b == 0xC3).unwrap() + 1;
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&entry[..cut]).unwrap();
    drop(file);

    let (mut wal, ops) = Wal::open(&path).unwrap();
    assert_eq!(ops, vec![claim_op("b-1", "alice")]);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);
    assert_eq!(wal.append(&claim_op("b-2", "J\u{fc}rgen")).unwrap(), 2);
    drop(wal);

    assert_eq!(
        Wal::replay(&path).unwrap(),
        vec![claim_op("b-1", "alice"), claim_op("b-2", "J\u{fc}rgen")]
    );
}

#[test]
fn failed_sync_is_rolled_back_and_sequence_reused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    let (mut wal, _) = Wal::open(&path).unwrap();
    wal.append(&claim_op("b-1", "alice")).unwrap();
    let len = std::fs::metadata(&path).unwrap().len();

    wal.fail_next_sync();
    let err = wal.append(&claim_op("b-2", "bob")).unwrap_err();
    assert!(matches!(err, WalError::Io(_)), "{err}");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
    assert_eq!(wal.last_seq(), 1);

    assert_eq!(wal.append(&claim_op("b-3", "carol")).unwrap(), 2);
    drop(wal);

    let (_, ops) = Wal::open(&path).unwrap();
    assert_eq!(ops, vec![claim_op("b-1", "alice"), claim_op("b-3", "carol")]);
}

#[test]
fn failed_rollback_refuses_further_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blasts.wal");
    let (mut wal, _) = Wal::open(&path).unwrap();
    wal.append(&claim_op("b-1", "alice")).unwrap();

    wal.fail_next_sync();
    wal.fail_next_rollback();
    assert!(matches!(
        wal.append(&claim_op("b-2", "bob")),
        Err(WalError::Io(_))
    ));

    let err = wal.append(&claim_op("b-3", "carol")).unwrap_err();
    assert!(matches!(err, WalError::Poisoned), "{err}");
}
