mod common;

use chrono::Utc;
use file_store::content::hash_bytes;
use file_store::storage::models::FileRecord;
use file_store::storage::Ledger;
use file_store::StoreError;

const OBJECT: &str = "photos|42|avatar";

fn record(ledger: &Ledger, content: &[u8]) -> String {
    let hash = hash_bytes(content);
    ledger
        .put_file_record(
            None,
            &FileRecord {
                hash: hash.clone(),
                content_type: "image/png".to_string(),
                byte_size: content.len() as u64,
                created_at: Utc::now(),
            },
        )
        .unwrap();
    hash
}

#[test]
fn test_put_file_record_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let hash = record(&ledger, b"one");

    let again = FileRecord {
        hash: hash.clone(),
        content_type: "text/plain".to_string(),
        byte_size: 3,
        created_at: Utc::now(),
    };
    assert!(!ledger.put_file_record(None, &again).unwrap());

    let stored = ledger.file_record(None, &hash).unwrap().expect("record should exist");
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(stored.byte_size, 3);
}

#[test]
fn test_check_file_lists_missing_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let present = record(&ledger, b"present");
    let absent = hash_bytes(b"absent");

    ledger.check_file(None, &[&present]).unwrap();
    let err = ledger
        .check_file(None, &[&present, &absent, &absent])
        .unwrap_err();
    assert!(matches!(err, StoreError::FileNotExists(ref missing) if *missing == vec![absent.clone()]));
    assert!(err.is_file_not_exists());
}

#[test]
fn test_link_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");

    ledger.link(None, OBJECT, &[&h1]).unwrap();
    ledger.link(None, OBJECT, &[&h1]).unwrap();

    assert_eq!(ledger.files_of(None, OBJECT).unwrap(), vec![h1]);
}

#[test]
fn test_link_missing_file_creates_no_link() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let missing = hash_bytes(b"never stored");

    let err = ledger.link(None, OBJECT, &[&h1, &missing]).unwrap_err();
    assert!(err.is_file_not_exists());
    assert!(ledger.files_of(None, OBJECT).unwrap().is_empty());
    assert!(!ledger.linked(None, OBJECT, &h1).unwrap());
}

#[test]
fn test_link_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");

    assert!(matches!(
        ledger.link(None, "", &[&h1]).unwrap_err(),
        StoreError::EmptyObject
    ));
    assert!(matches!(
        ledger.link(None, OBJECT, &["not-a-hash"]).unwrap_err(),
        StoreError::InvalidHash(ref h) if h == "not-a-hash"
    ));
    assert!(matches!(
        ledger.linked(None, OBJECT, "ABC").unwrap_err(),
        StoreError::InvalidHash(_)
    ));

    // No files is a no-op, not an error
    let none: [&str; 0] = [];
    ledger.link(None, OBJECT, &none).unwrap();
    ledger.unlink(None, OBJECT, &none).unwrap();
}

#[test]
fn test_files_of_keeps_link_order() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let hashes: Vec<String> = [b"c".as_slice(), b"a", b"b", b"d"]
        .iter()
        .map(|c| record(&ledger, c))
        .collect();

    ledger.link(None, OBJECT, &hashes[..2]).unwrap();
    ledger.link(None, OBJECT, &hashes[2..]).unwrap();

    assert_eq!(ledger.files_of(None, OBJECT).unwrap(), hashes);
}

#[test]
fn test_link_only_replaces_links() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let h2 = record(&ledger, b"two");

    ledger.link(None, OBJECT, &[&h1]).unwrap();
    ledger.link_only(None, OBJECT, &[&h2]).unwrap();

    assert_eq!(ledger.files_of(None, OBJECT).unwrap(), vec![h2.clone()]);
    assert!(!ledger.linked(None, OBJECT, &h1).unwrap());
    assert!(ledger.linked(None, OBJECT, &h2).unwrap());
}

#[test]
fn test_link_only_failure_keeps_existing_links() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let missing = hash_bytes(b"missing");

    ledger.link(None, OBJECT, &[&h1]).unwrap();
    assert!(ledger.link_only(None, OBJECT, &[&missing]).is_err());

    assert_eq!(ledger.files_of(None, OBJECT).unwrap(), vec![h1]);
}

#[test]
fn test_link_only_with_no_files_unlinks_all() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let h2 = record(&ledger, b"two");

    ledger.link(None, OBJECT, &[&h1, &h2]).unwrap();
    let none: [&str; 0] = [];
    ledger.link_only(None, OBJECT, &none).unwrap();

    assert!(ledger.files_of(None, OBJECT).unwrap().is_empty());
}

#[test]
fn test_unlink_all_of_leaves_other_objects() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let other = "photos|43|avatar";

    ledger.link(None, OBJECT, &[&h1]).unwrap();
    ledger.link(None, other, &[&h1]).unwrap();
    ledger.unlink_all_of(None, OBJECT).unwrap();

    assert!(ledger.files_of(None, OBJECT).unwrap().is_empty());
    assert_eq!(ledger.files_of(None, other).unwrap(), vec![h1.clone()]);
    assert!(ledger.file_record(None, &h1).unwrap().is_some());
}

#[test]
fn test_object_prefixes_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let h2 = record(&ledger, b"two");

    ledger.link(None, "users|1", &[&h1]).unwrap();
    ledger.link(None, "users|10", &[&h2]).unwrap();

    assert_eq!(ledger.files_of(None, "users|1").unwrap(), vec![h1]);
    ledger.unlink_all_of(None, "users|1").unwrap();
    assert_eq!(ledger.files_of(None, "users|10").unwrap(), vec![h2]);
}

#[test]
fn test_unlink_ignores_unlinked_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let h2 = record(&ledger, b"two");

    ledger.link(None, OBJECT, &[&h1, &h2]).unwrap();
    ledger.unlink(None, OBJECT, &[&h1, &hash_bytes(b"never linked")]).unwrap();

    assert_eq!(ledger.files_of(None, OBJECT).unwrap(), vec![h2]);
}

#[test]
fn test_ensure_linked() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");

    let err = ledger.ensure_linked(None, OBJECT, &h1).unwrap_err();
    assert!(err.is_not_linked());
    assert!(!ledger.linked(None, OBJECT, &h1).unwrap());

    ledger.link(None, OBJECT, &[&h1]).unwrap();
    ledger.ensure_linked(None, OBJECT, &h1).unwrap();
}

#[test]
fn test_operations_compose_in_caller_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");
    let h2 = record(&ledger, b"two");

    let txn = ledger.database().begin_write().unwrap();
    ledger.link(Some(&txn), OBJECT, &[&h1, &h2]).unwrap();
    ledger.unlink(Some(&txn), OBJECT, &[&h1]).unwrap();
    assert_eq!(ledger.files_of(Some(&txn), OBJECT).unwrap(), vec![h2.clone()]);

    // Not visible until the caller commits
    assert!(ledger.files_of(None, OBJECT).unwrap().is_empty());
    txn.commit().unwrap();
    assert_eq!(ledger.files_of(None, OBJECT).unwrap(), vec![h2]);
}

#[test]
fn test_aborted_caller_transaction_discards_links() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = common::test_ledger(&dir);
    let h1 = record(&ledger, b"one");

    let txn = ledger.database().begin_write().unwrap();
    ledger.link(Some(&txn), OBJECT, &[&h1]).unwrap();
    txn.abort().unwrap();

    assert!(!ledger.linked(None, OBJECT, &h1).unwrap());
}

#[test]
fn test_ledgers_with_distinct_tables_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::test_db(&dir);
    let avatars = Ledger::open(db.clone(), "avatar_links", "avatar_files").unwrap();
    let docs = Ledger::open(db, "doc_links", "doc_files").unwrap();

    let h1 = record(&avatars, b"one");
    avatars.link(None, OBJECT, &[&h1]).unwrap();

    assert!(docs.file_record(None, &h1).unwrap().is_none());
    assert!(docs.link(None, OBJECT, &[&h1]).unwrap_err().is_file_not_exists());
}
