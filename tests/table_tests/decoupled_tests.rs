//! Tests for DecoupledTable
//!
//! These tests verify:
//! - The index lives in its own store file
//! - Closing or dropping the private store never touches the shared store
//! - Operations after close fail fast

use std::sync::Arc;

use novelstore::store::Store;
use novelstore::table::{DecoupledTable, SingleRecordTable};
use novelstore::{Chapter, Novel, NovelError, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_pending(temp: &TempDir) -> DecoupledTable<Chapter> {
    DecoupledTable::open(
        temp.path(),
        "pending.db",
        "pending",
        Chapter::PENDING_FIELDS,
        "url",
    )
    .unwrap()
}

fn shared_novel(temp: &TempDir) -> SingleRecordTable<Novel> {
    let store = Arc::new(Store::open(temp.path(), "data.db", false).unwrap());
    SingleRecordTable::new(store, "novel", Novel::FIELDS).unwrap()
}

fn pending_chapters(n: i64) -> Vec<Chapter> {
    (0..n)
        .map(|i| {
            Chapter::new(i, format!("https://example.com/c/{}", i)).with_title(format!("C{}", i))
        })
        .collect()
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_roundtrip_in_private_file() {
    let temp = TempDir::new().unwrap();

    {
        let mut pending = open_pending(&temp);
        pending.set(pending_chapters(3)).unwrap();
        pending.save().unwrap();
        assert_eq!(pending.path(), temp.path().join("pending.db"));
    }

    // Nothing of the pending index lands in the shared store
    let shared = Store::open(temp.path(), "data.db", false).unwrap();
    assert!(shared.region("pending").unwrap().is_empty());

    let mut pending = open_pending(&temp);
    pending.load().unwrap();
    assert_eq!(pending.parse().unwrap(), pending_chapters(3));
}

#[test]
fn test_payload_field_is_not_stored_for_pending() {
    let temp = TempDir::new().unwrap();
    let mut pending = open_pending(&temp);

    let mut chapter = Chapter::new(0, "https://example.com/c/0");
    chapter.paragraphs = Some("should not persist".to_string());
    pending.put(&chapter).unwrap();

    let mut reloaded = open_pending(&temp);
    reloaded.load().unwrap();
    assert_eq!(reloaded.get(&chapter.url).unwrap().unwrap().paragraphs, None);
}

// =============================================================================
// Isolation Tests
// =============================================================================

#[test]
fn test_drop_backing_leaves_shared_store_intact() {
    let temp = TempDir::new().unwrap();

    let mut novel = shared_novel(&temp);
    novel
        .put(&Novel {
            title: Some("A".to_string()),
            ..Novel::default()
        })
        .unwrap();

    let mut pending = open_pending(&temp);
    pending.set(pending_chapters(2)).unwrap();
    pending.save().unwrap();

    pending.drop_backing().unwrap();

    assert!(!temp.path().join("pending.db").exists());
    assert!(temp.path().join("data.db").exists());
    assert!(pending.is_empty());

    let mut reloaded = shared_novel(&temp);
    reloaded.load().unwrap();
    assert_eq!(reloaded.require().unwrap().title.as_deref(), Some("A"));
}

#[test]
fn test_close_leaves_shared_store_usable() {
    let temp = TempDir::new().unwrap();

    let mut novel = shared_novel(&temp);
    let pending = open_pending(&temp);

    pending.close();
    assert!(pending.is_closed());

    novel.put(&Novel::default()).unwrap();
    novel.load().unwrap();
}

#[test]
fn test_operations_after_close_fail() {
    let temp = TempDir::new().unwrap();
    let mut pending = open_pending(&temp);

    pending.close();

    assert!(matches!(pending.load(), Err(NovelError::StoreClosed(_))));
    assert!(matches!(
        pending.put(&Chapter::new(0, "u")),
        Err(NovelError::StoreClosed(_))
    ));
}

#[test]
fn test_reopen_after_drop_backing_starts_empty() {
    let temp = TempDir::new().unwrap();
    {
        let mut pending = open_pending(&temp);
        pending.set(pending_chapters(2)).unwrap();
        pending.save().unwrap();
        pending.drop_backing().unwrap();
    }

    let mut pending = open_pending(&temp);
    pending.load().unwrap();
    assert!(pending.is_empty());
}
