//! Tests for SingleRecordTable
//!
//! These tests verify:
//! - set/save/load/parse round-trip through a fresh handle
//! - Empty tables parse to None, require() reports NotFound
//! - Whole-record overwrite
//! - Declared-field filtering (unknown fields ignored, missing fields default)

use std::sync::Arc;

use novelstore::store::Store;
use novelstore::table::SingleRecordTable;
use novelstore::{Novel, NovelError, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_store(temp: &TempDir) -> Arc<Store> {
    Arc::new(Store::open(temp.path(), "data.db", false).unwrap())
}

fn sample_novel() -> Novel {
    Novel {
        title: Some("A".to_string()),
        author: Some("B".to_string()),
        synopsis: Some("A story".to_string()),
        thumbnail: None,
        lang: Some("en".to_string()),
        meta_source: None,
        url: Some("https://example.com/novel".to_string()),
    }
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_roundtrip_through_new_handle() {
    let temp = TempDir::new().unwrap();

    {
        let mut table: SingleRecordTable<Novel> =
            SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();
        table.set(sample_novel()).unwrap();
        table.save().unwrap();
    }

    let mut table: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();
    table.load().unwrap();

    assert_eq!(table.parse().unwrap(), Some(sample_novel()));
}

#[test]
fn test_save_twice_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let mut table: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();

    table.set(sample_novel()).unwrap();
    table.save().unwrap();
    table.save().unwrap();

    let mut reloaded: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();
    reloaded.load().unwrap();
    assert_eq!(reloaded.parse().unwrap(), Some(sample_novel()));
}

// =============================================================================
// Empty Table Tests
// =============================================================================

#[test]
fn test_empty_table_parses_to_none() {
    let temp = TempDir::new().unwrap();
    let mut table: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();

    table.load().unwrap();

    assert!(table.is_empty());
    assert_eq!(table.parse().unwrap(), None);
    assert!(matches!(table.require(), Err(NovelError::NotFound(_))));
}

// =============================================================================
// Overwrite Tests
// =============================================================================

#[test]
fn test_overwrite_replaces_whole_record() {
    let temp = TempDir::new().unwrap();
    let mut table: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();

    table.put(&sample_novel()).unwrap();
    table
        .put(&Novel {
            title: Some("C".to_string()),
            ..Novel::default()
        })
        .unwrap();

    table.load().unwrap();
    let novel = table.require().unwrap();
    assert_eq!(novel.title.as_deref(), Some("C"));
    assert_eq!(novel.author, None);
}

// =============================================================================
// Field Filtering Tests
// =============================================================================

#[test]
fn test_unknown_stored_fields_are_ignored() {
    let temp = TempDir::new().unwrap();

    let mut wide: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();
    wide.put(&sample_novel()).unwrap();

    // A narrower schema only sees the fields it declares
    let mut narrow: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", &["title", "url"]).unwrap();
    narrow.load().unwrap();
    let novel = narrow.require().unwrap();

    assert_eq!(novel.title.as_deref(), Some("A"));
    assert_eq!(novel.url.as_deref(), Some("https://example.com/novel"));
    assert_eq!(novel.author, None);
    assert_eq!(novel.synopsis, None);
}

#[test]
fn test_missing_declared_fields_default() {
    let temp = TempDir::new().unwrap();

    let mut narrow: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", &["title"]).unwrap();
    narrow.put(&sample_novel()).unwrap();

    let mut wide: SingleRecordTable<Novel> =
        SingleRecordTable::new(open_store(&temp), "novel", Novel::FIELDS).unwrap();
    wide.load().unwrap();

    assert_eq!(
        wide.require().unwrap(),
        Novel {
            title: Some("A".to_string()),
            ..Novel::default()
        }
    );
}

#[test]
fn test_region_claimed_once_per_store() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);

    let _first: SingleRecordTable<Novel> =
        SingleRecordTable::new(Arc::clone(&store), "novel", Novel::FIELDS).unwrap();
    let second: novelstore::Result<SingleRecordTable<Novel>> =
        SingleRecordTable::new(store, "novel", Novel::FIELDS);

    assert!(matches!(second, Err(NovelError::Config(_))));
}
