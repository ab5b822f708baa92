//! Tests for NovelData
//!
//! These tests verify:
//! - Directory lifecycle and configuration validation
//! - Every table round-trips through a reopen
//! - close() releases both store handles
//! - The pending → controller → chapters flow end to end

use std::sync::Arc;

use novelstore::store::Store;
use novelstore::{
    Chapter, ConcurrentActionsController, Config, MetaData, Novel, NovelData, NovelError, Table,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(temp: &TempDir) -> Config {
    Config::builder().data_dir(temp.path().join("novel")).build()
}

fn sample_novel() -> Novel {
    Novel {
        title: Some("A".to_string()),
        author: Some("B".to_string()),
        url: Some("https://example.com/novel".to_string()),
        ..Novel::default()
    }
}

fn chapter(index: i64) -> Chapter {
    Chapter::new(index, format!("https://example.com/c/{}", index))
        .with_title(format!("Chapter {}", index))
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_creates_layout() {
    let temp = TempDir::new().unwrap();
    let data = NovelData::open(config_for(&temp)).unwrap();

    let dir = temp.path().join("novel");
    assert!(dir.is_dir());
    assert!(dir.join("data.db").exists());
    assert!(dir.join("pending.db").exists());
    assert_eq!(data.data_dir(), dir.as_path());

    data.close().unwrap();
}

#[test]
fn test_open_missing_without_create_fails() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path().join("missing"))
        .should_create(false)
        .build();

    let result = NovelData::open(config);

    assert!(matches!(result, Err(NovelError::Directory { .. })));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .pending_file("data.db")
        .build();

    assert!(matches!(NovelData::open(config), Err(NovelError::Config(_))));
}

#[test]
fn test_close_releases_shared_store() {
    let temp = TempDir::new().unwrap();
    let data = NovelData::open(config_for(&temp)).unwrap();
    let store: Arc<Store> = Arc::clone(data.store());

    data.close().unwrap();

    assert!(store.is_closed());
    assert!(matches!(
        store.get("novel", "title"),
        Err(NovelError::StoreClosed(_))
    ));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_all_tables_survive_reopen() {
    let temp = TempDir::new().unwrap();

    {
        let mut data = NovelData::open(config_for(&temp)).unwrap();
        data.novel.put(&sample_novel()).unwrap();
        data.metadata
            .put(vec![("tag".to_string(), "fantasy".to_string())])
            .unwrap();
        data.chapters.put(&chapter(0)).unwrap();
        data.pending.put(&chapter(1)).unwrap();
        data.misc.put("url", "https://example.com/novel").unwrap();
        data.close().unwrap();
    }

    let data = NovelData::open(config_for(&temp)).unwrap();
    assert_eq!(data.novel.require().unwrap(), sample_novel());
    assert_eq!(
        data.metadata_records().unwrap(),
        vec![MetaData::new("tag", "fantasy")]
    );
    assert_eq!(data.chapters.parse().unwrap(), vec![chapter(0)]);
    assert_eq!(data.pending.parse().unwrap(), vec![chapter(1)]);
    assert_eq!(data.misc.get("url"), Some("https://example.com/novel"));
}

#[test]
fn test_lazy_open_skips_payloads() {
    let temp = TempDir::new().unwrap();
    {
        let mut data = NovelData::open(config_for(&temp)).unwrap();
        let mut c = chapter(0);
        c.paragraphs = Some("text".to_string());
        data.chapters.put(&c).unwrap();
        data.close().unwrap();
    }

    let config = Config::builder()
        .data_dir(temp.path().join("novel"))
        .load_chapters(false)
        .build();
    let data = NovelData::open(config).unwrap();

    let chapters = data.chapters.parse().unwrap();
    assert_eq!(chapters[0].paragraphs, None);
    assert!(data.chapters.has_payload(&chapters[0]));
}

#[test]
fn test_dropping_pending_keeps_everything_else() {
    let temp = TempDir::new().unwrap();
    let mut data = NovelData::open(config_for(&temp)).unwrap();
    data.novel.put(&sample_novel()).unwrap();
    data.chapters.put(&chapter(0)).unwrap();
    data.pending.put(&chapter(1)).unwrap();

    data.pending.drop_backing().unwrap();
    data.close().unwrap();

    let data = NovelData::open(config_for(&temp)).unwrap();
    assert_eq!(data.novel.require().unwrap(), sample_novel());
    assert_eq!(data.chapters.len(), 1);
    assert!(data.pending.is_empty());
}

// =============================================================================
// End-to-end Scenario
// =============================================================================

#[test]
fn test_pending_chapters_through_controller() {
    let temp = TempDir::new().unwrap();
    let mut data = NovelData::open(config_for(&temp)).unwrap();

    data.novel.put(&sample_novel()).unwrap();
    let pending: Vec<Chapter> = (0..5).map(chapter).collect();
    data.pending.set(pending.clone()).unwrap();
    data.pending.save().unwrap();
    data.chapters.set(pending.clone()).unwrap();
    data.chapters.save().unwrap();

    let mut controller = ConcurrentActionsController::new(5, |mut c: Chapter| {
        c.paragraphs = Some(format!("content-{}", c.index));
        Ok::<_, String>(c)
    });
    for c in data.pending.parse().unwrap() {
        controller.add(c).unwrap();
    }

    // Single writer: results persisted from the consuming thread only
    for outcome in controller.iter() {
        let fetched = outcome.result.unwrap();
        data.chapters.update_payload(&fetched).unwrap();
        data.pending.remove(&outcome.item.url).unwrap();
    }
    data.close().unwrap();

    let data = NovelData::open(config_for(&temp)).unwrap();
    let chapters = data.chapters.parse().unwrap();
    assert_eq!(chapters.len(), 5);
    for (i, c) in chapters.iter().enumerate() {
        assert_eq!(c.index, i as i64);
        assert_eq!(c.paragraphs.as_deref(), Some(format!("content-{}", i).as_str()));
    }
    assert!(data.pending.is_empty());
}
