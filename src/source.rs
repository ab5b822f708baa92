//! Scraping collaborator interface
//!
//! Site adapters live outside this crate. The storage and concurrency core
//! only ever sees them through this trait.

use crate::models::{Chapter, MetaData, Novel};

/// Everything known about a novel after one listing fetch
#[derive(Debug, Clone, Default)]
pub struct NovelListing {
    pub novel: Novel,
    pub chapters: Vec<Chapter>,
    pub metadata: Vec<MetaData>,
}

/// A novel source (one per site)
///
/// Errors are plain messages: the core never interprets them, it only
/// reports them next to the item that failed.
pub trait NovelSource: Send + Sync {
    /// Fetch novel details, chapter index and metadata from `url`
    fn fetch(&self, url: &str) -> Result<NovelListing, String>;

    /// Fetch one chapter's content; the returned chapter carries the payload
    fn fetch_content(&self, chapter: Chapter) -> Result<Chapter, String>;
}
