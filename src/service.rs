//! Novel workflows
//!
//! Glue between a [`NovelSource`] and [`NovelData`]: create and update a
//! novel, then download its pending chapters through the actions controller.
//! Results are written back only from the thread draining the controller,
//! so the store always has a single writer.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::action::{BatchReport, ConcurrentActionsController};
use crate::database::NovelData;
use crate::error::{NovelError, Result};
use crate::models::{Chapter, MetaData, Novel};
use crate::source::NovelSource;
use crate::table::Table;

/// Misc key holding the novel's source url
pub const URL_KEY: &str = "url";

/// Runs novel workflows against one source
pub struct NovelService {
    source: Arc<dyn NovelSource>,
    max_workers: Option<usize>,
}

impl NovelService {
    pub fn new(source: Arc<dyn NovelSource>) -> Self {
        Self {
            source,
            max_workers: None,
        }
    }

    /// Cap download threads below available parallelism
    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Fetch a novel and store its details, metadata and chapter index
    ///
    /// Every chapter without a payload becomes pending. Running it again on
    /// a directory that already holds payload files keeps those chapters
    /// downloaded.
    pub fn create_novel(&self, data: &mut NovelData, url: &str) -> Result<Novel> {
        tracing::info!("Retrieving novel (url={})...", url);
        let listing = self.source.fetch(url).map_err(NovelError::Action)?;

        let mut novel = listing.novel;
        if novel.url.is_none() {
            novel.url = Some(url.to_string());
        }

        data.novel.put(&novel)?;
        data.metadata
            .put(listing.metadata.into_iter().map(<(String, String)>::from))?;
        data.misc.put(URL_KEY, url)?;

        let chapters = listing.chapters;
        let chapter_count = chapters.len();
        data.chapters.set(chapters.clone())?;
        data.chapters.save()?;

        // Payload files left by an earlier run still count as downloaded
        let pending: Vec<Chapter> = chapters
            .into_iter()
            .filter(|c| c.paragraphs.is_none() && !data.chapters.has_payload(c))
            .collect();
        data.pending.set(pending)?;
        data.pending.save()?;

        tracing::info!(
            "New novel (title={}, chapters={}, pending={})",
            novel.title.as_deref().unwrap_or("?"),
            chapter_count,
            data.pending.len()
        );
        Ok(novel)
    }

    /// Re-fetch from the stored url
    ///
    /// Novel details and metadata are replaced. Known chapters take their
    /// index from the fresh listing and keep their payload; new chapters are
    /// added and marked pending. Chapters the source no longer lists are kept
    /// after the listed ones, in their previous order.
    pub fn update_novel(&self, data: &mut NovelData) -> Result<Novel> {
        let url = self.stored_url(data)?;
        tracing::debug!("Using (url={})", url);
        let listing = self.source.fetch(&url).map_err(NovelError::Action)?;

        let mut novel = listing.novel;
        if novel.url.is_none() {
            novel.url = Some(url.clone());
        }
        data.novel.put(&novel)?;
        data.metadata
            .put(listing.metadata.into_iter().map(<(String, String)>::from))?;

        let mut known: BTreeMap<String, Chapter> = data
            .chapters
            .parse()?
            .into_iter()
            .map(|c| (c.url.clone(), c))
            .collect();
        let mut pending: BTreeMap<String, Chapter> = data
            .pending
            .parse()?
            .into_iter()
            .map(|c| (c.url.clone(), c))
            .collect();

        let mut chapters: Vec<Chapter> = Vec::with_capacity(listing.chapters.len());
        let mut added = 0usize;
        for chapter in listing.chapters {
            match known.remove(&chapter.url) {
                Some(mut existing) => {
                    existing.index = chapter.index;
                    existing.title = chapter.title;
                    existing.volume = chapter.volume;
                    chapters.push(existing);
                }
                None => {
                    added += 1;
                    pending.insert(chapter.url.clone(), chapter.without_payload());
                    chapters.push(chapter);
                }
            }
        }

        // Unlisted chapters go after the listed ones, in their previous order
        let mut next_index = chapters.iter().map(|c| c.index + 1).max().unwrap_or(0);
        let mut unlisted: Vec<Chapter> = known.into_values().collect();
        unlisted.sort_by_key(|c| c.index);
        for mut chapter in unlisted {
            chapter.index = next_index;
            next_index += 1;
            chapters.push(chapter);
        }

        for chapter in &chapters {
            if let Some(queued) = pending.get_mut(&chapter.url) {
                queued.index = chapter.index;
                queued.title = chapter.title.clone();
                queued.volume = chapter.volume.clone();
            }
        }

        data.chapters.set(chapters)?;
        data.chapters.save()?;
        data.pending.set(pending.into_values().collect())?;
        data.pending.save()?;

        tracing::info!(
            "Updated novel (title={}, new chapters={}, pending={})",
            novel.title.as_deref().unwrap_or("?"),
            added,
            data.pending.len()
        );
        Ok(novel)
    }

    /// Pending chapters in index order, at most `limit`
    pub fn pending_chapters(&self, data: &NovelData, limit: Option<usize>) -> Result<Vec<Chapter>> {
        let mut chapters = data.pending.parse()?;
        if let Some(limit) = limit {
            chapters.truncate(limit);
        }
        Ok(chapters)
    }

    /// Download pending chapters concurrently
    ///
    /// Each success is persisted as it streams out (payload, index entry,
    /// then removal from pending). Failed items stay pending and are listed
    /// in the report; a store failure aborts the batch.
    pub fn download_pending(
        &self,
        data: &mut NovelData,
        limit: Option<usize>,
    ) -> Result<BatchReport<Chapter>> {
        let chapters = self.pending_chapters(data, limit)?;
        let mut report = BatchReport::default();
        if chapters.is_empty() {
            tracing::warn!("Novel at {} has no pending chapters", data.data_dir().display());
            return Ok(report);
        }

        let source = Arc::clone(&self.source);
        let mut controller = ConcurrentActionsController::with_parallelism(
            self.max_workers,
            move |chapter: Chapter| source.fetch_content(chapter),
        );
        let count = chapters.len();
        for chapter in chapters {
            controller.add(chapter)?;
        }

        tracing::info!(
            "Downloading pending chapters (count={}, threads={})...",
            count,
            controller.worker_count()
        );

        for outcome in controller.iter() {
            match outcome.result {
                Ok(fetched) => {
                    Self::persist(data, &outcome.item, fetched)?;
                    report.record_success();
                }
                Err(e) => {
                    tracing::warn!("Chapter (url={}) failed: {}", outcome.item.url, e);
                    report.record_failure(outcome.item, e);
                }
            }
        }

        tracing::info!(
            "Download complete (succeeded={}, failed={})",
            report.succeeded,
            report.failed.len()
        );
        Ok(report)
    }

    /// Replace all metadata pairs
    pub fn replace_metadata(&self, data: &mut NovelData, metadata: Vec<MetaData>) -> Result<()> {
        data.metadata
            .put(metadata.into_iter().map(<(String, String)>::from))
    }

    /// Remove all metadata pairs
    pub fn remove_metadata(&self, data: &mut NovelData) -> Result<()> {
        data.metadata.put(Vec::new())
    }

    fn stored_url(&self, data: &NovelData) -> Result<String> {
        if let Some(url) = data.misc.get(URL_KEY) {
            return Ok(url.to_string());
        }
        data.novel
            .require()?
            .url
            .ok_or_else(|| NovelError::NotFound("novel url".to_string()))
    }

    /// Keyed by the pending item: the source cannot move a chapter
    fn persist(data: &mut NovelData, item: &Chapter, mut fetched: Chapter) -> Result<()> {
        fetched.index = item.index;
        fetched.url = item.url.clone();
        if fetched.title.is_none() {
            fetched.title = item.title.clone();
        }
        if fetched.volume.is_none() {
            fetched.volume = item.volume.clone();
        }

        data.chapters.update_payload(&fetched)?;
        data.pending.remove(&item.url)?;
        Ok(())
    }
}
