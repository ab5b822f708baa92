//! Database Module
//!
//! Composes one shared store, the decoupled pending store and one table per
//! region for a single novel directory.
//!
//! ## Responsibilities
//! - Prepare the working directory (create on request)
//! - Bind each table to its own region name
//! - Load every table on open
//! - Release both store handles on close

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::models::{Chapter, MetaData, Novel};
use crate::store::Store;
use crate::table::{
    DecoupledTable, ExternalTable, KeyValueTable, NamingScheme, SetTable, SingleRecordTable, Table,
};

/// All persisted data of one novel
///
/// Tables are plain fields: the database owns them and they never outlive
/// it. `close()` consumes the database so no table can be used afterwards.
pub struct NovelData {
    config: Config,
    store: Arc<Store>,

    /// Novel details (single record)
    pub novel: SingleRecordTable<Novel>,

    /// Metadata name/value pairs
    pub metadata: SetTable,

    /// Chapter index, payloads in `{data_dir}/{chapters_dir}/`
    pub chapters: ExternalTable<Chapter>,

    /// Chapters not yet downloaded (private store file)
    pub pending: DecoupledTable<Chapter>,

    /// Miscellaneous settings
    pub misc: KeyValueTable,
}

impl NovelData {
    // =========================================================================
    // Region Names
    // =========================================================================
    pub const NOVEL: &'static str = "novel";
    pub const METADATA: &'static str = "metadata";
    pub const CHAPTERS: &'static str = "chapters";
    pub const PENDING: &'static str = "pending";
    pub const MISC: &'static str = "misc";

    /// Open (or create) the novel directory described by `config`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let dir = config.data_dir.clone();
        let store = Arc::new(Store::open(&dir, &config.store_file, config.should_create)?);

        let mut novel: SingleRecordTable<Novel> =
            SingleRecordTable::new(Arc::clone(&store), Self::NOVEL, Novel::FIELDS)?;
        let mut metadata = SetTable::new(Arc::clone(&store), Self::METADATA, "name", "value")?;
        let mut chapters: ExternalTable<Chapter> =
            ExternalTable::new(Arc::clone(&store), Self::CHAPTERS, Chapter::FIELDS, "url")?
                .with_payload(
                    "paragraphs",
                    dir.join(&config.chapters_dir),
                    NamingScheme::zero_padded(config.payload_width),
                )
                .with_load_payload(config.load_chapters);
        let mut pending: DecoupledTable<Chapter> = DecoupledTable::open(
            &dir,
            &config.pending_file,
            Self::PENDING,
            Chapter::PENDING_FIELDS,
            "url",
        )?;
        let mut misc = KeyValueTable::new(Arc::clone(&store), Self::MISC)?;

        novel.load()?;
        metadata.load()?;
        chapters.load()?;
        pending.load()?;
        misc.load()?;

        tracing::info!(
            "Opened novel data at {} (chapters={}, pending={})",
            dir.display(),
            chapters.len(),
            pending.len()
        );

        Ok(Self {
            config,
            store,
            novel,
            metadata,
            chapters,
            pending,
            misc,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path, should_create: bool) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .should_create(should_create)
            .build();
        Self::open(config)
    }

    /// Metadata as typed records
    pub fn metadata_records(&self) -> Result<Vec<MetaData>> {
        Ok(self
            .metadata
            .parse()?
            .into_iter()
            .map(MetaData::from)
            .collect())
    }

    /// Release the pending store, then the shared store
    pub fn close(self) -> Result<()> {
        self.pending.close();
        self.store.close();
        tracing::debug!("Closed novel data at {}", self.config.data_dir.display());
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
