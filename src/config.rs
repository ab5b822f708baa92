//! Configuration for NovelStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{NovelError, Result};

/// Main configuration for a novel directory
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Directory Configuration
    // -------------------------------------------------------------------------
    /// Working directory holding everything for one novel
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── data.db          (shared store: novel, metadata, chapters index, misc)
    ///     ├── pending.db       (decoupled store: pending chapters index)
    ///     └── chapters/        (one payload file per downloaded chapter)
    pub data_dir: PathBuf,

    /// Create `data_dir` if it does not exist
    pub should_create: bool,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// File name of the shared store
    pub store_file: String,

    /// File name of the decoupled pending store
    pub pending_file: String,

    /// Directory (relative to `data_dir`) for chapter payload files
    pub chapters_dir: String,

    /// Zero-padding width used when naming payload files
    pub payload_width: usize,

    /// Read chapter payloads when the database is opened
    pub load_chapters: bool,

    // -------------------------------------------------------------------------
    // Controller Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on worker threads (None = available parallelism)
    pub max_workers: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./novel"),
            should_create: true,
            store_file: "data.db".to_string(),
            pending_file: "pending.db".to_string(),
            chapters_dir: "chapters".to_string(),
            payload_width: 4,
            load_chapters: true,
            max_workers: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.store_file.is_empty() || self.pending_file.is_empty() {
            return Err(NovelError::Config("store file names must not be empty".into()));
        }
        if self.store_file == self.pending_file {
            return Err(NovelError::Config(format!(
                "pending store must not share the main store file ({})",
                self.store_file
            )));
        }
        if self.chapters_dir.is_empty() {
            return Err(NovelError::Config("chapters_dir must not be empty".into()));
        }
        if self.payload_width == 0 {
            return Err(NovelError::Config("payload_width must be > 0".into()));
        }
        if self.max_workers == Some(0) {
            return Err(NovelError::Config("max_workers must be > 0".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the working directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Whether a missing directory is created on open
    pub fn should_create(mut self, create: bool) -> Self {
        self.config.should_create = create;
        self
    }

    /// Set the shared store file name
    pub fn store_file(mut self, name: impl Into<String>) -> Self {
        self.config.store_file = name.into();
        self
    }

    /// Set the pending store file name
    pub fn pending_file(mut self, name: impl Into<String>) -> Self {
        self.config.pending_file = name.into();
        self
    }

    /// Set the chapter payload directory name
    pub fn chapters_dir(mut self, name: impl Into<String>) -> Self {
        self.config.chapters_dir = name.into();
        self
    }

    /// Set the payload file name width
    pub fn payload_width(mut self, width: usize) -> Self {
        self.config.payload_width = width;
        self
    }

    /// Whether chapter payloads are read on open
    pub fn load_chapters(mut self, load: bool) -> Self {
        self.config.load_chapters = load;
        self
    }

    /// Cap the worker pool size
    pub fn max_workers(mut self, count: usize) -> Self {
        self.config.max_workers = Some(count);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
