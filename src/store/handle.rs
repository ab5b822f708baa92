//! Store handle
//!
//! One handle per store file. Every read goes to disk, so two handles on the
//! same file always observe each other's committed writes.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{NovelError, Result};

use super::format::{self, Regions};

/// Mutable handle state
#[derive(Default)]
struct State {
    closed: bool,
    claimed: HashSet<String>,
}

/// Handle to one store file inside a working directory
///
/// ## Concurrency:
/// - `state` mutex serializes read-modify-write commits within this handle
/// - No cross-process locking: a store file has one writer at a time
pub struct Store {
    /// Working directory
    dir: PathBuf,

    /// Full path of the store file
    path: PathBuf,

    state: Mutex<State>,
}

/// Make sure `dir` exists and is a writable directory
///
/// Creation is idempotent when `should_create` is set; otherwise a missing
/// directory is a configuration error.
pub fn prepare_dir(dir: &Path, should_create: bool) -> Result<()> {
    let directory_error = |reason: &str| NovelError::Directory {
        path: dir.to_path_buf(),
        reason: reason.to_string(),
    };

    if !dir.exists() {
        if !should_create {
            return Err(directory_error("does not exist"));
        }
        fs::create_dir_all(dir).map_err(|e| directory_error(&e.to_string()))?;
        tracing::debug!("Created directory {}", dir.display());
    }

    let metadata = fs::metadata(dir).map_err(|e| directory_error(&e.to_string()))?;
    if !metadata.is_dir() {
        return Err(directory_error("not a directory"));
    }
    if metadata.permissions().readonly() {
        return Err(directory_error("not writable"));
    }

    Ok(())
}

impl Store {
    /// Open (or create) the store file `file_name` inside `dir`
    pub fn open(dir: &Path, file_name: &str, should_create: bool) -> Result<Self> {
        prepare_dir(dir, should_create)?;

        let path = dir.join(file_name);
        if path.exists() {
            // Validate eagerly so a corrupt file is reported at open time
            let regions = format::read_file(&path)?;
            tracing::debug!(
                "Opened store {} ({} regions)",
                path.display(),
                regions.len()
            );
        } else {
            format::write_file(&path, &Regions::new()).map_err(|e| NovelError::Directory {
                path: dir.to_path_buf(),
                reason: format!("cannot create store file: {}", e),
            })?;
            tracing::debug!("Created store {}", path.display());
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            path,
            state: Mutex::new(State::default()),
        })
    }

    /// Reserve a region name for one table
    ///
    /// Fails if another table on this handle already claimed it.
    pub fn claim(&self, region: &str) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_open(&state, &self.path)?;
        if !state.claimed.insert(region.to_string()) {
            return Err(NovelError::Config(format!(
                "region '{}' already claimed in {}",
                region,
                self.path.display()
            )));
        }
        Ok(())
    }

    /// Get one value
    pub fn get(&self, region: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let state = self.state.lock();
        Self::check_open(&state, &self.path)?;
        let mut regions = format::read_file(&self.path)?;
        Ok(regions
            .get_mut(region)
            .and_then(|entries| entries.remove(key)))
    }

    /// Read a whole region; a missing region is empty
    pub fn region(&self, region: &str) -> Result<BTreeMap<String, Vec<u8>>> {
        let state = self.state.lock();
        Self::check_open(&state, &self.path)?;
        let mut regions = format::read_file(&self.path)?;
        Ok(regions.remove(region).unwrap_or_default())
    }

    /// Names of all non-empty regions
    pub fn regions(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        Self::check_open(&state, &self.path)?;
        Ok(format::read_file(&self.path)?.into_keys().collect())
    }

    /// Put one value
    pub fn put(&self, region: &str, key: &str, value: Vec<u8>) -> Result<()> {
        tracing::trace!("put {}/{} in {}", region, key, self.path.display());
        self.commit(|regions| {
            regions
                .entry(region.to_string())
                .or_default()
                .insert(key.to_string(), value);
        })
    }

    /// Delete one value; returns whether it existed
    pub fn delete(&self, region: &str, key: &str) -> Result<bool> {
        tracing::trace!("delete {}/{} in {}", region, key, self.path.display());
        let mut existed = false;
        self.commit(|regions| {
            if let Some(entries) = regions.get_mut(region) {
                existed = entries.remove(key).is_some();
                if entries.is_empty() {
                    regions.remove(region);
                }
            }
        })?;
        Ok(existed)
    }

    /// Replace a whole region in one commit
    pub fn replace_region(&self, region: &str, entries: BTreeMap<String, Vec<u8>>) -> Result<()> {
        tracing::debug!(
            "Writing region '{}' ({} entries) to {}",
            region,
            entries.len(),
            self.path.display()
        );
        self.commit(|regions| {
            if entries.is_empty() {
                regions.remove(region);
            } else {
                regions.insert(region.to_string(), entries);
            }
        })
    }

    /// Release the handle; later operations fail with `StoreClosed`
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            state.claimed.clear();
            tracing::debug!("Closed store {}", self.path.display());
        }
    }

    /// Close the handle and delete its backing file
    pub fn remove(&self) -> Result<()> {
        self.close();
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Removed store {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Full path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Working directory containing the store file
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Read, mutate and atomically rewrite the store file
    fn commit<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Regions),
    {
        let state = self.state.lock();
        Self::check_open(&state, &self.path)?;

        let mut regions = format::read_file(&self.path)?;
        mutate(&mut regions);
        format::write_file(&self.path, &regions)
    }

    fn check_open(state: &State, path: &Path) -> Result<()> {
        if state.closed {
            return Err(NovelError::StoreClosed(path.to_path_buf()));
        }
        Ok(())
    }
}
