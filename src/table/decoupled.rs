//! Decoupled multi-record table
//!
//! Same shape as [`ExternalTable`], but the index lives in a private store
//! file so its contents can be closed or thrown away as a unit without
//! touching the shared store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::store::Store;
use crate::value::Record;

use super::external::{ExternalTable, NamingScheme};
use super::Table;

/// External table backed by its own store handle
pub struct DecoupledTable<R: Record> {
    store: Arc<Store>,
    inner: ExternalTable<R>,
}

impl<R: Record> DecoupledTable<R> {
    /// Open `file_name` inside `dir` and bind region `name` in it
    ///
    /// `dir` must already exist; the owning database prepares it.
    pub fn open(
        dir: &Path,
        file_name: &str,
        name: &str,
        fields: &'static [&'static str],
        key_field: &'static str,
    ) -> Result<Self> {
        let store = Arc::new(Store::open(dir, file_name, false)?);
        let inner = ExternalTable::new(Arc::clone(&store), name, fields, key_field)?;
        Ok(Self { store, inner })
    }

    pub fn with_payload(
        mut self,
        field: &'static str,
        dir: impl Into<PathBuf>,
        naming: NamingScheme,
    ) -> Self {
        self.inner = self.inner.with_payload(field, dir, naming);
        self
    }

    pub fn with_load_payload(mut self, load: bool) -> Self {
        self.inner = self.inner.with_load_payload(load);
        self
    }

    pub fn load_with(&mut self, load_payload: bool) -> Result<()> {
        self.inner.load_with(load_payload)
    }

    pub fn get(&self, key: &str) -> Result<Option<R>> {
        self.inner.get(key)
    }

    pub fn put(&mut self, record: &R) -> Result<()> {
        self.inner.put(record)
    }

    pub fn update_payload(&mut self, record: &R) -> Result<()> {
        self.inner.update_payload(record)
    }

    pub fn remove(&mut self, key: &str) -> Result<bool> {
        self.inner.remove(key)
    }

    pub fn remove_all(&mut self) -> Result<()> {
        self.inner.remove_all()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Release the private store handle; the shared store is unaffected
    pub fn close(&self) {
        self.store.close();
    }

    /// Close and delete the private store file, discarding staged records
    pub fn drop_backing(&mut self) -> Result<()> {
        self.store.remove()?;
        self.inner.set(Vec::new())
    }

    pub fn is_closed(&self) -> bool {
        self.store.is_closed()
    }

    /// Path of the private store file
    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

impl<R: Record> Table for DecoupledTable<R> {
    type Input = Vec<R>;
    type Output = Vec<R>;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn load(&mut self) -> Result<()> {
        self.inner.load()
    }

    fn set(&mut self, records: Vec<R>) -> Result<()> {
        self.inner.set(records)
    }

    fn save(&mut self) -> Result<()> {
        self.inner.save()
    }

    fn parse(&self) -> Result<Vec<R>> {
        self.inner.parse()
    }
}
