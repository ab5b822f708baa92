//! Single-record table
//!
//! Stores one record as one key per declared field.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{NovelError, Result};
use crate::store::Store;
use crate::value::{self, Fields, Record, Value};

use super::{decode_value, encode_value, Table};

/// Holds zero or one record of type `R`
pub struct SingleRecordTable<R: Record> {
    store: Arc<Store>,
    name: String,
    fields: &'static [&'static str],
    data: Fields,
    _record: PhantomData<R>,
}

impl<R: Record> SingleRecordTable<R> {
    /// Bind a table to `name` in `store`, owning exactly `fields`
    pub fn new(store: Arc<Store>, name: &str, fields: &'static [&'static str]) -> Result<Self> {
        store.claim(name)?;
        Ok(Self {
            store,
            name: name.to_string(),
            fields,
            data: Fields::new(),
            _record: PhantomData,
        })
    }

    /// Stage and save `record` in one call
    pub fn put(&mut self, record: &R) -> Result<()> {
        self.set(record.clone())?;
        self.save()
    }

    /// Parse the record, failing if the table is empty
    pub fn require(&self) -> Result<R> {
        self.parse()?
            .ok_or_else(|| NovelError::NotFound(format!("no record in table '{}'", self.name)))
    }

    /// Drop the staged record (persisted on the next save)
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn fields(&self) -> &[&'static str] {
        self.fields
    }
}

impl<R: Record> Table for SingleRecordTable<R> {
    type Input = R;
    type Output = Option<R>;

    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<()> {
        let region = self.store.region(&self.name)?;
        self.data = region
            .iter()
            .map(|(k, v)| Ok((k.clone(), decode_value::<Value>(v)?)))
            .collect::<Result<Fields>>()?;
        Ok(())
    }

    /// Replaces the whole record; there is no partial-field update
    fn set(&mut self, record: R) -> Result<()> {
        self.data = value::extract(&record, self.fields);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let entries = self
            .data
            .iter()
            .map(|(k, v)| Ok((k.clone(), encode_value(v)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        self.store.replace_region(&self.name, entries)
    }

    fn parse(&self) -> Result<Option<R>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        value::build(&self.name, &self.data, self.fields).map(Some)
    }
}
