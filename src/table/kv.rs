//! Key-value table for miscellaneous settings (no schema)

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::store::Store;

use super::{decode_value, encode_value, Table};

pub struct KeyValueTable {
    store: Arc<Store>,
    name: String,
    data: BTreeMap<String, String>,
}

impl KeyValueTable {
    pub fn new(store: Arc<Store>, name: &str) -> Result<Self> {
        store.claim(name)?;
        Ok(Self {
            store,
            name: name.to_string(),
            data: BTreeMap::new(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Stage one entry; returns the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.data.insert(key.into(), value.into())
    }

    /// Unstage one entry
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.data.remove(key)
    }

    /// Stage and persist one entry without rewriting the others
    pub fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.store
            .put(&self.name, key, encode_value(&value.to_string())?)?;
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Remove and persist one entry
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        self.data.remove(key);
        self.store.delete(&self.name, key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Table for KeyValueTable {
    type Input = BTreeMap<String, String>;
    type Output = BTreeMap<String, String>;

    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<()> {
        self.data = self
            .store
            .region(&self.name)?
            .into_iter()
            .map(|(k, v)| Ok((k, decode_value::<String>(&v)?)))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn set(&mut self, values: BTreeMap<String, String>) -> Result<()> {
        self.data = values;
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

    fn parse(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.data.clone())
    }
}
