//! Set table
//!
//! Unique two-field tuples. Identical pairs are deduplicated; any other
//! uniqueness policy (e.g. single-valued names) belongs to the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::Result;
use crate::store::Store;
use crate::value::{Fields, Value};

use super::{decode_value, encode_value, Table};

/// A pair as stored: `(field1 value, field2 value)`
pub type Pair = (String, String);

/// Unordered collection of unique `(field1, field2)` pairs
pub struct SetTable {
    store: Arc<Store>,
    name: String,
    field1: &'static str,
    field2: &'static str,
    pairs: BTreeSet<Pair>,
}

impl SetTable {
    pub fn new(
        store: Arc<Store>,
        name: &str,
        field1: &'static str,
        field2: &'static str,
    ) -> Result<Self> {
        store.claim(name)?;
        Ok(Self {
            store,
            name: name.to_string(),
            field1,
            field2,
            pairs: BTreeSet::new(),
        })
    }

    /// Stage one pair; returns false if it was already present
    pub fn add(&mut self, first: impl Into<String>, second: impl Into<String>) -> bool {
        self.pairs.insert((first.into(), second.into()))
    }

    /// Unstage one pair; returns whether it was present
    pub fn remove(&mut self, first: &str, second: &str) -> bool {
        self.pairs.remove(&(first.to_string(), second.to_string()))
    }

    pub fn contains(&self, first: &str, second: &str) -> bool {
        self.pairs.contains(&(first.to_string(), second.to_string()))
    }

    /// Remove every pair whose first field equals `first`
    pub fn remove_by_first(&mut self, first: &str) -> usize {
        let before = self.pairs.len();
        self.pairs.retain(|(a, _)| a != first);
        before - self.pairs.len()
    }

    /// Bulk replace and save
    pub fn put<I>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = Pair>,
    {
        self.set(pairs.into_iter().collect())?;
        self.save()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Length-prefixed so distinct pairs never share a key
    fn key(pair: &Pair) -> String {
        format!("{}:{}{}", pair.0.len(), pair.0, pair.1)
    }

    fn text(&self, fields: &mut Fields, field: &str) -> Result<String> {
        Ok(fields
            .remove(field)
            .unwrap_or_default()
            .into_text(&self.name, field)?
            .unwrap_or_default())
    }
}

impl Table for SetTable {
    type Input = Vec<Pair>;
    type Output = Vec<Pair>;

    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<()> {
        let region = self.store.region(&self.name)?;
        let mut pairs = BTreeSet::new();
        for bytes in region.values() {
            let mut fields: Fields = decode_value(bytes)?;
            let first = self.text(&mut fields, self.field1)?;
            let second = self.text(&mut fields, self.field2)?;
            pairs.insert((first, second));
        }
        self.pairs = pairs;
        Ok(())
    }

    /// Remove all, then add all
    fn set(&mut self, pairs: Vec<Pair>) -> Result<()> {
        self.pairs = pairs.into_iter().collect();
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let mut entries = BTreeMap::new();
        for pair in &self.pairs {
            let fields: Fields = [
                (self.field1.to_string(), Value::Text(pair.0.clone())),
                (self.field2.to_string(), Value::Text(pair.1.clone())),
            ]
            .into_iter()
            .collect();
            entries.insert(Self::key(pair), encode_value(&fields)?);
        }
        self.store.replace_region(&self.name, entries)
    }

    fn parse(&self) -> Result<Vec<Pair>> {
        Ok(self.pairs.iter().cloned().collect())
    }
}
