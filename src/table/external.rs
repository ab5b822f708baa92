//! External multi-record table
//!
//! Small hot index in the store, large cold payload in one file per record.
//!
//! ```text
//!   store region "chapters"            {dir}/chapters/
//!   ┌───────────────┬───────────────┐   ┌──────┐
//!   │ key (url)     │ index fields  │   │ 0000 │ payload of index 0
//!   ├───────────────┼───────────────┤   │ 0001 │ payload of index 1
//!   │ ...           │ ...           │   │ ...  │
//!   └───────────────┴───────────────┘   └──────┘
//! ```
//!
//! Write ordering per record: payload file first, then the index entry.
//! Removal goes the other way (index entry, then payload file), so the index
//! never points at a payload that has already been deleted.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{NovelError, Result};
use crate::store::{write_atomic, Store};
use crate::value::{self, Fields, Record, Value};

use super::{decode_value, encode_value, Table};

/// Maps a record index to its payload file name
///
/// Zero-padded decimal: injective for all indices, and lexical order matches
/// numeric order for non-negative indices below `10^width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingScheme {
    width: usize,
}

impl NamingScheme {
    pub fn zero_padded(width: usize) -> Self {
        Self { width }
    }

    pub fn file_name(&self, index: i64) -> String {
        format!("{:0width$}", index, width = self.width)
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self::zero_padded(4)
    }
}

/// Where and how payloads are stored
struct PayloadLayout {
    field: &'static str,
    dir: PathBuf,
    naming: NamingScheme,
}

/// Ordered collection of records keyed by `key_field`
pub struct ExternalTable<R: Record> {
    store: Arc<Store>,
    name: String,
    fields: &'static [&'static str],
    key_field: &'static str,
    index_field: &'static str,
    payload: Option<PayloadLayout>,
    load_payload: bool,

    /// Staged records: key → all declared fields (payload only if loaded/set)
    records: BTreeMap<String, Fields>,

    /// Keys whose staged payload has not been written yet
    dirty: HashSet<String>,

    _record: PhantomData<R>,
}

impl<R: Record> ExternalTable<R> {
    /// Bind an index-only table; add a payload with [`Self::with_payload`]
    pub fn new(
        store: Arc<Store>,
        name: &str,
        fields: &'static [&'static str],
        key_field: &'static str,
    ) -> Result<Self> {
        if !fields.contains(&key_field) {
            return Err(NovelError::Config(format!(
                "key field '{}' is not declared by table '{}'",
                key_field, name
            )));
        }
        store.claim(name)?;
        Ok(Self {
            store,
            name: name.to_string(),
            fields,
            key_field,
            index_field: "index",
            payload: None,
            load_payload: true,
            records: BTreeMap::new(),
            dirty: HashSet::new(),
            _record: PhantomData,
        })
    }

    /// Store `field` as one file per record under `dir`
    pub fn with_payload(
        mut self,
        field: &'static str,
        dir: impl Into<PathBuf>,
        naming: NamingScheme,
    ) -> Self {
        self.payload = Some(PayloadLayout {
            field,
            dir: dir.into(),
            naming,
        });
        self
    }

    /// Field used for ordering and payload naming (default `index`)
    pub fn with_index_field(mut self, field: &'static str) -> Self {
        self.index_field = field;
        self
    }

    /// Whether `load()` reads payload files (default true)
    pub fn with_load_payload(mut self, load: bool) -> Self {
        self.load_payload = load;
        self
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load the index, and payloads only if `load_payload` is set
    ///
    /// A missing payload file leaves the field empty ("not yet fetched").
    pub fn load_with(&mut self, load_payload: bool) -> Result<()> {
        let region = self.store.region(&self.name)?;
        let mut records = BTreeMap::new();

        for (key, bytes) in region {
            let mut fields: Fields = decode_value(&bytes)?;
            if load_payload {
                if let Some(layout) = &self.payload {
                    let index = self.index_of(&fields)?;
                    let path = layout.dir.join(layout.naming.file_name(index));
                    if let Some(text) = Self::read_payload(&path)? {
                        fields.insert(layout.field.to_string(), Value::Text(text));
                    }
                }
            }
            records.insert(key, fields);
        }

        tracing::debug!(
            "Loaded table '{}' ({} records, payload={})",
            self.name,
            records.len(),
            load_payload && self.payload.is_some()
        );
        self.records = records;
        self.dirty.clear();
        Ok(())
    }

    // =========================================================================
    // Single Record Operations
    // =========================================================================

    /// Staged record by key
    pub fn get(&self, key: &str) -> Result<Option<R>> {
        self.records
            .get(key)
            .map(|fields| value::build(&self.name, fields, self.fields))
            .transpose()
    }

    /// Stage and persist one record (payload, if any, then index entry)
    pub fn put(&mut self, record: &R) -> Result<()> {
        let fields = value::extract(record, self.fields);
        self.commit_record(fields, true)
    }

    /// Write one record's payload; the index entry is rewritten only if
    /// its index fields changed
    pub fn update_payload(&mut self, record: &R) -> Result<()> {
        let fields = value::extract(record, self.fields);
        self.commit_record(fields, false)
    }

    /// Remove one record: index entry first, then its payload file
    ///
    /// The payload is located through the stored entry, so this works on a
    /// handle that was never loaded.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let stored = self.stored_entry(key)?;
        let existed = self.store.delete(&self.name, key)?;
        self.records.remove(key);
        self.dirty.remove(key);

        if let Some(fields) = stored {
            let index = self.index_of(&fields)?;
            if !self.index_in_use(index, key) {
                self.delete_payload_at(index);
            }
        }
        Ok(existed)
    }

    /// Remove every record and payload file
    pub fn remove_all(&mut self) -> Result<()> {
        let stored = self.store.region(&self.name)?;
        self.store.replace_region(&self.name, BTreeMap::new())?;

        for bytes in stored.values() {
            let fields: Fields = decode_value(bytes)?;
            self.delete_payload_at(self.index_of(&fields)?);
        }
        self.records.clear();
        self.dirty.clear();
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the payload file for `index` (None for index-only tables)
    pub fn payload_path(&self, index: i64) -> Option<PathBuf> {
        self.payload
            .as_ref()
            .map(|layout| layout.dir.join(layout.naming.file_name(index)))
    }

    /// Whether the payload file of `record` exists on disk
    pub fn has_payload(&self, record: &R) -> bool {
        let index = record
            .field(self.index_field)
            .and_then(|v| v.into_int(&self.name, self.index_field).ok());
        match index.and_then(|i| self.payload_path(i)) {
            Some(path) => path.is_file(),
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn key_of(&self, fields: &Fields) -> Result<String> {
        Ok(fields
            .get(self.key_field)
            .cloned()
            .unwrap_or_default()
            .into_text(&self.name, self.key_field)?
            .unwrap_or_default())
    }

    fn index_of(&self, fields: &Fields) -> Result<i64> {
        fields
            .get(self.index_field)
            .cloned()
            .unwrap_or_default()
            .into_int(&self.name, self.index_field)
    }

    /// Everything except the payload field
    fn index_entry(&self, fields: &Fields) -> Fields {
        let payload_field = self.payload.as_ref().map(|layout| layout.field);
        fields
            .iter()
            .filter(|(k, _)| Some(k.as_str()) != payload_field)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn stored_entry(&self, key: &str) -> Result<Option<Fields>> {
        self.store
            .get(&self.name, key)?
            .map(|bytes| decode_value(&bytes))
            .transpose()
    }

    /// Stored index of every key in the region
    fn stored_indices(&self) -> Result<BTreeMap<String, i64>> {
        self.store
            .region(&self.name)?
            .into_iter()
            .map(|(key, bytes)| {
                let fields: Fields = decode_value(&bytes)?;
                Ok((key, self.index_of(&fields)?))
            })
            .collect()
    }

    /// Whether a staged record other than `key` names its payload `index`
    fn index_in_use(&self, index: i64, key: &str) -> bool {
        self.records
            .iter()
            .any(|(k, fields)| k != key && self.index_of(fields).ok() == Some(index))
    }

    /// Persist one record, moving its payload file if the index changed
    ///
    /// Order: payload under the new name, index entry, then the file under
    /// the old name.
    fn commit_record(&mut self, fields: Fields, always_write_index: bool) -> Result<()> {
        let key = self.key_of(&fields)?;
        let index = self.index_of(&fields)?;
        let entry = self.index_entry(&fields);

        let previous = self.stored_entry(&key)?;
        let moved_from = match &previous {
            Some(stored) => Some(self.index_of(stored)?).filter(|old| *old != index),
            None => None,
        };

        match self.payload_text(&fields)? {
            Some(text) => self.write_payload_at(index, text)?,
            None => {
                if let Some(old) = moved_from {
                    if let Some(text) = self.read_payload_at(old)? {
                        self.write_payload_at(index, &text)?;
                    }
                }
            }
        }

        if always_write_index || previous.as_ref() != Some(&entry) {
            self.store.put(&self.name, &key, encode_value(&entry)?)?;
        }

        if let Some(old) = moved_from {
            if !self.index_in_use(old, &key) {
                self.delete_payload_at(old);
            }
        }

        self.dirty.remove(&key);
        self.records.insert(key, fields);
        Ok(())
    }

    fn read_payload(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_payload_at(&self, index: i64) -> Result<Option<String>> {
        match self.payload_path(index) {
            Some(path) => Self::read_payload(&path),
            None => Ok(None),
        }
    }

    /// Payload carried by `fields`, if any
    fn payload_text<'a>(&self, fields: &'a Fields) -> Result<Option<&'a str>> {
        let Some(layout) = &self.payload else {
            return Ok(None);
        };
        match fields.get(layout.field) {
            Some(Value::Text(text)) => Ok(Some(text.as_str())),
            Some(Value::Null) | None => Ok(None),
            Some(Value::Int(_)) => Err(NovelError::SchemaMismatch {
                table: self.name.clone(),
                field: layout.field.to_string(),
                expected: "text",
            }),
        }
    }

    fn write_payload_at(&self, index: i64, text: &str) -> Result<()> {
        let Some(layout) = &self.payload else {
            return Ok(());
        };
        fs::create_dir_all(&layout.dir)?;
        let path = layout.dir.join(layout.naming.file_name(index));
        write_atomic(&path, text.as_bytes())?;
        tracing::debug!("Wrote payload {} ({} bytes)", path.display(), text.len());
        Ok(())
    }

    /// Best effort: a missing file is fine, other failures are logged
    fn delete_payload_at(&self, index: i64) {
        let Some(path) = self.payload_path(index) else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed payload {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove payload {}: {}", path.display(), e),
        }
    }
}

impl<R: Record> Table for ExternalTable<R> {
    type Input = Vec<R>;
    type Output = Vec<R>;

    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<()> {
        self.load_with(self.load_payload)
    }

    fn set(&mut self, records: Vec<R>) -> Result<()> {
        let mut staged = BTreeMap::new();
        let mut dirty = HashSet::new();
        let payload_field = self.payload.as_ref().map(|layout| layout.field);

        for record in &records {
            let fields = value::extract(record, self.fields);
            let key = self.key_of(&fields)?;

            if let Some(field) = payload_field {
                let incoming = fields.get(field).filter(|v| !v.is_null());
                let current = self.records.get(&key).and_then(|f| f.get(field));
                if incoming.is_some() && incoming != current {
                    dirty.insert(key.clone());
                }
            }
            staged.insert(key, fields);
        }

        self.records = staged;
        self.dirty = dirty;
        Ok(())
    }

    /// Commit order: payloads under their current names, index region, then
    /// files no staged record names any more
    ///
    /// Payloads of records whose index changed are read before anything is
    /// written, so indices may be shuffled freely between records.
    fn save(&mut self) -> Result<()> {
        let stored = self.stored_indices()?;

        let mut writes: Vec<(i64, String)> = Vec::new();
        let mut claimed: HashSet<i64> = HashSet::new();
        for (key, fields) in &self.records {
            let index = self.index_of(fields)?;
            let moved_from = stored.get(key).copied().filter(|old| *old != index);
            if stored.get(key) == Some(&index) {
                claimed.insert(index);
            }
            if !self.dirty.contains(key) && moved_from.is_none() {
                continue;
            }

            let text = match (self.payload_text(fields)?, moved_from) {
                (Some(text), _) => Some(text.to_string()),
                (None, Some(old)) => self.read_payload_at(old)?,
                (None, None) => None,
            };
            if let Some(text) = text {
                claimed.insert(index);
                writes.push((index, text));
            }
        }

        for (index, text) in &writes {
            self.write_payload_at(*index, text)?;
        }

        let entries = self
            .records
            .iter()
            .map(|(k, fields)| Ok((k.clone(), encode_value(&self.index_entry(fields))?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        self.store.replace_region(&self.name, entries)?;
        self.dirty.clear();

        for (key, old) in &stored {
            let current = self.records.get(key).map(|f| self.index_of(f)).transpose()?;
            if current == Some(*old) || claimed.contains(old) {
                continue;
            }
            self.delete_payload_at(*old);
        }
        Ok(())
    }

    /// Records ordered by index
    fn parse(&self) -> Result<Vec<R>> {
        let mut ordered = self
            .records
            .values()
            .map(|fields| {
                let index = self.index_of(fields)?;
                Ok((index, value::build(&self.name, fields, self.fields)?))
            })
            .collect::<Result<Vec<(i64, R)>>>()?;
        ordered.sort_by_key(|(index, _)| *index);
        Ok(ordered.into_iter().map(|(_, record)| record).collect())
    }
}
