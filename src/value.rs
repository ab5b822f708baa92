//! Field values and the Record trait
//!
//! Tables never inspect record types structurally. Each table declares the
//! field names it owns and moves data through [`Record::field`] and
//! [`Record::set_field`], so unknown stored fields are skipped and missing
//! declared fields keep the record's default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{NovelError, Result};

/// A single stored field cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Text(String),
}

/// Staged field data of one record, keyed by field name
pub type Fields = BTreeMap<String, Value>;

impl Value {
    /// Interpret as optional text (`Null` → `None`)
    pub fn into_text(self, table: &str, field: &str) -> Result<Option<String>> {
        match self {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s)),
            Value::Int(_) => Err(mismatch(table, field, "text")),
        }
    }

    /// Interpret as an integer
    pub fn into_int(self, table: &str, field: &str) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(i),
            _ => Err(mismatch(table, field, "integer")),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn mismatch(table: &str, field: &str, expected: &'static str) -> NovelError {
    NovelError::SchemaMismatch {
        table: table.to_string(),
        field: field.to_string(),
        expected,
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map(Value::Text).unwrap_or(Value::Null)
    }
}

/// A typed application record with named fields
pub trait Record: Default + Clone + Send + 'static {
    /// Read a field by name (`None` if the record has no such field)
    fn field(&self, name: &str) -> Option<Value>;

    /// Write a field by name; unknown names are ignored
    ///
    /// `table` is only used to label schema mismatch errors.
    fn set_field(&mut self, table: &str, name: &str, value: Value) -> Result<()>;
}

/// Stage the declared `fields` of `record`
pub fn extract<R: Record>(record: &R, fields: &[&'static str]) -> Fields {
    fields
        .iter()
        .map(|f| (f.to_string(), record.field(f).unwrap_or_default()))
        .collect()
}

/// Build a record from staged data, keeping only declared `fields`
pub fn build<R: Record>(table: &str, data: &Fields, fields: &[&'static str]) -> Result<R> {
    let mut record = R::default();
    for (name, value) in data {
        if fields.contains(&name.as_str()) {
            record.set_field(table, name, value.clone())?;
        }
    }
    Ok(record)
}
