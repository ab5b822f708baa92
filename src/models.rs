//! Records consumed from the scraping collaborator

use crate::error::Result;
use crate::value::{Record, Value};

/// Novel level details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Novel {
    pub title: Option<String>,
    pub author: Option<String>,
    pub synopsis: Option<String>,
    pub thumbnail: Option<String>,
    pub lang: Option<String>,
    pub meta_source: Option<String>,
    pub url: Option<String>,
}

impl Novel {
    /// Fields stored by the novel table
    pub const FIELDS: &'static [&'static str] = &[
        "title",
        "author",
        "synopsis",
        "thumbnail",
        "lang",
        "meta_source",
        "url",
    ];
}

impl Record for Novel {
    fn field(&self, name: &str) -> Option<Value> {
        let v = match name {
            "title" => &self.title,
            "author" => &self.author,
            "synopsis" => &self.synopsis,
            "thumbnail" => &self.thumbnail,
            "lang" => &self.lang,
            "meta_source" => &self.meta_source,
            "url" => &self.url,
            _ => return None,
        };
        Some(v.clone().into())
    }

    fn set_field(&mut self, table: &str, name: &str, value: Value) -> Result<()> {
        let slot = match name {
            "title" => &mut self.title,
            "author" => &mut self.author,
            "synopsis" => &mut self.synopsis,
            "thumbnail" => &mut self.thumbnail,
            "lang" => &mut self.lang,
            "meta_source" => &mut self.meta_source,
            "url" => &mut self.url,
            _ => return Ok(()),
        };
        *slot = value.into_text(table, name)?;
        Ok(())
    }
}

/// A chapter; `paragraphs` is the heavy payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapter {
    pub index: i64,
    pub title: Option<String>,
    pub paragraphs: Option<String>,
    pub volume: Option<String>,
    pub url: String,
}

impl Chapter {
    /// Fields stored for downloaded chapters
    pub const FIELDS: &'static [&'static str] = &["index", "title", "paragraphs", "volume", "url"];

    /// Fields stored for pending chapters (no payload)
    pub const PENDING_FIELDS: &'static [&'static str] = &["index", "title", "volume", "url"];

    pub fn new(index: i64, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Copy with the payload removed
    pub fn without_payload(&self) -> Self {
        Self {
            paragraphs: None,
            ..self.clone()
        }
    }
}

impl Record for Chapter {
    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "index" => Value::Int(self.index),
            "title" => self.title.clone().into(),
            "paragraphs" => self.paragraphs.clone().into(),
            "volume" => self.volume.clone().into(),
            "url" => Value::Text(self.url.clone()),
            _ => return None,
        })
    }

    fn set_field(&mut self, table: &str, name: &str, value: Value) -> Result<()> {
        match name {
            "index" => self.index = value.into_int(table, name)?,
            "title" => self.title = value.into_text(table, name)?,
            "paragraphs" => self.paragraphs = value.into_text(table, name)?,
            "volume" => self.volume = value.into_text(table, name)?,
            "url" => self.url = value.into_text(table, name)?.unwrap_or_default(),
            _ => {}
        }
        Ok(())
    }
}

/// A metadata name/value pair
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetaData {
    pub name: String,
    pub value: String,
}

impl MetaData {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<(String, String)> for MetaData {
    fn from((name, value): (String, String)) -> Self {
        Self { name, value }
    }
}

impl From<MetaData> for (String, String) {
    fn from(m: MetaData) -> Self {
        (m.name, m.value)
    }
}
