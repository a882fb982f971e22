//! Document info records for pdftk's `update_info_utf8`

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Document info dictionary keys pdftk understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum InfoKey {
    #[serde(alias = "creationDate")]
    CreationDate,
    #[serde(alias = "modDate", alias = "modificationDate")]
    ModDate,
    #[serde(alias = "title")]
    Title,
    #[serde(alias = "author")]
    Author,
    #[serde(alias = "subject")]
    Subject,
    #[serde(alias = "keywords")]
    Keywords,
    #[serde(alias = "creator")]
    Creator,
    #[serde(alias = "producer")]
    Producer,
}

impl InfoKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoKey::CreationDate => "CreationDate",
            InfoKey::ModDate => "ModDate",
            InfoKey::Title => "Title",
            InfoKey::Author => "Author",
            InfoKey::Subject => "Subject",
            InfoKey::Keywords => "Keywords",
            InfoKey::Creator => "Creator",
            InfoKey::Producer => "Producer",
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, InfoKey::CreationDate | InfoKey::ModDate)
    }
}

impl fmt::Display for InfoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of one info entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    /// Stored verbatim, including pre-formatted PDF dates
    Text(String),
    /// Written as a PDF date string in UTC
    Date(DateTime<Utc>),
    /// Written as an empty value
    Empty,
}

impl InfoValue {
    pub fn to_info_string(&self) -> String {
        match self {
            InfoValue::Text(text) => text.clone(),
            InfoValue::Date(date) => format_pdf_date(date),
            InfoValue::Empty => String::new(),
        }
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::Text(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::Text(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for InfoValue {
    fn from(value: DateTime<Tz>) -> Self {
        InfoValue::Date(value.with_timezone(&Utc))
    }
}

/// Format a timestamp as `D:YYYYMMDDHHMMSSZ00'00'`.
pub fn format_pdf_date(date: &DateTime<Utc>) -> String {
    date.format("D:%Y%m%d%H%M%SZ00'00'").to_string()
}

/// Document metadata to set before filling
///
/// Entries are written in key order: dates first, then the text keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<InfoKey, Option<String>>")]
pub struct DocumentInfo {
    entries: BTreeMap<InfoKey, InfoValue>,
}

impl DocumentInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: InfoKey, value: impl Into<InfoValue>) -> Self {
        self.entries.insert(key, value.into());
        self
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        self.set(InfoKey::Title, InfoValue::Text(title.into()))
    }

    pub fn author(self, author: impl Into<String>) -> Self {
        self.set(InfoKey::Author, InfoValue::Text(author.into()))
    }

    pub fn subject(self, subject: impl Into<String>) -> Self {
        self.set(InfoKey::Subject, InfoValue::Text(subject.into()))
    }

    pub fn keywords(self, keywords: impl Into<String>) -> Self {
        self.set(InfoKey::Keywords, InfoValue::Text(keywords.into()))
    }

    pub fn creator(self, creator: impl Into<String>) -> Self {
        self.set(InfoKey::Creator, InfoValue::Text(creator.into()))
    }

    pub fn producer(self, producer: impl Into<String>) -> Self {
        self.set(InfoKey::Producer, InfoValue::Text(producer.into()))
    }

    pub fn creation_date(self, date: impl Into<InfoValue>) -> Self {
        self.set(InfoKey::CreationDate, date)
    }

    pub fn mod_date(self, date: impl Into<InfoValue>) -> Self {
        self.set(InfoKey::ModDate, date)
    }

    pub fn get(&self, key: InfoKey) -> Option<&InfoValue> {
        self.entries.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InfoKey, &InfoValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Encode as the `InfoBegin` / `InfoKey` / `InfoValue` text pdftk reads.
    pub fn to_info_block(&self) -> String {
        let mut block = String::new();
        for (key, value) in self.iter() {
            let value = value.to_info_string().replace(['\r', '\n'], " ");
            block.push_str("InfoBegin\n");
            block.push_str(&format!("InfoKey: {}\n", key));
            block.push_str(&format!("InfoValue: {}\n", value));
        }
        block
    }
}

impl From<BTreeMap<InfoKey, Option<String>>> for DocumentInfo {
    fn from(raw: BTreeMap<InfoKey, Option<String>>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    None => InfoValue::Empty,
                    Some(text) if key.is_date() => match DateTime::parse_from_rfc3339(&text) {
                        Ok(date) => InfoValue::from(date),
                        Err(_) => InfoValue::Text(text),
                    },
                    Some(text) => InfoValue::Text(text),
                };
                (key, value)
            })
            .collect();
        Self { entries }
    }
}
