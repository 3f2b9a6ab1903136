//! Core domain model for NLS: flat source records and niche scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod niche;

pub use niche::{
    filter_niches, prioritize_niches, rank_niches, KeywordScorer, NicheCriteria, NicheIdea,
    NicheScore, PlaceholderScorer,
};

pub const CRATE_NAME: &str = "nls-core";

/// Flat record handed from a source adapter to the persistence sinks.
///
/// Contact-shaped: content sources (threads, comments) carry their extra
/// fields in `extra`, which is flattened on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Set on records synthesised in preview mode instead of fetched.
    #[serde(default, skip_serializing_if = "is_false")]
    pub preview: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SourceRecord {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            keyword: None,
            handle: None,
            email: None,
            url: None,
            note: None,
            preview: false,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn marked_preview(mut self) -> Self {
        self.preview = true;
        self
    }

    /// Key/value pairs in column order: contact fields first, then extras,
    /// then the preview marker. Absent optional fields are omitted except
    /// `email`, which always renders (null when unknown).
    pub fn to_flat(&self) -> Vec<(String, JsonValue)> {
        let mut out = vec![("source".to_string(), JsonValue::from(self.source.clone()))];
        let optional = [
            ("keyword", &self.keyword),
            ("handle", &self.handle),
            ("email", &self.email),
            ("url", &self.url),
            ("note", &self.note),
        ];
        for (key, value) in optional {
            match value {
                Some(v) => out.push((key.to_string(), JsonValue::from(v.clone()))),
                None if key == "email" => out.push((key.to_string(), JsonValue::Null)),
                None => {}
            }
        }
        for (key, value) in &self.extra {
            out.push((key.clone(), value.clone()));
        }
        if self.preview {
            out.push(("preview".to_string(), JsonValue::Bool(true)));
        }
        out
    }
}
