//! Flat proxy lists merged from CLI flags and newline-delimited files.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::warn;

/// Ordered proxy URIs, unique by exact string match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyList {
    entries: Vec<String>,
}

impl ProxyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `proxy` unless an identical entry is already present.
    pub fn push(&mut self, proxy: impl Into<String>) -> bool {
        let proxy = proxy.into();
        if self.entries.contains(&proxy) {
            return false;
        }
        self.entries.push(proxy);
        true
    }

    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }
}

impl<S: Into<String>> FromIterator<S> for ProxyList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = ProxyList::new();
        for proxy in iter {
            list.push(proxy);
        }
        list
    }
}

/// Merge inline proxies with an optional file, inline entries first.
///
/// Entries are trimmed and blanks dropped; file lines starting with `#` are
/// comments. A missing file is logged and ignored.
pub fn load_proxies<S: AsRef<str>>(inline: &[S], proxy_file: Option<&Path>) -> anyhow::Result<ProxyList> {
    let mut list = ProxyList::new();
    for item in inline {
        let cleaned = item.as_ref().trim();
        if !cleaned.is_empty() {
            list.push(cleaned);
        }
    }

    if let Some(path) = proxy_file {
        if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading proxy file {}", path.display()))?;
            for raw in text.lines() {
                let cleaned = raw.trim();
                if cleaned.is_empty() || cleaned.starts_with('#') {
                    continue;
                }
                list.push(cleaned);
            }
        } else {
            warn!(path = %path.display(), "proxy file not found; skipping");
        }
    }

    Ok(list)
}

/// Documentation-range placeholders in the shape public free lists use.
pub fn sample_free_proxies() -> Vec<String> {
    vec![
        "http://203.0.113.10:8080".to_string(),
        "http://203.0.113.11:3128".to_string(),
    ]
}
