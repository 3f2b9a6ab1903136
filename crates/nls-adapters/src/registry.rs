use std::sync::Arc;

use thiserror::Error;

use crate::{builtin_adapters, SourceAdapter};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no source registered under {name:?} (available: {available})")]
    NotFound { name: String, available: String },
}

/// Ordered table of source adapters. Dispatch follows insertion order.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new(adapters: impl IntoIterator<Item = Arc<dyn SourceAdapter>>) -> Self {
        let mut registry = Self::default();
        for adapter in adapters {
            registry.register(adapter);
        }
        registry
    }

    /// Add `adapter`, replacing an entry with the same id in place.
    /// Returns the adapter it replaced, if any.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Option<Arc<dyn SourceAdapter>> {
        let key = adapter.source_id().to_ascii_lowercase();
        match self
            .adapters
            .iter()
            .position(|a| a.source_id().eq_ignore_ascii_case(&key))
        {
            Some(idx) => Some(std::mem::replace(&mut self.adapters[idx], adapter)),
            None => {
                self.adapters.push(adapter);
                None
            }
        }
    }

    /// Look up by source id or display name, case-insensitively.
    pub fn get(&self, name: &str) -> Result<Arc<dyn SourceAdapter>, RegistryError> {
        let wanted = name.trim().to_lowercase();
        self.adapters
            .iter()
            .find(|a| {
                a.source_id().to_lowercase() == wanted
                    || a.profile().display_name.to_lowercase() == wanted
            })
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
                available: self.source_ids().join(", "),
            })
    }

    /// Resolve `names` in the given order. A name listed twice yields the
    /// adapter twice; any unknown name fails the whole selection.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn SourceAdapter>>, RegistryError> {
        names.iter().map(|name| self.get(name.as_ref())).collect()
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.source_id().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SourceAdapter>> {
        self.adapters.iter()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

pub fn default_registry() -> SourceRegistry {
    SourceRegistry::new(builtin_adapters())
}
