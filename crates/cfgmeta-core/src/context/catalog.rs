use crate::errors::{ConfigError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Localized descriptive text keyed by definition and resource key
/// (`synopsis`, `property.<name>.synopsis`, ...).
pub trait MessageCatalog: Send + Sync {
    /// Exact lookup for one locale; `None` when the catalog has no entry.
    fn lookup(&self, definition: &str, key: &str, locale: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    message: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    definition: String,
    key: String,
    #[serde(default)]
    locale: String,
    text: String,
}

/// In-memory catalog, optionally loaded from TOML:
///
/// ```toml
/// [[message]]
/// definition = "connection-handler"
/// key = "synopsis"
/// locale = "en"
/// text = "Connection Handlers are responsible for handling all interaction with the clients"
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticMessageCatalog {
    entries: HashMap<(String, String, String), String>,
}

impl StaticMessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; an empty locale is the root fallback.
    pub fn insert(&mut self, definition: &str, key: &str, locale: &str, text: &str) {
        self.entries.insert(
            (definition.to_string(), key.to_string(), locale.to_string()),
            text.to_string(),
        );
    }

    pub fn with(mut self, definition: &str, key: &str, locale: &str, text: &str) -> Self {
        self.insert(definition, key, locale, text);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// # Errors
    /// Fails when the document is not a valid catalog.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut catalog = Self::new();
        for entry in file.message {
            catalog.insert(&entry.definition, &entry.key, &entry.locale, &entry.text);
        }
        Ok(catalog)
    }

    /// # Errors
    /// Fails when the file cannot be read or is not a valid catalog.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidConfiguration {
            message: format!("cannot read message catalog {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }
}

impl MessageCatalog for StaticMessageCatalog {
    fn lookup(&self, definition: &str, key: &str, locale: &str) -> Option<String> {
        self.entries
            .get(&(definition.to_string(), key.to_string(), locale.to_string()))
            .cloned()
    }
}
