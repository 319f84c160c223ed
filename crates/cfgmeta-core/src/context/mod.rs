//! Administration context.
//!
//! Everything a property definition or constraint needs from its host
//! (class validation, descriptive text, schema lookups, directory layout)
//! travels in an explicit `AdminContext` rather than process-wide state.

mod attribute_types;
mod catalog;
mod class_loader;

pub use attribute_types::{AttributeTypeRegistry, StaticAttributeTypeRegistry};
pub use catalog::{MessageCatalog, StaticMessageCatalog};
pub use class_loader::{ClassLoadError, ClassLoader, StaticClassRegistry};

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::path::LdapProfile;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

type MessageKey = (String, String, String);
type MessageCell = Arc<OnceLock<Option<String>>>;

pub struct AdminContext {
    class_validation: bool,
    locale: String,
    ldap_profile: LdapProfile,
    class_loader: Option<Arc<dyn ClassLoader>>,
    catalog: Option<Arc<dyn MessageCatalog>>,
    attribute_types: Option<Arc<dyn AttributeTypeRegistry>>,
    messages: RwLock<HashMap<MessageKey, MessageCell>>,
}

impl fmt::Debug for AdminContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminContext")
            .field("class_validation", &self.class_validation)
            .field("locale", &self.locale)
            .field("ldap_profile", &self.ldap_profile)
            .field("class_loader", &self.class_loader.is_some())
            .field("catalog", &self.catalog.is_some())
            .field("attribute_types", &self.attribute_types.is_some())
            .finish()
    }
}

impl Default for AdminContext {
    fn default() -> Self {
        Self::client()
    }
}

impl AdminContext {
    /// Context for a disconnected management client: structural checks only.
    pub fn client() -> Self {
        Self {
            class_validation: false,
            locale: "en".to_string(),
            ldap_profile: LdapProfile::default(),
            class_loader: None,
            catalog: None,
            attribute_types: None,
            messages: RwLock::new(HashMap::new()),
        }
    }

    /// Context for a server process, where implementation classes can be
    /// checked against their declared interfaces.
    pub fn server(class_loader: Arc<dyn ClassLoader>) -> Self {
        Self::client()
            .with_class_loader(class_loader)
            .with_class_validation(true)
    }

    /// # Errors
    /// Fails when the LDAP profile or the message catalog file is invalid.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut cx = Self::client()
            .with_class_validation(config.admin.class_validation)
            .with_locale(&config.admin.locale)
            .with_ldap_profile(config.ldap.to_profile()?);
        if let Some(path) = &config.admin.message_catalog {
            cx = cx.with_message_catalog(Arc::new(StaticMessageCatalog::from_file(path)?));
        }
        Ok(cx)
    }

    pub fn with_class_validation(mut self, enabled: bool) -> Self {
        self.class_validation = enabled;
        self
    }

    pub fn with_class_loader(mut self, loader: Arc<dyn ClassLoader>) -> Self {
        self.class_loader = Some(loader);
        self
    }

    pub fn with_message_catalog(mut self, catalog: Arc<dyn MessageCatalog>) -> Self {
        self.catalog = Some(catalog);
        self.messages = RwLock::new(HashMap::new());
        self
    }

    pub fn with_attribute_type_registry(mut self, registry: Arc<dyn AttributeTypeRegistry>) -> Self {
        self.attribute_types = Some(registry);
        self
    }

    pub fn with_ldap_profile(mut self, profile: LdapProfile) -> Self {
        self.ldap_profile = profile;
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    pub fn is_class_validation_enabled(&self) -> bool {
        self.class_validation
    }

    pub fn class_loader(&self) -> Option<&dyn ClassLoader> {
        self.class_loader.as_deref()
    }

    pub fn attribute_types(&self) -> Option<&dyn AttributeTypeRegistry> {
        self.attribute_types.as_deref()
    }

    pub fn ldap_profile(&self) -> &LdapProfile {
        &self.ldap_profile
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Message for the context locale.
    pub fn message(&self, definition: &str, key: &str) -> Option<String> {
        self.message_for_locale(definition, key, &self.locale)
    }

    /// Message lookup with locale fallback (`en_US`, then `en`, then the root
    /// entry). Each (definition, key, locale) entry is loaded at most once.
    pub fn message_for_locale(&self, definition: &str, key: &str, locale: &str) -> Option<String> {
        let catalog = self.catalog.as_deref()?;
        let cache_key = (definition.to_string(), key.to_string(), locale.to_string());

        let cached = self
            .messages
            .read()
            .ok()
            .and_then(|map| map.get(&cache_key).cloned());
        let cell = match cached {
            Some(cell) => cell,
            None => match self.messages.write() {
                Ok(mut map) => Arc::clone(map.entry(cache_key).or_default()),
                // poisoned: skip the cache
                Err(_) => return lookup_with_fallback(catalog, definition, key, locale),
            },
        };
        cell.get_or_init(|| lookup_with_fallback(catalog, definition, key, locale))
            .clone()
    }

    pub fn user_friendly_name(&self, definition: &str) -> String {
        self.message(definition, "user-friendly-name")
            .unwrap_or_else(|| definition.replace('-', " "))
    }

    pub fn synopsis(&self, definition: &str) -> Option<String> {
        self.message(definition, "synopsis")
    }

    pub fn property_synopsis(&self, definition: &str, property: &str) -> Option<String> {
        self.message(definition, &format!("property.{}.synopsis", property))
    }

    pub fn property_description(&self, definition: &str, property: &str) -> Option<String> {
        self.message(definition, &format!("property.{}.description", property))
    }

    pub fn relation_user_friendly_name(&self, definition: &str, relation: &str) -> String {
        self.message(definition, &format!("relation.{}.user-friendly-name", relation))
            .unwrap_or_else(|| relation.replace('-', " "))
    }

    pub fn constraint_synopsis(&self, definition: &str, constraint: &str) -> Option<String> {
        self.message(definition, &format!("constraint.{}.synopsis", constraint))
    }
}

fn lookup_with_fallback(
    catalog: &dyn MessageCatalog,
    definition: &str,
    key: &str,
    locale: &str,
) -> Option<String> {
    let mut candidate = locale;
    loop {
        if let Some(text) = catalog.lookup(definition, key, candidate) {
            return Some(text);
        }
        if candidate.is_empty() {
            return None;
        }
        candidate = match candidate.rfind(['_', '-']) {
            Some(i) => &candidate[..i],
            None => "",
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCatalog {
        inner: StaticMessageCatalog,
        lookups: AtomicUsize,
    }

    impl MessageCatalog for CountingCatalog {
        fn lookup(&self, definition: &str, key: &str, locale: &str) -> Option<String> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(definition, key, locale)
        }
    }

    #[test]
    fn test_locale_fallback_to_language_then_root() {
        let catalog = StaticMessageCatalog::new()
            .with("global", "synopsis", "", "root text")
            .with("global", "synopsis", "fr", "texte");
        let cx = AdminContext::client()
            .with_message_catalog(Arc::new(catalog))
            .with_locale("fr_CA");

        assert_eq!(cx.synopsis("global").as_deref(), Some("texte"));
        assert_eq!(
            cx.message_for_locale("global", "synopsis", "de_DE").as_deref(),
            Some("root text")
        );
        assert_eq!(cx.synopsis("other"), None);
    }

    #[test]
    fn test_entries_are_loaded_once() {
        let catalog = Arc::new(CountingCatalog {
            inner: StaticMessageCatalog::new().with("global", "synopsis", "en", "text"),
            lookups: AtomicUsize::new(0),
        });
        let cx = AdminContext::client().with_message_catalog(catalog.clone());

        for _ in 0..5 {
            assert_eq!(cx.synopsis("global").as_deref(), Some("text"));
        }
        assert_eq!(catalog.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_access_shares_one_entry() {
        let catalog = Arc::new(CountingCatalog {
            inner: StaticMessageCatalog::new().with("global", "synopsis", "en", "text"),
            lookups: AtomicUsize::new(0),
        });
        let cx = Arc::new(AdminContext::client().with_message_catalog(catalog.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cx = Arc::clone(&cx);
                std::thread::spawn(move || cx.synopsis("global"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("text"));
        }
        assert_eq!(catalog.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_friendly_name_defaults_to_definition_name() {
        let cx = AdminContext::client();
        assert_eq!(cx.user_friendly_name("connection-handler"), "connection handler");
        assert!(!cx.is_class_validation_enabled());
    }
}
