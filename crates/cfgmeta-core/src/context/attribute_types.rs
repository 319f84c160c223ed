use std::collections::HashMap;

/// Directory schema lookup used by attribute-type properties.
pub trait AttributeTypeRegistry: Send + Sync {
    /// Canonical name for a name, alias or OID; `None` when unknown.
    fn canonical_name(&self, name_or_oid: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticAttributeTypeRegistry {
    by_key: HashMap<String, String>,
}

impl StaticAttributeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, canonical: &str, oid: &str, aliases: &[&str]) -> Self {
        for key in std::iter::once(canonical)
            .chain(std::iter::once(oid))
            .chain(aliases.iter().copied())
        {
            self.by_key
                .insert(key.to_ascii_lowercase(), canonical.to_string());
        }
        self
    }
}

impl AttributeTypeRegistry for StaticAttributeTypeRegistry {
    fn canonical_name(&self, name_or_oid: &str) -> Option<String> {
        self.by_key
            .get(&name_or_oid.trim().to_ascii_lowercase())
            .cloned()
    }
}
