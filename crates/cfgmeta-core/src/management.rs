//! Access to live managed objects.
//!
//! The metamodel never stores objects itself; default-value inheritance and
//! referential integrity ask a `ManagementContext` supplied by the host.

use crate::dn::Dn;
use crate::path::{LdapProfile, ManagedObjectPath};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("management context unavailable: {message}")]
    Unavailable { message: String },
    #[error("communication with the management context failed: {message}")]
    Communication { message: String },
    #[error("managed object {path} does not exist")]
    ManagedObjectNotFound { path: String },
}

/// Snapshot of one managed object: where it lives, its concrete definition
/// and its raw (undecoded) property values.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateObject {
    path: ManagedObjectPath,
    definition: String,
    values: BTreeMap<String, Vec<String>>,
}

impl CandidateObject {
    /// The definition is taken from the path's last element.
    pub fn new(path: ManagedObjectPath) -> Self {
        let definition = path.definition_name().to_string();
        Self {
            path,
            definition,
            values: BTreeMap::new(),
        }
    }

    pub fn with_values<I, S>(mut self, property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_values(property, values);
        self
    }

    pub fn set_values<I, S>(&mut self, property: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.values.remove(property);
        } else {
            self.values.insert(property.to_string(), values);
        }
    }

    pub fn path(&self) -> &ManagedObjectPath {
        &self.path
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Explicitly set values; empty when the property is unset.
    pub fn values(&self, property: &str) -> &[String] {
        self.values.get(property).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Lookups identify an object by the entry its path maps to. A path built
/// for a parent definition reaches an object stored under one of its
/// sub-types, and instance names compare case-insensitively.
pub trait ManagementContext: Send + Sync {
    /// # Errors
    /// Fails when the backing store cannot be reached.
    fn managed_object_exists(&self, path: &ManagedObjectPath) -> Result<bool, ContextError>;

    /// Raw values of `property` on the object at `path`; empty when unset.
    ///
    /// # Errors
    /// `ManagedObjectNotFound` when nothing lives at `path`.
    fn property_values(
        &self,
        path: &ManagedObjectPath,
        property: &str,
    ) -> Result<Vec<String>, ContextError>;

    /// Every object whose definition is one of `definitions`. Contexts that
    /// cannot enumerate return nothing, which disables the checks that need
    /// reverse lookups.
    ///
    /// # Errors
    /// Fails when the backing store cannot be reached.
    fn find_managed_objects(&self, definitions: &[&str]) -> Result<Vec<CandidateObject>, ContextError> {
        let _ = definitions;
        Ok(Vec::new())
    }
}

/// Objects held in memory, keyed by the normalized DN of their path.
///
/// Lookups therefore ignore the concrete definition recorded in a path and
/// compare instance names the way the directory does, so an object stored
/// under a sub-type is found through a path built for its parent type.
/// Used by disconnected tooling and tests.
#[derive(Debug, Default)]
pub struct MemoryContext {
    profile: LdapProfile,
    objects: RwLock<HashMap<Dn, CandidateObject>>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key objects with `profile` instead of the default `cn=config` layout.
    pub fn with_ldap_profile(profile: LdapProfile) -> Self {
        Self {
            profile,
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_object(self, object: CandidateObject) -> Self {
        self.put(object);
        self
    }

    /// Store `object`, replacing whatever lives at the same DN.
    pub fn put(&self, object: CandidateObject) {
        let key = self.key(object.path());
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(key, object);
        }
    }

    pub fn remove(&self, path: &ManagedObjectPath) -> Option<CandidateObject> {
        let key = self.key(path);
        self.objects.write().ok().and_then(|mut o| o.remove(&key))
    }

    pub fn get(&self, path: &ManagedObjectPath) -> Option<CandidateObject> {
        let key = self.key(path);
        self.objects.read().ok().and_then(|o| o.get(&key).cloned())
    }

    fn key(&self, path: &ManagedObjectPath) -> Dn {
        path.to_dn(&self.profile)
    }

    fn poisoned() -> ContextError {
        ContextError::Unavailable {
            message: "object table lock poisoned".to_string(),
        }
    }
}

impl ManagementContext for MemoryContext {
    fn managed_object_exists(&self, path: &ManagedObjectPath) -> Result<bool, ContextError> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        Ok(path.is_empty() || objects.contains_key(&self.key(path)))
    }

    fn property_values(
        &self,
        path: &ManagedObjectPath,
        property: &str,
    ) -> Result<Vec<String>, ContextError> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        objects
            .get(&self.key(path))
            .map(|o| o.values(property).to_vec())
            .ok_or_else(|| ContextError::ManagedObjectNotFound {
                path: path.to_string(),
            })
    }

    fn find_managed_objects(&self, definitions: &[&str]) -> Result<Vec<CandidateObject>, ContextError> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        let mut found: Vec<CandidateObject> = objects
            .values()
            .filter(|o| definitions.contains(&o.definition()))
            .cloned()
            .collect();
        found.sort_by_key(|o| o.path().to_string());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationDefinition;

    fn handler_path(name: &str) -> ManagedObjectPath {
        let relation = RelationDefinition::instantiable("root", "connection-handler", "connection-handler")
            .plural_name("connection-handlers")
            .build()
            .unwrap();
        ManagedObjectPath::empty("root")
            .child_of_type(&relation, "ldap-connection-handler", Some(name))
            .unwrap()
    }

    #[test]
    fn test_memory_context_lookups() {
        let ldap = handler_path("LDAP");
        let cx = MemoryContext::new().with_object(
            CandidateObject::new(ldap.clone()).with_values("listen-port", ["389"]),
        );

        assert!(cx.managed_object_exists(&ldap).unwrap());
        assert!(cx.managed_object_exists(&ManagedObjectPath::empty("root")).unwrap());
        assert!(!cx.managed_object_exists(&handler_path("LDAPS")).unwrap());
        assert_eq!(cx.property_values(&ldap, "listen-port").unwrap(), vec!["389"]);
        assert!(cx.property_values(&ldap, "enabled").unwrap().is_empty());
        assert!(matches!(
            cx.property_values(&handler_path("LDAPS"), "listen-port"),
            Err(ContextError::ManagedObjectNotFound { .. })
        ));
    }

    #[test]
    fn test_lookup_ignores_case_and_concrete_type() {
        let relation = RelationDefinition::instantiable("root", "connection-handler", "connection-handler")
            .plural_name("connection-handlers")
            .build()
            .unwrap();
        let cx = MemoryContext::new()
            .with_object(CandidateObject::new(handler_path("LDAP")).with_values("enabled", ["true"]));

        let as_base_type = ManagedObjectPath::empty("root")
            .child_instantiable(&relation, "ldap")
            .unwrap();

        assert!(cx.managed_object_exists(&as_base_type).unwrap());
        assert_eq!(cx.property_values(&as_base_type, "enabled").unwrap(), vec!["true"]);
        assert!(cx.remove(&as_base_type).is_some());
        assert!(!cx.managed_object_exists(&handler_path("LDAP")).unwrap());
    }

    #[test]
    fn test_find_by_definition() {
        let cx = MemoryContext::new()
            .with_object(CandidateObject::new(handler_path("b")))
            .with_object(CandidateObject::new(handler_path("a")));
        let found = cx.find_managed_objects(&["ldap-connection-handler"]).unwrap();
        let names: Vec<_> = found.iter().filter_map(|o| o.path().name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(cx.find_managed_objects(&["jmx-connection-handler"]).unwrap().is_empty());
    }

    #[test]
    fn test_empty_value_list_unsets_property() {
        let mut object = CandidateObject::new(handler_path("LDAP")).with_values("enabled", ["true"]);
        object.set_values("enabled", Vec::<String>::new());
        assert!(object.values("enabled").is_empty());
        assert_eq!(object.definition(), "ldap-connection-handler");
    }
}
