//! Managed object paths.
//!
//! A path addresses one managed object instance as the chain of composition
//! relations walked from the root. Paths are persistent: appending shares the
//! existing prefix.

mod serializer;

pub use serializer::{DnPathSerializer, LdapProfile, ManagedObjectPathSerializer, StringPathSerializer};

use crate::dn::Dn;
use crate::errors::{ConfigError, Result};
use crate::relation::{RelationDefinition, RelationType};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
    relation_type: RelationType,
    relation: String,
    plural_name: String,
    relation_child: String,
    definition: String,
    name: Option<String>,
}

impl PathElement {
    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    /// Child definition declared by the relation.
    pub fn relation_child(&self) -> &str {
        &self.relation_child
    }

    /// Definition of the addressed object; a sub-type of the relation child.
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Instance name, present only for instantiable relations.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Debug)]
struct Node {
    element: PathElement,
    parent: Option<Arc<Node>>,
}

#[derive(Debug, Clone)]
pub struct ManagedObjectPath {
    root: Arc<str>,
    last: Option<Arc<Node>>,
    size: usize,
}

impl ManagedObjectPath {
    /// The empty path, addressing the root object of `root_definition`.
    pub fn empty(root_definition: &str) -> Self {
        Self {
            root: Arc::from(root_definition),
            last: None,
            size: 0,
        }
    }

    pub fn child_singleton(&self, relation: &RelationDefinition) -> Result<Self> {
        self.child_of_type(relation, relation.child(), None)
    }

    pub fn child_optional(&self, relation: &RelationDefinition) -> Result<Self> {
        self.child_of_type(relation, relation.child(), None)
    }

    pub fn child_instantiable(&self, relation: &RelationDefinition, name: &str) -> Result<Self> {
        self.child_of_type(relation, relation.child(), Some(name))
    }

    /// Set elements are identified by their concrete sub-type.
    pub fn child_set(&self, relation: &RelationDefinition, definition: &str) -> Result<Self> {
        self.child_of_type(relation, definition, None)
    }

    /// Append an element whose object is of `definition` (the relation child or
    /// one of its sub-types; checked by `DefinitionTree::parse_path`).
    pub fn child_of_type(
        &self,
        relation: &RelationDefinition,
        definition: &str,
        name: Option<&str>,
    ) -> Result<Self> {
        let relation_type = relation.relation_type();
        let name = match (relation_type, name) {
            (RelationType::Aggregation, _) => {
                return Err(ConfigError::invalid_path(
                    self.to_string(),
                    format!("aggregation relation \"{}\" cannot be traversed", relation.name()),
                ))
            }
            (RelationType::Instantiable, Some(name)) => Some(checked_name(self, name)?),
            (RelationType::Instantiable, None) => {
                return Err(ConfigError::invalid_path(
                    self.to_string(),
                    format!("relation \"{}\" requires an instance name", relation.name()),
                ))
            }
            (_, Some(name)) => {
                return Err(ConfigError::invalid_path(
                    self.to_string(),
                    format!(
                        "relation \"{}\" does not take an instance name (got \"{}\")",
                        relation.name(),
                        name
                    ),
                ))
            }
            (_, None) => None,
        };

        let element = PathElement {
            relation_type,
            relation: relation.name().to_string(),
            plural_name: relation.plural_name().to_string(),
            relation_child: relation.child().to_string(),
            definition: definition.to_string(),
            name,
        };
        Ok(self.push(element))
    }

    fn push(&self, element: PathElement) -> Self {
        Self {
            root: Arc::clone(&self.root),
            last: Some(Arc::new(Node {
                element,
                parent: self.last.clone(),
            })),
            size: self.size + 1,
        }
    }

    /// The path `offset` levels up. `parent(0)` is this path.
    pub fn parent(&self, offset: usize) -> Result<Self> {
        if offset > self.size {
            return Err(ConfigError::invalid_path(
                self.to_string(),
                format!("parent offset {} exceeds path size {}", offset, self.size),
            ));
        }
        let mut node = self.last.clone();
        for _ in 0..offset {
            node = node.and_then(|n| n.parent.clone());
        }
        Ok(Self {
            root: Arc::clone(&self.root),
            last: node,
            size: self.size - offset,
        })
    }

    /// Same object addressed under a new instance name.
    pub fn rename(&self, new_name: &str) -> Result<Self> {
        let Some(last) = &self.last else {
            return Err(ConfigError::invalid_path("/", "the root path cannot be renamed"));
        };
        if last.element.relation_type != RelationType::Instantiable {
            return Err(ConfigError::invalid_path(
                self.to_string(),
                format!(
                    "relation \"{}\" is not instantiable; only instantiable elements can be renamed",
                    last.element.relation
                ),
            ));
        }
        let name = checked_name(self, new_name)?;
        let element = PathElement {
            name: Some(name),
            ..last.element.clone()
        };
        Ok(Self {
            root: Arc::clone(&self.root),
            last: Some(Arc::new(Node {
                element,
                parent: last.parent.clone(),
            })),
            size: self.size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn last_element(&self) -> Option<&PathElement> {
        self.last.as_deref().map(|n| &n.element)
    }

    /// Instance name of the last element.
    pub fn name(&self) -> Option<&str> {
        self.last_element().and_then(PathElement::name)
    }

    pub fn relation_name(&self) -> Option<&str> {
        self.last_element().map(PathElement::relation)
    }

    /// Definition of the addressed object; the root definition for the empty
    /// path.
    pub fn definition_name(&self) -> &str {
        self.last_element()
            .map(PathElement::definition)
            .unwrap_or(&self.root)
    }

    pub fn root_definition(&self) -> &str {
        &self.root
    }

    /// Elements from the root downwards.
    pub fn elements(&self) -> Vec<&PathElement> {
        let mut out = Vec::with_capacity(self.size);
        let mut node = self.last.as_deref();
        while let Some(n) = node {
            out.push(&n.element);
            node = n.parent.as_deref();
        }
        out.reverse();
        out
    }

    /// True when `self` is a (non-strict) prefix of `other`.
    pub fn is_ancestor_of(&self, other: &ManagedObjectPath) -> bool {
        self.size <= other.size
            && other
                .parent(other.size - self.size)
                .map(|p| &p == self)
                .unwrap_or(false)
    }

    pub fn serialize(&self, serializer: &mut dyn ManagedObjectPathSerializer) {
        for element in self.elements() {
            match element.relation_type {
                RelationType::Instantiable => {
                    let name = element.name.as_deref().unwrap_or_default();
                    serializer.append_instantiable(element, name);
                }
                RelationType::Set => serializer.append_set(element),
                RelationType::Optional => serializer.append_optional(element),
                RelationType::Singleton => serializer.append_singleton(element),
                // never pushed; see child_of_type
                RelationType::Aggregation => {}
            }
        }
    }

    pub fn to_dn(&self, profile: &LdapProfile) -> Dn {
        let mut serializer = DnPathSerializer::new(profile);
        self.serialize(&mut serializer);
        serializer.into_dn()
    }
}

fn checked_name(path: &ManagedObjectPath, name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(ConfigError::invalid_path(
            path.to_string(),
            "instance names must not be blank",
        ));
    }
    Ok(name.to_string())
}

impl fmt::Display for ManagedObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serializer = StringPathSerializer::default();
        self.serialize(&mut serializer);
        f.write_str(&serializer.into_string())
    }
}

impl PartialEq for ManagedObjectPath {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size || self.root != other.root {
            return false;
        }
        let mut a = self.last.as_ref();
        let mut b = other.last.as_ref();
        while let (Some(x), Some(y)) = (a, b) {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            if x.element != y.element {
                return false;
            }
            a = x.parent.as_ref();
            b = y.parent.as_ref();
        }
        true
    }
}

impl Eq for ManagedObjectPath {}

impl Hash for ManagedObjectPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        for element in self.elements() {
            element.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationDefinition;

    fn handlers() -> RelationDefinition {
        RelationDefinition::instantiable("root", "connection-handler", "connection-handler")
            .plural_name("connection-handlers")
            .build()
            .unwrap()
    }

    fn crypto() -> RelationDefinition {
        RelationDefinition::singleton("root", "crypto-manager", "crypto-manager")
            .build()
            .unwrap()
    }

    #[test]
    fn test_child_and_parent_share_prefix() {
        let root = ManagedObjectPath::empty("root");
        let ldap = root
            .child_of_type(&handlers(), "ldap-connection-handler", Some("LDAP"))
            .unwrap();

        assert_eq!(ldap.size(), 1);
        assert_eq!(ldap.name(), Some("LDAP"));
        assert_eq!(ldap.relation_name(), Some("connection-handler"));
        assert_eq!(ldap.definition_name(), "ldap-connection-handler");
        assert_eq!(ldap.parent(0).unwrap(), ldap);
        assert_eq!(ldap.parent(1).unwrap(), root);
        assert_eq!(root.definition_name(), "root");
        assert!(root.is_ancestor_of(&ldap));
        assert!(!ldap.is_ancestor_of(&root));
    }

    #[test]
    fn test_parent_offset_beyond_size_fails() {
        let path = ManagedObjectPath::empty("root")
            .child_instantiable(&handlers(), "LDAP")
            .unwrap();
        let err = path.parent(2).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }

    #[test]
    fn test_instance_name_rules() {
        let root = ManagedObjectPath::empty("root");
        assert!(root.child_instantiable(&handlers(), "  ").is_err());
        assert!(root.child_of_type(&handlers(), "connection-handler", None).is_err());
        assert!(root
            .child_of_type(&crypto(), "crypto-manager", Some("x"))
            .is_err());
    }

    #[test]
    fn test_rename_only_for_instantiable() {
        let root = ManagedObjectPath::empty("root");
        let ldap = root.child_instantiable(&handlers(), "LDAP").unwrap();
        let renamed = ldap.rename("LDAPS").unwrap();
        assert_eq!(renamed.name(), Some("LDAPS"));
        assert_eq!(renamed.parent(1).unwrap(), root);

        let crypto = root.child_singleton(&crypto()).unwrap();
        assert!(crypto.rename("other").is_err());
        assert!(root.rename("x").is_err());
    }

    #[test]
    fn test_string_form_escapes_slashes_and_marks_subtypes() {
        let root = ManagedObjectPath::empty("root");
        assert_eq!(root.to_string(), "/");

        let plain = root.child_instantiable(&handlers(), "a/b").unwrap();
        assert_eq!(plain.to_string(), "/relation=connection-handler+name=a//b");

        let typed = root
            .child_of_type(&handlers(), "ldap-connection-handler", Some("LDAP"))
            .unwrap();
        assert_eq!(
            typed.to_string(),
            "/relation=connection-handler+type=ldap-connection-handler+name=LDAP"
        );
    }

    #[test]
    fn test_structural_equality_and_hash() {
        use std::collections::HashSet;
        let root = ManagedObjectPath::empty("root");
        let a = root.child_instantiable(&handlers(), "LDAP").unwrap();
        let b = ManagedObjectPath::empty("root")
            .child_instantiable(&handlers(), "LDAP")
            .unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
