use super::PathElement;
use crate::dn::{Dn, Rdn};
use crate::errors::{ConfigError, Result};
use std::collections::BTreeMap;

/// Receives the elements of a path, root first.
pub trait ManagedObjectPathSerializer {
    fn append_instantiable(&mut self, element: &PathElement, name: &str);
    fn append_set(&mut self, element: &PathElement);
    fn append_optional(&mut self, element: &PathElement);
    fn append_singleton(&mut self, element: &PathElement);
}

/// Renders `/relation=<rel>[+type=<def>][+name=<name>]...`.
#[derive(Debug, Default)]
pub struct StringPathSerializer {
    out: String,
}

impl StringPathSerializer {
    pub fn into_string(self) -> String {
        if self.out.is_empty() {
            "/".to_string()
        } else {
            self.out
        }
    }

    fn append(&mut self, element: &PathElement, name: Option<&str>) {
        self.out.push_str("/relation=");
        self.out.push_str(element.relation());
        if element.definition() != element.relation_child() {
            self.out.push_str("+type=");
            self.out.push_str(element.definition());
        }
        if let Some(name) = name {
            self.out.push_str("+name=");
            self.out.push_str(&name.replace('/', "//"));
        }
    }
}

impl ManagedObjectPathSerializer for StringPathSerializer {
    fn append_instantiable(&mut self, element: &PathElement, name: &str) {
        self.append(element, Some(name));
    }

    fn append_set(&mut self, element: &PathElement) {
        self.append(element, None);
    }

    fn append_optional(&mut self, element: &PathElement) {
        self.append(element, None);
    }

    fn append_singleton(&mut self, element: &PathElement) {
        self.append(element, None);
    }
}

/// Directory layout of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LdapProfile {
    root_dn: Dn,
    naming_attribute: String,
    relation_rdns: BTreeMap<String, Dn>,
}

impl Default for LdapProfile {
    fn default() -> Self {
        Self {
            root_dn: Dn::root().child(Rdn::new("cn", "config")),
            naming_attribute: "cn".to_string(),
            relation_rdns: BTreeMap::new(),
        }
    }
}

impl LdapProfile {
    pub fn new(root_dn: Dn, naming_attribute: impl Into<String>) -> Self {
        Self {
            root_dn,
            naming_attribute: naming_attribute.into(),
            relation_rdns: BTreeMap::new(),
        }
    }

    /// Parse a profile from its textual settings.
    pub fn from_parts(
        root_dn: &str,
        naming_attribute: &str,
        relation_rdns: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let root_dn = Dn::parse(root_dn).map_err(|e| ConfigError::InvalidConfiguration {
            message: format!("invalid root DN \"{}\": {}", root_dn, e),
        })?;
        let mut profile = Self::new(root_dn, naming_attribute);
        for (relation, rdns) in relation_rdns {
            profile = profile.with_relation_rdns(relation, rdns)?;
        }
        Ok(profile)
    }

    /// Override the RDN sequence placed between a parent and the instances of
    /// `relation`.
    pub fn with_relation_rdns(mut self, relation: &str, rdns: &str) -> Result<Self> {
        let dn = Dn::parse(rdns).map_err(|e| ConfigError::InvalidConfiguration {
            message: format!("invalid RDN sequence \"{}\" for relation \"{}\": {}", rdns, relation, e),
        })?;
        self.relation_rdns.insert(relation.to_string(), dn);
        Ok(self)
    }

    pub fn root_dn(&self) -> &Dn {
        &self.root_dn
    }

    pub fn naming_attribute(&self) -> &str {
        &self.naming_attribute
    }

    /// RDN sequence for a relation. Instantiable and set relations default to
    /// their plural name, singleton and optional ones to their name.
    pub fn relation_rdn_sequence(&self, element: &PathElement) -> Dn {
        if let Some(dn) = self.relation_rdns.get(element.relation()) {
            return dn.clone();
        }
        let value = match element.name() {
            Some(_) => element.plural_name(),
            None if element.relation_type() == crate::relation::RelationType::Set => {
                element.plural_name()
            }
            None => element.relation(),
        };
        Dn::root().child(Rdn::new(self.naming_attribute.clone(), value))
    }
}

/// Renders a path as the DN of the entry holding the managed object.
#[derive(Debug)]
pub struct DnPathSerializer<'a> {
    profile: &'a LdapProfile,
    dn: Dn,
}

impl<'a> DnPathSerializer<'a> {
    pub fn new(profile: &'a LdapProfile) -> Self {
        Self {
            profile,
            dn: profile.root_dn.clone(),
        }
    }

    pub fn into_dn(self) -> Dn {
        self.dn
    }
}

impl ManagedObjectPathSerializer for DnPathSerializer<'_> {
    fn append_instantiable(&mut self, element: &PathElement, name: &str) {
        let base = self.dn.child_dn(&self.profile.relation_rdn_sequence(element));
        self.dn = base.child(Rdn::new(self.profile.naming_attribute.clone(), name));
    }

    fn append_set(&mut self, element: &PathElement) {
        let base = self.dn.child_dn(&self.profile.relation_rdn_sequence(element));
        self.dn = base.child(Rdn::new(
            self.profile.naming_attribute.clone(),
            element.definition(),
        ));
    }

    fn append_optional(&mut self, element: &PathElement) {
        self.dn = self.dn.child_dn(&self.profile.relation_rdn_sequence(element));
    }

    fn append_singleton(&mut self, element: &PathElement) {
        self.dn = self.dn.child_dn(&self.profile.relation_rdn_sequence(element));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ManagedObjectPath;
    use crate::relation::RelationDefinition;

    #[test]
    fn test_dn_rendering_with_defaults_and_overrides() {
        let handlers = RelationDefinition::instantiable("root", "connection-handler", "connection-handler")
            .plural_name("connection-handlers")
            .build()
            .unwrap();
        let crypto = RelationDefinition::singleton("root", "crypto-manager", "crypto-manager")
            .build()
            .unwrap();
        let root = ManagedObjectPath::empty("root");

        let profile = LdapProfile::default();
        assert_eq!(root.to_dn(&profile).to_string(), "cn=config");
        assert_eq!(
            root.child_instantiable(&handlers, "LDAP")
                .unwrap()
                .to_dn(&profile)
                .to_string(),
            "cn=LDAP,cn=connection-handlers,cn=config"
        );
        assert_eq!(
            root.child_singleton(&crypto).unwrap().to_dn(&profile).to_string(),
            "cn=crypto-manager,cn=config"
        );

        let custom = LdapProfile::default()
            .with_relation_rdns("connection-handler", "cn=Connection Handlers")
            .unwrap();
        assert_eq!(
            root.child_instantiable(&handlers, "LDAP")
                .unwrap()
                .to_dn(&custom)
                .to_string(),
            "cn=LDAP,cn=Connection Handlers,cn=config"
        );
    }

    #[test]
    fn test_profile_rejects_bad_rdn_sequence() {
        let err = LdapProfile::default()
            .with_relation_rdns("connection-handler", "not a dn")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration { .. }));
    }
}
