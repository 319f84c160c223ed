//! Relation definitions: how one definition owns or refers to another.

use crate::errors::{ConfigError, Result};
use crate::path::ManagedObjectPath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    Singleton,
    Optional,
    Instantiable,
    Set,
    Aggregation,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Singleton => "singleton",
            RelationType::Optional => "optional",
            RelationType::Instantiable => "instantiable",
            RelationType::Set => "set",
            RelationType::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationOption {
    Hidden,
}

/// Template for an object created alongside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultManagedObject {
    definition: String,
    values: BTreeMap<String, Vec<String>>,
}

impl DefaultManagedObject {
    pub fn new(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_values<I, S>(mut self, property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values
            .insert(property.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Raw property values, keyed by property name.
    pub fn values(&self) -> &BTreeMap<String, Vec<String>> {
        &self.values
    }
}

/// Reference-only relation into an instantiable relation elsewhere in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRelation {
    target_path: String,
    target_relation: String,
    min_occurs: u32,
    max_occurs: u32,
    resolved_target: Option<ManagedObjectPath>,
}

impl AggregationRelation {
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn target_relation(&self) -> &str {
        &self.target_relation
    }

    pub fn min_occurs(&self) -> u32 {
        self.min_occurs
    }

    /// Zero means unbounded.
    pub fn max_occurs(&self) -> u32 {
        self.max_occurs
    }

    /// Parsed target path; available once the definition tree is built.
    pub fn resolved_target(&self) -> Option<&ManagedObjectPath> {
        self.resolved_target.as_ref()
    }

    pub(crate) fn set_resolved_target(&mut self, path: ManagedObjectPath) {
        self.resolved_target = Some(path);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    Singleton {
        default_object: Option<DefaultManagedObject>,
    },
    Optional {
        default_object: Option<DefaultManagedObject>,
    },
    Instantiable {
        naming_property: Option<String>,
        default_objects: BTreeMap<String, DefaultManagedObject>,
    },
    /// At most one instance per concrete sub-type; templates keyed by sub-type.
    Set {
        default_objects: BTreeMap<String, DefaultManagedObject>,
    },
    Aggregation(AggregationRelation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationDefinition {
    name: String,
    plural_name: String,
    parent: String,
    child: String,
    options: BTreeSet<RelationOption>,
    kind: RelationKind,
}

impl RelationDefinition {
    pub fn singleton(parent: &str, name: &str, child: &str) -> RelationDefinitionBuilder {
        RelationDefinitionBuilder::new(RelationType::Singleton, parent, name, child)
    }

    pub fn optional(parent: &str, name: &str, child: &str) -> RelationDefinitionBuilder {
        RelationDefinitionBuilder::new(RelationType::Optional, parent, name, child)
    }

    pub fn instantiable(parent: &str, name: &str, child: &str) -> RelationDefinitionBuilder {
        RelationDefinitionBuilder::new(RelationType::Instantiable, parent, name, child)
    }

    pub fn set(parent: &str, name: &str, child: &str) -> RelationDefinitionBuilder {
        RelationDefinitionBuilder::new(RelationType::Set, parent, name, child)
    }

    pub fn aggregation(parent: &str, name: &str, child: &str) -> RelationDefinitionBuilder {
        RelationDefinitionBuilder::new(RelationType::Aggregation, parent, name, child)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Equal to `name` for singleton and optional relations.
    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    /// Name of the definition declaring the relation.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Name of the related definition.
    pub fn child(&self) -> &str {
        &self.child
    }

    pub fn options(&self) -> &BTreeSet<RelationOption> {
        &self.options
    }

    pub fn has_option(&self, option: RelationOption) -> bool {
        self.options.contains(&option)
    }

    pub fn kind(&self) -> &RelationKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut RelationKind {
        &mut self.kind
    }

    pub fn relation_type(&self) -> RelationType {
        match self.kind {
            RelationKind::Singleton { .. } => RelationType::Singleton,
            RelationKind::Optional { .. } => RelationType::Optional,
            RelationKind::Instantiable { .. } => RelationType::Instantiable,
            RelationKind::Set { .. } => RelationType::Set,
            RelationKind::Aggregation(_) => RelationType::Aggregation,
        }
    }

    /// Composition relations delete their children with the parent.
    pub fn cascade_delete(&self) -> bool {
        !matches!(self.kind, RelationKind::Aggregation(_))
    }

    /// Whether `count` references satisfy the aggregation bounds. Composition
    /// relations place no bound here.
    pub fn check_cardinality(&self, count: usize) -> bool {
        match &self.kind {
            RelationKind::Aggregation(agg) => {
                let count = u64::try_from(count).unwrap_or(u64::MAX);
                count >= u64::from(agg.min_occurs)
                    && (agg.max_occurs == 0 || count <= u64::from(agg.max_occurs))
            }
            _ => true,
        }
    }

    pub fn naming_property(&self) -> Option<&str> {
        match &self.kind {
            RelationKind::Instantiable {
                naming_property, ..
            } => naming_property.as_deref(),
            _ => None,
        }
    }

    /// Default-object templates with their instance key: the instance name for
    /// instantiable relations, the sub-type for sets, none otherwise.
    pub fn default_managed_objects(&self) -> Vec<(Option<&str>, &DefaultManagedObject)> {
        match &self.kind {
            RelationKind::Singleton { default_object } | RelationKind::Optional { default_object } => {
                default_object.iter().map(|o| (None, o)).collect()
            }
            RelationKind::Instantiable {
                default_objects, ..
            }
            | RelationKind::Set { default_objects } => default_objects
                .iter()
                .map(|(k, o)| (Some(k.as_str()), o))
                .collect(),
            RelationKind::Aggregation(_) => Vec::new(),
        }
    }

    pub fn aggregation_relation(&self) -> Option<&AggregationRelation> {
        match &self.kind {
            RelationKind::Aggregation(agg) => Some(agg),
            _ => None,
        }
    }

    pub fn accept<R, P, V>(&self, visitor: &mut V, param: P) -> Result<R>
    where
        V: RelationDefinitionVisitor<R, P> + ?Sized,
    {
        match self.relation_type() {
            RelationType::Singleton => visitor.visit_singleton(self, param),
            RelationType::Optional => visitor.visit_optional(self, param),
            RelationType::Instantiable => visitor.visit_instantiable(self, param),
            RelationType::Set => visitor.visit_set(self, param),
            RelationType::Aggregation => visitor.visit_aggregation(self, param),
        }
    }
}

#[derive(Debug)]
pub struct RelationDefinitionBuilder {
    relation_type: RelationType,
    parent: String,
    name: String,
    child: String,
    plural_name: Option<String>,
    options: BTreeSet<RelationOption>,
    naming_property: Option<String>,
    default_object: Option<DefaultManagedObject>,
    default_instances: BTreeMap<String, DefaultManagedObject>,
    target: Option<(String, String)>,
    occurs: (u32, u32),
}

impl RelationDefinitionBuilder {
    fn new(relation_type: RelationType, parent: &str, name: &str, child: &str) -> Self {
        Self {
            relation_type,
            parent: parent.to_string(),
            name: name.to_string(),
            child: child.to_string(),
            plural_name: None,
            options: BTreeSet::new(),
            naming_property: None,
            default_object: None,
            default_instances: BTreeMap::new(),
            target: None,
            occurs: (0, 0),
        }
    }

    pub fn plural_name(mut self, plural_name: &str) -> Self {
        self.plural_name = Some(plural_name.to_string());
        self
    }

    pub fn option(mut self, option: RelationOption) -> Self {
        self.options.insert(option);
        self
    }

    /// Instantiable relations only: the child property whose value names the
    /// instance.
    pub fn naming_property(mut self, property: &str) -> Self {
        self.naming_property = Some(property.to_string());
        self
    }

    /// Template for singleton/optional relations, or for sets, keyed by the
    /// template's definition.
    pub fn default_object(mut self, object: DefaultManagedObject) -> Self {
        if self.relation_type == RelationType::Set {
            self.default_instances
                .insert(object.definition().to_string(), object);
        } else {
            self.default_object = Some(object);
        }
        self
    }

    /// Instantiable relations only: a template created under `name`.
    pub fn default_instance(mut self, name: &str, object: DefaultManagedObject) -> Self {
        self.default_instances.insert(name.to_string(), object);
        self
    }

    /// Aggregation only: the parent path and instantiable relation the
    /// references point into.
    pub fn target(mut self, parent_path: &str, relation: &str) -> Self {
        self.target = Some((parent_path.to_string(), relation.to_string()));
        self
    }

    /// Aggregation only. `max_occurs = 0` is unbounded.
    pub fn occurs(mut self, min_occurs: u32, max_occurs: u32) -> Result<Self> {
        if max_occurs != 0 && min_occurs > max_occurs {
            return Err(ConfigError::schema(format!(
                "relation \"{}\": min-occurs {} exceeds max-occurs {}",
                self.name, min_occurs, max_occurs
            )));
        }
        self.occurs = (min_occurs, max_occurs);
        Ok(self)
    }

    /// # Errors
    /// Returns `ConfigError::Schema` when the name is blank, when an option
    /// does not apply to the relation type (naming property, target, default
    /// objects), when a plural relation has no plural name, or when an
    /// aggregation has no target.
    pub fn build(self) -> Result<RelationDefinition> {
        let fail = |message: String| {
            Err(ConfigError::schema(format!("relation \"{}\": {}", self.name, message)))
        };
        if self.name.trim().is_empty() {
            return fail("relation names must not be blank".to_string());
        }
        let kind_name = self.relation_type.as_str();
        if self.naming_property.is_some() && self.relation_type != RelationType::Instantiable {
            return fail(format!("{} relations have no naming property", kind_name));
        }
        if self.target.is_some() && self.relation_type != RelationType::Aggregation {
            return fail(format!("{} relations have no target", kind_name));
        }
        if !self.default_instances.is_empty()
            && !matches!(self.relation_type, RelationType::Instantiable | RelationType::Set)
        {
            return fail(format!("{} relations have no named default objects", kind_name));
        }
        if self.default_object.is_some()
            && !matches!(self.relation_type, RelationType::Singleton | RelationType::Optional)
        {
            return fail(format!("{} relations need named default objects", kind_name));
        }

        let plural_name = match (self.relation_type, self.plural_name) {
            (RelationType::Singleton | RelationType::Optional, None) => self.name.clone(),
            (_, Some(plural)) => plural,
            (_, None) => return fail(format!("{} relations require a plural name", kind_name)),
        };

        let kind = match self.relation_type {
            RelationType::Singleton => RelationKind::Singleton {
                default_object: self.default_object,
            },
            RelationType::Optional => RelationKind::Optional {
                default_object: self.default_object,
            },
            RelationType::Instantiable => RelationKind::Instantiable {
                naming_property: self.naming_property,
                default_objects: self.default_instances,
            },
            RelationType::Set => RelationKind::Set {
                default_objects: self.default_instances,
            },
            RelationType::Aggregation => {
                let Some((target_path, target_relation)) = self.target else {
                    return fail("aggregation relations require a target".to_string());
                };
                RelationKind::Aggregation(AggregationRelation {
                    target_path,
                    target_relation,
                    min_occurs: self.occurs.0,
                    max_occurs: self.occurs.1,
                    resolved_target: None,
                })
            }
        };

        Ok(RelationDefinition {
            name: self.name,
            plural_name,
            parent: self.parent,
            child: self.child,
            options: self.options,
            kind,
        })
    }
}

/// Dispatch over relation kinds. Unhandled kinds fall through to
/// `visit_unknown`.
pub trait RelationDefinitionVisitor<R, P> {
    fn visit_unknown(&mut self, relation: &RelationDefinition, _param: P) -> Result<R> {
        Err(ConfigError::UnknownVariant {
            visitor: std::any::type_name::<Self>().to_string(),
            kind: format!("{} relation \"{}\"", relation.relation_type(), relation.name()),
        })
    }

    fn visit_singleton(&mut self, relation: &RelationDefinition, param: P) -> Result<R> {
        self.visit_unknown(relation, param)
    }

    fn visit_optional(&mut self, relation: &RelationDefinition, param: P) -> Result<R> {
        self.visit_unknown(relation, param)
    }

    fn visit_instantiable(&mut self, relation: &RelationDefinition, param: P) -> Result<R> {
        self.visit_unknown(relation, param)
    }

    fn visit_set(&mut self, relation: &RelationDefinition, param: P) -> Result<R> {
        self.visit_unknown(relation, param)
    }

    fn visit_aggregation(&mut self, relation: &RelationDefinition, param: P) -> Result<R> {
        self.visit_unknown(relation, param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_cascades_aggregation_does_not() {
        let singleton = RelationDefinition::singleton("root", "crypto-manager", "crypto-manager")
            .build()
            .unwrap();
        assert!(singleton.cascade_delete());
        assert_eq!(singleton.plural_name(), "crypto-manager");

        let agg = RelationDefinition::aggregation("ldap-connection-handler", "key-manager", "key-manager-provider")
            .plural_name("key-managers")
            .target("/", "key-manager-provider")
            .occurs(1, 2)
            .unwrap()
            .build()
            .unwrap();
        assert!(!agg.cascade_delete());
        assert!(!agg.check_cardinality(0));
        assert!(agg.check_cardinality(2));
        assert!(!agg.check_cardinality(3));
        let target = agg.aggregation_relation().unwrap();
        assert_eq!(target.target_relation(), "key-manager-provider");
        assert_eq!(target.max_occurs(), 2);
        assert!(singleton.aggregation_relation().is_none());
    }

    #[test]
    fn test_unbounded_max_occurs() {
        let agg = RelationDefinition::aggregation("a", "refs", "b")
            .plural_name("refs")
            .target("/", "b")
            .occurs(0, 0)
            .unwrap()
            .build()
            .unwrap();
        assert!(agg.check_cardinality(10_000));
    }

    #[test]
    fn test_builder_rejects_inconsistent_settings() {
        assert!(RelationDefinition::aggregation("a", "refs", "b")
            .occurs(3, 1)
            .is_err());
        assert!(RelationDefinition::instantiable("a", "items", "b").build().is_err());
        assert!(RelationDefinition::singleton("a", "one", "b")
            .naming_property("cn")
            .build()
            .is_err());
        assert!(RelationDefinition::aggregation("a", "refs", "b")
            .plural_name("refs")
            .build()
            .is_err());
    }

    #[test]
    fn test_set_templates_are_keyed_by_definition() {
        let set = RelationDefinition::set("root", "password-validator", "password-validator")
            .plural_name("password-validators")
            .default_object(DefaultManagedObject::new("length-based-password-validator"))
            .build()
            .unwrap();
        let templates = set.default_managed_objects();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].0, Some("length-based-password-validator"));
    }

    struct KindName;

    impl RelationDefinitionVisitor<&'static str, ()> for KindName {
        fn visit_instantiable(&mut self, _r: &RelationDefinition, _p: ()) -> Result<&'static str> {
            Ok("instantiable")
        }
    }

    #[test]
    fn test_visitor_falls_back_to_unknown() {
        let inst = RelationDefinition::instantiable("root", "item", "item")
            .plural_name("items")
            .build()
            .unwrap();
        assert_eq!(inst.accept(&mut KindName, ()).unwrap(), "instantiable");

        let single = RelationDefinition::singleton("root", "one", "one").build().unwrap();
        let err = single.accept(&mut KindName, ()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVariant { .. }));
    }
}
