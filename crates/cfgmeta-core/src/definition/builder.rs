use super::{Definition, DefinitionId, DefinitionTree};
use crate::constraint::{aggregation_constraints, Constraint};
use crate::context::AdminContext;
use crate::default_behavior::DefaultBehavior;
use crate::errors::{ConfigError, Result};
use crate::path::ManagedObjectPath;
use crate::property::{AggregationSyntax, PropertyDefinition, PropertySyntax, ResolvedAggregation};
use crate::relation::{RelationDefinition, RelationKind, RelationType};
use cfgmeta_core_types::schema::OP_BUILD_DEFINITION_TREE;
use std::collections::HashMap;
use std::time::Instant;

/// Bootstrap phase of a definition tree.
///
/// Registration order is free; cross references (paths, relations,
/// conditions, templates) are only checked by `build`.
#[derive(Debug)]
pub struct DefinitionTreeBuilder {
    definitions: Vec<Definition>,
    index: HashMap<String, DefinitionId>,
}

/// Cross references found by the first initialization phase.
enum Resolution {
    AggregationProperty {
        definition: DefinitionId,
        property: usize,
        resolved: ResolvedAggregation,
    },
    InheritedDefault {
        definition: DefinitionId,
        property: usize,
        path: ManagedObjectPath,
    },
    AggregationRelation {
        definition: DefinitionId,
        relation: usize,
        target: ManagedObjectPath,
    },
}

impl DefinitionTreeBuilder {
    /// Start a tree whose root definition is `root`.
    pub fn new(root: &str) -> Self {
        let id = DefinitionId(0);
        let mut index = HashMap::new();
        index.insert(root.to_string(), id);
        Self {
            definitions: vec![Definition::new(id, root, None, false)],
            index,
        }
    }

    pub fn root(&self) -> &str {
        self.definitions[0].name()
    }

    /// # Errors
    /// Schema error for a duplicate or blank name, or an unknown parent.
    pub fn define(&mut self, name: &str, parent: &str) -> Result<DefinitionId> {
        self.add(name, parent, false)
    }

    /// # Errors
    /// As `define`.
    pub fn define_abstract(&mut self, name: &str, parent: &str) -> Result<DefinitionId> {
        self.add(name, parent, true)
    }

    fn add(&mut self, name: &str, parent: &str, is_abstract: bool) -> Result<DefinitionId> {
        if name.trim().is_empty() {
            return Err(ConfigError::schema("definition names must not be blank"));
        }
        if self.index.contains_key(name) {
            return Err(ConfigError::schema(format!("definition \"{}\" is declared twice", name)));
        }
        let parent_id = self.id_of(parent)?;
        let id = DefinitionId(self.definitions.len());
        self.definitions
            .push(Definition::new(id, name, Some(parent_id), is_abstract));
        self.definitions[parent_id.0].children.push(id);
        self.index.insert(name.to_string(), id);
        Ok(id)
    }

    fn id_of(&self, name: &str) -> Result<DefinitionId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::DefinitionNotFound {
                name: name.to_string(),
            })
    }

    /// # Errors
    /// `DefinitionNotFound`.
    pub fn tag(&mut self, definition: &str, tag: &str) -> Result<()> {
        let id = self.id_of(definition)?;
        self.definitions[id.0].tags.insert(tag.to_string());
        Ok(())
    }

    /// Register `pd` with its owner. A property already declared at that
    /// level is replaced.
    ///
    /// # Errors
    /// `DefinitionNotFound` for an unknown owner.
    pub fn register_property(&mut self, pd: PropertyDefinition) -> Result<()> {
        let id = self.id_of(pd.owner())?;
        let def = &mut self.definitions[id.0];
        match def.properties.iter().position(|p| p.name() == pd.name()) {
            Some(i) => {
                tracing::debug!(
                    definition = def.name.as_str(),
                    property = pd.name(),
                    "replacing property definition"
                );
                def.properties[i] = pd;
            }
            None => def.properties.push(pd),
        }
        Ok(())
    }

    /// Register `rd` with its parent definition. A relation already declared
    /// at that level is replaced.
    ///
    /// # Errors
    /// `DefinitionNotFound` for an unknown parent.
    pub fn register_relation(&mut self, rd: RelationDefinition) -> Result<()> {
        let id = self.id_of(rd.parent())?;
        let def = &mut self.definitions[id.0];
        match def.relations.iter().position(|r| r.name() == rd.name()) {
            Some(i) => {
                tracing::debug!(
                    definition = def.name.as_str(),
                    relation = rd.name(),
                    "replacing relation definition"
                );
                def.relations[i] = rd;
            }
            None => def.relations.push(rd),
        }
        Ok(())
    }

    /// # Errors
    /// `DefinitionNotFound`.
    pub fn register_constraint(&mut self, definition: &str, mut constraint: Constraint) -> Result<()> {
        let id = self.id_of(definition)?;
        constraint.set_owner(definition);
        self.definitions[id.0].constraints.push(constraint);
        Ok(())
    }

    /// Run the initialization pass with a client context.
    ///
    /// # Errors
    /// Schema errors for unresolvable cross references.
    pub fn build(self) -> Result<DefinitionTree> {
        self.build_with(&AdminContext::client())
    }

    /// Run the initialization pass, decoding templates and defaults with `cx`.
    ///
    /// # Errors
    /// Schema errors for unresolvable cross references.
    pub fn build_with(self, cx: &AdminContext) -> Result<DefinitionTree> {
        let start = Instant::now();
        crate::log_op_start!(OP_BUILD_DEFINITION_TREE, definitions = self.definitions.len());
        let mut tree = DefinitionTree {
            definitions: self.definitions,
            index: self.index,
        };
        let result = initialize(&mut tree, cx);
        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                crate::log_op_end!(
                    OP_BUILD_DEFINITION_TREE,
                    duration_ms = duration_ms,
                    definitions = tree.len()
                );
                Ok(tree)
            }
            Err(err) => {
                crate::log_op_error!(OP_BUILD_DEFINITION_TREE, err.clone(), duration_ms = duration_ms);
                Err(err)
            }
        }
    }
}

fn initialize(tree: &mut DefinitionTree, cx: &AdminContext) -> Result<()> {
    check_relations(tree)?;
    let resolutions = resolve_references(tree)?;
    apply_resolutions(tree, resolutions);
    check_properties(tree, cx)?;
    check_templates(tree, cx)?;
    register_aggregation_constraints(tree)?;
    for def in tree.definitions() {
        for constraint in def.constraints() {
            constraint.initialize(tree, cx)?;
        }
    }
    Ok(())
}

fn check_relations(tree: &DefinitionTree) -> Result<()> {
    for def in tree.definitions() {
        for rd in def.relations() {
            tree.get(rd.child()).map_err(|_| {
                ConfigError::schema(format!(
                    "relation \"{}\" of \"{}\" holds unknown definition \"{}\"",
                    rd.name(),
                    def.name(),
                    rd.child()
                ))
            })?;
            if let Some(naming) = rd.naming_property() {
                tree.property_definition(rd.child(), naming)?;
            }
        }
    }
    Ok(())
}

fn resolve_aggregation(tree: &DefinitionTree, pd: &PropertyDefinition, syntax: &AggregationSyntax) -> Result<ResolvedAggregation> {
    let parent_path = tree.parse_path(syntax.parent_path())?;
    let relation = tree.relation_definition(parent_path.definition_name(), syntax.relation_name())?;
    if relation.relation_type() != RelationType::Instantiable {
        return Err(ConfigError::schema(format!(
            "aggregation property \"{}\" refers to {} relation \"{}\"; an instantiable relation is required",
            pd.name(),
            relation.relation_type(),
            relation.name()
        )));
    }
    if relation.child() != syntax.target_definition() {
        return Err(ConfigError::schema(format!(
            "aggregation property \"{}\" targets \"{}\" but relation \"{}\" holds \"{}\"",
            pd.name(),
            syntax.target_definition(),
            relation.name(),
            relation.child()
        )));
    }
    Ok(ResolvedAggregation {
        parent_path,
        relation: relation.clone(),
    })
}

fn resolve_references(tree: &DefinitionTree) -> Result<Vec<Resolution>> {
    let mut resolutions = Vec::new();
    for def in tree.definitions() {
        for (i, pd) in def.properties().iter().enumerate() {
            if let PropertySyntax::Aggregation(syntax) = pd.syntax() {
                resolutions.push(Resolution::AggregationProperty {
                    definition: def.id(),
                    property: i,
                    resolved: resolve_aggregation(tree, pd, syntax)?,
                });
            }
            if let DefaultBehavior::AbsoluteInherited(a) = pd.default_behavior() {
                let path = tree.parse_path(a.path())?;
                resolutions.push(Resolution::InheritedDefault {
                    definition: def.id(),
                    property: i,
                    path,
                });
            }
        }
        for (i, rd) in def.relations().iter().enumerate() {
            let Some(agg) = rd.aggregation_relation() else {
                continue;
            };
            let target = tree.parse_path(agg.target_path())?;
            let held = tree.relation_definition(target.definition_name(), agg.target_relation())?;
            if held.relation_type() != RelationType::Instantiable || held.child() != rd.child() {
                return Err(ConfigError::schema(format!(
                    "aggregation relation \"{}\" must target an instantiable relation of \"{}\"",
                    rd.name(),
                    rd.child()
                )));
            }
            resolutions.push(Resolution::AggregationRelation {
                definition: def.id(),
                relation: i,
                target,
            });
        }
    }
    Ok(resolutions)
}

fn apply_resolutions(tree: &mut DefinitionTree, resolutions: Vec<Resolution>) {
    for resolution in resolutions {
        match resolution {
            Resolution::AggregationProperty {
                definition,
                property,
                resolved,
            } => {
                if let Some(PropertySyntax::Aggregation(syntax)) = tree
                    .definition_mut(definition)
                    .and_then(|d| d.properties.get_mut(property))
                    .map(PropertyDefinition::syntax_mut)
                {
                    syntax.set_resolved(resolved);
                }
            }
            Resolution::InheritedDefault {
                definition,
                property,
                path,
            } => {
                if let Some(DefaultBehavior::AbsoluteInherited(a)) = tree
                    .definition_mut(definition)
                    .and_then(|d| d.properties.get_mut(property))
                    .map(PropertyDefinition::default_behavior_mut)
                {
                    a.set_resolved_path(path);
                }
            }
            Resolution::AggregationRelation {
                definition,
                relation,
                target,
            } => {
                if let Some(RelationKind::Aggregation(agg)) = tree
                    .definition_mut(definition)
                    .and_then(|d| d.relations.get_mut(relation))
                    .map(RelationDefinition::kind_mut)
                {
                    agg.set_resolved_target(target);
                }
            }
        }
    }
}

fn check_properties(tree: &DefinitionTree, cx: &AdminContext) -> Result<()> {
    for def in tree.definitions() {
        for pd in def.properties() {
            match pd.default_behavior() {
                DefaultBehavior::Defined(values) => {
                    for value in values {
                        pd.decode_value(value, cx).map_err(|e| {
                            ConfigError::schema(format!(
                                "default value of \"{}\" in \"{}\" is invalid: {}",
                                pd.name(),
                                def.name(),
                                e
                            ))
                        })?;
                    }
                }
                DefaultBehavior::AbsoluteInherited(a) => {
                    if let Some(path) = a.resolved_path() {
                        tree.property_definition(path.definition_name(), a.property())?;
                    }
                }
                DefaultBehavior::RelativeInherited(r) => {
                    tree.property_definition(r.definition(), r.property())?;
                }
                DefaultBehavior::Undefined | DefaultBehavior::Alias(_) => {}
            }
            if let PropertySyntax::Aggregation(syntax) = pd.syntax() {
                syntax.target_needs_enabling().initialize(tree, def.name(), cx)?;
                syntax
                    .target_is_enabled()
                    .initialize(tree, syntax.target_definition(), cx)?;
            }
        }
    }
    Ok(())
}

fn check_templates(tree: &DefinitionTree, cx: &AdminContext) -> Result<()> {
    for def in tree.definitions() {
        for rd in def.relations() {
            for (key, template) in rd.default_managed_objects() {
                if !tree.is_child_of(template.definition(), rd.child()) {
                    return Err(ConfigError::schema(format!(
                        "default object {} of relation \"{}\" is a \"{}\", not a \"{}\"",
                        key.unwrap_or("-"),
                        rd.name(),
                        template.definition(),
                        rd.child()
                    )));
                }
                for (property, values) in template.values() {
                    let pd = tree.property_definition(template.definition(), property)?;
                    pd.decode_values(values, cx).map_err(|e| {
                        ConfigError::schema(format!(
                            "default object {} of relation \"{}\" is invalid: {}",
                            key.unwrap_or("-"),
                            rd.name(),
                            e
                        ))
                    })?;
                }
            }
        }
    }
    Ok(())
}

fn register_aggregation_constraints(tree: &mut DefinitionTree) -> Result<()> {
    let mut additions = Vec::new();
    for def in tree.definitions() {
        for pd in def.properties() {
            if let PropertySyntax::Aggregation(syntax) = pd.syntax() {
                let target = tree.get(syntax.target_definition())?.id();
                let (source_constraint, target_constraint) =
                    aggregation_constraints(def.name(), pd.name(), syntax);
                additions.push((def.id(), source_constraint));
                additions.push((target, target_constraint));
            }
        }
    }
    for (id, mut constraint) in additions {
        if let Some(def) = tree.definition_mut(id) {
            constraint.set_owner(&def.name);
            def.constraints.push(constraint);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::Condition;
    use crate::property::{BooleanSyntax, IntegerSyntax, PropertyOption};
    use crate::relation::DefaultManagedObject;

    fn base() -> DefinitionTreeBuilder {
        let mut b = DefinitionTreeBuilder::new("root");
        b.define("key-manager-provider", "root").unwrap();
        b.define("connection-handler", "root").unwrap();
        b.register_property(
            PropertyDefinition::builder("key-manager-provider", "enabled")
                .option(PropertyOption::Mandatory)
                .syntax(BooleanSyntax)
                .build()
                .unwrap(),
        )
        .unwrap();
        b.register_property(
            PropertyDefinition::builder("connection-handler", "enabled")
                .syntax(BooleanSyntax)
                .build()
                .unwrap(),
        )
        .unwrap();
        b.register_relation(
            RelationDefinition::instantiable("root", "key-manager-provider", "key-manager-provider")
                .plural_name("key-manager-providers")
                .build()
                .unwrap(),
        )
        .unwrap();
        b
    }

    fn aggregation(target: &str) -> PropertyDefinition {
        PropertyDefinition::builder("connection-handler", "key-manager-provider")
            .syntax(
                AggregationSyntax::builder("key-manager-provider", target)
                    .target_needs_enabling(Condition::contains("enabled", "true"))
                    .target_is_enabled(Condition::contains("enabled", "true"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_aggregation_is_resolved_and_constrained() {
        let mut b = base();
        b.register_property(aggregation("key-manager-provider")).unwrap();
        let tree = b.build().unwrap();
        let pd = tree
            .property_definition("connection-handler", "key-manager-provider")
            .unwrap();
        let PropertySyntax::Aggregation(syntax) = pd.syntax() else {
            panic!("aggregation expected");
        };
        assert!(syntax.resolved().is_some());
        assert_eq!(tree.get("connection-handler").unwrap().constraints().len(), 1);
        let target = &tree.get("key-manager-provider").unwrap().constraints()[0];
        assert_eq!(target.owner(), Some("key-manager-provider"));
    }

    #[test]
    fn test_aggregation_target_must_match_relation_child() {
        let mut b = base();
        b.register_property(aggregation("connection-handler")).unwrap();
        assert!(matches!(b.build(), Err(ConfigError::Schema { .. })));
    }

    #[test]
    fn test_duplicate_and_orphan_definitions_rejected() {
        let mut b = DefinitionTreeBuilder::new("root");
        b.define("a", "root").unwrap();
        assert!(b.define("a", "root").is_err());
        assert!(b.define("b", "missing").is_err());
        assert!(b
            .register_property(
                PropertyDefinition::builder("missing", "x")
                    .syntax(BooleanSyntax)
                    .build()
                    .unwrap()
            )
            .is_err());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut b = base();
        b.register_property(
            PropertyDefinition::builder("connection-handler", "enabled")
                .syntax(IntegerSyntax::default())
                .build()
                .unwrap(),
        )
        .unwrap();
        let tree = b.build().unwrap();
        let def = tree.get("connection-handler").unwrap();
        assert_eq!(def.properties().len(), 1);
        assert_eq!(def.properties()[0].syntax().kind_name(), "integer");
    }

    #[test]
    fn test_invalid_templates_and_defaults_fail_build() {
        let mut b = base();
        b.register_relation(
            RelationDefinition::singleton("root", "default-handler", "connection-handler")
                .default_object(
                    DefaultManagedObject::new("connection-handler").with_values("enabled", ["maybe"]),
                )
                .build()
                .unwrap(),
        )
        .unwrap();
        assert!(b.build().is_err());

        let mut b = base();
        b.register_property(
            PropertyDefinition::builder("connection-handler", "port")
                .syntax(IntegerSyntax::default())
                .default_behavior(DefaultBehavior::defined(["x"]))
                .build()
                .unwrap(),
        )
        .unwrap();
        assert!(b.build().is_err());

        let mut b = base();
        b.register_property(
            PropertyDefinition::builder("connection-handler", "port")
                .syntax(IntegerSyntax::default())
                .default_behavior(DefaultBehavior::relative_inherited(1, "root", "port"))
                .build()
                .unwrap(),
        )
        .unwrap();
        assert!(b.build().is_err());
    }
}
