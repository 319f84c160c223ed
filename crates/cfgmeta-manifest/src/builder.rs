//! Registration of a parsed manifest into a definition tree

use crate::errors::{definition_validation, Result};
use crate::format_v0::{ConditionSpec, DefaultSpec, ManifestV0, PropertySpec, RelationSpec, SyntaxSpec};
use crate::parser::{parse_manifest_file, parse_manifest_str};
use cfgmeta_core::cfgmeta_core_types::schema::OP_LOAD_MANIFEST;
use cfgmeta_core::conditions::Condition;
use cfgmeta_core::context::StaticMessageCatalog;
use cfgmeta_core::dn::Dn;
use cfgmeta_core::property::{
    AdministratorAction, AggregationSyntax, AttributeTypeSyntax, BooleanSyntax, ClassSyntax, DnSyntax,
    DurationSyntax, DurationUnit, EnumSyntax, IntegerSyntax, IpAddressSyntax, PropertyDefinition,
    PropertySyntax, SizeSyntax, SizeUnit, StringSyntax,
};
use cfgmeta_core::relation::{DefaultManagedObject, RelationDefinition, RelationOption, RelationType};
use cfgmeta_core::{log_op_end, log_op_error, log_op_start};
use cfgmeta_core::{AdminContext, DefaultBehavior, DefinitionTree, DefinitionTreeBuilder, GenericConstraint};
use std::path::Path;
use std::time::Instant;

/// A built tree plus the descriptive text carried by the manifest.
#[derive(Debug)]
pub struct LoadedSchema {
    pub tree: DefinitionTree,
    pub catalog: StaticMessageCatalog,
}

/// Parse, validate and build a manifest file
pub fn load_manifest_file(path: &Path, cx: &AdminContext) -> Result<LoadedSchema> {
    let start = Instant::now();
    log_op_start!(OP_LOAD_MANIFEST, path = %path.display());
    let result = parse_manifest_file(path).and_then(|m| load(&m, cx));
    finish(start, result)
}

/// Parse, validate and build a manifest held in memory
pub fn load_manifest_str(content: &str, cx: &AdminContext) -> Result<LoadedSchema> {
    let start = Instant::now();
    log_op_start!(OP_LOAD_MANIFEST);
    let result = parse_manifest_str(content).and_then(|m| load(&m, cx));
    finish(start, result)
}

fn finish(start: Instant, result: Result<LoadedSchema>) -> Result<LoadedSchema> {
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(schema) => log_op_end!(
            OP_LOAD_MANIFEST,
            duration_ms = duration_ms,
            definition_count = schema.tree.len()
        ),
        Err(err) => log_op_error!(OP_LOAD_MANIFEST, err.clone(), duration_ms = duration_ms),
    }
    result
}

fn load(manifest: &ManifestV0, cx: &AdminContext) -> Result<LoadedSchema> {
    Ok(LoadedSchema {
        tree: build_tree(manifest, cx)?,
        catalog: message_catalog(manifest),
    })
}

/// Register every definition, property, relation and constraint
pub fn build_tree(manifest: &ManifestV0, cx: &AdminContext) -> Result<DefinitionTree> {
    let mut builder = DefinitionTreeBuilder::new(&manifest.root);

    for definition in &manifest.definitions {
        let parent = definition.parent.as_deref().unwrap_or(&manifest.root);
        if definition.is_abstract {
            builder.define_abstract(&definition.name, parent)?;
        } else {
            builder.define(&definition.name, parent)?;
        }
        for tag in &definition.tags {
            builder.tag(&definition.name, tag)?;
        }
    }

    for relation in &manifest.root_relations {
        builder.register_relation(relation_definition(&manifest.root, relation)?)?;
    }
    for definition in &manifest.definitions {
        for property in &definition.properties {
            builder.register_property(property_definition(&definition.name, property)?)?;
        }
        for relation in &definition.relations {
            builder.register_relation(relation_definition(&definition.name, relation)?)?;
        }
        for constraint in &definition.constraints {
            builder.register_constraint(
                &definition.name,
                GenericConstraint::constraint(
                    &definition.name,
                    &constraint.name,
                    condition(&constraint.condition),
                ),
            )?;
        }
    }

    Ok(builder.build_with(cx)?)
}

/// Descriptive text keyed the way `AdminContext` looks it up
pub fn message_catalog(manifest: &ManifestV0) -> StaticMessageCatalog {
    let locale = manifest.locale.as_str();
    let mut catalog = StaticMessageCatalog::new();
    let relation_names = |catalog: &mut StaticMessageCatalog, owner: &str, relations: &[RelationSpec]| {
        for relation in relations {
            if let Some(text) = &relation.user_friendly_name {
                let key = format!("relation.{}.user-friendly-name", relation.name);
                catalog.insert(owner, &key, locale, text);
            }
        }
    };
    relation_names(&mut catalog, &manifest.root, &manifest.root_relations);

    for definition in &manifest.definitions {
        let name = definition.name.as_str();
        if let Some(text) = &definition.user_friendly_name {
            catalog.insert(name, "user-friendly-name", locale, text);
        }
        if let Some(text) = &definition.synopsis {
            catalog.insert(name, "synopsis", locale, text);
        }
        for property in &definition.properties {
            if let Some(text) = &property.synopsis {
                catalog.insert(name, &format!("property.{}.synopsis", property.name), locale, text);
            }
            if let Some(text) = &property.description {
                catalog.insert(name, &format!("property.{}.description", property.name), locale, text);
            }
        }
        for constraint in &definition.constraints {
            if let Some(text) = &constraint.synopsis {
                catalog.insert(name, &format!("constraint.{}.synopsis", constraint.name), locale, text);
            }
        }
        relation_names(&mut catalog, name, &definition.relations);
    }
    catalog
}

fn condition(spec: &ConditionSpec) -> Condition {
    match spec {
        ConditionSpec::Contains { property, value } => Condition::contains(property, value),
        ConditionSpec::IsPresent(property) => Condition::is_present(property),
        ConditionSpec::Not(inner) => Condition::not(condition(inner)),
        ConditionSpec::And(all) => Condition::and(all.iter().map(condition)),
        ConditionSpec::Or(all) => Condition::or(all.iter().map(condition)),
    }
}

fn default_behavior(spec: &DefaultSpec) -> DefaultBehavior {
    match spec {
        DefaultSpec::Defined(values) => DefaultBehavior::defined(values.iter().cloned()),
        DefaultSpec::Alias(key) => DefaultBehavior::Alias(key.clone()),
        DefaultSpec::AbsoluteInherited { path, property } => DefaultBehavior::absolute_inherited(path, property),
        DefaultSpec::RelativeInherited {
            offset,
            definition,
            property,
        } => DefaultBehavior::relative_inherited(*offset, definition, property),
    }
}

fn property_definition(owner: &str, spec: &PropertySpec) -> Result<PropertyDefinition> {
    let mut builder = PropertyDefinition::builder(owner, &spec.name)
        .options(spec.options.iter().copied())
        .syntax(syntax(owner, &spec.name, &spec.syntax)?);
    if let Some(action) = &spec.admin_action {
        let mut admin_action = AdministratorAction::new(action.kind);
        if let Some(synopsis) = &action.synopsis {
            admin_action = admin_action.with_synopsis(synopsis.clone());
        }
        builder = builder.admin_action(admin_action);
    }
    if let Some(default) = &spec.default {
        builder = builder.default_behavior(default_behavior(default));
    }
    Ok(builder.build()?)
}

fn size_limit(owner: &str, property: &str, text: &str) -> Result<i64> {
    SizeUnit::parse_value(text, SizeUnit::Bytes).map_err(|e| {
        definition_validation(
            owner,
            &format!("Invalid size limit \"{}\" for property {}: {}", text, property, e.reason()),
        )
    })
}

fn duration_unit(owner: &str, property: &str, text: &str) -> Result<DurationUnit> {
    DurationUnit::parse(text).ok_or_else(|| {
        definition_validation(
            owner,
            &format!("Unknown duration unit \"{}\" for property {}", text, property),
        )
    })
}

fn syntax(owner: &str, property: &str, spec: &SyntaxSpec) -> Result<PropertySyntax> {
    let syntax: PropertySyntax = match spec {
        SyntaxSpec::Boolean => PropertySyntax::from(BooleanSyntax),
        SyntaxSpec::Integer {
            lower,
            upper,
            unlimited,
        } => {
            let mut builder = IntegerSyntax::builder();
            if let Some(lower) = lower {
                builder = builder.lower_limit(*lower)?;
            }
            if let Some(upper) = upper {
                builder = builder.upper_limit(*upper)?;
            }
            builder.allow_unlimited(*unlimited).build().into()
        }
        SyntaxSpec::Size {
            lower,
            upper,
            unlimited,
        } => {
            let mut builder = SizeSyntax::builder();
            if let Some(lower) = lower {
                builder = builder.lower_limit(size_limit(owner, property, lower)?)?;
            }
            if let Some(upper) = upper {
                builder = builder.upper_limit(size_limit(owner, property, upper)?)?;
            }
            builder.allow_unlimited(*unlimited).build().into()
        }
        SyntaxSpec::Duration {
            base_unit,
            maximum_unit,
            lower,
            upper,
            unlimited,
        } => {
            let mut builder = DurationSyntax::builder();
            if let Some(unit) = base_unit {
                builder = builder.base_unit(duration_unit(owner, property, unit)?)?;
            }
            if let Some(unit) = maximum_unit {
                builder = builder.maximum_unit(duration_unit(owner, property, unit)?)?;
            }
            if let Some(lower) = lower {
                builder = builder.lower_limit(*lower)?;
            }
            if let Some(upper) = upper {
                builder = builder.upper_limit(*upper)?;
            }
            builder.allow_unlimited(*unlimited).build().into()
        }
        SyntaxSpec::String {
            pattern,
            usage,
            case_insensitive,
        } => {
            let mut builder = StringSyntax::builder();
            if let Some(pattern) = pattern {
                builder = builder.pattern(pattern, usage.as_deref().unwrap_or("STRING"))?;
            }
            builder.case_insensitive(*case_insensitive).build().into()
        }
        SyntaxSpec::Class { instance_of } => {
            let mut builder = ClassSyntax::builder();
            for interface in instance_of {
                builder = builder.instance_of(interface)?;
            }
            builder.build().into()
        }
        SyntaxSpec::Enum { values } => EnumSyntax::builder()
            .values(values.iter().map(String::as_str))?
            .build()?
            .into(),
        SyntaxSpec::Dn { base_dn } => match base_dn {
            Some(text) => {
                let base = Dn::parse(text).map_err(|e| {
                    definition_validation(
                        owner,
                        &format!("Invalid base DN \"{}\" for property {}: {}", text, property, e),
                    )
                })?;
                DnSyntax::with_base_dn(base).into()
            }
            None => DnSyntax::new().into(),
        },
        SyntaxSpec::Aggregation {
            relation,
            target,
            parent_path,
            target_needs_enabling,
            target_is_enabled,
        } => {
            let mut builder = AggregationSyntax::builder(relation, target);
            if let Some(path) = parent_path {
                builder = builder.parent_path(path);
            }
            if let Some(c) = target_needs_enabling {
                builder = builder.target_needs_enabling(condition(c));
            }
            if let Some(c) = target_is_enabled {
                builder = builder.target_is_enabled(condition(c));
            }
            builder.build()?.into()
        }
        SyntaxSpec::IpAddress => IpAddressSyntax.into(),
        SyntaxSpec::AttributeType => AttributeTypeSyntax.into(),
    };
    Ok(syntax)
}

fn relation_definition(parent: &str, spec: &RelationSpec) -> Result<RelationDefinition> {
    let mut builder = match spec.kind {
        RelationType::Singleton => RelationDefinition::singleton(parent, &spec.name, &spec.child),
        RelationType::Optional => RelationDefinition::optional(parent, &spec.name, &spec.child),
        RelationType::Instantiable => RelationDefinition::instantiable(parent, &spec.name, &spec.child),
        RelationType::Set => RelationDefinition::set(parent, &spec.name, &spec.child),
        RelationType::Aggregation => RelationDefinition::aggregation(parent, &spec.name, &spec.child),
    };
    if let Some(plural) = &spec.plural_name {
        builder = builder.plural_name(plural);
    }
    if let Some(naming) = &spec.naming_property {
        builder = builder.naming_property(naming);
    }
    if spec.hidden {
        builder = builder.option(RelationOption::Hidden);
    }
    for object in &spec.default_objects {
        let mut template = DefaultManagedObject::new(object.definition.as_deref().unwrap_or(&spec.child));
        for (property, values) in &object.values {
            template = template.with_values(property.as_str(), values.iter().cloned());
        }
        builder = match &object.name {
            Some(name) => builder.default_instance(name, template),
            None => builder.default_object(template),
        };
    }
    if let Some(target) = &spec.target {
        builder = builder.target(&target.path, &target.relation);
    }
    if spec.min_occurs.is_some() || spec.max_occurs.is_some() {
        builder = builder.occurs(spec.min_occurs.unwrap_or(0), spec.max_occurs.unwrap_or(0))?;
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_tree_with_catalog() {
        let yaml = r#"
schema_version: 0
root_relations:
  - name: backend
    kind: instantiable
    child: backend
    plural_name: backends
    user_friendly_name: Backend
definitions:
  - name: backend
    user_friendly_name: Backend
    synopsis: Stores directory data
    properties:
      - name: enabled
        syntax: { kind: boolean }
        options: [mandatory]
        synopsis: Whether the backend is enabled
"#;
        let schema = load_manifest_str(yaml, &AdminContext::client()).unwrap();
        assert!(schema.tree.find("backend").is_some());
        assert!(schema.tree.property_definition("backend", "enabled").is_ok());
        assert_eq!(schema.catalog.len(), 4);
    }

    #[test]
    fn test_bad_limits_are_reported_against_definition() {
        let yaml = r#"
schema_version: 0
definitions:
  - name: backend
    properties:
      - name: cache-size
        syntax: { kind: size, lower: "lots" }
"#;
        let err = load_manifest_str(yaml, &AdminContext::client()).unwrap_err();
        assert_eq!(err.definition(), Some("backend"));
    }
}
