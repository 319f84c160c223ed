//! Manifest parser with validation
//!
//! Parses YAML and validates schema version, name uniqueness and definition
//! ordering

use crate::errors::{definition_validation, io_error, manifest_validation, yaml_error, Result};
use crate::format_v0::{ManifestV0, RelationSpec};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Parse a manifest file from a path
pub fn parse_manifest_file(path: &Path) -> Result<ManifestV0> {
    let content = fs::read_to_string(path).map_err(|e| io_error("manifest_read", e))?;
    parse_manifest_str(&content)
}

/// Parse a manifest from a string
pub fn parse_manifest_str(content: &str) -> Result<ManifestV0> {
    let manifest: ManifestV0 = serde_yaml::from_str(content).map_err(yaml_error)?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Validate a parsed manifest
fn validate_manifest(manifest: &ManifestV0) -> Result<()> {
    if manifest.schema_version != 0 {
        return Err(manifest_validation(&format!(
            "Unsupported schema_version: {}. Expected 0",
            manifest.schema_version
        )));
    }
    if manifest.root.trim().is_empty() {
        return Err(manifest_validation("The root definition needs a name"));
    }

    // Every name known to the manifest, for relation children
    let mut all_names: HashSet<&str> = HashSet::new();
    all_names.insert(&manifest.root);
    for definition in &manifest.definitions {
        if !all_names.insert(&definition.name) {
            return Err(definition_validation(
                &definition.name,
                &format!("Duplicate definition {}", definition.name),
            ));
        }
    }

    // Parents must be declared before their children
    let mut declared: HashSet<&str> = HashSet::new();
    declared.insert(&manifest.root);
    for definition in &manifest.definitions {
        let parent = definition.parent.as_deref().unwrap_or(&manifest.root);
        if !declared.contains(parent) {
            return Err(definition_validation(
                &definition.name,
                &format!(
                    "Definition {} extends {}, which is not declared before it",
                    definition.name, parent
                ),
            ));
        }
        declared.insert(&definition.name);

        unique(&definition.name, "property", definition.properties.iter().map(|p| p.name.as_str()))?;
        unique(&definition.name, "relation", definition.relations.iter().map(|r| r.name.as_str()))?;
        unique(
            &definition.name,
            "constraint",
            definition.constraints.iter().map(|c| c.name.as_str()),
        )?;
        validate_relations(&definition.name, &definition.relations, &all_names)?;
    }

    unique(
        &manifest.root,
        "relation",
        manifest.root_relations.iter().map(|r| r.name.as_str()),
    )?;
    validate_relations(&manifest.root, &manifest.root_relations, &all_names)?;

    Ok(())
}

fn unique<'a>(definition: &str, what: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(definition_validation(
                definition,
                &format!("Duplicate {} {} in definition {}", what, name, definition),
            ));
        }
    }
    Ok(())
}

fn validate_relations(owner: &str, relations: &[RelationSpec], known: &HashSet<&str>) -> Result<()> {
    for relation in relations {
        if !known.contains(relation.child.as_str()) {
            return Err(definition_validation(
                owner,
                &format!(
                    "Relation {} references non-existent definition: {}",
                    relation.name, relation.child
                ),
            ));
        }
        for object in &relation.default_objects {
            if let Some(definition) = &object.definition {
                if !known.contains(definition.as_str()) {
                    return Err(definition_validation(
                        owner,
                        &format!(
                            "Default object of relation {} references non-existent definition: {}",
                            relation.name, definition
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}
