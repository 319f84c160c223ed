//! The definition tree.
//!
//! Definitions form a single-inheritance hierarchy held in an arena and
//! addressed by name. The tree is assembled by `DefinitionTreeBuilder`,
//! whose `build` runs the cross-reference initialization pass, and is
//! immutable afterwards.

mod builder;
mod resolver;

pub use builder::DefinitionTreeBuilder;
pub use resolver::{no_type_information, DecodingReason};

use crate::constraint::Constraint;
use crate::errors::{ConfigError, Result};
use crate::path::ManagedObjectPath;
use crate::property::PropertyDefinition;
use crate::relation::{RelationDefinition, RelationType};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(usize);

#[derive(Debug, Clone)]
pub struct Definition {
    id: DefinitionId,
    name: String,
    parent: Option<DefinitionId>,
    children: Vec<DefinitionId>,
    is_abstract: bool,
    tags: BTreeSet<String>,
    properties: Vec<PropertyDefinition>,
    relations: Vec<RelationDefinition>,
    constraints: Vec<Constraint>,
}

impl Definition {
    fn new(id: DefinitionId, name: &str, parent: Option<DefinitionId>, is_abstract: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            parent,
            children: Vec::new(),
            is_abstract,
            tags: BTreeSet::new(),
            properties: Vec::new(),
            relations: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn id(&self) -> DefinitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<DefinitionId> {
        self.parent
    }

    /// Direct sub-types in declaration order.
    pub fn child_ids(&self) -> &[DefinitionId] {
        &self.children
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Locally declared properties.
    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Locally declared relations.
    pub fn relations(&self) -> &[RelationDefinition] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name() == name)
    }

    /// Locally registered constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

#[derive(Debug, Clone)]
pub struct DefinitionTree {
    definitions: Vec<Definition>,
    index: HashMap<String, DefinitionId>,
}

impl DefinitionTree {
    pub fn root(&self) -> &Definition {
        &self.definitions[0]
    }

    pub fn root_path(&self) -> ManagedObjectPath {
        ManagedObjectPath::empty(self.root().name())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Every definition, parents before children.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter()
    }

    pub fn find(&self, name: &str) -> Option<&Definition> {
        self.index.get(name).map(|id| &self.definitions[id.0])
    }

    /// # Errors
    /// `DefinitionNotFound` when no definition has this name.
    pub fn get(&self, name: &str) -> Result<&Definition> {
        self.find(name).ok_or_else(|| ConfigError::DefinitionNotFound {
            name: name.to_string(),
        })
    }

    pub fn definition(&self, id: DefinitionId) -> Option<&Definition> {
        self.definitions.get(id.0)
    }

    pub fn parent(&self, definition: &Definition) -> Option<&Definition> {
        definition.parent.and_then(|id| self.definition(id))
    }

    /// `definition` followed by its ancestors up to the root.
    fn lineage<'a>(&'a self, definition: &'a Definition) -> impl Iterator<Item = &'a Definition> + 'a {
        std::iter::successors(Some(definition), move |d| self.parent(d))
    }

    /// Property declared by `definition` or its nearest ancestor declaring it.
    ///
    /// # Errors
    /// `DefinitionNotFound` or `PropertyNotFound`.
    pub fn property_definition(&self, definition: &str, property: &str) -> Result<&PropertyDefinition> {
        let def = self.get(definition)?;
        self.lineage(def)
            .find_map(|d| d.property(property))
            .ok_or_else(|| ConfigError::PropertyNotFound {
                definition: definition.to_string(),
                property: property.to_string(),
            })
    }

    /// # Errors
    /// `DefinitionNotFound` or `RelationNotFound`.
    pub fn relation_definition(&self, definition: &str, relation: &str) -> Result<&RelationDefinition> {
        let def = self.get(definition)?;
        self.lineage(def)
            .find_map(|d| d.relation(relation))
            .ok_or_else(|| ConfigError::RelationNotFound {
                definition: definition.to_string(),
                relation: relation.to_string(),
            })
    }

    /// Local properties followed by the inherited ones. Overridden
    /// properties appear once per declaring level.
    ///
    /// # Errors
    /// `DefinitionNotFound`.
    pub fn all_property_definitions(&self, definition: &str) -> Result<Vec<&PropertyDefinition>> {
        let def = self.get(definition)?;
        Ok(self.lineage(def).flat_map(|d| d.properties.iter()).collect())
    }

    /// Local relations followed by the inherited ones, without de-duplication.
    ///
    /// # Errors
    /// `DefinitionNotFound`.
    pub fn all_relation_definitions(&self, definition: &str) -> Result<Vec<&RelationDefinition>> {
        let def = self.get(definition)?;
        Ok(self.lineage(def).flat_map(|d| d.relations.iter()).collect())
    }

    /// Local constraints followed by the inherited ones.
    ///
    /// # Errors
    /// `DefinitionNotFound`.
    pub fn all_constraints(&self, definition: &str) -> Result<Vec<&Constraint>> {
        let def = self.get(definition)?;
        Ok(self.lineage(def).flat_map(|d| d.constraints.iter()).collect())
    }

    /// True when `a` is `b` or one of its sub-types.
    pub fn is_child_of(&self, a: &str, b: &str) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(a), Some(b)) => self.lineage(a).any(|d| d.id == b.id),
            _ => false,
        }
    }

    pub fn is_parent_of(&self, a: &str, b: &str) -> bool {
        self.is_child_of(b, a)
    }

    /// # Errors
    /// `DefinitionNotFound`.
    pub fn children(&self, definition: &str) -> Result<Vec<&Definition>> {
        let def = self.get(definition)?;
        Ok(def
            .children
            .iter()
            .filter_map(|id| self.definition(*id))
            .collect())
    }

    /// Every sub-type, depth-first in declaration order.
    ///
    /// # Errors
    /// `DefinitionNotFound`.
    pub fn all_children(&self, definition: &str) -> Result<Vec<&Definition>> {
        let def = self.get(definition)?;
        let mut out = Vec::new();
        self.collect_children(def, &mut out);
        Ok(out)
    }

    fn collect_children<'a>(&'a self, definition: &'a Definition, out: &mut Vec<&'a Definition>) {
        for child in definition.children.iter().filter_map(|id| self.definition(*id)) {
            out.push(child);
            self.collect_children(child, out);
        }
    }

    /// Relations, anywhere in the tree, able to hold objects of `definition`.
    ///
    /// # Errors
    /// `DefinitionNotFound`.
    pub fn reverse_relations(&self, definition: &str) -> Result<Vec<&RelationDefinition>> {
        self.get(definition)?;
        Ok(self
            .definitions
            .iter()
            .flat_map(|d| d.relations.iter())
            .filter(|r| self.is_child_of(definition, r.child()))
            .collect())
    }

    /// Parse the string form of a path, e.g.
    /// `/relation=backend+name=userRoot/relation=index+name=cn`.
    ///
    /// # Errors
    /// `InvalidPath` for malformed text; relation and definition lookup
    /// errors for names the tree does not know.
    pub fn parse_path(&self, text: &str) -> Result<ManagedObjectPath> {
        let mut path = self.root_path();
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(path);
        }
        let Some(body) = trimmed.strip_prefix('/') else {
            return Err(ConfigError::invalid_path(text, "paths must start with '/'"));
        };
        for element in split_elements(body) {
            let parsed = parse_element(text, &element)?;
            let rd = self.relation_definition(path.definition_name(), &parsed.relation)?;
            let definition = match parsed.definition {
                Some(definition) => {
                    self.get(&definition)?;
                    if !self.is_child_of(&definition, rd.child()) {
                        return Err(ConfigError::invalid_path(
                            text,
                            format!(
                                "\"{}\" is not a sub-type of \"{}\" held by relation \"{}\"",
                                definition,
                                rd.child(),
                                rd.name()
                            ),
                        ));
                    }
                    definition
                }
                None => rd.child().to_string(),
            };
            if rd.relation_type() == RelationType::Set && parsed.name.is_some() {
                return Err(ConfigError::invalid_path(
                    text,
                    format!("set relation \"{}\" does not take a name", rd.name()),
                ));
            }
            path = path.child_of_type(rd, &definition, parsed.name.as_deref())?;
        }
        Ok(path)
    }

    pub(crate) fn definition_mut(&mut self, id: DefinitionId) -> Option<&mut Definition> {
        self.definitions.get_mut(id.0)
    }
}

struct ParsedElement {
    relation: String,
    definition: Option<String>,
    name: Option<String>,
}

/// Split on single `/`; `//` stands for a literal slash.
fn split_elements(body: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' {
            if chars.peek() == Some(&'/') {
                chars.next();
                current.push('/');
            } else {
                elements.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    elements.push(current);
    elements
}

/// `relation=<r>[+type=<t>][+name=<n>]`, in that order.
fn parse_element(path: &str, element: &str) -> Result<ParsedElement> {
    let mut parts = element.split('+').map(str::trim);
    let relation = parts
        .next()
        .and_then(|p| p.strip_prefix("relation="))
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            ConfigError::invalid_path(path, format!("element \"{}\" does not start with relation=", element))
        })?;
    let mut parsed = ParsedElement {
        relation: relation.to_string(),
        definition: None,
        name: None,
    };
    for part in parts {
        let (key, value) = part
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
            .ok_or_else(|| ConfigError::invalid_path(path, format!("malformed element \"{}\"", element)))?;
        match key {
            "type" if parsed.definition.is_none() && parsed.name.is_none() => {
                parsed.definition = Some(value.to_string());
            }
            "name" if parsed.name.is_none() => parsed.name = Some(value.to_string()),
            _ => {
                return Err(ConfigError::invalid_path(
                    path,
                    format!("unexpected \"{}\" in element \"{}\"", key, element),
                ))
            }
        }
    }
    Ok(parsed)
}
