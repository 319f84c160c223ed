//! Boolean conditions over a managed object's effective property values.
//!
//! Used by generic constraints and by aggregation properties to couple the
//! enabled state of a referencing object with that of its target.

use crate::context::AdminContext;
use crate::default_behavior::DefaultBehavior;
use crate::definition::DefinitionTree;
use crate::errors::{ConfigError, Result};
use crate::management::{CandidateObject, ManagementContext};
use crate::path::ManagedObjectPath;
use crate::property::PropertyDefinition;
use std::fmt;

/// Raw property values of the object a condition is evaluated against.
pub trait PropertySource {
    fn definition(&self) -> &str;

    /// # Errors
    /// Fails when the values cannot be read.
    fn raw_values(&self, property: &str) -> Result<Vec<String>>;
}

impl PropertySource for CandidateObject {
    fn definition(&self) -> &str {
        CandidateObject::definition(self)
    }

    fn raw_values(&self, property: &str) -> Result<Vec<String>> {
        Ok(self.values(property).to_vec())
    }
}

/// An object read through a management context.
pub struct ContextPropertySource<'a> {
    context: &'a dyn ManagementContext,
    path: &'a ManagedObjectPath,
}

impl<'a> ContextPropertySource<'a> {
    pub fn new(context: &'a dyn ManagementContext, path: &'a ManagedObjectPath) -> Self {
        Self { context, path }
    }
}

impl PropertySource for ContextPropertySource<'_> {
    fn definition(&self) -> &str {
        self.path.definition_name()
    }

    fn raw_values(&self, property: &str) -> Result<Vec<String>> {
        Ok(self.context.property_values(self.path, property)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    True,
    False,
    Contains { property: String, value: String },
    IsPresent { property: String },
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn contains(property: &str, value: &str) -> Self {
        Condition::Contains {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_present(property: &str) -> Self {
        Condition::IsPresent {
            property: property.to_string(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    pub fn and<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn or<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    /// Property names this condition reads.
    pub fn referenced_properties(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_properties(&mut names);
        names
    }

    fn collect_properties<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Condition::True | Condition::False => {}
            Condition::Contains { property, .. } | Condition::IsPresent { property } => {
                if !names.contains(&property.as_str()) {
                    names.push(property);
                }
            }
            Condition::Not(inner) => inner.collect_properties(names),
            Condition::And(all) | Condition::Or(all) => {
                for c in all {
                    c.collect_properties(names);
                }
            }
        }
    }

    /// Check that every property referenced exists on `definition` and that
    /// `contains` operands decode.
    ///
    /// # Errors
    /// Schema error naming the first unresolvable reference.
    pub fn initialize(&self, tree: &DefinitionTree, definition: &str, cx: &AdminContext) -> Result<()> {
        match self {
            Condition::True | Condition::False => Ok(()),
            Condition::IsPresent { property } => tree.property_definition(definition, property).map(|_| ()),
            Condition::Contains { property, value } => {
                let pd = tree.property_definition(definition, property)?;
                pd.decode_value(value, cx).map(|_| ()).map_err(|e| {
                    ConfigError::schema(format!(
                        "condition {} on \"{}\" has an invalid operand: {}",
                        self, definition, e
                    ))
                })
            }
            Condition::Not(inner) => inner.initialize(tree, definition, cx),
            Condition::And(all) | Condition::Or(all) => all
                .iter()
                .try_for_each(|c| c.initialize(tree, definition, cx)),
        }
    }

    /// # Errors
    /// Fails when a referenced property is unknown or its values cannot be
    /// read or decoded.
    pub fn evaluate(
        &self,
        tree: &DefinitionTree,
        source: &dyn PropertySource,
        cx: &AdminContext,
    ) -> Result<bool> {
        match self {
            Condition::True => Ok(true),
            Condition::False => Ok(false),
            Condition::IsPresent { property } => {
                let pd = tree.property_definition(source.definition(), property)?;
                Ok(!effective_values(pd, source)?.is_empty())
            }
            Condition::Contains { property, value } => {
                let pd = tree.property_definition(source.definition(), property)?;
                let wanted = pd.normalize_value(&pd.decode_value(value, cx)?, cx)?;
                for text in effective_values(pd, source)? {
                    let actual = pd.normalize_value(&pd.decode_value(&text, cx)?, cx)?;
                    if actual == wanted {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not(inner) => Ok(!inner.evaluate(tree, source, cx)?),
            Condition::And(all) => {
                for c in all {
                    if !c.evaluate(tree, source, cx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(all) => {
                for c in all {
                    if c.evaluate(tree, source, cx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Explicit values, else the property's fixed defaults.
fn effective_values(pd: &PropertyDefinition, source: &dyn PropertySource) -> Result<Vec<String>> {
    let values = source.raw_values(pd.name())?;
    if !values.is_empty() {
        return Ok(values);
    }
    match pd.default_behavior() {
        DefaultBehavior::Defined(defaults) => Ok(defaults.clone()),
        _ => Ok(Vec::new()),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, all: &[Condition]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, c) in all.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", c)?;
    }
    f.write_str(")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::True => f.write_str("true"),
            Condition::False => f.write_str("false"),
            Condition::Contains { property, value } => write!(f, "contains({}, {})", property, value),
            Condition::IsPresent { property } => write!(f, "is-present({})", property),
            Condition::Not(inner) => write!(f, "not({})", inner),
            Condition::And(all) => write_list(f, "and", all),
            Condition::Or(all) => write_list(f, "or", all),
        }
    }
}
