use super::{ValueIssue, ValueSyntax};
use crate::conditions::Condition;
use crate::context::AdminContext;
use crate::dn::Rdn;
use crate::errors::{ConfigError, Result};
use crate::path::ManagedObjectPath;
use crate::relation::RelationDefinition;
use std::cmp::Ordering;

/// Target location fixed when the definition tree is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAggregation {
    pub parent_path: ManagedObjectPath,
    pub relation: RelationDefinition,
}

/// References, by instance name, to objects held in an instantiable relation
/// elsewhere in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSyntax {
    parent_path: String,
    relation: String,
    target_definition: String,
    target_needs_enabling: Condition,
    target_is_enabled: Condition,
    resolved: Option<ResolvedAggregation>,
}

impl AggregationSyntax {
    /// Values name instances of `target_definition` held in `relation`.
    pub fn builder(relation: &str, target_definition: &str) -> AggregationSyntaxBuilder {
        AggregationSyntaxBuilder {
            parent_path: "/".to_string(),
            relation: relation.to_string(),
            target_definition: target_definition.to_string(),
            target_needs_enabling: None,
            target_is_enabled: None,
        }
    }

    /// String form of the path holding the relation.
    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    pub fn relation_name(&self) -> &str {
        &self.relation
    }

    pub fn target_definition(&self) -> &str {
        &self.target_definition
    }

    /// Evaluated on the referencing object: when true its targets must be
    /// enabled.
    pub fn target_needs_enabling(&self) -> &Condition {
        &self.target_needs_enabling
    }

    /// Evaluated on a target: whether it counts as enabled.
    pub fn target_is_enabled(&self) -> &Condition {
        &self.target_is_enabled
    }

    pub fn resolved(&self) -> Option<&ResolvedAggregation> {
        self.resolved.as_ref()
    }

    pub(crate) fn set_resolved(&mut self, resolved: ResolvedAggregation) {
        self.resolved = Some(resolved);
    }

    /// Path of the object named `name`.
    ///
    /// # Errors
    /// Fails before the definition tree is built, or for an invalid name.
    pub fn child_path(&self, name: &str) -> Result<ManagedObjectPath> {
        let resolved = self.resolved.as_ref().ok_or_else(|| {
            ConfigError::schema(format!(
                "aggregation over \"{}\" is used before its definition tree is built",
                self.relation
            ))
        })?;
        resolved
            .parent_path
            .child_of_type(&resolved.relation, &self.target_definition, Some(name))
    }

    fn normalized_name(&self, name: &str, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        if self.resolved.is_none() {
            return Ok(Rdn::new(cx.ldap_profile().naming_attribute(), name).normalized_value());
        }
        let path = self
            .child_path(name)
            .map_err(|e| ValueIssue::new(e.to_string()))?;
        path.to_dn(cx.ldap_profile())
            .rdn()
            .map(Rdn::normalized_value)
            .ok_or_else(|| ValueIssue::new(format!("\"{}\" does not name an object", name)))
    }
}

#[derive(Debug)]
pub struct AggregationSyntaxBuilder {
    parent_path: String,
    relation: String,
    target_definition: String,
    target_needs_enabling: Option<Condition>,
    target_is_enabled: Option<Condition>,
}

impl AggregationSyntaxBuilder {
    /// Path of the object holding the relation; the root by default.
    pub fn parent_path(mut self, path: &str) -> Self {
        self.parent_path = path.to_string();
        self
    }

    pub fn target_needs_enabling(mut self, condition: Condition) -> Self {
        self.target_needs_enabling = Some(condition);
        self
    }

    pub fn target_is_enabled(mut self, condition: Condition) -> Self {
        self.target_is_enabled = Some(condition);
        self
    }

    /// With neither enabled condition given, both default to `Condition::True`:
    /// every referencing object needs an enabled target and every target counts
    /// as enabled.
    ///
    /// # Errors
    /// Schema error for blank names, or when only one of the two enabled
    /// conditions is given.
    pub fn build(self) -> Result<AggregationSyntax> {
        if self.relation.trim().is_empty() || self.target_definition.trim().is_empty() {
            return Err(ConfigError::schema(
                "an aggregation needs a relation and a target definition",
            ));
        }
        let (needs, is_enabled) = match (self.target_needs_enabling, self.target_is_enabled) {
            (Some(needs), Some(is_enabled)) => (needs, is_enabled),
            (None, None) => (Condition::True, Condition::True),
            _ => {
                return Err(ConfigError::schema(format!(
                    "aggregation over \"{}\" must declare both enabled conditions or neither",
                    self.relation
                )))
            }
        };
        Ok(AggregationSyntax {
            parent_path: self.parent_path,
            relation: self.relation,
            target_definition: self.target_definition,
            target_needs_enabling: needs,
            target_is_enabled: is_enabled,
            resolved: None,
        })
    }
}

impl ValueSyntax for AggregationSyntax {
    type Value = String;

    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        let name = text.trim().to_string();
        self.validate(&name, cx)?;
        Ok(name)
    }

    fn validate(&self, value: &String, cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        if value.trim().is_empty() {
            return Err(ValueIssue::new("an aggregation value must name an object"));
        }
        self.normalized_name(value, cx).map(|_| ())
    }

    fn encode(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        Ok(value.clone())
    }

    fn normalize(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        if value.trim().is_empty() {
            return Err(ValueIssue::new("an aggregation value must name an object"));
        }
        self.normalized_name(value, cx)
    }

    fn compare(&self, a: &String, b: &String) -> Ordering {
        let key = |name: &String| Rdn::new("cn", name.as_str()).normalized_value();
        key(a).cmp(&key(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> AggregationSyntax {
        let relation = RelationDefinition::instantiable("root", "key-manager-provider", "key-manager-provider")
            .plural_name("key-manager-providers")
            .build()
            .unwrap();
        let mut syntax = AggregationSyntax::builder("key-manager-provider", "key-manager-provider")
            .build()
            .unwrap();
        syntax.set_resolved(ResolvedAggregation {
            parent_path: ManagedObjectPath::empty("root"),
            relation,
        });
        syntax
    }

    #[test]
    fn test_enabled_conditions_both_or_neither() {
        let one = AggregationSyntax::builder("r", "t")
            .target_is_enabled(Condition::contains("enabled", "true"))
            .build();
        assert!(one.is_err());
        let neither = AggregationSyntax::builder("r", "t").build().unwrap();
        assert_eq!(neither.target_needs_enabling(), &Condition::True);
        assert_eq!(neither.target_is_enabled(), &Condition::True);
        assert_eq!(neither.parent_path(), "/");
    }

    #[test]
    fn test_child_path_requires_resolution() {
        let unresolved = AggregationSyntax::builder("r", "t").build().unwrap();
        assert!(unresolved.child_path("x").is_err());
        let path = resolved().child_path("JKS").unwrap();
        assert_eq!(path.to_string(), "/relation=key-manager-provider+name=JKS");
    }

    #[test]
    fn test_normalized_through_dn() {
        let cx = AdminContext::client();
        let syntax = resolved();
        assert_eq!(
            syntax.normalize(&"Default  Key Manager".to_string(), &cx).unwrap(),
            "default key manager"
        );
        assert!(syntax.decode("  ", &cx).is_err());
        assert_eq!(
            syntax.compare(&"JKS".to_string(), &"jks".to_string()),
            Ordering::Equal
        );
    }
}
