use super::{Definition, DefinitionTree};
use crate::errors::{ConfigError, Result};
use std::collections::HashSet;
use std::fmt;

/// Why external data could not be mapped onto a concrete definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodingReason {
    /// The data carries no type information at all.
    NoTypeInformation,
    /// The data does not describe the expected definition or a sub-type.
    WrongTypeInformation,
    /// The most specific match is abstract.
    AbstractTypeInformation,
}

impl fmt::Display for DecodingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DecodingReason::NoTypeInformation => "no type information",
            DecodingReason::WrongTypeInformation => "the type information does not match",
            DecodingReason::AbstractTypeInformation => "the type information names an abstract type",
        })
    }
}

/// Error for callers that find no type information before resolving.
pub fn no_type_information(definition: &str) -> ConfigError {
    ConfigError::DefinitionDecoding {
        definition: definition.to_string(),
        reason: DecodingReason::NoTypeInformation,
    }
}

impl DefinitionTree {
    /// Most specific definition under `root` accepted by `matches`.
    ///
    /// Depth-first: a rejected node ends its subtree; otherwise the first
    /// child (in declaration order) that resolves wins, else the node itself.
    ///
    /// # Errors
    /// `WrongTypeInformation` when `root` is rejected,
    /// `AbstractTypeInformation` when the result is abstract.
    pub fn resolve_managed_object_definition<F>(&self, root: &str, matches: F) -> Result<&Definition>
    where
        F: Fn(&Definition) -> bool,
    {
        let start = self.get(root)?;
        let resolved = self
            .resolve_from(start, &matches)
            .ok_or_else(|| ConfigError::DefinitionDecoding {
                definition: root.to_string(),
                reason: DecodingReason::WrongTypeInformation,
            })?;
        if resolved.is_abstract() {
            return Err(ConfigError::DefinitionDecoding {
                definition: resolved.name().to_string(),
                reason: DecodingReason::AbstractTypeInformation,
            });
        }
        Ok(resolved)
    }

    fn resolve_from<'a, F>(&'a self, node: &'a Definition, matches: &F) -> Option<&'a Definition>
    where
        F: Fn(&Definition) -> bool,
    {
        if !matches(node) {
            return None;
        }
        node.child_ids()
            .iter()
            .filter_map(|id| self.definition(*id))
            .find_map(|child| self.resolve_from(child, matches))
            .or(Some(node))
    }

    /// Resolve from type tags such as object classes. A definition matches
    /// when the tags name it or one of its sub-types, so an object tagged
    /// with its concrete type and nothing else still resolves.
    ///
    /// # Errors
    /// `NoTypeInformation` for an empty tag set, otherwise as
    /// `resolve_managed_object_definition`.
    pub fn resolve_from_tags<S: AsRef<str>>(&self, root: &str, tags: &[S]) -> Result<&Definition> {
        if tags.is_empty() {
            return Err(no_type_information(root));
        }
        let tags: HashSet<String> = tags.iter().map(|t| t.as_ref().trim().to_lowercase()).collect();
        self.resolve_managed_object_definition(root, |d| {
            let named = |d: &Definition| {
                tags.contains(&d.name().to_lowercase())
                    || d.tags().iter().any(|t| tags.contains(&t.to_lowercase()))
            };
            named(d)
                || self
                    .all_children(d.name())
                    .map(|children| children.into_iter().any(named))
                    .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionTreeBuilder;

    fn tree() -> DefinitionTree {
        let mut b = DefinitionTreeBuilder::new("root");
        b.define_abstract("a", "root").unwrap();
        b.define("a1", "a").unwrap();
        b.define("a2", "a").unwrap();
        b.define("b", "root").unwrap();
        b.build().unwrap()
    }

    fn reason(result: Result<&Definition>) -> Option<DecodingReason> {
        match result {
            Err(ConfigError::DefinitionDecoding { reason, .. }) => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn test_resolution_outcomes() {
        let tree = tree();
        assert_eq!(tree.resolve_from_tags("a", &["a1"]).unwrap().name(), "a1");
        assert_eq!(tree.resolve_from_tags("a", &["A", "A2"]).unwrap().name(), "a2");
        assert_eq!(
            reason(tree.resolve_from_tags("a", &["a"])),
            Some(DecodingReason::AbstractTypeInformation)
        );
        assert_eq!(
            reason(tree.resolve_from_tags("a", &["x"])),
            Some(DecodingReason::WrongTypeInformation)
        );
        assert_eq!(
            reason(tree.resolve_from_tags::<&str>("a", &[])),
            Some(DecodingReason::NoTypeInformation)
        );
    }

    #[test]
    fn test_first_matching_child_wins() {
        let tree = tree();
        let resolved = tree
            .resolve_managed_object_definition("root", |d| d.name() != "b")
            .unwrap();
        assert_eq!(resolved.name(), "a1");
        let rooted = tree.resolve_managed_object_definition("root", |d| d.name() == "root");
        assert_eq!(rooted.unwrap().name(), "root");
    }
}
