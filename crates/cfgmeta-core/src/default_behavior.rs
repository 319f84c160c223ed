//! Default behavior of properties.
//!
//! A provider only describes where defaults come from; callers resolve them
//! with `resolve_default_values`, which may read other managed objects
//! through a `ManagementContext`.

use crate::context::AdminContext;
use crate::definition::DefinitionTree;
use crate::errors::{ConfigError, Result};
use crate::management::ManagementContext;
use crate::path::ManagedObjectPath;
use crate::property::{PropertyDefinition, PropertyValue};
use cfgmeta_core_types::schema::OP_RESOLVE_DEFAULT_VALUES;
use std::time::Instant;

/// Inherit from a property of the object at a fixed path.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteInherited {
    path: String,
    property: String,
    resolved: Option<ManagedObjectPath>,
}

impl AbsoluteInherited {
    pub fn new(path: &str, property: &str) -> Self {
        Self {
            path: path.to_string(),
            property: property.to_string(),
            resolved: None,
        }
    }

    /// String form of the source path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    /// Parsed source path; available once the definition tree is built.
    pub fn resolved_path(&self) -> Option<&ManagedObjectPath> {
        self.resolved.as_ref()
    }

    pub(crate) fn set_resolved_path(&mut self, path: ManagedObjectPath) {
        self.resolved = Some(path);
    }
}

/// Inherit from a property of an ancestor `offset` levels above the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeInherited {
    offset: usize,
    definition: String,
    property: String,
}

impl RelativeInherited {
    /// `definition` is the type expected at the ancestor.
    pub fn new(offset: usize, definition: &str, property: &str) -> Self {
        Self {
            offset,
            definition: definition.to_string(),
            property: property.to_string(),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultBehavior {
    /// No default: absence is meaningful.
    #[default]
    Undefined,
    /// Fixed textual values, decoded by the owning property.
    Defined(Vec<String>),
    /// Behavior described in text only; the value is a message key.
    Alias(String),
    AbsoluteInherited(AbsoluteInherited),
    RelativeInherited(RelativeInherited),
}

impl DefaultBehavior {
    pub fn defined<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DefaultBehavior::Defined(values.into_iter().map(Into::into).collect())
    }

    pub fn absolute_inherited(path: &str, property: &str) -> Self {
        DefaultBehavior::AbsoluteInherited(AbsoluteInherited::new(path, property))
    }

    pub fn relative_inherited(offset: usize, definition: &str, property: &str) -> Self {
        DefaultBehavior::RelativeInherited(RelativeInherited::new(offset, definition, property))
    }

    pub fn is_inherited(&self) -> bool {
        matches!(
            self,
            DefaultBehavior::AbsoluteInherited(_) | DefaultBehavior::RelativeInherited(_)
        )
    }

    /// Path of the object defaults are inherited from, for an object at
    /// `current`. `None` for the non-inherited variants.
    ///
    /// # Errors
    /// Fails when a relative offset exceeds the depth of `current`, or an
    /// absolute path was never resolved.
    pub fn source_path(&self, current: &ManagedObjectPath) -> Result<Option<ManagedObjectPath>> {
        match self {
            DefaultBehavior::AbsoluteInherited(a) => a
                .resolved_path()
                .cloned()
                .map(Some)
                .ok_or_else(|| {
                    ConfigError::schema(format!(
                        "inherited default path \"{}\" is used before its definition tree is built",
                        a.path()
                    ))
                }),
            DefaultBehavior::RelativeInherited(r) => current.parent(r.offset()).map(Some),
            _ => Ok(None),
        }
    }

    /// Source property of an inherited default.
    pub fn source_property(&self) -> Option<&str> {
        match self {
            DefaultBehavior::AbsoluteInherited(a) => Some(a.property()),
            DefaultBehavior::RelativeInherited(r) => Some(r.property()),
            _ => None,
        }
    }

    pub fn accept<R, P, V>(&self, visitor: &mut V, param: P) -> Result<R>
    where
        V: DefaultBehaviorVisitor<R, P> + ?Sized,
    {
        match self {
            DefaultBehavior::Undefined => visitor.visit_undefined(param),
            DefaultBehavior::Defined(values) => visitor.visit_defined(values, param),
            DefaultBehavior::Alias(key) => visitor.visit_alias(key, param),
            DefaultBehavior::AbsoluteInherited(a) => visitor.visit_absolute_inherited(a, param),
            DefaultBehavior::RelativeInherited(r) => visitor.visit_relative_inherited(r, param),
        }
    }
}

/// Dispatch over default behavior variants. Unhandled variants fall through
/// to `visit_unknown`.
pub trait DefaultBehaviorVisitor<R, P> {
    fn visit_unknown(&mut self, kind: &str, _param: P) -> Result<R> {
        Err(ConfigError::UnknownVariant {
            visitor: std::any::type_name::<Self>().to_string(),
            kind: format!("{} default behavior", kind),
        })
    }

    fn visit_undefined(&mut self, param: P) -> Result<R> {
        self.visit_unknown("undefined", param)
    }

    fn visit_defined(&mut self, _values: &[String], param: P) -> Result<R> {
        self.visit_unknown("defined", param)
    }

    fn visit_alias(&mut self, _message_key: &str, param: P) -> Result<R> {
        self.visit_unknown("alias", param)
    }

    fn visit_absolute_inherited(&mut self, _provider: &AbsoluteInherited, param: P) -> Result<R> {
        self.visit_unknown("absolute-inherited", param)
    }

    fn visit_relative_inherited(&mut self, _provider: &RelativeInherited, param: P) -> Result<R> {
        self.visit_unknown("relative-inherited", param)
    }
}

/// Resolved defaults of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValues {
    Values(Vec<PropertyValue>),
    Undefined,
    /// Message key describing the behavior.
    Alias(String),
}

/// Inherited lookups give up after this many hops.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Resolve the defaults of `pd` for the object at `current`.
///
/// Inherited defaults read the source object's explicit values; when the
/// source has none its own default behavior applies, recursively.
///
/// # Errors
/// `DefaultBehavior` wrapping the cause when the source cannot be read or a
/// value does not decode.
pub fn resolve_default_values(
    tree: &DefinitionTree,
    pd: &PropertyDefinition,
    current: &ManagedObjectPath,
    context: &dyn ManagementContext,
    cx: &AdminContext,
) -> Result<DefaultValues> {
    let start = Instant::now();
    crate::log_op_start!(
        OP_RESOLVE_DEFAULT_VALUES,
        property = pd.name(),
        path = %current
    );
    let result = resolve_texts(tree, pd.default_behavior(), current, context, 0)
        .and_then(|resolved| match resolved {
            Resolved::Texts(texts) => texts
                .iter()
                .map(|t| pd.decode_value(t, cx))
                .collect::<Result<Vec<_>>>()
                .map(DefaultValues::Values),
            Resolved::Undefined => Ok(DefaultValues::Undefined),
            Resolved::Alias(key) => Ok(DefaultValues::Alias(key)),
        })
        .map_err(|cause| ConfigError::DefaultBehavior {
            property: pd.name().to_string(),
            cause: Box::new(cause),
        });
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => crate::log_op_end!(
            OP_RESOLVE_DEFAULT_VALUES,
            duration_ms = duration_ms,
            property = pd.name()
        ),
        Err(err) => crate::log_op_error!(
            OP_RESOLVE_DEFAULT_VALUES,
            err.clone(),
            duration_ms = duration_ms,
            property = pd.name()
        ),
    }
    result
}

enum Resolved {
    Texts(Vec<String>),
    Undefined,
    Alias(String),
}

fn resolve_texts(
    tree: &DefinitionTree,
    behavior: &DefaultBehavior,
    current: &ManagedObjectPath,
    context: &dyn ManagementContext,
    depth: usize,
) -> Result<Resolved> {
    match behavior {
        DefaultBehavior::Undefined => Ok(Resolved::Undefined),
        DefaultBehavior::Defined(values) => Ok(Resolved::Texts(values.clone())),
        DefaultBehavior::Alias(key) => Ok(Resolved::Alias(key.clone())),
        DefaultBehavior::AbsoluteInherited(_) | DefaultBehavior::RelativeInherited(_) => {
            if depth >= MAX_INHERITANCE_DEPTH {
                return Err(ConfigError::schema(format!(
                    "inherited defaults nest deeper than {} levels",
                    MAX_INHERITANCE_DEPTH
                )));
            }
            let (Some(source), Some(property)) =
                (behavior.source_path(current)?, behavior.source_property())
            else {
                return Ok(Resolved::Undefined);
            };
            let values = context.property_values(&source, property)?;
            if !values.is_empty() {
                return Ok(Resolved::Texts(values));
            }
            let source_pd = tree.property_definition(source.definition_name(), property)?;
            resolve_texts(tree, source_pd.default_behavior(), &source, context, depth + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationDefinition;

    fn nested_path() -> ManagedObjectPath {
        let backends = RelationDefinition::instantiable("root", "backend", "backend")
            .plural_name("backends")
            .build()
            .unwrap();
        let indexes = RelationDefinition::instantiable("backend", "index", "index")
            .plural_name("indexes")
            .build()
            .unwrap();
        ManagedObjectPath::empty("root")
            .child_instantiable(&backends, "userRoot")
            .unwrap()
            .child_instantiable(&indexes, "cn")
            .unwrap()
    }

    #[test]
    fn test_relative_source_paths() {
        let current = nested_path();
        let one_up = DefaultBehavior::relative_inherited(1, "backend", "entry-limit");
        let here = DefaultBehavior::relative_inherited(0, "index", "entry-limit");

        let parent = one_up.source_path(&current).unwrap().unwrap();
        assert_eq!(parent, current.parent(1).unwrap());
        assert_eq!(parent.name(), Some("userRoot"));
        assert_eq!(here.source_path(&current).unwrap().unwrap(), current);

        let too_far = DefaultBehavior::relative_inherited(3, "root", "entry-limit");
        assert!(too_far.source_path(&current).is_err());
    }

    #[test]
    fn test_non_inherited_have_no_source() {
        let current = nested_path();
        assert_eq!(DefaultBehavior::Undefined.source_path(&current).unwrap(), None);
        assert_eq!(DefaultBehavior::defined(["1"]).source_property(), None);
        assert!(DefaultBehavior::absolute_inherited("/", "x")
            .source_path(&current)
            .is_err());
    }

    struct Describe;

    impl DefaultBehaviorVisitor<String, ()> for Describe {
        fn visit_defined(&mut self, values: &[String], _: ()) -> Result<String> {
            Ok(values.join(", "))
        }
    }

    #[test]
    fn test_visitor_dispatch() {
        assert_eq!(
            DefaultBehavior::defined(["a", "b"]).accept(&mut Describe, ()).unwrap(),
            "a, b"
        );
        assert!(matches!(
            DefaultBehavior::Alias("k".into()).accept(&mut Describe, ()),
            Err(ConfigError::UnknownVariant { .. })
        ));
    }
}
