//! Property definitions.
//!
//! A `PropertyDefinition` couples the generic metadata of a property (owner,
//! name, options, administrator action, default behavior) with a
//! `PropertySyntax`: the closed set of value kinds and their invariants.
//! Values travel as `PropertyValue`, the matching closed set of decoded
//! values. Every syntax also implements `ValueSyntax` over its native type
//! for callers that know the kind statically.

mod aggregation;
mod class;
mod dn;
mod duration;
mod enumeration;
mod integer;
mod simple;
mod size;
mod string;
mod units;
pub mod usage;
mod visitor;

pub use aggregation::{AggregationSyntax, AggregationSyntaxBuilder, ResolvedAggregation};
pub use class::{is_valid_class_name, ClassSyntax, ClassSyntaxBuilder};
pub use dn::DnSyntax;
pub use duration::{DurationSyntax, DurationSyntaxBuilder};
pub use enumeration::{ConfigEnum, EnumSyntax, EnumSyntaxBuilder};
pub use integer::{IntegerSyntax, IntegerSyntaxBuilder};
pub use simple::{AttributeTypeSyntax, BooleanSyntax, IpAddressSyntax};
pub use size::{SizeSyntax, SizeSyntaxBuilder};
pub use string::{StringSyntax, StringSyntaxBuilder};
pub use units::{DurationUnit, SizeUnit};
pub use usage::PropertyUsageBuilder;
pub use visitor::{PropertyDefinitionVisitor, PropertyValueVisitor};

use crate::context::AdminContext;
use crate::default_behavior::DefaultBehavior;
use crate::dn::Dn;
use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// Why a value was refused by a syntax. `PropertyDefinition` wraps it into a
/// `ConfigError` naming the property and the offending text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValueIssue(String);

impl ValueIssue {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Typed per-kind contract.
pub trait ValueSyntax {
    type Value: Clone + fmt::Debug + PartialEq;

    /// Parse and validate a textual value.
    ///
    /// # Errors
    /// Fails when the text is malformed or the value violates an invariant.
    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<Self::Value, ValueIssue>;

    /// # Errors
    /// Fails when the value violates an invariant of the syntax.
    fn validate(&self, value: &Self::Value, cx: &AdminContext) -> std::result::Result<(), ValueIssue>;

    /// Inverse of `decode`.
    ///
    /// # Errors
    /// Fails when the value violates an invariant of the syntax.
    fn encode(&self, value: &Self::Value, cx: &AdminContext) -> std::result::Result<String, ValueIssue>;

    /// Canonical form used for equality of values.
    ///
    /// # Errors
    /// Fails when the value violates an invariant of the syntax.
    fn normalize(&self, value: &Self::Value, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.encode(value, cx)
    }

    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyOption {
    Mandatory,
    MultiValued,
    Hidden,
    ReadOnly,
    Monitoring,
    Advanced,
}

impl PropertyOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyOption::Mandatory => "mandatory",
            PropertyOption::MultiValued => "multi-valued",
            PropertyOption::Hidden => "hidden",
            PropertyOption::ReadOnly => "read-only",
            PropertyOption::Monitoring => "monitoring",
            PropertyOption::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdministratorActionType {
    #[default]
    None,
    ComponentRestart,
    ServerRestart,
    Other,
}

impl AdministratorActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdministratorActionType::None => "none",
            AdministratorActionType::ComponentRestart => "component-restart",
            AdministratorActionType::ServerRestart => "server-restart",
            AdministratorActionType::Other => "other",
        }
    }
}

/// What an administrator must do for a change to take effect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdministratorAction {
    kind: AdministratorActionType,
    synopsis: Option<String>,
}

impl AdministratorAction {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(kind: AdministratorActionType) -> Self {
        Self {
            kind,
            synopsis: None,
        }
    }

    /// Text naming the affected component or describing the action.
    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    pub fn kind(&self) -> AdministratorActionType {
        self.kind
    }

    pub fn synopsis(&self) -> Option<&str> {
        self.synopsis.as_deref()
    }
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    /// Bytes; `-1` is unlimited.
    Size(i64),
    /// Count of the property's base unit; `-1` is unlimited.
    Duration(i64),
    String(String),
    Class(String),
    Enum(String),
    Dn(Dn),
    /// Instance name of the referenced object.
    Aggregation(String),
    IpAddress(IpAddr),
    AttributeType(String),
}

impl PropertyValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Size(_) => "size",
            PropertyValue::Duration(_) => "duration",
            PropertyValue::String(_) => "string",
            PropertyValue::Class(_) => "class",
            PropertyValue::Enum(_) => "enumeration",
            PropertyValue::Dn(_) => "dn",
            PropertyValue::Aggregation(_) => "aggregation",
            PropertyValue::IpAddress(_) => "ip-address",
            PropertyValue::AttributeType(_) => "attribute-type",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(v) => write!(f, "{}", v),
            PropertyValue::Integer(v) | PropertyValue::Size(v) | PropertyValue::Duration(v) => {
                write!(f, "{}", v)
            }
            PropertyValue::String(v)
            | PropertyValue::Class(v)
            | PropertyValue::Enum(v)
            | PropertyValue::Aggregation(v)
            | PropertyValue::AttributeType(v) => f.write_str(v),
            PropertyValue::Dn(v) => write!(f, "{}", v),
            PropertyValue::IpAddress(v) => write!(f, "{}", v),
        }
    }
}

/// Kind-specific part of a property definition.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySyntax {
    Boolean(BooleanSyntax),
    Integer(IntegerSyntax),
    Size(SizeSyntax),
    Duration(DurationSyntax),
    String(StringSyntax),
    Class(ClassSyntax),
    Enum(EnumSyntax),
    Dn(DnSyntax),
    Aggregation(AggregationSyntax),
    IpAddress(IpAddressSyntax),
    AttributeType(AttributeTypeSyntax),
}

impl PropertySyntax {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertySyntax::Boolean(_) => "boolean",
            PropertySyntax::Integer(_) => "integer",
            PropertySyntax::Size(_) => "size",
            PropertySyntax::Duration(_) => "duration",
            PropertySyntax::String(_) => "string",
            PropertySyntax::Class(_) => "class",
            PropertySyntax::Enum(_) => "enumeration",
            PropertySyntax::Dn(_) => "dn",
            PropertySyntax::Aggregation(_) => "aggregation",
            PropertySyntax::IpAddress(_) => "ip-address",
            PropertySyntax::AttributeType(_) => "attribute-type",
        }
    }
}

macro_rules! impl_into_syntax {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for PropertySyntax {
                fn from(syntax: $ty) -> Self {
                    PropertySyntax::$variant(syntax)
                }
            }
        )*
    };
}

impl_into_syntax!(
    Boolean(BooleanSyntax),
    Integer(IntegerSyntax),
    Size(SizeSyntax),
    Duration(DurationSyntax),
    String(StringSyntax),
    Class(ClassSyntax),
    Enum(EnumSyntax),
    Dn(DnSyntax),
    Aggregation(AggregationSyntax),
    IpAddress(IpAddressSyntax),
    AttributeType(AttributeTypeSyntax),
);

/// Runs `$body` with the syntax and typed value bound when the value kind
/// matches the syntax kind.
macro_rules! with_typed_value {
    ($syntax_expr:expr, $value_expr:expr, |$s:ident, $v:ident| $body:expr) => {
        match ($syntax_expr, $value_expr) {
            (PropertySyntax::Boolean($s), PropertyValue::Boolean($v)) => $body,
            (PropertySyntax::Integer($s), PropertyValue::Integer($v)) => $body,
            (PropertySyntax::Size($s), PropertyValue::Size($v)) => $body,
            (PropertySyntax::Duration($s), PropertyValue::Duration($v)) => $body,
            (PropertySyntax::String($s), PropertyValue::String($v)) => $body,
            (PropertySyntax::Class($s), PropertyValue::Class($v)) => $body,
            (PropertySyntax::Enum($s), PropertyValue::Enum($v)) => $body,
            (PropertySyntax::Dn($s), PropertyValue::Dn($v)) => $body,
            (PropertySyntax::Aggregation($s), PropertyValue::Aggregation($v)) => $body,
            (PropertySyntax::IpAddress($s), PropertyValue::IpAddress($v)) => $body,
            (PropertySyntax::AttributeType($s), PropertyValue::AttributeType($v)) => $body,
            (syntax, value) => Err(ValueIssue::new(format!(
                "a {} value cannot be used with a {} property",
                value.kind_name(),
                syntax.kind_name()
            ))),
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    owner: String,
    name: String,
    options: BTreeSet<PropertyOption>,
    admin_action: AdministratorAction,
    default_behavior: DefaultBehavior,
    syntax: PropertySyntax,
}

impl PropertyDefinition {
    /// Start a definition for property `name` declared by `owner`.
    pub fn builder(owner: &str, name: &str) -> PropertyDefinitionBuilder {
        PropertyDefinitionBuilder {
            owner: owner.to_string(),
            name: name.to_string(),
            options: BTreeSet::new(),
            admin_action: AdministratorAction::none(),
            default_behavior: DefaultBehavior::Undefined,
            syntax: None,
        }
    }

    /// Name of the declaring definition.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &BTreeSet<PropertyOption> {
        &self.options
    }

    pub fn has_option(&self, option: PropertyOption) -> bool {
        self.options.contains(&option)
    }

    pub fn admin_action(&self) -> &AdministratorAction {
        &self.admin_action
    }

    pub fn default_behavior(&self) -> &DefaultBehavior {
        &self.default_behavior
    }

    pub(crate) fn default_behavior_mut(&mut self) -> &mut DefaultBehavior {
        &mut self.default_behavior
    }

    pub fn syntax(&self) -> &PropertySyntax {
        &self.syntax
    }

    pub(crate) fn syntax_mut(&mut self) -> &mut PropertySyntax {
        &mut self.syntax
    }

    /// # Errors
    /// `IllegalPropertyValueString` when the text does not decode.
    pub fn decode_value(&self, text: &str, cx: &AdminContext) -> Result<PropertyValue> {
        let decoded = match &self.syntax {
            PropertySyntax::Boolean(s) => s.decode(text, cx).map(PropertyValue::Boolean),
            PropertySyntax::Integer(s) => s.decode(text, cx).map(PropertyValue::Integer),
            PropertySyntax::Size(s) => s.decode(text, cx).map(PropertyValue::Size),
            PropertySyntax::Duration(s) => s.decode(text, cx).map(PropertyValue::Duration),
            PropertySyntax::String(s) => s.decode(text, cx).map(PropertyValue::String),
            PropertySyntax::Class(s) => s.decode(text, cx).map(PropertyValue::Class),
            PropertySyntax::Enum(s) => s.decode(text, cx).map(PropertyValue::Enum),
            PropertySyntax::Dn(s) => s.decode(text, cx).map(PropertyValue::Dn),
            PropertySyntax::Aggregation(s) => s.decode(text, cx).map(PropertyValue::Aggregation),
            PropertySyntax::IpAddress(s) => s.decode(text, cx).map(PropertyValue::IpAddress),
            PropertySyntax::AttributeType(s) => {
                s.decode(text, cx).map(PropertyValue::AttributeType)
            }
        };
        decoded.map_err(|issue| ConfigError::IllegalPropertyValueString {
            property: self.name.clone(),
            value: text.to_string(),
            reason: issue.reason().to_string(),
        })
    }

    /// Decode a full value set, enforcing single-valuedness.
    ///
    /// # Errors
    /// Fails on the first undecodable text, or when several values are given
    /// to a single-valued property.
    pub fn decode_values(&self, texts: &[String], cx: &AdminContext) -> Result<Vec<PropertyValue>> {
        if texts.len() > 1 && !self.has_option(PropertyOption::MultiValued) {
            return Err(ConfigError::IllegalPropertyValueString {
                property: self.name.clone(),
                value: texts.join(", "),
                reason: "the property is single-valued".to_string(),
            });
        }
        texts.iter().map(|t| self.decode_value(t, cx)).collect()
    }

    /// # Errors
    /// `IllegalPropertyValue` when the value is invalid for this property.
    pub fn validate_value(&self, value: &PropertyValue, cx: &AdminContext) -> Result<()> {
        with_typed_value!(&self.syntax, value, |s, v| s.validate(v, cx))
            .map_err(|issue| self.value_error(value, issue))
    }

    /// # Errors
    /// `IllegalPropertyValue` when the value is invalid for this property.
    pub fn encode_value(&self, value: &PropertyValue, cx: &AdminContext) -> Result<String> {
        with_typed_value!(&self.syntax, value, |s, v| s.encode(v, cx))
            .map_err(|issue| self.value_error(value, issue))
    }

    /// # Errors
    /// `IllegalPropertyValue` when the value is invalid for this property.
    pub fn normalize_value(&self, value: &PropertyValue, cx: &AdminContext) -> Result<String> {
        with_typed_value!(&self.syntax, value, |s, v| s.normalize(v, cx))
            .map_err(|issue| self.value_error(value, issue))
    }

    /// # Errors
    /// `IllegalPropertyValue` when either value is of another kind.
    pub fn compare(&self, a: &PropertyValue, b: &PropertyValue) -> Result<Ordering> {
        let ordering = match (&self.syntax, a, b) {
            (PropertySyntax::Boolean(s), PropertyValue::Boolean(x), PropertyValue::Boolean(y)) => {
                s.compare(x, y)
            }
            (PropertySyntax::Integer(s), PropertyValue::Integer(x), PropertyValue::Integer(y)) => {
                s.compare(x, y)
            }
            (PropertySyntax::Size(s), PropertyValue::Size(x), PropertyValue::Size(y)) => {
                s.compare(x, y)
            }
            (PropertySyntax::Duration(s), PropertyValue::Duration(x), PropertyValue::Duration(y)) => {
                s.compare(x, y)
            }
            (PropertySyntax::String(s), PropertyValue::String(x), PropertyValue::String(y)) => {
                s.compare(x, y)
            }
            (PropertySyntax::Class(s), PropertyValue::Class(x), PropertyValue::Class(y)) => {
                s.compare(x, y)
            }
            (PropertySyntax::Enum(s), PropertyValue::Enum(x), PropertyValue::Enum(y)) => {
                s.compare(x, y)
            }
            (PropertySyntax::Dn(s), PropertyValue::Dn(x), PropertyValue::Dn(y)) => s.compare(x, y),
            (
                PropertySyntax::Aggregation(s),
                PropertyValue::Aggregation(x),
                PropertyValue::Aggregation(y),
            ) => s.compare(x, y),
            (
                PropertySyntax::IpAddress(s),
                PropertyValue::IpAddress(x),
                PropertyValue::IpAddress(y),
            ) => s.compare(x, y),
            (
                PropertySyntax::AttributeType(s),
                PropertyValue::AttributeType(x),
                PropertyValue::AttributeType(y),
            ) => s.compare(x, y),
            (syntax, x, y) => {
                let odd = if x.kind_name() == syntax.kind_name() { y } else { x };
                return Err(self.value_error(
                    odd,
                    ValueIssue::new(format!(
                        "a {} value cannot be compared as a {} value",
                        odd.kind_name(),
                        syntax.kind_name()
                    )),
                ));
            }
        };
        Ok(ordering)
    }

    pub fn accept<R, P, V>(&self, visitor: &mut V, param: P) -> Result<R>
    where
        V: PropertyDefinitionVisitor<R, P> + ?Sized,
    {
        match &self.syntax {
            PropertySyntax::Boolean(s) => visitor.visit_boolean(self, s, param),
            PropertySyntax::Integer(s) => visitor.visit_integer(self, s, param),
            PropertySyntax::Size(s) => visitor.visit_size(self, s, param),
            PropertySyntax::Duration(s) => visitor.visit_duration(self, s, param),
            PropertySyntax::String(s) => visitor.visit_string(self, s, param),
            PropertySyntax::Class(s) => visitor.visit_class(self, s, param),
            PropertySyntax::Enum(s) => visitor.visit_enum(self, s, param),
            PropertySyntax::Dn(s) => visitor.visit_dn(self, s, param),
            PropertySyntax::Aggregation(s) => visitor.visit_aggregation(self, s, param),
            PropertySyntax::IpAddress(s) => visitor.visit_ip_address(self, s, param),
            PropertySyntax::AttributeType(s) => visitor.visit_attribute_type(self, s, param),
        }
    }

    /// # Errors
    /// `IllegalPropertyValue` when the value kind does not match the
    /// property, otherwise whatever the visitor returns.
    pub fn accept_value<R, P, V>(&self, value: &PropertyValue, visitor: &mut V, param: P) -> Result<R>
    where
        V: PropertyValueVisitor<R, P> + ?Sized,
    {
        match (&self.syntax, value) {
            (PropertySyntax::Boolean(s), PropertyValue::Boolean(v)) => {
                visitor.visit_boolean(self, s, *v, param)
            }
            (PropertySyntax::Integer(s), PropertyValue::Integer(v)) => {
                visitor.visit_integer(self, s, *v, param)
            }
            (PropertySyntax::Size(s), PropertyValue::Size(v)) => visitor.visit_size(self, s, *v, param),
            (PropertySyntax::Duration(s), PropertyValue::Duration(v)) => {
                visitor.visit_duration(self, s, *v, param)
            }
            (PropertySyntax::String(s), PropertyValue::String(v)) => {
                visitor.visit_string(self, s, v, param)
            }
            (PropertySyntax::Class(s), PropertyValue::Class(v)) => visitor.visit_class(self, s, v, param),
            (PropertySyntax::Enum(s), PropertyValue::Enum(v)) => visitor.visit_enum(self, s, v, param),
            (PropertySyntax::Dn(s), PropertyValue::Dn(v)) => visitor.visit_dn(self, s, v, param),
            (PropertySyntax::Aggregation(s), PropertyValue::Aggregation(v)) => {
                visitor.visit_aggregation(self, s, v, param)
            }
            (PropertySyntax::IpAddress(s), PropertyValue::IpAddress(v)) => {
                visitor.visit_ip_address(self, s, v, param)
            }
            (PropertySyntax::AttributeType(s), PropertyValue::AttributeType(v)) => {
                visitor.visit_attribute_type(self, s, v, param)
            }
            (syntax, value) => Err(self.value_error(
                value,
                ValueIssue::new(format!(
                    "a {} value cannot be used with a {} property",
                    value.kind_name(),
                    syntax.kind_name()
                )),
            )),
        }
    }

    fn value_error(&self, value: &PropertyValue, issue: ValueIssue) -> ConfigError {
        ConfigError::IllegalPropertyValue {
            property: self.name.clone(),
            value: value.to_string(),
            reason: issue.reason().to_string(),
        }
    }
}

#[derive(Debug)]
pub struct PropertyDefinitionBuilder {
    owner: String,
    name: String,
    options: BTreeSet<PropertyOption>,
    admin_action: AdministratorAction,
    default_behavior: DefaultBehavior,
    syntax: Option<PropertySyntax>,
}

impl PropertyDefinitionBuilder {
    pub fn option(mut self, option: PropertyOption) -> Self {
        self.options.insert(option);
        self
    }

    pub fn options<I: IntoIterator<Item = PropertyOption>>(mut self, options: I) -> Self {
        self.options.extend(options);
        self
    }

    pub fn admin_action(mut self, action: AdministratorAction) -> Self {
        self.admin_action = action;
        self
    }

    pub fn default_behavior(mut self, behavior: DefaultBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    pub fn syntax(mut self, syntax: impl Into<PropertySyntax>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    /// # Errors
    /// Schema error when the definition is incomplete or its default values
    /// contradict its options.
    pub fn build(self) -> Result<PropertyDefinition> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::schema(format!(
                "a property of \"{}\" has a blank name",
                self.owner
            )));
        }
        let Some(syntax) = self.syntax else {
            return Err(ConfigError::schema(format!(
                "property \"{}\" of \"{}\" has no syntax",
                self.name, self.owner
            )));
        };
        if let DefaultBehavior::Defined(values) = &self.default_behavior {
            if values.is_empty() {
                return Err(ConfigError::schema(format!(
                    "property \"{}\" declares an empty set of default values",
                    self.name
                )));
            }
            if values.len() > 1 && !self.options.contains(&PropertyOption::MultiValued) {
                return Err(ConfigError::schema(format!(
                    "single-valued property \"{}\" declares {} default values",
                    self.name,
                    values.len()
                )));
            }
        }
        Ok(PropertyDefinition {
            owner: self.owner,
            name: self.name,
            options: self.options,
            admin_action: self.admin_action,
            default_behavior: self.default_behavior,
            syntax,
        })
    }
}
