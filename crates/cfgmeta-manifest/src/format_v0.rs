//! Manifest Format v0 schema
//!
//! Defines the YAML structure of a schema manifest

use cfgmeta_core::property::{AdministratorActionType, PropertyOption};
use cfgmeta_core::relation::RelationType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_root() -> String {
    "root".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

/// Top-level manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Name of the root definition
    #[serde(default = "default_root")]
    pub root: String,

    /// Locale of the descriptive text
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Relations held by the root
    #[serde(default)]
    pub root_relations: Vec<RelationSpec>,

    /// Definitions, parents before children
    #[serde(default)]
    pub definitions: Vec<DefinitionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionSpec {
    pub name: String,

    /// Parent definition; the root when omitted
    pub parent: Option<String>,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    pub user_friendly_name: Option<String>,
    pub synopsis: Option<String>,

    #[serde(default)]
    pub properties: Vec<PropertySpec>,

    #[serde(default)]
    pub relations: Vec<RelationSpec>,

    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    pub name: String,
    pub syntax: SyntaxSpec,

    #[serde(default)]
    pub options: Vec<PropertyOption>,

    pub admin_action: Option<AdminActionSpec>,
    pub default: Option<DefaultSpec>,
    pub synopsis: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminActionSpec {
    pub kind: AdministratorActionType,
    pub synopsis: Option<String>,
}

/// Value syntax, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyntaxSpec {
    Boolean,
    Integer {
        lower: Option<i64>,
        upper: Option<i64>,
        #[serde(default)]
        unlimited: bool,
    },
    /// Limits are sizes with units, e.g. `"1 kib"`
    Size {
        lower: Option<String>,
        upper: Option<String>,
        #[serde(default)]
        unlimited: bool,
    },
    /// Limits count base units
    Duration {
        base_unit: Option<String>,
        maximum_unit: Option<String>,
        lower: Option<i64>,
        upper: Option<i64>,
        #[serde(default)]
        unlimited: bool,
    },
    String {
        pattern: Option<String>,
        usage: Option<String>,
        #[serde(default)]
        case_insensitive: bool,
    },
    Class {
        #[serde(default)]
        instance_of: Vec<String>,
    },
    Enum {
        values: Vec<String>,
    },
    Dn {
        base_dn: Option<String>,
    },
    Aggregation {
        relation: String,
        target: String,
        parent_path: Option<String>,
        target_needs_enabling: Option<ConditionSpec>,
        target_is_enabled: Option<ConditionSpec>,
    },
    IpAddress,
    AttributeType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultSpec {
    Defined(Vec<String>),
    Alias(String),
    AbsoluteInherited {
        path: String,
        property: String,
    },
    RelativeInherited {
        offset: usize,
        definition: String,
        property: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSpec {
    Contains { property: String, value: String },
    IsPresent(String),
    Not(Box<ConditionSpec>),
    And(Vec<ConditionSpec>),
    Or(Vec<ConditionSpec>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationSpec {
    pub name: String,
    pub kind: RelationType,
    pub child: String,
    pub plural_name: Option<String>,
    pub naming_property: Option<String>,

    #[serde(default)]
    pub hidden: bool,

    /// Objects created with the parent
    #[serde(default)]
    pub default_objects: Vec<DefaultObjectSpec>,

    /// Aggregation relations only
    pub target: Option<TargetSpec>,
    pub min_occurs: Option<u32>,
    pub max_occurs: Option<u32>,

    pub user_friendly_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultObjectSpec {
    /// Instance name (instantiable relations)
    pub name: Option<String>,

    /// Definition of the object; the relation child when omitted
    pub definition: Option<String>,

    #[serde(default)]
    pub values: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub path: String,
    pub relation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintSpec {
    pub name: String,
    pub condition: ConditionSpec,
    pub synopsis: Option<String>,
}
