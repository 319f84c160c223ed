//! cfgmeta Core - configuration metamodel engine
//!
//! This crate describes the structure of a server's configuration and the
//! rules its values obey, independently of where the configuration lives:
//! - Managed object definitions arranged in an inheritance tree
//! - Typed property definitions with syntaxes, options and default behaviors
//! - Relations between definitions and the paths they induce
//! - Conditions and constraints, including aggregation referential integrity
//! - Resolution of concrete definitions from external type information

pub mod conditions;
pub mod config;
pub mod constraint;
pub mod context;
pub mod default_behavior;
pub mod definition;
pub mod dn;
pub mod errors;
pub mod logging_facility;
pub mod management;
pub mod path;
pub mod property;
pub mod relation;

// Used by the exported logging macros
pub use cfgmeta_core_types;

// Re-export commonly used types
pub use conditions::{Condition, PropertySource};
pub use constraint::{Constraint, ConstraintEngine, ConstraintOutcome, GenericConstraint};
pub use context::AdminContext;
pub use default_behavior::{resolve_default_values, DefaultBehavior, DefaultValues};
pub use definition::{Definition, DefinitionTree, DefinitionTreeBuilder};
pub use errors::{ConfigError, ExError, ExErrorKind, Result};
pub use management::{CandidateObject, ManagementContext, MemoryContext};
pub use path::ManagedObjectPath;
pub use property::{PropertyDefinition, PropertySyntax, PropertyValue};
pub use relation::RelationDefinition;
