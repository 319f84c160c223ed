//! cfgmeta Manifest - declarative schema documents
//!
//! A manifest is a YAML document listing definitions with their properties,
//! relations and constraints. It is parsed, validated and then registered
//! into a `DefinitionTree`.

pub mod builder;
pub mod errors;
pub mod format_v0;
pub mod parser;

pub use builder::{build_tree, load_manifest_file, load_manifest_str, message_catalog, LoadedSchema};
pub use format_v0::ManifestV0;
pub use parser::{parse_manifest_file, parse_manifest_str};
