//! Subcommands and the manifest session they share

pub mod check;
pub mod describe;
pub mod path;

use cfgmeta_core::config::EngineConfig;
use cfgmeta_core::logging_facility::init;
use cfgmeta_core::{AdminContext, DefinitionTree};
use cfgmeta_manifest::load_manifest_file;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Path to the manifest YAML file
    #[arg(short, long, global = true, default_value = "cfgmeta.yaml")]
    pub manifest: PathBuf,

    /// Optional engine configuration (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

/// A loaded manifest plus the context its text and DNs are rendered with.
pub struct Session {
    pub tree: DefinitionTree,
    pub admin: AdminContext,
    pub json: bool,
}

impl Session {
    pub fn open(args: &SessionArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match &args.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        init(config.logging.profile);

        let admin = AdminContext::from_config(&config)?;
        let schema = load_manifest_file(&args.manifest, &admin)?;
        tracing::debug!(
            manifest = %args.manifest.display(),
            definitions = schema.tree.len(),
            "manifest loaded"
        );

        // A configured catalog replaces the text carried by the manifest.
        let admin = if config.admin.message_catalog.is_none() {
            admin.with_message_catalog(Arc::new(schema.catalog))
        } else {
            admin
        };
        Ok(Self {
            tree: schema.tree,
            admin,
            json: args.json,
        })
    }

    /// Print `value` as pretty JSON, or fall back to `text`.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> CommandResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }
}
