//! Path command
//!
//! Usage: cfgmeta path <PATH>

use super::{CommandResult, Session};
use clap::Args;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct PathArgs {
    /// Managed object path, e.g. /relation=connection-handler+name=LDAP
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct PathReport {
    pub path: String,
    pub definition: String,
    pub dn: String,
}

/// Execute path command
pub fn execute(session: &Session, args: PathArgs) -> CommandResult {
    let path = session.tree.parse_path(&args.path)?;
    let report = PathReport {
        path: path.to_string(),
        definition: path.definition_name().to_string(),
        dn: path.to_dn(session.admin.ldap_profile()).to_string(),
    };
    session.emit(&report, || {
        format!("{}\n  definition: {}\n  dn: {}\n", report.path, report.definition, report.dn)
    })
}
