//! Check command
//!
//! Usage: cfgmeta check <DEFINITION> <PROPERTY> <VALUE>...

use super::{CommandResult, Session};
use clap::Args;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Definition declaring or inheriting the property
    pub definition: String,

    /// Property name
    pub property: String,

    /// Values to decode; several only for multi-valued properties
    #[arg(required = true)]
    pub values: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub definition: String,
    pub property: String,
    pub values: Vec<CheckedValue>,
}

#[derive(Debug, Serialize)]
pub struct CheckedValue {
    pub input: String,
    pub kind: &'static str,
    pub normalized: String,
}

/// Execute check command
pub fn execute(session: &Session, args: CheckArgs) -> CommandResult {
    let pd = session
        .tree
        .property_definition(&args.definition, &args.property)?;
    let decoded = pd.decode_values(&args.values, &session.admin)?;

    let mut values = Vec::with_capacity(decoded.len());
    for (input, value) in args.values.iter().zip(&decoded) {
        pd.validate_value(value, &session.admin)?;
        values.push(CheckedValue {
            input: input.clone(),
            kind: value.kind_name(),
            normalized: pd.normalize_value(value, &session.admin)?,
        });
    }
    tracing::debug!(property = %args.property, count = values.len(), "values accepted");

    let report = CheckReport {
        definition: args.definition,
        property: args.property,
        values,
    };
    session.emit(&report, || {
        let mut out = String::new();
        for v in &report.values {
            let _ = writeln!(out, "✓ {} -> {}", v.input, v.normalized);
        }
        out
    })
}
