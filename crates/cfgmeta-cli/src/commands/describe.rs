//! Describe command
//!
//! Usage: cfgmeta describe <DEFINITION>

use super::{CommandResult, Session};
use cfgmeta_core::property::{PropertyOption, PropertyUsageBuilder};
use cfgmeta_core::{DefaultBehavior, PropertyDefinition};
use clap::Args;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Definition name, e.g. ldap-connection-handler
    pub definition: String,

    /// Include inherited properties and relations
    #[arg(long)]
    pub inherited: bool,
}

#[derive(Debug, Serialize)]
pub struct DefinitionSummary {
    pub name: String,
    pub user_friendly_name: String,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub parent: Option<String>,
    pub tags: Vec<String>,
    pub synopsis: Option<String>,
    pub properties: Vec<PropertySummary>,
    pub relations: Vec<RelationSummary>,
    pub constraints: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PropertySummary {
    pub name: String,
    pub owner: String,
    pub syntax: String,
    pub usage: String,
    pub options: Vec<&'static str>,
    pub default: String,
    pub admin_action: &'static str,
    pub synopsis: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RelationSummary {
    pub name: String,
    pub kind: String,
    pub child: String,
}

/// Execute describe command
pub fn execute(session: &Session, args: DescribeArgs) -> CommandResult {
    let summary = summarize(session, &args)?;
    session.emit(&summary, || render(&summary))
}

fn summarize(session: &Session, args: &DescribeArgs) -> Result<DefinitionSummary, Box<dyn std::error::Error>> {
    let tree = &session.tree;
    let admin = &session.admin;
    let definition = tree.get(&args.definition)?;

    let properties: Vec<&PropertyDefinition> = if args.inherited {
        let mut seen = std::collections::BTreeSet::new();
        tree.all_property_definitions(definition.name())?
            .into_iter()
            .filter(|pd| seen.insert(pd.name().to_string()))
            .collect()
    } else {
        definition.properties().iter().collect()
    };
    let relations = if args.inherited {
        tree.all_relation_definitions(definition.name())?
    } else {
        definition.relations().iter().collect()
    };

    let mut usage = PropertyUsageBuilder::detailed();
    let mut property_summaries = Vec::with_capacity(properties.len());
    for pd in properties {
        property_summaries.push(PropertySummary {
            name: pd.name().to_string(),
            owner: pd.owner().to_string(),
            syntax: pd.syntax().kind_name().to_string(),
            usage: usage.usage(pd)?,
            options: pd.options().iter().map(PropertyOption::as_str).collect(),
            default: describe_default(pd.default_behavior()),
            admin_action: pd.admin_action().kind().as_str(),
            synopsis: admin.property_synopsis(pd.owner(), pd.name()),
        });
    }

    Ok(DefinitionSummary {
        name: definition.name().to_string(),
        user_friendly_name: admin.user_friendly_name(definition.name()),
        is_abstract: definition.is_abstract(),
        parent: tree.parent(definition).map(|p| p.name().to_string()),
        tags: definition.tags().iter().cloned().collect(),
        synopsis: admin.synopsis(definition.name()),
        properties: property_summaries,
        relations: relations
            .into_iter()
            .map(|rd| RelationSummary {
                name: rd.name().to_string(),
                kind: rd.relation_type().to_string(),
                child: rd.child().to_string(),
            })
            .collect(),
        constraints: tree
            .all_constraints(definition.name())?
            .into_iter()
            .map(|c| c.name().to_string())
            .collect(),
    })
}

fn describe_default(behavior: &DefaultBehavior) -> String {
    match behavior {
        DefaultBehavior::Undefined => "undefined".to_string(),
        DefaultBehavior::Defined(values) => values.join(", "),
        DefaultBehavior::Alias(key) => format!("alias: {}", key),
        DefaultBehavior::AbsoluteInherited(a) => {
            format!("inherited from {} of {}", a.property(), a.path())
        }
        DefaultBehavior::RelativeInherited(r) => format!(
            "inherited from {} of the {} {} level(s) up",
            r.property(),
            r.definition(),
            r.offset()
        ),
    }
}

fn render(summary: &DefinitionSummary) -> String {
    let mut out = String::new();
    let kind = if summary.is_abstract { " (abstract)" } else { "" };
    let _ = writeln!(out, "{}{}", summary.user_friendly_name, kind);
    if let Some(parent) = &summary.parent {
        let _ = writeln!(out, "  extends: {}", parent);
    }
    if !summary.tags.is_empty() {
        let _ = writeln!(out, "  tags: {}", summary.tags.join(", "));
    }
    if let Some(synopsis) = &summary.synopsis {
        let _ = writeln!(out, "  {}", synopsis);
    }
    if !summary.properties.is_empty() {
        let _ = writeln!(out, "\nProperties:");
        for p in &summary.properties {
            let _ = writeln!(out, "  {:<28} {}", p.name, p.usage);
            let _ = writeln!(out, "  {:<28} default: {}", "", p.default);
            if !p.options.is_empty() {
                let _ = writeln!(out, "  {:<28} options: {}", "", p.options.join(", "));
            }
        }
    }
    if !summary.relations.is_empty() {
        let _ = writeln!(out, "\nRelations:");
        for r in &summary.relations {
            let _ = writeln!(out, "  {:<28} {} {}", r.name, r.kind, r.child);
        }
    }
    if !summary.constraints.is_empty() {
        let _ = writeln!(out, "\nConstraints:");
        for c in &summary.constraints {
            let _ = writeln!(out, "  {}", c);
        }
    }
    out
}
