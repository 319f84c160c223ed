//! Referential integrity of aggregation properties.
//!
//! The source side (registered on the definition declaring the property)
//! refuses dangling and disabled references. The target side (registered on
//! the target definition) refuses deleting or disabling objects that are
//! still referenced.

use super::{ClientConstraintHandler, Constraint, ConstraintEnv, ServerConstraintHandler};
use crate::conditions::ContextPropertySource;
use crate::context::AdminContext;
use crate::definition::DefinitionTree;
use crate::errors::{ConfigError, Result};
use crate::management::CandidateObject;
use crate::property::AggregationSyntax;
use cfgmeta_core_types::Message;

#[derive(Debug, Clone)]
struct AggregationLink {
    source: String,
    property: String,
    syntax: AggregationSyntax,
}

/// Reason codes for one side of the check.
struct ReferenceCodes {
    dangling: &'static str,
    disabled: &'static str,
}

const CLIENT_CODES: ReferenceCodes = ReferenceCodes {
    dangling: "ERR_CLIENT_REFINT_TARGET_DANGLING_REFERENCE",
    disabled: "ERR_CLIENT_REFINT_TARGET_DISABLED",
};

const SERVER_CODES: ReferenceCodes = ReferenceCodes {
    dangling: "ERR_SERVER_REFINT_DANGLING_REFERENCE",
    disabled: "ERR_SERVER_REFINT_TARGET_DISABLED",
};

/// Source and target constraints contributed by an aggregation property.
pub(crate) fn aggregation_constraints(
    source: &str,
    property: &str,
    syntax: &AggregationSyntax,
) -> (Constraint, Constraint) {
    let link = AggregationLink {
        source: source.to_string(),
        property: property.to_string(),
        syntax: syntax.clone(),
    };
    let source_constraint = Constraint::new(&format!("aggregation-source:{}", property))
        .with_client_handler(AggregationSourceClientHandler { link: link.clone() })
        .with_server_handler(AggregationSourceServerHandler { link: link.clone() });
    let target_constraint = Constraint::new(&format!("aggregation-target:{}.{}", source, property))
        .with_client_handler(AggregationTargetClientHandler { link: link.clone() })
        .with_server_handler(AggregationTargetServerHandler { link });
    (source_constraint, target_constraint)
}

impl AggregationLink {
    fn ensure_resolved(&self) -> Result<()> {
        if self.syntax.resolved().is_none() {
            return Err(ConfigError::schema(format!(
                "aggregation property \"{}\" of \"{}\" was not resolved",
                self.property, self.source
            )));
        }
        Ok(())
    }

    fn target_label(&self, env: &ConstraintEnv<'_>) -> String {
        env.admin.user_friendly_name(self.syntax.target_definition())
    }

    /// Append a reason per missing or disabled target.
    fn check_references(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        codes: &ReferenceCodes,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        let before = reasons.len();
        let names = candidate.values(&self.property);
        if names.is_empty() {
            return Ok(true);
        }
        let needs_enabling = self
            .syntax
            .target_needs_enabling()
            .evaluate(env.tree, candidate, env.admin)?;
        for name in names {
            let path = self.syntax.child_path(name.trim())?;
            if !env.context.managed_object_exists(&path)? {
                reasons.push(Message::new(
                    codes.dangling,
                    format!(
                        "The {} \"{}\" referenced in property \"{}\" does not exist",
                        self.target_label(env),
                        name.trim(),
                        self.property
                    ),
                ));
                continue;
            }
            if needs_enabling {
                let target = ContextPropertySource::new(env.context, &path);
                if !self
                    .syntax
                    .target_is_enabled()
                    .evaluate(env.tree, &target, env.admin)?
                {
                    reasons.push(Message::new(
                        codes.disabled,
                        format!(
                            "The {} \"{}\" referenced in property \"{}\" is disabled",
                            self.target_label(env),
                            name.trim(),
                            self.property
                        ),
                    ));
                }
            }
        }
        Ok(reasons.len() == before)
    }

    /// Objects whose aggregation property names `target`.
    fn referencing_objects(&self, env: &ConstraintEnv<'_>, target: &CandidateObject) -> Result<Vec<CandidateObject>> {
        let mut definitions = vec![self.source.as_str()];
        let children = env.tree.all_children(&self.source)?;
        definitions.extend(children.iter().map(|d| d.name()));
        let target_dn = target.path().to_dn(env.admin.ldap_profile());
        let mut referencing = Vec::new();
        for object in env.context.find_managed_objects(&definitions)? {
            let mut refers = false;
            for name in object.values(&self.property) {
                let path = self.syntax.child_path(name.trim())?;
                if path.to_dn(env.admin.ldap_profile()) == target_dn {
                    refers = true;
                    break;
                }
            }
            if refers {
                referencing.push(object);
            }
        }
        Ok(referencing)
    }

    fn describe(&self, env: &ConstraintEnv<'_>, object: &CandidateObject) -> String {
        let label = env.admin.user_friendly_name(object.definition());
        match object.path().name() {
            Some(name) => format!("the {} \"{}\"", label, name),
            None => format!("the {}", label),
        }
    }

    fn target_name<'c>(&self, target: &'c CandidateObject) -> &'c str {
        target.path().name().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct AggregationSourceClientHandler {
    link: AggregationLink,
}

impl ClientConstraintHandler for AggregationSourceClientHandler {
    fn initialize(&self, _tree: &DefinitionTree, _cx: &AdminContext) -> Result<()> {
        self.link.ensure_resolved()
    }

    fn is_add_acceptable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        self.link.check_references(env, candidate, &CLIENT_CODES, reasons)
    }

    fn is_modify_acceptable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        self.link.check_references(env, candidate, &CLIENT_CODES, reasons)
    }
}

#[derive(Debug, Clone)]
pub struct AggregationSourceServerHandler {
    link: AggregationLink,
}

impl ServerConstraintHandler for AggregationSourceServerHandler {
    fn initialize(&self, _tree: &DefinitionTree, _cx: &AdminContext) -> Result<()> {
        self.link.ensure_resolved()
    }

    fn is_usable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        self.link.check_references(env, candidate, &SERVER_CODES, reasons)
    }
}

#[derive(Debug, Clone)]
pub struct AggregationTargetClientHandler {
    link: AggregationLink,
}

impl ClientConstraintHandler for AggregationTargetClientHandler {
    fn is_delete_acceptable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        let referencing = self.link.referencing_objects(env, candidate)?;
        for object in &referencing {
            let code = if object.path().name().is_some() {
                "ERR_CLIENT_REFINT_CANNOT_DELETE_WITH_NAME"
            } else {
                "ERR_CLIENT_REFINT_CANNOT_DELETE_WITHOUT_NAME"
            };
            reasons.push(Message::new(
                code,
                format!(
                    "The {} \"{}\" cannot be deleted as it is referenced by the \"{}\" property of {}",
                    self.link.target_label(env),
                    self.link.target_name(candidate),
                    self.link.property,
                    self.link.describe(env, object)
                ),
            ));
        }
        Ok(referencing.is_empty())
    }

    fn is_modify_acceptable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        if self
            .link
            .syntax
            .target_is_enabled()
            .evaluate(env.tree, candidate, env.admin)?
        {
            return Ok(true);
        }
        let before = reasons.len();
        for object in self.link.referencing_objects(env, candidate)? {
            if !self
                .link
                .syntax
                .target_needs_enabling()
                .evaluate(env.tree, &object, env.admin)?
            {
                continue;
            }
            let code = if object.path().name().is_some() {
                "ERR_CLIENT_REFINT_CANNOT_DISABLE_WITH_NAME"
            } else {
                "ERR_CLIENT_REFINT_CANNOT_DISABLE_WITHOUT_NAME"
            };
            reasons.push(Message::new(
                code,
                format!(
                    "The {} \"{}\" cannot be disabled as it is referenced by the \"{}\" property of {}",
                    self.link.target_label(env),
                    self.link.target_name(candidate),
                    self.link.property,
                    self.link.describe(env, &object)
                ),
            ));
        }
        Ok(reasons.len() == before)
    }
}

#[derive(Debug, Clone)]
pub struct AggregationTargetServerHandler {
    link: AggregationLink,
}

impl ServerConstraintHandler for AggregationTargetServerHandler {
    fn is_delete_allowed(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        let referencing = self.link.referencing_objects(env, candidate)?;
        for object in &referencing {
            reasons.push(Message::new(
                "ERR_SERVER_REFINT_CANNOT_DELETE",
                format!(
                    "The {} \"{}\" cannot be deleted as it is referenced by the \"{}\" property of {}",
                    self.link.target_label(env),
                    self.link.target_name(candidate),
                    self.link.property,
                    self.link.describe(env, object)
                ),
            ));
        }
        Ok(referencing.is_empty())
    }
}
