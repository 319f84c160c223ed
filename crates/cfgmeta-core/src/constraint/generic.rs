use super::{ClientConstraintHandler, Constraint, ConstraintEnv, ServerConstraintHandler};
use crate::conditions::Condition;
use crate::context::AdminContext;
use crate::definition::DefinitionTree;
use crate::errors::Result;
use crate::management::CandidateObject;
use cfgmeta_core_types::Message;

/// A condition every object of a definition must satisfy.
#[derive(Debug, Clone)]
pub struct GenericConstraint {
    definition: String,
    name: String,
    condition: Condition,
}

impl GenericConstraint {
    pub fn new(definition: &str, name: &str, condition: Condition) -> Self {
        Self {
            definition: definition.to_string(),
            name: name.to_string(),
            condition,
        }
    }

    /// A constraint enforcing the condition on both the client and the
    /// server side.
    pub fn constraint(definition: &str, name: &str, condition: Condition) -> Constraint {
        let handler = Self::new(definition, name, condition);
        Constraint::new(name)
            .with_client_handler(handler.clone())
            .with_server_handler(handler)
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    fn check(&self, env: &ConstraintEnv<'_>, candidate: &CandidateObject, reasons: &mut Vec<Message>) -> Result<bool> {
        if self.condition.evaluate(env.tree, candidate, env.admin)? {
            return Ok(true);
        }
        let text = env
            .admin
            .constraint_synopsis(&self.definition, &self.name)
            .unwrap_or_else(|| {
                let label = env.admin.user_friendly_name(candidate.definition());
                match candidate.path().name() {
                    Some(name) => format!(
                        "The {} \"{}\" does not satisfy the constraint {}",
                        label, name, self.condition
                    ),
                    None => format!(
                        "The {} does not satisfy the constraint {}",
                        label, self.condition
                    ),
                }
            });
        reasons.push(Message::new("ERR_CONSTRAINT_VIOLATION", text));
        Ok(false)
    }
}

impl ClientConstraintHandler for GenericConstraint {
    fn initialize(&self, tree: &DefinitionTree, cx: &AdminContext) -> Result<()> {
        self.condition.initialize(tree, &self.definition, cx)
    }

    fn is_add_acceptable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        self.check(env, candidate, reasons)
    }

    fn is_modify_acceptable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        self.check(env, candidate, reasons)
    }
}

impl ServerConstraintHandler for GenericConstraint {
    fn is_usable(
        &self,
        env: &ConstraintEnv<'_>,
        candidate: &CandidateObject,
        reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        self.check(env, candidate, reasons)
    }
}
